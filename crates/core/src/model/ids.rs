use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SEPARATOR: &str = "::";

/// Error type for parsing a `TopicKey` from a string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicKeyError {
    #[error("subject cannot be empty")]
    EmptySubject,
    #[error("topic cannot be empty")]
    EmptyTopic,
    #[error("expected `subject::topic`, got `{raw}`")]
    MissingSeparator { raw: String },
}

/// Identifies a topic within a subject.
///
/// Formats as `subject::topic`; parsing trims both halves.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicKey {
    subject: String,
    topic: String,
}

impl TopicKey {
    /// Creates a key, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `TopicKeyError` if either part is empty after trimming.
    pub fn new(subject: impl AsRef<str>, topic: impl AsRef<str>) -> Result<Self, TopicKeyError> {
        let subject = subject.as_ref().trim();
        let topic = topic.as_ref().trim();
        if subject.is_empty() {
            return Err(TopicKeyError::EmptySubject);
        }
        if topic.is_empty() {
            return Err(TopicKeyError::EmptyTopic);
        }
        Ok(Self {
            subject: subject.to_owned(),
            topic: topic.to_owned(),
        })
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// True if this key names `(subject, topic)`, ignoring surrounding whitespace.
    #[must_use]
    pub fn matches(&self, subject: &str, topic: &str) -> bool {
        self.subject == subject.trim() && self.topic == topic.trim()
    }
}

impl fmt::Debug for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicKey({}{SEPARATOR}{})", self.subject, self.topic)
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.subject, self.topic)
    }
}

impl FromStr for TopicKey {
    type Err = TopicKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (subject, topic) =
            s.split_once(SEPARATOR)
                .ok_or_else(|| TopicKeyError::MissingSeparator { raw: s.to_owned() })?;
        Self::new(subject, topic)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_parts() {
        let key = TopicKey::new("Math", "Fractions").unwrap();
        assert_eq!(key.to_string(), "Math::Fractions");
    }

    #[test]
    fn from_str_trims_and_splits_once() {
        let key: TopicKey = " Physics :: Vectors::2D ".parse().unwrap();
        assert_eq!(key.subject(), "Physics");
        assert_eq!(key.topic(), "Vectors::2D");
    }

    #[test]
    fn from_str_rejects_missing_separator() {
        let err = "Chemistry".parse::<TopicKey>().unwrap_err();
        assert!(matches!(err, TopicKeyError::MissingSeparator { .. }));
    }

    #[test]
    fn new_rejects_blank_parts() {
        assert_eq!(TopicKey::new(" ", "x"), Err(TopicKeyError::EmptySubject));
        assert_eq!(TopicKey::new("x", ""), Err(TopicKeyError::EmptyTopic));
    }

    #[test]
    fn roundtrip_through_string() {
        let key = TopicKey::new("History", "Rome").unwrap();
        let parsed: TopicKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
        assert!(parsed.matches("History", "Rome"));
        assert!(parsed.matches(" History ", "Rome "));
    }
}
