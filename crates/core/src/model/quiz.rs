use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons a question payload cannot be used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is missing")]
    MissingText,
    #[error("question must have exactly 4 options, got {0}")]
    WrongOptionCount(usize),
    #[error("option {0} is empty")]
    EmptyOption(char),
    #[error("correct option is missing")]
    MissingCorrectOption,
    #[error("correct option must be one of A, B, C, D, got `{0}`")]
    InvalidCorrectOption(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty `{0}` (expected easy, medium or hard)")]
pub struct DifficultyParseError(pub String);

//
// ─── OPTION LETTER ─────────────────────────────────────────────────────────────
//

/// Label of one of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; OPTION_COUNT] =
        [OptionLetter::A, OptionLetter::B, OptionLetter::C, OptionLetter::D];

    /// Parses a learner's answer case-insensitively.
    ///
    /// Accepts `"b"`, `"B"`, `" B) "` and similar; anything else yields `None`.
    #[must_use]
    pub fn parse_answer(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_suffix(')').unwrap_or(trimmed).trim_end();
        let mut chars = trimmed.chars();
        let letter = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Self::from_char(letter)
    }

    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            OptionLetter::A => 'A',
            OptionLetter::B => 'B',
            OptionLetter::C => 'C',
            OptionLetter::D => 'D',
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            OptionLetter::A => 0,
            OptionLetter::B => 1,
            OptionLetter::C => 2,
            OptionLetter::D => 3,
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(DifficultyParseError(s.to_owned())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question as produced by an external generator.
///
/// Accepts both `question`/`text` and `correct`/`correctOption` spellings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    #[serde(alias = "question")]
    pub text: Option<String>,
    pub options: Option<Vec<String>>,
    #[serde(alias = "correct", alias = "answer")]
    pub correct_option: Option<String>,
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Validates the draft into a `Question`.
    ///
    /// Options missing an `A)`..`D)` prefix are labeled in order. A missing
    /// explanation becomes an empty string.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for missing text, a wrong option count, an empty
    /// option, or a missing/invalid correct option.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let text = self
            .text
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or(QuestionError::MissingText)?;

        let raw_options = self.options.unwrap_or_default();
        if raw_options.len() != OPTION_COUNT {
            return Err(QuestionError::WrongOptionCount(raw_options.len()));
        }
        let mut options = Vec::with_capacity(OPTION_COUNT);
        for (letter, raw) in OptionLetter::ALL.into_iter().zip(raw_options) {
            options.push(label_option(letter, &raw)?);
        }

        let raw_correct = self
            .correct_option
            .filter(|c| !c.trim().is_empty())
            .ok_or(QuestionError::MissingCorrectOption)?;
        let correct = OptionLetter::parse_answer(&raw_correct)
            .or_else(|| labeled_letter(&raw_correct))
            .ok_or(QuestionError::InvalidCorrectOption(raw_correct))?;

        Ok(Question {
            text,
            options,
            correct,
            explanation: self.explanation.unwrap_or_default().trim().to_owned(),
        })
    }
}

/// Letter of a fully labeled option such as `"C) Paris"`.
fn labeled_letter(raw: &str) -> Option<OptionLetter> {
    let mut chars = raw.trim().chars();
    let letter = chars.next()?;
    (chars.next() == Some(')')).then_some(letter).and_then(OptionLetter::from_char)
}

fn label_option(letter: OptionLetter, raw: &str) -> Result<String, QuestionError> {
    let raw = raw.trim();
    let prefix = format!("{letter})");
    let body = raw
        .strip_prefix(&prefix)
        .or_else(|| raw.strip_prefix(&prefix.to_ascii_lowercase()))
        .unwrap_or(raw)
        .trim();
    if body.is_empty() {
        return Err(QuestionError::EmptyOption(letter.as_char()));
    }
    Ok(format!("{prefix} {body}"))
}

/// A validated multiple-choice question with four labeled options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    text: String,
    options: Vec<String>,
    #[serde(rename = "correctOption")]
    correct: OptionLetter,
    explanation: String,
}

impl Question {
    /// Convenience constructor that runs the same validation as `QuestionDraft`.
    ///
    /// # Errors
    ///
    /// See [`QuestionDraft::validate`].
    pub fn new(
        text: impl Into<String>,
        options: [&str; OPTION_COUNT],
        correct: OptionLetter,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        QuestionDraft {
            text: Some(text.into()),
            options: Some(options.iter().map(|o| (*o).to_owned()).collect()),
            correct_option: Some(correct.to_string()),
            explanation: Some(explanation.into()),
        }
        .validate()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Options labeled `A) …` through `D) …`.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> OptionLetter {
        self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Case-insensitive check of a learner's answer.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        OptionLetter::parse_answer(answer) == Some(self.correct)
    }
}

//
// ─── ANSWER RECORD ─────────────────────────────────────────────────────────────
//

/// One submitted answer within a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_index: usize,
    pub answer: String,
    pub correct_answer: OptionLetter,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

//
// ─── LETTER GRADE ──────────────────────────────────────────────────────────────
//

/// Grade band for a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Self::APlus
        } else if percentage >= 80.0 {
            Self::A
        } else if percentage >= 70.0 {
            Self::B
        } else if percentage >= 60.0 {
            Self::C
        } else if percentage >= 50.0 {
            Self::D
        } else {
            Self::F
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            LetterGrade::APlus => "A+",
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        }
    }

    /// Encouragement shown next to the grade.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            LetterGrade::APlus => "Outstanding! You've mastered this material!",
            LetterGrade::A => "Excellent work! You have a strong understanding.",
            LetterGrade::B => "Good job! Keep practicing to improve further.",
            LetterGrade::C => "Not bad! Review the explanations to strengthen your knowledge.",
            LetterGrade::D => "You're getting there! Focus on the questions you missed.",
            LetterGrade::F => "Keep learning! Review the material and try again.",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            text: Some("What is 2 + 2?".into()),
            options: Some(vec!["3".into(), "B) 4".into(), "c) 5".into(), "22".into()]),
            correct_option: Some("b".into()),
            explanation: Some("Two plus two is four.".into()),
        }
    }

    #[test]
    fn validate_labels_options() {
        let q = draft().validate().unwrap();
        assert_eq!(q.options(), &["A) 3", "B) 4", "C) 5", "D) 22"]);
        assert_eq!(q.correct_option(), OptionLetter::B);
    }

    #[test]
    fn validate_rejects_missing_correct_option() {
        let err = QuestionDraft {
            correct_option: None,
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, QuestionError::MissingCorrectOption);
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let err = QuestionDraft {
            options: Some(vec!["A) 1".into(), "B) 2".into()]),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, QuestionError::WrongOptionCount(2));

        let err = QuestionDraft {
            correct_option: Some("E".into()),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, QuestionError::InvalidCorrectOption(_)));

        let q = QuestionDraft {
            correct_option: Some("C) 5".into()),
            ..draft()
        }
        .validate()
        .unwrap();
        assert_eq!(q.correct_option(), OptionLetter::C);

        let err = QuestionDraft {
            text: Some("   ".into()),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, QuestionError::MissingText);

        let err = QuestionDraft {
            options: Some(vec!["A) 1".into(), "B)".into(), "C) 3".into(), "D) 4".into()]),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyOption('B'));
    }

    #[test]
    fn draft_accepts_generator_field_names() {
        let json = r#"{"question":"Q?","options":["a","b","c","d"],"correct":"D","explanation":"x"}"#;
        let q = serde_json::from_str::<QuestionDraft>(json)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(q.text(), "Q?");
        assert_eq!(q.correct_option(), OptionLetter::D);
    }

    #[test]
    fn answers_compare_case_insensitively() {
        let q = draft().validate().unwrap();
        assert!(q.is_correct("b"));
        assert!(q.is_correct(" B) "));
        assert!(!q.is_correct("A"));
        assert!(!q.is_correct("banana"));
        assert!(!q.is_correct(""));
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(LetterGrade::from_percentage(100.0), LetterGrade::APlus);
        assert_eq!(LetterGrade::from_percentage(90.0), LetterGrade::APlus);
        assert_eq!(LetterGrade::from_percentage(80.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(79.9), LetterGrade::B);
        assert_eq!(LetterGrade::from_percentage(60.0), LetterGrade::C);
        assert_eq!(LetterGrade::from_percentage(50.0), LetterGrade::D);
        assert_eq!(LetterGrade::from_percentage(49.9), LetterGrade::F);
        assert_eq!(LetterGrade::APlus.to_string(), "A+");
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }
}
