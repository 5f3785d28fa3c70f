//! Question payloads produced by an external generator.
//!
//! Generators tend to wrap the JSON array in prose or code fences, so the
//! array is cut out of the surrounding text before decoding.

use tutor_core::model::{Question, QuestionDraft};

use crate::error::QuizError;

/// Extract and validate the question array embedded in `raw`.
///
/// # Errors
///
/// Returns `QuizError::InvalidInput` if no JSON array is found, it cannot be
/// decoded, or it is empty. Returns `QuizError::MalformedQuestionData` for
/// the first entry that fails validation.
pub fn parse_questions(raw: &str) -> Result<Vec<Question>, QuizError> {
    let drafts = parse_drafts(raw)?;
    if drafts.is_empty() {
        return Err(QuizError::InvalidInput("question list is empty".into()));
    }
    validate_drafts(drafts)
}

pub(crate) fn validate_drafts(drafts: Vec<QuestionDraft>) -> Result<Vec<Question>, QuizError> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            draft
                .validate()
                .map_err(|source| QuizError::MalformedQuestionData { index, source })
        })
        .collect()
}

fn parse_drafts(raw: &str) -> Result<Vec<QuestionDraft>, QuizError> {
    let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) else {
        return Err(QuizError::InvalidInput("no JSON array found".into()));
    };
    if end < start {
        return Err(QuizError::InvalidInput("no JSON array found".into()));
    }

    serde_json::from_str(&raw[start..=end])
        .map_err(|e| QuizError::InvalidInput(format!("invalid question JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::model::{OptionLetter, QuestionError};

    #[test]
    fn extracts_array_from_surrounding_text() {
        let raw = r#"Here is your quiz:
```json
[
  {"question": "2 + 2?", "options": ["A) 3", "B) 4", "C) 5", "D) 6"], "correct": "B", "explanation": "Basic sum."},
  {"text": "Capital of France?", "options": ["Rome", "Paris", "Lima", "Oslo"], "correctOption": "b"}
]
```
Good luck!"#;

        let questions = parse_questions(raw).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct_option(), OptionLetter::B);
        assert_eq!(questions[1].options()[1], "B) Paris");
        assert_eq!(questions[1].explanation(), "");
    }

    #[test]
    fn rejects_missing_or_broken_arrays() {
        assert!(matches!(
            parse_questions("no quiz here").unwrap_err(),
            QuizError::InvalidInput(_)
        ));
        assert!(matches!(
            parse_questions("] backwards [").unwrap_err(),
            QuizError::InvalidInput(_)
        ));
        assert!(matches!(
            parse_questions("[{\"question\": ]").unwrap_err(),
            QuizError::InvalidInput(_)
        ));
        assert!(matches!(
            parse_questions("[]").unwrap_err(),
            QuizError::InvalidInput(_)
        ));
    }

    #[test]
    fn reports_index_of_malformed_question() {
        let raw = r#"[
            {"question": "ok", "options": ["a", "b", "c", "d"], "correct": "A"},
            {"question": "no answer", "options": ["a", "b", "c", "d"]}
        ]"#;

        match parse_questions(raw).unwrap_err() {
            QuizError::MalformedQuestionData { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(source, QuestionError::MissingCorrectOption);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
