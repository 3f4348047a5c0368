use std::collections::HashMap;
use thiserror::Error;

use crate::models::{Level, Question, QuestionKind, MAX_HINTS, QUESTIONS_PER_LEVEL};

const BUILTIN: &str = include_str!("../data/questions.json");

#[derive(Error, Debug)]
pub enum BankError {
    #[error("failed to parse question bank: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{level} has {found} questions, expected {}", QUESTIONS_PER_LEVEL)]
    WrongCount { level: Level, found: usize },
    #[error("{level} question {id}: {reason}")]
    Invalid { level: Level, id: u32, reason: String },
}

/// The fixed, read-only question set for every level.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    levels: HashMap<Level, Vec<Question>>,
}

impl QuestionBank {
    pub fn builtin() -> Result<Self, BankError> {
        Self::from_json(BUILTIN)
    }

    pub fn from_json(json: &str) -> Result<Self, BankError> {
        let mut levels: HashMap<Level, Vec<Question>> = serde_json::from_str(json)?;
        for level in Level::ALL {
            let questions = levels.entry(level).or_default();
            if questions.len() != QUESTIONS_PER_LEVEL {
                return Err(BankError::WrongCount {
                    level,
                    found: questions.len(),
                });
            }
            for q in questions.iter() {
                validate(level, q)?;
            }
        }
        Ok(Self { levels })
    }

    pub fn get_questions(&self, level: Level) -> &[Question] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn validate(level: Level, q: &Question) -> Result<(), BankError> {
    let invalid = |reason: &str| BankError::Invalid {
        level,
        id: q.id,
        reason: reason.to_string(),
    };
    if q.hints.len() > MAX_HINTS {
        return Err(invalid("more than 3 hints"));
    }
    match &q.kind {
        QuestionKind::MultipleChoice {
            options,
            correct_answer,
        } => {
            if *correct_answer >= options.len() {
                return Err(invalid("correctAnswer is not one of the options"));
            }
        }
        QuestionKind::FillInBlank { correct_answer, .. } => {
            if correct_answer.trim().is_empty() {
                return Err(invalid("empty correctAnswer"));
            }
        }
        QuestionKind::SqlQuery { keywords, .. } => {
            if keywords.is_empty() {
                return Err(invalid("sql-query without keywords"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_fifteen_per_level() {
        let bank = QuestionBank::builtin().unwrap();
        for level in Level::ALL {
            assert_eq!(bank.get_questions(level).len(), 15, "{level}");
        }
    }

    #[test]
    fn builtin_keeps_source_order() {
        let bank = QuestionBank::builtin().unwrap();
        let ids: Vec<u32> = bank.get_questions(Level::Beginner).iter().map(|q| q.id).collect();
        assert_eq!(ids, (1..=15).collect::<Vec<_>>());
    }

    #[test]
    fn fill_in_blank_flag_loaded() {
        let bank = QuestionBank::builtin().unwrap();
        let q = &bank.get_questions(Level::Beginner)[2];
        assert_eq!(
            q.kind,
            QuestionKind::FillInBlank {
                correct_answer: "FROM".into(),
                case_sensitive: false
            }
        );
    }

    #[test]
    fn short_level_rejected() {
        let err = QuestionBank::from_json(r#"{"beginner":[],"intermediate":[],"advanced":[]}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            BankError::WrongCount {
                level: Level::Beginner,
                found: 0
            }
        ));
    }
}
