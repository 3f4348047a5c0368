// Answer checks for the three question types

use crate::{
    error::QuizError,
    models::{AnswerValue, Question, QuestionKind},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graded {
    /// Normalized answer as it gets stored (text is trimmed).
    pub answer: AnswerValue,
    pub correct: bool,
    pub correct_answer: Option<String>,
}

pub fn check_choice(selected: usize, correct_answer: usize) -> bool {
    selected == correct_answer
}

pub fn check_fill_in(answer: &str, correct_answer: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        answer == correct_answer
    } else {
        answer.to_lowercase() == correct_answer.to_lowercase()
    }
}

/// Keyword containment: every keyword must occur somewhere in the uppercased query.
/// Clause order, comments and syntax are not looked at.
pub fn check_sql_keywords<S: AsRef<str>>(query: &str, keywords: &[S]) -> bool {
    let query = query.to_uppercase();
    keywords
        .iter()
        .all(|k| query.contains(&k.as_ref().to_uppercase()))
}

fn non_empty_text(raw: Option<&AnswerValue>, expected: &'static str) -> Result<String, QuizError> {
    match raw {
        None => Err(QuizError::EmptyAnswer),
        Some(AnswerValue::Choice(_)) => Err(QuizError::AnswerTypeMismatch { expected }),
        Some(AnswerValue::Text(t)) => {
            let t = t.trim();
            if t.is_empty() {
                Err(QuizError::EmptyAnswer)
            } else {
                Ok(t.to_string())
            }
        }
    }
}

pub fn grade(question: &Question, raw: Option<&AnswerValue>) -> Result<Graded, QuizError> {
    let expected = question.kind.type_name();
    match &question.kind {
        QuestionKind::MultipleChoice {
            options,
            correct_answer,
        } => {
            let selected = match raw {
                None => return Err(QuizError::NoSelectionMade),
                Some(AnswerValue::Choice(i)) => *i,
                Some(AnswerValue::Text(_)) => {
                    return Err(QuizError::AnswerTypeMismatch { expected })
                }
            };
            if selected >= options.len() {
                return Err(QuizError::InvalidOption(selected));
            }
            Ok(Graded {
                answer: AnswerValue::Choice(selected),
                correct: check_choice(selected, *correct_answer),
                correct_answer: None,
            })
        }
        QuestionKind::FillInBlank {
            correct_answer,
            case_sensitive,
        } => {
            let text = non_empty_text(raw, expected)?;
            let correct = check_fill_in(&text, correct_answer, *case_sensitive);
            Ok(Graded {
                answer: AnswerValue::Text(text),
                correct,
                correct_answer: (!correct).then(|| correct_answer.clone()),
            })
        }
        QuestionKind::SqlQuery {
            correct_answer,
            keywords,
        } => {
            let text = non_empty_text(raw, expected)?;
            let correct = check_sql_keywords(&text, keywords);
            Ok(Graded {
                answer: AnswerValue::Text(text),
                correct,
                correct_answer: (!correct).then(|| correct_answer.clone()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYWORDS: [&str; 9] = [
        "SELECT",
        "students",
        "WHERE",
        "grade_level",
        "IN",
        "10",
        "11",
        "ORDER BY",
        "name",
    ];

    fn sql_question() -> Question {
        Question {
            id: 2,
            prompt: "grade 10 or 11 by name".into(),
            kind: QuestionKind::SqlQuery {
                correct_answer: "SELECT * FROM students WHERE grade_level IN (10, 11) ORDER BY name"
                    .into(),
                keywords: KEYWORDS.iter().map(|k| k.to_string()).collect(),
            },
            explanation: "Use IN and ORDER BY.".into(),
            hints: vec![],
        }
    }

    #[test]
    fn sql_keywords_all_present() {
        assert!(check_sql_keywords(
            "SELECT * FROM students WHERE grade_level IN (10, 11) ORDER BY name",
            &KEYWORDS
        ));
    }

    #[test]
    fn sql_keywords_missing_order_by() {
        assert!(!check_sql_keywords(
            "SELECT * FROM students WHERE grade_level IN (10, 11)",
            &KEYWORDS
        ));
    }

    #[test]
    fn sql_keywords_ignore_case() {
        assert!(check_sql_keywords(
            "select * from students where grade_level in (10, 11) order by name",
            &KEYWORDS
        ));
    }

    #[test]
    fn sql_keywords_accept_any_order() {
        // known leniency: keywords in a comment still count
        assert!(check_sql_keywords(
            "-- ORDER BY name IN 10 11\nSELECT * FROM students WHERE grade_level = 1",
            &KEYWORDS
        ));
    }

    #[test]
    fn fill_in_case_insensitive_variants() {
        for variant in ["from", "From", "FROM"] {
            assert!(check_fill_in(variant, "FROM", false));
        }
        assert!(!check_fill_in("from", "FROM", true));
    }

    #[test]
    fn wrong_sql_reveals_reference_query() {
        let q = sql_question();
        let g = grade(&q, Some(&AnswerValue::Text("SELECT name FROM students".into()))).unwrap();
        assert!(!g.correct);
        assert_eq!(
            g.correct_answer.as_deref(),
            Some("SELECT * FROM students WHERE grade_level IN (10, 11) ORDER BY name")
        );
    }

    #[test]
    fn blank_text_is_empty_answer() {
        let q = sql_question();
        assert_eq!(
            grade(&q, Some(&AnswerValue::Text("   \n".into()))),
            Err(QuizError::EmptyAnswer)
        );
        assert_eq!(grade(&q, None), Err(QuizError::EmptyAnswer));
    }

    #[test]
    fn choice_never_reveals_answer() {
        let q = Question {
            id: 1,
            prompt: "?".into(),
            kind: QuestionKind::MultipleChoice {
                options: vec!["GET".into(), "SELECT".into()],
                correct_answer: 1,
            },
            explanation: "".into(),
            hints: vec![],
        };
        let g = grade(&q, Some(&AnswerValue::Choice(0))).unwrap();
        assert!(!g.correct);
        assert_eq!(g.correct_answer, None);
        assert_eq!(grade(&q, None), Err(QuizError::NoSelectionMade));
        assert_eq!(
            grade(&q, Some(&AnswerValue::Choice(4))),
            Err(QuizError::InvalidOption(4))
        );
    }
}
