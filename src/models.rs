use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Questions per level; also the ceiling for a stored score.
pub const QUESTIONS_PER_LEVEL: usize = 15;
/// Hints shown per question at most.
pub const MAX_HINTS: usize = 3;
/// 12/15 = 80%. Compared as an integer so there is no rounding to argue about.
pub const UNLOCK_SCORE: u32 = 12;
pub const PASS_PERCENTAGE: u32 = 80;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    pub fn next(self) -> Option<Level> {
        match self {
            Level::Beginner => Some(Level::Intermediate),
            Level::Intermediate => Some(Level::Advanced),
            Level::Advanced => None,
        }
    }

    /// The level whose score gates this one.
    pub fn prerequisite(self) -> Option<Level> {
        match self {
            Level::Beginner => None,
            Level::Intermediate => Some(Level::Beginner),
            Level::Advanced => Some(Level::Intermediate),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown level: {}", self.0)
    }
}

impl std::error::Error for UnknownLevel {}

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: u32,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub explanation: String,
    #[serde(default)]
    pub hints: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    #[serde(rename_all = "camelCase")]
    MultipleChoice {
        options: Vec<String>,
        correct_answer: usize,
    },
    #[serde(rename_all = "camelCase")]
    FillInBlank {
        correct_answer: String,
        #[serde(default = "default_case_sensitive")]
        case_sensitive: bool,
    },
    #[serde(rename_all = "camelCase")]
    SqlQuery {
        correct_answer: String,
        keywords: Vec<String>,
    },
}

fn default_case_sensitive() -> bool {
    true
}

impl QuestionKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple-choice",
            QuestionKind::FillInBlank { .. } => "fill-in-blank",
            QuestionKind::SqlQuery { .. } => "sql-query",
        }
    }
}

/// A submitted answer: an option index or free text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnswerValue {
    Choice(usize),
    Text(String),
}

/// `answer == None` marks a skipped question.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub answer: Option<AnswerValue>,
    pub correct: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelProgress {
    pub score: u32,
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub beginner: LevelProgress,
    pub intermediate: LevelProgress,
    pub advanced: LevelProgress,
}

impl Progress {
    pub fn get(&self, level: Level) -> LevelProgress {
        match level {
            Level::Beginner => self.beginner,
            Level::Intermediate => self.intermediate,
            Level::Advanced => self.advanced,
        }
    }

    pub fn set(&mut self, level: Level, lp: LevelProgress) {
        match level {
            Level::Beginner => self.beginner = lp,
            Level::Intermediate => self.intermediate = lp,
            Level::Advanced => self.advanced = lp,
        }
    }

    /// Overwrites whatever the level held before; a worse retry replaces a better run.
    pub fn record(&mut self, level: Level, score: u32) {
        self.set(
            level,
            LevelProgress {
                score,
                completed: true,
            },
        );
    }

    pub fn is_unlocked(&self, level: Level) -> bool {
        match level.prerequisite() {
            None => true,
            Some(prev) => self.get(prev).score >= UNLOCK_SCORE,
        }
    }

    pub fn is_passed(&self, level: Level) -> bool {
        self.get(level).score >= UNLOCK_SCORE
    }

    /// Stored scores above the per-level ceiling can only come from a corrupt record.
    pub fn is_valid(&self) -> bool {
        Level::ALL
            .iter()
            .all(|l| self.get(*l).score as usize <= QUESTIONS_PER_LEVEL)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub correct: bool,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    /// 1-based position of this hint.
    pub number: usize,
    pub remaining: usize,
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuizResults {
    pub session_id: Uuid,
    pub level: Level,
    pub score: u32,
    pub total_questions: usize,
    pub percentage: u32,
    pub passed: bool,
    pub next_level_available: bool,
    pub elapsed_secs: u64,
    pub finished_at: DateTime<Utc>,
}

/// What a client gets to see of a question: no correct answer, no keywords.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: u32,
    pub index: usize,
    pub total: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub hints_available: usize,
}

impl QuestionView {
    pub fn new(q: &Question, index: usize, total: usize) -> Self {
        let options = match &q.kind {
            QuestionKind::MultipleChoice { options, .. } => Some(options.clone()),
            _ => None,
        };
        Self {
            id: q.id,
            index,
            total,
            kind: q.kind.type_name().to_string(),
            question: q.prompt.clone(),
            options,
            hints_available: q.hints.len().min(MAX_HINTS),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StartQuizReq {
    pub level: Level,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmitAnswerReq {
    #[serde(default)]
    pub answer: Option<AnswerValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CertificateReq {
    pub student_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LevelStatus {
    pub level: Level,
    pub score: u32,
    pub completed: bool,
    pub unlocked: bool,
}
