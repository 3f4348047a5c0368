use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::{
    bank::QuestionBank,
    error::QuizError,
    grading,
    models::{
        AnswerRecord, AnswerValue, Hint, Level, Progress, Question, QuestionView, QuizResults,
        SubmitOutcome, MAX_HINTS, PASS_PERCENTAGE,
    },
};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    InProgress,
    Finalized,
}

/// Result of moving past the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Finished(QuizResults),
}

/// Rounded half away from zero, on integers.
pub fn percentage(score: u32, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let total = total as u64;
    ((200 * score as u64 + total) / (2 * total)) as u32
}

/// One learner's run through one level.
///
/// Starting a level always builds a fresh session, so a restart never sees
/// the score, hints or answers of the run it replaces. The session never
/// checks whether `level` is unlocked; callers do that with
/// [`Progress::is_unlocked`] before calling [`QuizSession::start`].
#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    level: Level,
    questions: Vec<Question>,
    question_index: usize,
    score: u32,
    hints_used: usize,
    answers: Vec<AnswerRecord>,
    answer_finalized: bool,
    state: SessionState,
    started_at: DateTime<Utc>,
    started: Instant,
    finished_after: Option<Duration>,
    results: Option<QuizResults>,
}

impl QuizSession {
    pub fn start(bank: &QuestionBank, level: Level) -> Self {
        let questions = bank.get_questions(level).to_vec();
        let session = Self {
            id: Uuid::new_v4(),
            level,
            questions,
            question_index: 0,
            score: 0,
            hints_used: 0,
            answers: Vec::new(),
            answer_finalized: false,
            state: SessionState::InProgress,
            started_at: Utc::now(),
            started: Instant::now(),
            finished_after: None,
            results: None,
        };
        tracing::info!(session_id=%session.id, level=%level, questions=session.questions.len(), "quiz started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn hints_used(&self) -> usize {
        self.hints_used
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn answer_finalized(&self) -> bool {
        self.answer_finalized
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn started_instant(&self) -> Instant {
        self.started
    }

    pub fn results(&self) -> Option<&QuizResults> {
        self.results.as_ref()
    }

    /// Frozen once the session is finalized.
    pub fn elapsed(&self) -> Duration {
        self.finished_after
            .unwrap_or_else(|| self.started.elapsed())
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            SessionState::InProgress => self.questions.get(self.question_index),
            SessionState::Finalized => None,
        }
    }

    pub fn current_view(&self) -> Option<QuestionView> {
        self.current_question()
            .map(|q| QuestionView::new(q, self.question_index, self.questions.len()))
    }

    fn ensure_in_progress(&self) -> Result<&Question, QuizError> {
        self.current_question().ok_or(QuizError::SessionFinished)
    }

    pub fn submit(&mut self, raw: Option<&AnswerValue>) -> Result<SubmitOutcome, QuizError> {
        let question = self.ensure_in_progress()?;
        if self.answer_finalized {
            return Err(QuizError::AlreadyAnswered);
        }
        let graded = grading::grade(question, raw)?;
        let outcome = SubmitOutcome {
            correct: graded.correct,
            explanation: question.explanation.clone(),
            correct_answer: graded.correct_answer,
        };

        if graded.correct {
            self.score += 1;
        }
        self.answers.push(AnswerRecord {
            answer: Some(graded.answer),
            correct: graded.correct,
        });
        self.answer_finalized = true;
        tracing::debug!(session_id=%self.id, index=self.question_index, correct=graded.correct, score=self.score, "answer submitted");
        Ok(outcome)
    }

    pub fn hint(&mut self) -> Result<Hint, QuizError> {
        let question = self.ensure_in_progress()?;
        let available = question.hints.len().min(MAX_HINTS);
        if self.hints_used >= available {
            return Err(QuizError::HintsExhausted);
        }
        let text = question.hints[self.hints_used].clone();
        self.hints_used += 1;
        Ok(Hint {
            number: self.hints_used,
            remaining: available - self.hints_used,
            text,
        })
    }

    /// Scores the current question as wrong with no answer, then moves on.
    pub fn skip(&mut self, progress: &mut Progress) -> Result<Advance, QuizError> {
        self.ensure_in_progress()?;
        if self.answer_finalized {
            return Err(QuizError::AlreadyAnswered);
        }
        self.answers.push(AnswerRecord {
            answer: None,
            correct: false,
        });
        self.answer_finalized = true;
        tracing::debug!(session_id=%self.id, index=self.question_index, "question skipped");
        self.advance(progress)
    }

    /// Past the last question this finalizes and records the score in `progress`.
    pub fn advance(&mut self, progress: &mut Progress) -> Result<Advance, QuizError> {
        self.ensure_in_progress()?;
        if !self.answer_finalized {
            return Err(QuizError::QuestionNotAnswered);
        }
        if self.question_index + 1 < self.questions.len() {
            self.question_index += 1;
            self.hints_used = 0;
            self.answer_finalized = false;
            Ok(Advance::Next(self.question_index))
        } else {
            self.finalize(progress).map(Advance::Finished)
        }
    }

    /// Closes the run once the last question is answered or skipped, and
    /// records the score in `progress`.
    pub fn finalize(&mut self, progress: &mut Progress) -> Result<QuizResults, QuizError> {
        self.ensure_in_progress()?;
        if !self.answer_finalized {
            return Err(QuizError::QuestionNotAnswered);
        }
        let remaining = self.questions.len() - self.question_index - 1;
        if remaining > 0 {
            return Err(QuizError::QuestionsRemaining(remaining));
        }

        let elapsed = self.started.elapsed();
        let total = self.questions.len();
        let pct = percentage(self.score, total);
        let passed = pct >= PASS_PERCENTAGE;

        progress.record(self.level, self.score);

        let results = QuizResults {
            session_id: self.id,
            level: self.level,
            score: self.score,
            total_questions: total,
            percentage: pct,
            passed,
            next_level_available: passed && self.level.next().is_some(),
            elapsed_secs: elapsed.as_secs(),
            finished_at: Utc::now(),
        };
        self.state = SessionState::Finalized;
        self.finished_after = Some(elapsed);
        self.results = Some(results.clone());
        tracing::info!(session_id=%self.id, level=%self.level, score=self.score, percentage=pct, passed, "quiz finished");
        Ok(results)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            level: self.level,
            state: self.state,
            question: self.current_view(),
            score: self.score,
            hints_used: self.hints_used,
            answered: self.answer_finalized,
            answers: self.answers.clone(),
            started_at: self.started_at,
            elapsed_secs: self.elapsed().as_secs(),
            results: self.results.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub level: Level,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    pub score: u32,
    pub hints_used: usize,
    pub answered: bool,
    pub answers: Vec<AnswerRecord>,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<QuizResults>,
}
