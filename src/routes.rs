use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    bank::QuestionBank,
    certificate::{CertificateClient, CertificateError, CertificateRequest, IssuedCertificate},
    error::QuizError,
    models::*,
    progress::{ProgressStore, StoreError},
    session::{Advance, QuizSession, SessionSnapshot},
    timer::{ElapsedTicker, DEFAULT_TICK},
};

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// The one quiz a learner can have open, plus the clock running for it.
#[derive(Default)]
struct ActiveQuiz {
    session: Option<QuizSession>,
    ticker: Option<ElapsedTicker>,
    /// Results of a finished quiz whose progress write failed; retried on the next skip/next.
    unsaved: Option<QuizResults>,
}

impl ActiveQuiz {
    fn session_mut(&mut self) -> Result<&mut QuizSession, QuizError> {
        self.session.as_mut().ok_or(QuizError::NoActiveSession)
    }

    fn stop_clock(&mut self) {
        if let Some(t) = self.ticker.take() {
            t.stop();
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    bank: Arc<QuestionBank>,
    store: Arc<ProgressStore>,
    certificates: Option<CertificateClient>,
    quiz: Arc<Mutex<ActiveQuiz>>,
}

impl AppState {
    pub fn new(
        bank: QuestionBank,
        store: ProgressStore,
        certificates: Option<CertificateClient>,
    ) -> Self {
        Self {
            bank: Arc::new(bank),
            store: Arc::new(store),
            certificates,
            quiz: Arc::new(Mutex::new(ActiveQuiz::default())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // progress + unlocks
        .route("/api/levels", get(list_levels))
        .route("/api/progress", get(get_progress))
        .route("/api/progress/reset", post(reset_progress))
        // quiz session
        .route("/api/quiz", get(quiz_state).delete(abandon_quiz))
        .route("/api/quiz/start", post(start_quiz))
        .route("/api/quiz/answer", post(submit_answer))
        .route("/api/quiz/hint", post(next_hint))
        .route("/api/quiz/skip", post(skip_question))
        .route("/api/quiz/next", post(next_question))
        // certificate
        .route("/api/certificate", post(request_certificate))
        .with_state(state)
}

#[derive(Serialize)]
struct AnswerResp {
    #[serde(flatten)]
    outcome: SubmitOutcome,
    score: u32,
}

#[derive(Serialize)]
struct AdvanceResp {
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<QuizResults>,
    progress: Option<Progress>,
}

async fn list_levels(State(st): State<AppState>) -> ApiResult<Vec<LevelStatus>> {
    let progress = st.store.load().await.map_err(e500)?;
    let levels = Level::ALL
        .iter()
        .map(|&level| {
            let lp = progress.get(level);
            LevelStatus {
                level,
                score: lp.score,
                completed: lp.completed,
                unlocked: progress.is_unlocked(level),
            }
        })
        .collect();
    Ok(Json(levels))
}

async fn get_progress(State(st): State<AppState>) -> ApiResult<Progress> {
    Ok(Json(st.store.load().await.map_err(e500)?))
}

async fn reset_progress(State(st): State<AppState>) -> ApiResult<serde_json::Value> {
    st.store.reset().await.map_err(e500)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn start_quiz(
    State(st): State<AppState>,
    Json(req): Json<StartQuizReq>,
) -> ApiResult<SessionSnapshot> {
    let progress = st.store.load().await.map_err(e500)?;
    if !progress.is_unlocked(req.level) {
        return Err(reject(QuizError::LevelLocked(req.level)));
    }

    let session = QuizSession::start(&st.bank, req.level);
    let started = tokio::time::Instant::from_std(session.started_instant());
    let session_id = session.id();
    let ticker = ElapsedTicker::spawn(started, DEFAULT_TICK, move |elapsed| {
        tracing::trace!(%session_id, elapsed_secs = elapsed.as_secs(), "tick");
    });

    let mut quiz = st.quiz.lock().await;
    quiz.stop_clock();
    if let Some(r) = quiz.unsaved.take() {
        tracing::warn!(session_id=%r.session_id, level=%r.level, score=r.score, "unsaved results dropped by a new quiz");
    }
    let snapshot = session.snapshot();
    quiz.session = Some(session);
    quiz.ticker = Some(ticker);
    Ok(Json(snapshot))
}

async fn quiz_state(State(st): State<AppState>) -> ApiResult<SessionSnapshot> {
    let mut quiz = st.quiz.lock().await;
    let ticked = quiz.ticker.as_ref().map(|t| t.elapsed().as_secs());
    let mut snapshot = quiz.session_mut().map_err(reject)?.snapshot();
    if let Some(secs) = ticked {
        snapshot.elapsed_secs = secs;
    }
    Ok(Json(snapshot))
}

async fn abandon_quiz(State(st): State<AppState>) -> ApiResult<serde_json::Value> {
    let mut quiz = st.quiz.lock().await;
    quiz.stop_clock();
    quiz.unsaved = None;
    if let Some(s) = quiz.session.take() {
        tracing::info!(session_id=%s.id(), level=%s.level(), "quiz abandoned");
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn submit_answer(
    State(st): State<AppState>,
    Json(req): Json<SubmitAnswerReq>,
) -> ApiResult<AnswerResp> {
    let mut quiz = st.quiz.lock().await;
    let session = quiz.session_mut().map_err(reject)?;
    let outcome = session.submit(req.answer.as_ref()).map_err(reject)?;
    Ok(Json(AnswerResp {
        outcome,
        score: session.score(),
    }))
}

async fn next_hint(State(st): State<AppState>) -> ApiResult<Hint> {
    let mut quiz = st.quiz.lock().await;
    let hint = quiz.session_mut().map_err(reject)?.hint().map_err(reject)?;
    Ok(Json(hint))
}

async fn skip_question(State(st): State<AppState>) -> ApiResult<AdvanceResp> {
    advance_with(&st, |session, progress| session.skip(progress)).await
}

async fn next_question(State(st): State<AppState>) -> ApiResult<AdvanceResp> {
    advance_with(&st, |session, progress| session.advance(progress)).await
}

/// Runs a cursor move; a finished quiz gets its progress written before replying.
/// If that write fails the results are held and the write is retried by the
/// next skip/next call instead of moving the cursor.
async fn advance_with<F>(st: &AppState, step: F) -> ApiResult<AdvanceResp>
where
    F: FnOnce(&mut QuizSession, &mut Progress) -> Result<Advance, QuizError>,
{
    let mut quiz = st.quiz.lock().await;
    let mut progress = st.store.load().await.map_err(e500)?;

    if let Some(results) = quiz.unsaved.clone() {
        progress.record(results.level, results.score);
        st.store.save(&progress).await.map_err(e500)?;
        quiz.unsaved = None;
        tracing::info!(session_id=%results.session_id, level=%results.level, "held results saved");
        return Ok(Json(AdvanceResp {
            question: None,
            results: Some(results),
            progress: Some(progress),
        }));
    }

    let session = quiz.session_mut().map_err(reject)?;
    match step(session, &mut progress).map_err(reject)? {
        Advance::Next(_) => Ok(Json(AdvanceResp {
            question: session.current_view(),
            results: None,
            progress: None,
        })),
        Advance::Finished(results) => {
            quiz.stop_clock();
            if let Err(e) = st.store.save(&progress).await {
                quiz.unsaved = Some(results);
                return Err(e500(e));
            }
            Ok(Json(AdvanceResp {
                question: None,
                results: Some(results),
                progress: Some(progress),
            }))
        }
    }
}

async fn request_certificate(
    State(st): State<AppState>,
    Json(req): Json<CertificateReq>,
) -> ApiResult<IssuedCertificate> {
    let client = st
        .certificates
        .as_ref()
        .ok_or((StatusCode::SERVICE_UNAVAILABLE, "certificate service not configured".to_string()))?;
    let progress = st.store.load().await.map_err(e500)?;

    let total_time = {
        let quiz = st.quiz.lock().await;
        quiz.session
            .as_ref()
            .and_then(|s| s.results())
            .filter(|r| r.level == Level::Advanced)
            .map(|r| r.elapsed_secs)
            .unwrap_or(0)
    };

    let cert_req = CertificateRequest::from_progress(&req.student_name, &progress, total_time)
        .map_err(cert_err)?;
    let issued = client.issue(&cert_req).await.map_err(cert_err)?;
    Ok(Json(issued))
}

// --- helpers ---
fn reject(e: QuizError) -> (StatusCode, String) {
    tracing::debug!(error=%e, "quiz request rejected");
    (e.status(), e.to_string())
}

fn cert_err(e: CertificateError) -> (StatusCode, String) {
    let status = match e {
        CertificateError::InvalidName => StatusCode::UNPROCESSABLE_ENTITY,
        CertificateError::NotEarned => StatusCode::FORBIDDEN,
        CertificateError::Http(_) | CertificateError::Rejected(_) => {
            tracing::error!(error=%e, "certificate request failed");
            StatusCode::BAD_GATEWAY
        }
    };
    (status, e.to_string())
}

fn e500(e: StoreError) -> (StatusCode, String) {
    tracing::error!(error=%e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
