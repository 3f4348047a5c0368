use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Level, Progress};

#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("please enter your full name")]
    InvalidName,
    #[error("the advanced level has not been passed yet")]
    NotEarned,
    #[error("certificate service unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("certificate service refused: {0}")]
    Rejected(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    pub student_name: String,
    pub beginner_score: u32,
    pub intermediate_score: u32,
    pub advanced_score: u32,
    pub total_time: u64,
}

impl CertificateRequest {
    pub fn from_progress(
        student_name: &str,
        progress: &Progress,
        total_time: u64,
    ) -> Result<Self, CertificateError> {
        let name = student_name.trim();
        if name.chars().count() < 2 {
            return Err(CertificateError::InvalidName);
        }
        if !progress.is_passed(Level::Advanced) {
            return Err(CertificateError::NotEarned);
        }
        Ok(Self {
            student_name: name.to_string(),
            beginner_score: progress.beginner.score,
            intermediate_score: progress.intermediate.score,
            advanced_score: progress.advanced.score,
            total_time,
        })
    }
}

#[derive(Deserialize, Debug)]
struct IssueResp {
    success: bool,
    #[serde(default)]
    certificate_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub certificate_id: String,
}

/// Talks to the external certificate service. No retries.
#[derive(Debug, Clone)]
pub struct CertificateClient {
    http: reqwest::Client,
    base_url: String,
}

impl CertificateClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn issue(&self, req: &CertificateRequest) -> Result<IssuedCertificate, CertificateError> {
        let url = format!("{}/api/certificate/generate", self.base_url);
        // the service answers 400 with a JSON body, so read it before judging the status
        let resp = self.http.post(&url).json(req).send().await?;
        let status = resp.status();
        let body: IssueResp = resp.json().await?;

        match body {
            IssueResp {
                success: true,
                certificate_id: Some(id),
                ..
            } => {
                tracing::info!(certificate_id=%id, "certificate issued");
                Ok(IssuedCertificate { certificate_id: id })
            }
            IssueResp { error, .. } => {
                let msg = error.unwrap_or_else(|| format!("unexpected response ({status})"));
                tracing::warn!(%status, error=%msg, "certificate refused");
                Err(CertificateError::Rejected(msg))
            }
        }
    }
}
