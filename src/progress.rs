use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{db, models::Progress};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("progress file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("progress encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("progress database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Durable progress record. Saves replace the whole record.
#[derive(Debug)]
pub enum ProgressStore {
    Memory(Mutex<Progress>),
    File(PathBuf),
    Postgres(db::Db),
}

impl ProgressStore {
    pub fn memory() -> Self {
        ProgressStore::Memory(Mutex::new(Progress::default()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        ProgressStore::File(path.into())
    }

    pub fn backend(&self) -> &'static str {
        match self {
            ProgressStore::Memory(_) => "memory",
            ProgressStore::File(_) => "file",
            ProgressStore::Postgres(_) => "postgres",
        }
    }

    /// Missing progress is fresh progress. So is a record that fails to decode
    /// or holds impossible scores; that case is logged and then ignored.
    pub async fn load(&self) -> Result<Progress, StoreError> {
        let loaded = match self {
            ProgressStore::Memory(m) => Some(*m.lock().await),
            ProgressStore::File(path) => match tokio::fs::read(path).await {
                Ok(bytes) => match serde_json::from_slice::<Progress>(&bytes) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        tracing::warn!(path=%path.display(), error=%e, "stored progress unreadable, starting fresh");
                        None
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Some(Progress::default()),
                Err(e) => return Err(e.into()),
            },
            ProgressStore::Postgres(pool) => {
                let p = db::load_progress(pool).await?;
                if p.is_none() {
                    tracing::warn!("progress rows unreadable, starting fresh");
                }
                p
            }
        };

        match loaded {
            Some(p) if p.is_valid() => Ok(p),
            Some(p) => {
                tracing::warn!(?p, "stored progress out of range, starting fresh");
                Ok(Progress::default())
            }
            None => Ok(Progress::default()),
        }
    }

    pub async fn save(&self, progress: &Progress) -> Result<(), StoreError> {
        match self {
            ProgressStore::Memory(m) => *m.lock().await = *progress,
            ProgressStore::File(path) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                // write-then-rename; readers never see a partial record
                let tmp = path.with_extension("json.tmp");
                tokio::fs::write(&tmp, serde_json::to_vec_pretty(progress)?).await?;
                tokio::fs::rename(&tmp, path).await?;
            }
            ProgressStore::Postgres(pool) => db::save_progress(pool, progress).await?,
        }
        tracing::debug!(backend = self.backend(), "progress saved");
        Ok(())
    }

    pub async fn reset(&self) -> Result<(), StoreError> {
        match self {
            ProgressStore::Postgres(pool) => db::reset_progress(pool).await?,
            _ => self.save(&Progress::default()).await?,
        }
        tracing::info!(backend = self.backend(), "progress reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Level, LevelProgress};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("edudb-quiz-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn file_round_trip_and_missing_file() {
        let store = ProgressStore::file(temp_path("progress.json"));
        assert_eq!(store.load().await.unwrap(), Progress::default());

        let mut p = Progress::default();
        p.record(Level::Beginner, 13);
        store.save(&p).await.unwrap();
        assert_eq!(
            store.load().await.unwrap().beginner,
            LevelProgress { score: 13, completed: true }
        );
    }

    #[tokio::test]
    async fn malformed_file_starts_fresh() {
        let path = temp_path("progress.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let store = ProgressStore::file(&path);
        assert_eq!(store.load().await.unwrap(), Progress::default());
    }

    #[tokio::test]
    async fn out_of_range_score_starts_fresh() {
        let path = temp_path("progress.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(
            &path,
            br#"{"beginner":{"score":99,"completed":true},
                "intermediate":{"score":0,"completed":false},
                "advanced":{"score":0,"completed":false}}"#,
        )
        .await
        .unwrap();
        let store = ProgressStore::file(&path);
        assert_eq!(store.load().await.unwrap(), Progress::default());
    }

    #[tokio::test]
    async fn reset_clears_memory_store() {
        let store = ProgressStore::memory();
        let mut p = Progress::default();
        p.record(Level::Advanced, 15);
        store.save(&p).await.unwrap();
        store.reset().await.unwrap();
        assert_eq!(store.load().await.unwrap(), Progress::default());
    }
}
