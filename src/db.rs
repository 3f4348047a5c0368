use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, FromRow, Pool, Postgres};

use crate::models::{Level, LevelProgress, Progress};

pub type Db = Pool<Postgres>;

pub async fn connect(url: &str) -> Result<Db> {
    let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
    // crate-relative path for sqlx migrations
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[derive(FromRow, Debug)]
struct ProgressRow {
    level: String,
    score: i32,
    completed: bool,
}

/// `None` when a row cannot be mapped back onto a level or a valid score.
pub async fn load_progress(db: &Db) -> Result<Option<Progress>, sqlx::Error> {
    let rows: Vec<ProgressRow> =
        sqlx::query_as("SELECT level, score, completed FROM progress")
            .fetch_all(db)
            .await?;

    let mut progress = Progress::default();
    for row in rows {
        let Ok(level) = row.level.parse::<Level>() else {
            return Ok(None);
        };
        let Ok(score) = u32::try_from(row.score) else {
            return Ok(None);
        };
        progress.set(
            level,
            LevelProgress {
                score,
                completed: row.completed,
            },
        );
    }
    Ok(Some(progress))
}

/// Replaces every level row in one transaction.
pub async fn save_progress(db: &Db, progress: &Progress) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;
    for level in Level::ALL {
        let lp = progress.get(level);
        sqlx::query(
            r#"
            INSERT INTO progress (level, score, completed)
            VALUES ($1,$2,$3)
            ON CONFLICT (level)
            DO UPDATE SET score=EXCLUDED.score, completed=EXCLUDED.completed, updated_at=now()
            "#,
        )
        .bind(level.as_str())
        .bind(lp.score as i32)
        .bind(lp.completed)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

pub async fn reset_progress(db: &Db) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM progress").execute(db).await?;
    Ok(())
}
