//! Legacy SQL review store.
//!
//! The realtime service owns the live review collection; these rows are kept
//! only so older clients of the HTTP API keep working.

use crate::database_ops::db::Db;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated review ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub game_id: String,
    pub user_name: Option<String>,
    pub rating: i64,
    pub comment: Option<String>,
}

/// Row as stored; `created_at` is SQLite's `CURRENT_TIMESTAMP` text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: i64,
    pub game_id: String,
    pub user_name: Option<String>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub created_at: Option<String>,
}

/// Echo of a freshly inserted review. The timestamp is generated here rather
/// than read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedReview {
    pub id: i64,
    pub game_id: String,
    pub user_name: Option<String>,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_review(db: &Db, review: NewReview) -> Result<CreatedReview> {
    let id = sqlx::query(
        "INSERT INTO reviews (game_id, user_name, rating, comment) VALUES (?, ?, ?, ?)",
    )
    .bind(&review.game_id)
    .bind(&review.user_name)
    .bind(review.rating)
    .bind(&review.comment)
    .execute(&db.pool)
    .await?
    .last_insert_rowid();

    Ok(CreatedReview {
        id,
        game_id: review.game_id,
        user_name: review.user_name,
        rating: review.rating,
        comment: review.comment,
        created_at: Utc::now(),
    })
}

/// All reviews for a game, newest first.
pub async fn reviews_for_game(db: &Db, game_id: &str) -> Result<Vec<ReviewRow>> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, game_id, user_name, rating, comment, CAST(created_at AS TEXT) AS created_at \
         FROM reviews WHERE game_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(game_id)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}
