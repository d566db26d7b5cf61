use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{ChatMessage, Sender, User};

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_user(
    pool: &SqlitePool,
    email: &str,
    first_name: &str,
    password_hash: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO users (email, first_name, password_hash) VALUES (?, ?, ?)")
        .bind(email)
        .bind(first_name)
        .bind(password_hash)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn insert_message(
    pool: &SqlitePool,
    user_id: i64,
    sender: Sender,
    text: &str,
    created_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO chat_messages (user_id, sender, text, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(sender)
    .bind(text)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All messages owned by `user_id`, oldest first. Ties on `created_at` keep insertion order.
pub async fn messages_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(
        "SELECT * FROM chat_messages WHERE user_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
