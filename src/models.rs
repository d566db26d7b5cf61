use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub password_hash: String,
}

#[derive(sqlx::Type, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(FromRow, Debug, Clone)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    pub sender: Sender,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}
