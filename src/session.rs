use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use axum::http::{header::COOKIE, HeaderMap};
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, key: &str, user_id: i64, ttl: Duration) -> Result<(), SessionError>;

    async fn get(&self, key: &str) -> Result<Option<i64>, SessionError>;

    async fn remove(&self, key: &str) -> Result<(), SessionError>;
}

pub struct RedisSessionStore {
    client: Arc<redis::Client>,
}

impl RedisSessionStore {
    pub fn open(url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)?;
        Ok(Self { client: Arc::new(client) })
    }

    fn redis_key(key: &str) -> String {
        format!("session:{}", key)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn insert(&self, key: &str, user_id: i64, ttl: Duration) -> Result<(), SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(Self::redis_key(key), user_id.to_string(), ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let user_id: Option<String> = conn.get(Self::redis_key(key)).await?;
        Ok(user_id.and_then(|id| id.parse::<i64>().ok()))
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(Self::redis_key(key)).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, (i64, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, key: &str, user_id: i64, ttl: Duration) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (_, expires_at)| *expires_at > now);
        sessions.insert(key.to_string(), (user_id, now + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(user_id, _)| *user_id))
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(key);
        Ok(())
    }
}

pub fn issue_token() -> (String, String) {
    let token = Uuid::new_v4().to_string();
    let key = digest(&token);
    (token, key)
}

/// Store key for a browser token, or `None` if the token is not well-formed.
pub fn session_key(token: &str) -> Option<String> {
    if Uuid::parse_str(token).is_err() {
        return None;
    }
    Some(digest(token))
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    /// `Set-Cookie` value. `max_age: None` makes a browser-session cookie.
    pub fn build(&self, name: &str, value: &str, max_age: Option<Duration>) -> String {
        let mut parts = vec![
            format!("{}={}", name, value),
            "Path=/".to_string(),
            "HttpOnly".to_string(),
            "SameSite=Lax".to_string(),
        ];
        if let Some(max_age) = max_age {
            parts.push(format!("Max-Age={}", max_age.as_secs()));
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.join("; ")
    }

    pub fn expire(&self, name: &str) -> String {
        self.build(name, "", Some(Duration::ZERO))
    }
}
