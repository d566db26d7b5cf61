#![allow(dead_code)]

use std::{sync::Arc, sync::Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Method, Request, Response, StatusCode,
    },
    Router,
};
use healthbot::{
    config::SessionSettings,
    db,
    error::ApiError,
    gemini::{BotReply, CompletionClient},
    relay::ChatRelay,
    routes,
    session::MemorySessionStore,
    state::AppState,
};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

/// Completion client that answers every prompt the same way, or always fails.
pub struct Scripted {
    reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionClient for Scripted {
    async fn complete(&self, prompt: &str) -> Result<BotReply, ApiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(reply) => Ok(BotReply(reply.clone())),
            None => Err(ApiError::Status { status: 500, body: "boom".to_string() }),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub client: Arc<Scripted>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn replying(reply: &str) -> Self {
        Self::build(Some(reply.to_string())).await
    }

    pub async fn failing() -> Self {
        Self::build(None).await
    }

    async fn build(reply: Option<String>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("app.db").display());
        let pool = db::connect(&url, 2).await.unwrap();

        let client = Arc::new(Scripted { reply, prompts: Mutex::new(Vec::new()) });
        let relay = ChatRelay::new(pool.clone(), client.clone());
        let state = AppState::new(
            pool.clone(),
            Arc::new(MemorySessionStore::new()),
            relay,
            SessionSettings::default(),
        )
        .unwrap();

        Self { router: routes::create_router(state), pool, client, _dir: dir }
    }

    pub async fn send(&self, method: Method, uri: &str, form: Option<&str>, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if form.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        }
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let request = builder.body(Body::from(form.unwrap_or_default().to_string())).unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(Method::GET, uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(Method::POST, uri, Some(form), cookie).await
    }

    /// Signs up and logs in, returning the `Cookie` header value for the session.
    pub async fn signed_in(&self, email: &str, first_name: &str, password: &str) -> String {
        let form = format!(
            "email={email}&firstName={first_name}&password1={password}&password2={password}"
        );
        let response = self.post("/sign-up", &form, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = self.post("/login", &format!("email={email}&password={password}"), None).await;
        assert_eq!(location(&response), Some("/"));
        cookie_pair(&response, "session").expect("session cookie")
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(sql).fetch_one(&self.pool).await.unwrap();
        n
    }
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response.headers().get(LOCATION).and_then(|v| v.to_str().ok())
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Full `Set-Cookie` value for `name`.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{name}=")))
}

/// `name=value` pair ready to send back in a `Cookie` header.
pub fn cookie_pair(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookie(response, name).map(|c| c.split(';').next().unwrap_or_default().to_string())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
