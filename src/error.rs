use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("session store error: {0}")]
    Session(#[from] SessionError),

    #[error("password hash error: {0}")]
    PasswordHash(String),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("not logged in")]
    Unauthenticated,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated => Redirect::to("/login").into_response(),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("completion request failed")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode completion response")]
    Decode(#[source] reqwest::Error),
}

impl ApiError {
    /// The message followed by every underlying cause, `: `-separated.
    pub fn chain(self) -> String {
        format!("{:#}", anyhow::Error::from(self))
    }
}
