use std::time::Duration;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use rand::RngCore;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::User,
    requests::{LoginForm, SignUpForm},
    session::{self, SessionStore, SESSION_COOKIE},
    state::AppState,
    store,
};

pub const EMAIL_TAKEN: &str = "An account with that email already exists.";
pub const EMAIL_TOO_SHORT: &str = "Email must be at least 4 characters.";
pub const FIRST_NAME_TOO_SHORT: &str = "First name must be at least 2 characters.";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match.";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters.";
pub const UNKNOWN_EMAIL: &str = "No account found with that email.";
pub const WRONG_PASSWORD: &str = "Incorrect password. Please try again.";

#[derive(Debug)]
pub enum Outcome<T> {
    Accepted(T),
    Rejected(&'static str),
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AppError::PasswordHash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Errors only when `hash` is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AppError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// Argon2 is CPU-bound; keep it off the async workers.
async fn off_runtime<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

pub fn validate_sign_up(email_taken: bool, form: &SignUpForm) -> Option<&'static str> {
    if email_taken {
        Some(EMAIL_TAKEN)
    } else if form.email.trim().chars().count() < 4 {
        Some(EMAIL_TOO_SHORT)
    } else if form.first_name.trim().chars().count() < 2 {
        Some(FIRST_NAME_TOO_SHORT)
    } else if form.password1 != form.password2 {
        Some(PASSWORDS_DIFFER)
    } else if form.password1.chars().count() < 6 {
        Some(PASSWORD_TOO_SHORT)
    } else {
        None
    }
}

pub async fn register(pool: &SqlitePool, form: &SignUpForm) -> Result<Outcome<i64>, AppError> {
    let email = form.email.trim();
    let first_name = form.first_name.trim();

    let existing = store::find_user_by_email(pool, email).await?;
    if let Some(notice) = validate_sign_up(existing.is_some(), form) {
        return Ok(Outcome::Rejected(notice));
    }

    let password = form.password1.clone();
    let password_hash = off_runtime(move || hash_password(&password)).await?;

    match store::insert_user(pool, email, first_name, &password_hash).await {
        Ok(user_id) => {
            tracing::info!(user_id, email, "user registered");
            Ok(Outcome::Accepted(user_id))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Ok(Outcome::Rejected(EMAIL_TAKEN))
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug)]
pub struct LoginSession {
    pub user: User,
    pub token: String,
    pub remember: bool,
}

pub async fn login(
    pool: &SqlitePool,
    sessions: &dyn SessionStore,
    form: &LoginForm,
    ttl: Duration,
    remember_ttl: Duration,
) -> Result<Outcome<LoginSession>, AppError> {
    let email = form.email.trim();

    let Some(user) = store::find_user_by_email(pool, email).await? else {
        tracing::info!(email, "login rejected: unknown email");
        return Ok(Outcome::Rejected(UNKNOWN_EMAIL));
    };

    let (password, stored) = (form.password.clone(), user.password_hash.clone());
    if !off_runtime(move || verify_password(&password, &stored)).await? {
        tracing::info!(email, "login rejected: wrong password");
        return Ok(Outcome::Rejected(WRONG_PASSWORD));
    }

    let remember = form.remember();
    let (token, key) = session::issue_token();
    sessions
        .insert(&key, user.id, if remember { remember_ttl } else { ttl })
        .await?;

    tracing::info!(user_id = user.id, remember, "user logged in");
    Ok(Outcome::Accepted(LoginSession { user, token, remember }))
}

pub async fn logout(sessions: &dyn SessionStore, current: &CurrentUser) -> Result<(), AppError> {
    sessions.remove(&current.session_key).await?;
    tracing::info!(user_id = current.user.id, "user logged out");
    Ok(())
}

/// The logged-in user behind the request's session cookie. Extracting it is the
/// guard for every protected route.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_key: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = session::read_cookie(&parts.headers, SESSION_COOKIE).ok_or(AppError::Unauthenticated)?;
        let session_key = session::session_key(&token).ok_or(AppError::Unauthenticated)?;

        let app_state = AppState::from_ref(state);

        let user_id = app_state
            .sessions
            .get(&session_key)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        let user = store::find_user_by_id(&app_state.pool, user_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(CurrentUser { user, session_key })
    }
}
