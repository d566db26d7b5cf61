use axum::{
    extract::{Form, State},
    http::{
        header::{HeaderName, SET_COOKIE},
        HeaderMap,
    },
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};

use crate::{
    auth::{self, CurrentUser, Outcome},
    error::AppError,
    requests::{ChatForm, LoginForm, SignUpForm},
    responses::{Category, Flash, FLASH_COOKIE},
    session::{read_cookie, SESSION_COOKIE},
    state::AppState,
};

pub const ACCOUNT_CREATED: &str = "Account created successfully. You can now log in.";
pub const LOGGED_OUT: &str = "You've been logged out. Come back anytime.";

type Cookies = Vec<(HeaderName, String)>;

fn take_flash(state: &AppState, headers: &HeaderMap) -> (Vec<Flash>, Cookies) {
    match read_cookie(headers, FLASH_COOKIE) {
        Some(value) => (
            Flash::decode(&value).into_iter().collect(),
            vec![(SET_COOKIE, state.settings.cookies.expire(FLASH_COOKIE))],
        ),
        None => (Vec::new(), Vec::new()),
    }
}

fn flash_cookie(state: &AppState, flash: &Flash) -> (HeaderName, String) {
    (SET_COOKIE, state.settings.cookies.build(FLASH_COOKIE, &flash.encode(), None))
}

pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let (flashes, cookies) = take_flash(&state, &headers);
    let page = state.pages.login(&flashes)?;
    Ok((AppendHeaders(cookies), page).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let settings = state.settings;
    let outcome = auth::login(
        &state.pool,
        state.sessions.as_ref(),
        &form,
        settings.ttl,
        settings.remember_ttl,
    )
    .await?;

    match outcome {
        Outcome::Accepted(session) => {
            let max_age = session.remember.then_some(settings.remember_ttl);
            let cookie = settings.cookies.build(SESSION_COOKIE, &session.token, max_age);
            Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to("/")).into_response())
        }
        Outcome::Rejected(notice) => Ok(state.pages.login(&[Flash::error(notice)])?.into_response()),
    }
}

pub async fn sign_up_page(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let (flashes, cookies) = take_flash(&state, &headers);
    let page = state.pages.sign_up(&flashes)?;
    Ok((AppendHeaders(cookies), page).into_response())
}

pub async fn sign_up(
    State(state): State<AppState>,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    match auth::register(&state.pool, &form).await? {
        Outcome::Accepted(_) => {
            let flash = Flash::new(Category::Success, ACCOUNT_CREATED);
            Ok((AppendHeaders([flash_cookie(&state, &flash)]), Redirect::to("/login")).into_response())
        }
        Outcome::Rejected(notice) => Ok(state.pages.sign_up(&[Flash::error(notice)])?.into_response()),
    }
}

pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> Result<Response, AppError> {
    auth::logout(state.sessions.as_ref(), &current).await?;

    let flash = Flash::new(Category::Info, LOGGED_OUT);
    let cookies = [
        (SET_COOKIE, state.settings.cookies.expire(SESSION_COOKIE)),
        flash_cookie(&state, &flash),
    ];
    Ok((AppendHeaders(cookies), Redirect::to("/login")).into_response())
}

pub async fn home(State(state): State<AppState>, current: CurrentUser) -> Result<Response, AppError> {
    let history = state.relay.show_history(&current).await?;
    Ok(state.pages.chat(&current.user, &history)?.into_response())
}

pub async fn chat_reply(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<ChatForm>,
) -> Result<String, AppError> {
    Ok(state.relay.submit_message(&current, &form.msg).await?)
}
