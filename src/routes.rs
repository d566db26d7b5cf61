use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/get", post(handlers::chat_reply))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/sign-up", get(handlers::sign_up_page).post(handlers::sign_up))
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
