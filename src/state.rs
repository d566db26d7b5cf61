use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{config::SessionSettings, relay::ChatRelay, responses::Pages, session::SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub sessions: Arc<dyn SessionStore>,
    pub relay: Arc<ChatRelay>,
    pub pages: Arc<Pages>,
    pub settings: SessionSettings,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        sessions: Arc<dyn SessionStore>,
        relay: ChatRelay,
        settings: SessionSettings,
    ) -> Result<Self, minijinja::Error> {
        Ok(Self {
            pool,
            sessions,
            relay: Arc::new(relay),
            pages: Arc::new(Pages::new()?),
            settings,
        })
    }
}
