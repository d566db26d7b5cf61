use axum::response::Html;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::User, relay::HistoryEntry};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: Category,
    pub message: String,
}

impl Flash {
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Self { category, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Category::Error, message)
    }

    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(value: &str) -> Option<Self> {
        let json = URL_SAFE_NO_PAD.decode(value).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

#[derive(Debug, Serialize)]
struct UserView<'a> {
    email: &'a str,
    first_name: &'a str,
}

impl<'a> From<&'a User> for UserView<'a> {
    fn from(user: &'a User) -> Self {
        UserView { email: &user.email, first_name: &user.first_name }
    }
}

pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../templates/base.html"))?;
        env.add_template("login.html", include_str!("../templates/login.html"))?;
        env.add_template("sign_up.html", include_str!("../templates/sign_up.html"))?;
        env.add_template("index.html", include_str!("../templates/index.html"))?;
        Ok(Self { env })
    }

    pub fn login(&self, flashes: &[Flash]) -> Result<Html<String>, AppError> {
        let html = self
            .env
            .get_template("login.html")?
            .render(context! { flashes => flashes })?;
        Ok(Html(html))
    }

    pub fn sign_up(&self, flashes: &[Flash]) -> Result<Html<String>, AppError> {
        let html = self
            .env
            .get_template("sign_up.html")?
            .render(context! { flashes => flashes })?;
        Ok(Html(html))
    }

    pub fn chat(&self, user: &User, history: &[HistoryEntry]) -> Result<Html<String>, AppError> {
        let html = self.env.get_template("index.html")?.render(context! {
            user => UserView::from(user),
            history => history,
            flashes => Vec::<Flash>::new(),
        })?;
        Ok(Html(html))
    }
}
