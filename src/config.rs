use std::{env, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use secrecy::SecretString;

use crate::session::CookiePolicy;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub ttl: Duration,
    pub remember_ttl: Duration,
    pub cookies: CookiePolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(86_400),
            remember_ttl: Duration::from_secs(365 * 86_400),
            cookies: CookiePolicy::default(),
        }
    }
}

pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub redis_url: Option<String>,
    pub app_address: String,
    pub gemini: GeminiConfig,
    pub session: SessionSettings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let app_host = var("APP_HOST", "127.0.0.1");
        let app_port: u16 = parse(&lookup, "APP_PORT", 5000)?;

        let gemini = GeminiConfig {
            api_key: SecretString::from(var("GOOGLE_API_KEY", "")),
            model: var("GEMINI_MODEL", "gemini-1.0-pro"),
            base_url: var("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(parse(&lookup, "GEMINI_TIMEOUT_SECS", 60)?),
        };

        let defaults = SessionSettings::default();
        let session = SessionSettings {
            ttl: Duration::from_secs(parse(&lookup, "SESSION_TTL_SECS", defaults.ttl.as_secs())?),
            remember_ttl: Duration::from_secs(parse(
                &lookup,
                "REMEMBER_TTL_SECS",
                defaults.remember_ttl.as_secs(),
            )?),
            cookies: CookiePolicy {
                secure: parse_flag(&lookup, "COOKIE_SECURE")?,
            },
        };

        Ok(Self {
            database_url: var("DATABASE_URL", "sqlite://healthbot.db?mode=rwc"),
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
            app_address: format!("{}:{}", app_host, app_port),
            gemini,
            session,
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        None => Ok(default),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<bool> {
    match lookup(name).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(other) => Err(anyhow!("invalid value for {name}: {other:?}")),
    }
}
