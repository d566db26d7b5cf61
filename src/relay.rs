use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    auth::CurrentUser,
    gemini::{BotReply, CompletionClient},
    models::{ChatMessage, Sender},
    store,
};

pub const SYSTEM_PROMPT: &str = "\
You are a friendly AI assistant for a student project about Artificial Intelligence in Healthcare.

Rules:
- Explain things in clear, simple, conversational language.
- You can talk about AI in medicine, diagnostics, hospitals, healthcare systems, etc.
- YOU ARE NOT A DOCTOR.
- Do NOT give diagnoses, treatment plans, or prescriptions.
- For any serious or personal medical concern, always tell the user to consult a qualified doctor.
- Keep replies concise but helpful.";

pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having some trouble responding right now. Please try again in a bit.";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub text: String,
    pub time: String,
}

impl From<ChatMessage> for HistoryEntry {
    fn from(message: ChatMessage) -> Self {
        HistoryEntry {
            sender: message.sender,
            time: time_of_day(message.created_at),
            text: message.text,
        }
    }
}

pub struct ChatRelay {
    pool: SqlitePool,
    client: Arc<dyn CompletionClient>,
    system_prompt: String,
}

impl ChatRelay {
    pub fn new(pool: SqlitePool, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            pool,
            client,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub async fn show_history(&self, user: &CurrentUser) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let messages = store::messages_for_user(&self.pool, user.user.id).await?;
        Ok(messages.into_iter().map(HistoryEntry::from).collect())
    }

    /// Runs one chat turn and returns the bot's text. Blank input is a no-op that returns
    /// an empty string. Completion failures never surface: the fallback reply is stored
    /// and returned in their place.
    pub async fn submit_message(&self, user: &CurrentUser, text: &str) -> Result<String, sqlx::Error> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }

        let now = Utc::now();
        let user_id = user.user.id;

        store::insert_message(&self.pool, user_id, Sender::User, text, now).await?;

        let reply = match self.client.complete(&self.prompt_for(text)).await {
            Ok(BotReply(reply)) => reply.trim().to_string(),
            Err(e) => {
                let cause = e.chain();
                tracing::error!(user_id, error = %cause, "completion request failed");
                FALLBACK_REPLY.to_string()
            }
        };

        store::insert_message(&self.pool, user_id, Sender::Bot, &reply, now).await?;

        Ok(reply)
    }

    fn prompt_for(&self, text: &str) -> String {
        format!("{}\n\nUser: {}\nAssistant:", self.system_prompt, text)
    }
}

/// `03:07 PM` style local time, or empty when the message has no timestamp.
pub fn time_of_day(created_at: Option<DateTime<Utc>>) -> String {
    created_at
        .map(|ts| ts.with_timezone(&Local).format("%I:%M %p").to_string())
        .unwrap_or_default()
}
