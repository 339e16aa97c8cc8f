use super::client::BotApi;
use super::types::ParseMode;
use crate::pipeline::Responder;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// [`Responder`] that replies into one Telegram chat
#[derive(Debug, Clone)]
pub struct ChatResponder {
    api: Arc<BotApi>,
    chat_id: i64,
}

impl ChatResponder {
    /// Reply into `chat_id` through `api`
    pub fn new(api: Arc<BotApi>, chat_id: i64) -> Self {
        Self { api, chat_id }
    }
}

#[async_trait]
impl Responder for ChatResponder {
    async fn reply_text(&self, text: &str) -> crate::Result<()> {
        self.api.send_message(self.chat_id, text, None).await?;
        Ok(())
    }

    async fn reply_markdown(&self, text: &str) -> crate::Result<()> {
        self.api
            .send_message(self.chat_id, text, Some(ParseMode::Markdown))
            .await?;
        Ok(())
    }

    async fn send_document(&self, path: &Path) -> crate::Result<()> {
        self.api.send_document(self.chat_id, path).await?;
        Ok(())
    }
}
