//! Bot API wire types
//!
//! Only the fields the bot reads are modelled; serde ignores the rest.

use serde::{Deserialize, Serialize};

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub ok: bool,
    /// Method result, present when `ok`
    pub result: Option<T>,
    /// Human-readable failure reason
    #[serde(default)]
    pub description: Option<String>,
    /// HTTP-like failure code
    #[serde(default)]
    pub error_code: Option<i32>,
    /// Flood-control hints
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Extra information attached to failed requests
#[derive(Debug, Default, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before repeating a flood-limited request
    #[serde(default)]
    pub retry_after: Option<u64>,
}

/// One incoming event from `getUpdates`
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic identifier; the next poll offset is this plus one
    pub update_id: i64,
    /// New incoming message, if this update carries one
    #[serde(default)]
    pub message: Option<Message>,
}

/// A chat message
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Identifier unique within the chat
    pub message_id: i64,
    /// Chat the message belongs to
    pub chat: Chat,
    /// Sender, absent for channel posts
    #[serde(default)]
    pub from: Option<User>,
    /// Text of a text message
    #[serde(default)]
    pub text: Option<String>,
    /// Sticker of a sticker message
    #[serde(default)]
    pub sticker: Option<Sticker>,
}

/// Chat reference
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat identifier used as `chat_id` in replies
    pub id: i64,
}

/// Telegram user or bot
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// User identifier
    pub id: i64,
    /// `@username` without the `@`
    #[serde(default)]
    pub username: Option<String>,
}

/// Sticker attached to a message
#[derive(Debug, Clone, Deserialize)]
pub struct Sticker {
    /// File identifier of this sticker
    pub file_id: String,
    /// Name of the pack the sticker belongs to; absent for standalone stickers
    #[serde(default)]
    pub set_name: Option<String>,
}

/// Text formatting mode for `sendMessage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    /// Legacy Markdown
    Markdown,
}
