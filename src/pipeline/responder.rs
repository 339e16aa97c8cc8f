//! Outbound surface of an export: status text and file delivery

use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

/// Where an export reports progress and delivers its artifacts
///
/// The Telegram implementation is [`crate::telegram::ChatResponder`]; tests use a
/// recording fake.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Send a plain status message to the requester
    async fn reply_text(&self, text: &str) -> crate::Result<()>;

    /// Send a status message rendered as Markdown where the transport supports it
    async fn reply_markdown(&self, text: &str) -> crate::Result<()> {
        self.reply_text(text).await
    }

    /// Send a file as a document attachment
    async fn send_document(&self, path: &Path) -> crate::Result<()>;
}

/// Send a status message, logging instead of propagating a failed send
pub(crate) async fn notify(responder: &dyn Responder, text: &str) {
    if let Err(e) = responder.reply_text(text).await {
        warn!(error = %e, "failed to send status message");
    }
}
