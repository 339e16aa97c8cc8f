//! Update polling and per-message dispatch
//!
//! Every update runs in its own task on a [`TaskTracker`], so a slow export never
//! holds up the poll loop and shutdown can wait for in-flight work.

use super::client::BotApi;
use super::responder::ChatResponder;
use super::types::{Message, Update};
use crate::identifier::{PackId, extract_pack_id};
use crate::pipeline::{ExportPipeline, ExportReport, Responder, notify};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Pause after a failed poll before trying again
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

const UNRECOGNIZED_TEXT: &str = "Send a sticker from the pack or a t.me/addstickers/PackName link.";

const MISSING_SET_NAME: &str = "Couldn't determine sticker set name from that sticker. \
     Please send the sticker directly from the original pack (not a forwarded copy), \
     or send the pack link.";

/// Reply to `/start` and `/help`
pub fn usage(max_per_pack: usize) -> String {
    format!(
        "Send me a sticker (from any sticker pack) and I'll export the whole pack \
         into WhatsApp-compatible .wastickers files (chunks of <={max_per_pack}). \
         You can also send a pack link like https://t.me/addstickers/PackName."
    )
}

fn text_ack(pack: &PackId) -> String {
    format!("Received pack name/link: `{pack}` - processing...")
}

fn sticker_ack(pack: &PackId) -> String {
    format!("Detected sticker pack `{pack}` - processing into WhatsApp chunks...")
}

/// What an incoming message asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// `/start` or `/help`
    Start,
    /// Free text that may name a pack
    Text(String),
    /// A sticker, with the name of its pack if Telegram sent one
    Sticker {
        /// `set_name` of the sticker
        set_name: Option<String>,
    },
    /// Anything else: other commands, media, empty text
    Ignored,
}

/// Decide how to handle `message`
pub fn classify(message: &Message) -> Inbound {
    if let Some(sticker) = &message.sticker {
        return Inbound::Sticker {
            set_name: sticker.set_name.clone(),
        };
    }

    let Some(text) = message.text.as_deref().map(str::trim) else {
        return Inbound::Ignored;
    };
    if text.is_empty() {
        return Inbound::Ignored;
    }

    match text.strip_prefix('/') {
        Some(command) => {
            let name = command
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .split('@')
                .next()
                .unwrap_or_default();
            if name.eq_ignore_ascii_case("start") || name.eq_ignore_ascii_case("help") {
                Inbound::Start
            } else {
                Inbound::Ignored
            }
        }
        None => Inbound::Text(text.to_string()),
    }
}

/// Act on one classified message
///
/// Returns the export report when a pipeline run happened.
pub async fn handle_inbound(
    inbound: Inbound,
    pipeline: &ExportPipeline,
    responder: &dyn Responder,
) -> Option<ExportReport> {
    let pack = match inbound {
        Inbound::Ignored => return None,
        Inbound::Start => {
            notify(responder, &usage(pipeline.max_per_pack())).await;
            return None;
        }
        Inbound::Text(text) => {
            let Some(pack) = extract_pack_id(&text) else {
                notify(responder, UNRECOGNIZED_TEXT).await;
                return None;
            };
            ack(responder, &text_ack(&pack)).await;
            pack
        }
        Inbound::Sticker { set_name } => {
            let Some(pack) = set_name.as_deref().and_then(PackId::new) else {
                notify(responder, MISSING_SET_NAME).await;
                return None;
            };
            ack(responder, &sticker_ack(&pack)).await;
            pack
        }
    };

    Some(pipeline.run(&pack, responder).await)
}

async fn ack(responder: &dyn Responder, text: &str) {
    if let Err(e) = responder.reply_markdown(text).await {
        warn!(error = %e, "failed to send acknowledgement");
    }
}

/// Long-polling bot
pub struct Bot {
    api: Arc<BotApi>,
    pipeline: Arc<ExportPipeline>,
    poll_timeout: Duration,
    tracker: TaskTracker,
}

impl Bot {
    /// Create a bot that polls `api` and exports through `pipeline`
    pub fn new(api: Arc<BotApi>, pipeline: Arc<ExportPipeline>, poll_timeout: Duration) -> Self {
        Self {
            api,
            pipeline,
            poll_timeout,
            tracker: TaskTracker::new(),
        }
    }

    /// Poll until `shutdown` is cancelled, then wait for in-flight updates
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(poll_timeout_secs = self.poll_timeout.as_secs(), "starting bot (polling)");
        let mut offset: Option<i64> = None;

        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.api.get_updates(offset, self.poll_timeout) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.spawn_update(update);
                    }
                }
                Err(e) => {
                    error!(error = %e, "polling for updates failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        self.tracker.close();
        info!(in_flight = self.tracker.len(), "stopped polling, waiting for in-flight exports");
        self.tracker.wait().await;
        info!("bot stopped");
    }

    fn spawn_update(&self, update: Update) {
        let update_id = update.update_id;
        let Some(message) = update.message else {
            debug!(update_id, "update without message skipped");
            return;
        };

        let inbound = classify(&message);
        if inbound == Inbound::Ignored {
            debug!(update_id, "message ignored");
            return;
        }

        let chat_id = message.chat.id;
        let user_id = message.from.as_ref().map(|u| u.id);
        debug!(update_id, chat_id, ?user_id, ?inbound, "dispatching message");

        let pipeline = Arc::clone(&self.pipeline);
        let responder = ChatResponder::new(Arc::clone(&self.api), chat_id);

        // The inner task isolates a panic so it can be logged with its update id.
        let handler = tokio::spawn(async move {
            if let Some(report) = handle_inbound(inbound, &pipeline, &responder).await {
                debug!(update_id, ?report, "export report");
            }
        });
        self.tracker.spawn(async move {
            if let Err(e) = handler.await {
                if e.is_panic() {
                    error!(update_id, chat_id, "update handler panicked");
                } else {
                    warn!(update_id, chat_id, error = %e, "update handler was cancelled");
                }
            }
        });
    }
}
