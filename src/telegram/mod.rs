//! Telegram Bot API transport
//!
//! A thin long-polling client: [`BotApi`] speaks `getUpdates`, `sendMessage` and
//! `sendDocument`; [`Bot`] turns updates into export requests; [`ChatResponder`]
//! is the pipeline's outbound surface for one chat.

mod client;
mod dispatch;
mod responder;
pub mod types;


pub use client::BotApi;
pub use dispatch::{Bot, Inbound, classify, handle_inbound, usage};
pub use responder::ChatResponder;
