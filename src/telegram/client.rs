//! Minimal Bot API client over reqwest

use super::types::{ApiResponse, Message, ParseMode, Update, User};
use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::{with_retry, with_retry_if};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Timeout for ordinary requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for document uploads
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Slack added on top of the long-poll timeout for `getUpdates`
const POLL_SLACK: Duration = Duration::from_secs(10);

/// Client for `<api_url>/bot<token>/<method>`
///
/// `getUpdates` and `sendMessage` are retried with backoff on flood control,
/// server errors, and transport timeouts. Uploads are only repeated on flood
/// control, where Telegram has rejected the file outright.
pub struct BotApi {
    http: reqwest::Client,
    /// `<api_url>/bot<token>`; secret because it embeds the token
    base: SecretString,
    retry: RetryConfig,
}

impl fmt::Debug for BotApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotApi")
            .field("base", &"[REDACTED]")
            .field("retry", &self.retry)
            .finish()
    }
}

impl BotApi {
    /// Create a client for the API at `api_url` authenticating with `token`
    pub fn new(api_url: &str, token: &SecretString, retry: RetryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sticker-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base = format!(
            "{}/bot{}",
            api_url.trim_end_matches('/'),
            token.expose_secret()
        );
        Ok(Self {
            http,
            base: SecretString::new(base),
            retry,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base.expose_secret())
    }

    /// Identify the bot; used at startup to verify the token
    pub async fn get_me(&self) -> Result<User> {
        let body = json!({});
        with_retry(&self.retry, || self.call("getMe", &body, REQUEST_TIMEOUT)).await
    }

    /// Long-poll for updates starting at `offset`
    pub async fn get_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>> {
        let mut body = json!({
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        with_retry(&self.retry, || self.call("getUpdates", &body, timeout + POLL_SLACK)).await
    }

    /// Send a text message to `chat_id`
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<Message> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = serde_json::to_value(mode)?;
        }
        with_retry(&self.retry, || self.call("sendMessage", &body, REQUEST_TIMEOUT)).await
    }

    /// Upload `path` as a document to `chat_id`
    pub async fn send_document(&self, chat_id: i64, path: &Path) -> Result<Message> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let bytes = tokio::fs::read(path).await?;
        debug!(chat_id, file = %file_name, size = bytes.len(), "uploading document");

        with_retry_if(&self.retry, is_flood_limited, || {
            self.upload(chat_id, bytes.clone(), file_name.clone())
        })
        .await
    }

    async fn upload(&self, chat_id: i64, bytes: Vec<u8>, file_name: String) -> Result<Message> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;
        decode(response).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<T> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .timeout(timeout)
            .send()
            .await?;
        decode(response).await
    }
}

fn is_flood_limited(err: &Error) -> bool {
    matches!(err, Error::TelegramApi { code: 429, .. })
}

/// Unwrap the `{ok, result}` envelope
///
/// A body that is not an envelope (a proxy's HTML error page, say) is reported
/// with the HTTP status so 5xx stays retryable.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;

    let envelope: ApiResponse<T> = match serde_json::from_str(&text) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => return Err(e.into()),
        Err(_) => {
            return Err(Error::TelegramApi {
                code: i32::from(status.as_u16()),
                description: status
                    .canonical_reason()
                    .unwrap_or("unexpected response")
                    .to_string(),
                retry_after: None,
            });
        }
    };

    into_result(envelope, status.as_u16())
}

fn into_result<T>(envelope: ApiResponse<T>, http_status: u16) -> Result<T> {
    match envelope {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse { ok: true, .. } => Err(Error::Other(
            "Bot API reported success without a result".to_string(),
        )),
        ApiResponse {
            description,
            error_code,
            parameters,
            ..
        } => Err(Error::TelegramApi {
            code: error_code.unwrap_or(i32::from(http_status)),
            description: description.unwrap_or_else(|| "no description".to_string()),
            retry_after: parameters.and_then(|p| p.retry_after),
        }),
    }
}
