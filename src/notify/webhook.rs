//! Chat-webhook notification sink.
//!
//! Text and rich messages are posted as JSON; attachments go up as a
//! multipart form. Calls are serialised and each is followed by a fixed
//! pause so the webhook's own rate limit is respected.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use std::borrow::Cow;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{Attachment, Notifier, RichMessage};
use crate::config::NotifierConfig;
use crate::error::NotifyError;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Cow<'a, str>>,
    username: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    avatar_url: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<Embed<'a>>,
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: &'a str,
    color: u32,
    timestamp: String,
    footer: Footer<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField<'a>>,
}

#[derive(Debug, Serialize)]
struct Footer<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct EmbedField<'a> {
    name: &'a str,
    value: &'a str,
    inline: bool,
}

/// Webhook sink bound to one URL
pub struct WebhookNotifier {
    client: Client,
    url: Url,
    username: String,
    avatar_url: String,
    max_content_len: usize,
    message_delay: Duration,
    send_lock: Mutex<()>,
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("host", &self.url.host_str())
            .field("username", &self.username)
            .field("message_delay", &self.message_delay)
            .finish()
    }
}

impl WebhookNotifier {
    pub fn new(client: Client, config: &NotifierConfig) -> Result<Self, NotifyError> {
        let raw = config
            .webhook_url
            .as_deref()
            .ok_or_else(|| NotifyError::Unavailable("no webhook URL configured".to_string()))?;
        let url = Url::parse(raw)
            .map_err(|e| NotifyError::Unavailable(format!("invalid webhook URL: {e}")))?;

        Ok(Self {
            client,
            url,
            username: config.username.clone(),
            avatar_url: config.avatar_url.clone(),
            max_content_len: config.max_content_len,
            message_delay: config.message_delay(),
            send_lock: Mutex::new(()),
        })
    }

    fn text_payload<'a>(&'a self, message: &'a str) -> WebhookPayload<'a> {
        WebhookPayload {
            content: Some(truncate_content(message, self.max_content_len)),
            username: &self.username,
            avatar_url: &self.avatar_url,
            embeds: Vec::new(),
        }
    }

    fn rich_payload<'a>(&'a self, message: &'a RichMessage) -> WebhookPayload<'a> {
        let embed = Embed {
            title: &message.title,
            description: &message.description,
            color: message.severity.color(),
            timestamp: message.timestamp.to_rfc3339(),
            footer: Footer {
                text: &self.username,
            },
            fields: message
                .fields
                .iter()
                .map(|f| EmbedField {
                    name: &f.name,
                    value: &f.value,
                    inline: f.inline,
                })
                .collect(),
        };

        WebhookPayload {
            content: None,
            username: &self.username,
            avatar_url: &self.avatar_url,
            embeds: vec![embed],
        }
    }

    /// Post under the send lock, then hold it for the configured pause
    async fn post(&self, request: reqwest::RequestBuilder, kind: &str) -> Result<(), NotifyError> {
        let _guard = self.send_lock.lock().await;

        let result = match request.send().await {
            Ok(response) => {
                let status = response.status();
                if is_delivered(status) {
                    debug!(kind = %kind, status = status.as_u16(), "Webhook delivered");
                    Ok(())
                } else {
                    let body = response.text().await.unwrap_or_default();
                    warn!(kind = %kind, status = status.as_u16(), "Webhook rejected notification");
                    Err(NotifyError::rejected(status.as_u16(), body))
                }
            }
            Err(e) => Err(NotifyError::Transport(e)),
        };

        tokio::time::sleep(self.message_delay).await;
        result
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_text(&self, message: &str) -> Result<(), NotifyError> {
        let payload = self.text_payload(message);
        let request = self.client.post(self.url.clone()).json(&payload);
        self.post(request, "text").await
    }

    async fn notify_rich(&self, message: &RichMessage) -> Result<(), NotifyError> {
        let payload = self.rich_payload(message);
        let request = self.client.post(self.url.clone()).json(&payload);
        self.post(request, "rich").await
    }

    async fn notify_attachment(&self, attachment: &Attachment) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(&self.text_payload(&attachment.caption))?;
        let file = Part::bytes(attachment.content.clone())
            .file_name(attachment.filename.clone())
            .mime_str(&attachment.content_type)?;
        let form = Form::new().text("payload_json", payload).part("file", file);

        let request = self.client.post(self.url.clone()).multipart(form);
        self.post(request, "attachment").await
    }
}

/// The webhook answers 204 for plain posts and 200 when it echoes the message
fn is_delivered(status: StatusCode) -> bool {
    matches!(status, StatusCode::OK | StatusCode::NO_CONTENT)
}

/// Cut `message` to at most `max_chars` characters
fn truncate_content(message: &str, max_chars: usize) -> Cow<'_, str> {
    match message.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(message[..cut].to_string()),
        None => Cow::Borrowed(message),
    }
}
