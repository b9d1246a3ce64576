//! # Notification Sinks
//!
//! Everything the monitor tells the outside world goes through [`Notifier`]:
//! plain text, rich messages with named fields, and file attachments.
//!
//! Sink failures are logged and reported to the caller but never escalate
//! beyond that; the dispatcher only acts on attachment failures.

pub mod local;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::logging::log_delivery_failure;

pub use local::{LogNotifier, RecordedNotification, RecordingNotifier};
pub use webhook::WebhookNotifier;

/// Visual weight of a rich message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// RGB colour used by chat embeds
    pub fn color(&self) -> u32 {
        match self {
            Severity::Info => 0x0099ff,
            Severity::Success => 0x00ff00,
            Severity::Warning => 0xff9900,
            Severity::Error => 0xff0000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Titled message with ordered name/value fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichMessage {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub fields: Vec<RichField>,
    pub timestamp: DateTime<Utc>,
}

impl RichMessage {
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            fields: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Append an inline field
    pub fn field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push(RichField {
            name: name.into(),
            value: value.to_string(),
            inline: true,
        });
        self
    }

    /// Append a field rendered on its own line
    pub fn block_field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push(RichField {
            name: name.into(),
            value: value.to_string(),
            inline: false,
        });
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// File delivered alongside a caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub caption: String,
    pub content_type: String,
}

impl Attachment {
    pub fn html(filename: impl Into<String>, body: &str, caption: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: body.as_bytes().to_vec(),
            caption: caption.into(),
            content_type: "text/html".to_string(),
        }
    }
}

/// Outbound notification channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_text(&self, message: &str) -> Result<(), NotifyError>;

    async fn notify_rich(&self, message: &RichMessage) -> Result<(), NotifyError>;

    async fn notify_attachment(&self, attachment: &Attachment) -> Result<(), NotifyError>;
}

/// Send a text notification, logging any failure. Returns whether it was delivered.
pub async fn deliver_text(notifier: &dyn Notifier, message: &str) -> bool {
    match notifier.notify_text(message).await {
        Ok(()) => true,
        Err(e) => {
            log_delivery_failure("text", None, &e.to_string());
            false
        }
    }
}

/// Send a rich notification, logging any failure. Returns whether it was delivered.
pub async fn deliver_rich(notifier: &dyn Notifier, message: &RichMessage) -> bool {
    match notifier.notify_rich(message).await {
        Ok(()) => true,
        Err(e) => {
            log_delivery_failure("rich", Some(&message.title), &e.to_string());
            false
        }
    }
}
