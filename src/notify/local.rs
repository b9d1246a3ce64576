//! In-process notification sinks: a dry-run logger and a recorder.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use super::{Attachment, Notifier, RichMessage};
use crate::error::NotifyError;

/// Writes every notification to the log and always succeeds
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_text(&self, message: &str) -> Result<(), NotifyError> {
        info!(message = %message, "NOTIFY text");
        Ok(())
    }

    async fn notify_rich(&self, message: &RichMessage) -> Result<(), NotifyError> {
        let fields: Vec<String> = message
            .fields
            .iter()
            .map(|f| format!("{}={}", f.name, f.value))
            .collect();
        info!(
            title = %message.title,
            description = %message.description,
            severity = ?message.severity,
            fields = %fields.join(", "),
            "NOTIFY rich"
        );
        Ok(())
    }

    async fn notify_attachment(&self, attachment: &Attachment) -> Result<(), NotifyError> {
        info!(
            filename = %attachment.filename,
            bytes = attachment.content.len(),
            caption = %attachment.caption,
            "NOTIFY attachment"
        );
        Ok(())
    }
}

/// One captured call
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedNotification {
    Text(String),
    Rich(RichMessage),
    Attachment(Attachment),
}

impl RecordedNotification {
    /// Text body, rich title or attachment filename
    pub fn headline(&self) -> &str {
        match self {
            RecordedNotification::Text(text) => text,
            RecordedNotification::Rich(message) => &message.title,
            RecordedNotification::Attachment(attachment) => &attachment.filename,
        }
    }
}

/// Captures every call in memory; failures can be switched on per kind
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    records: Mutex<Vec<RecordedNotification>>,
    fail_text: AtomicBool,
    fail_attachments: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_text(&self, fail: bool) {
        self.fail_text.store(fail, Ordering::SeqCst);
    }

    pub fn fail_attachments(&self, fail: bool) {
        self.fail_attachments.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of everything attempted so far, in call order
    pub fn records(&self) -> Vec<RecordedNotification> {
        self.records.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                RecordedNotification::Text(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn rich_titles(&self) -> Vec<String> {
        self.rich_messages().into_iter().map(|m| m.title).collect()
    }

    pub fn rich_messages(&self) -> Vec<RichMessage> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                RecordedNotification::Rich(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                RecordedNotification::Attachment(a) => Some(a.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of text notifications that contain `needle`
    pub fn count_texts_containing(&self, needle: &str) -> usize {
        self.texts().iter().filter(|t| t.contains(needle)).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_text(&self, message: &str) -> Result<(), NotifyError> {
        self.records
            .lock()
            .push(RecordedNotification::Text(message.to_string()));
        if self.fail_text.load(Ordering::SeqCst) {
            return Err(NotifyError::Unavailable("text delivery disabled".to_string()));
        }
        Ok(())
    }

    async fn notify_rich(&self, message: &RichMessage) -> Result<(), NotifyError> {
        self.records
            .lock()
            .push(RecordedNotification::Rich(message.clone()));
        Ok(())
    }

    async fn notify_attachment(&self, attachment: &Attachment) -> Result<(), NotifyError> {
        self.records
            .lock()
            .push(RecordedNotification::Attachment(attachment.clone()));
        if self.fail_attachments.load(Ordering::SeqCst) {
            return Err(NotifyError::rejected(413, "attachment too large"));
        }
        Ok(())
    }
}
