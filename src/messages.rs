//! Notification wording.
//!
//! Every user-visible message the monitor sends is built here so the
//! watcher, dispatcher and pipeline stay free of presentation details.

use chrono::Local;
use std::time::Duration;

use crate::constants::system::TIMESTAMP_FORMAT;
use crate::error::{FetchError, SourceError};
use crate::notify::{Attachment, RichMessage, Severity};
use crate::report::BatchReport;

fn now_stamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `"{h}h {m}m"`
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

pub fn monitoring_started(target_url: &str, poll_interval: Duration) -> RichMessage {
    RichMessage::new(
        "🔍 Monitoring Started",
        "Result monitoring is now active and checking the results page for updates.",
        Severity::Info,
    )
    .field("Check Interval", format!("{} second(s)", poll_interval.as_secs()))
    .block_field("Target URL", target_url)
    .field("Started At", now_stamp())
}

pub fn results_live() -> RichMessage {
    RichMessage::new(
        "🌐 RESULTS LIVE!",
        "**The exam results are now published!** Starting automatic processing...",
        Severity::Success,
    )
    .field("Status", "✅ Results Available")
    .field("Action", "🚀 Auto-processing started")
    .field("Detected At", now_stamp())
}

pub fn not_yet_live() -> String {
    "⏳ Results page checked; results not yet published".to_string()
}

pub fn degraded() -> String {
    "⚠️ **Website overloaded:** Service Unavailable".to_string()
}

pub fn unreachable(error: &FetchError) -> String {
    format!("❌ **Website DOWN** - {}: {error}", error.kind())
}

pub fn heartbeat(uptime: Duration) -> String {
    format!(
        "❤️ Health Check - Uptime: {}\nLast check: {}",
        format_uptime(uptime),
        now_stamp()
    )
}

pub fn processing_started(total: usize, batch_size: usize) -> RichMessage {
    RichMessage::new(
        "🚀 Processing Started",
        format!("Processing **{total}** identifiers in batches of **{batch_size}**"),
        Severity::Info,
    )
    .field("Total Numbers", total)
    .field("Batch Size", batch_size)
    .field("Started At", now_stamp())
}

pub fn invalid_format(identifier: &str) -> String {
    format!("❌ **Invalid format:** {identifier}")
}

pub fn no_result(identifier: &str) -> String {
    format!("❌ **No result for** {identifier}")
}

pub fn file_delivery_failed(identifier: &str) -> String {
    format!("⚠️ **File send failed for:** {identifier}")
}

pub fn result_found(identifier: &str) -> RichMessage {
    RichMessage::new(
        "🎯 Result Found!",
        format!("Successfully found result for registration number: **{identifier}**"),
        Severity::Success,
    )
    .field("Registration Number", identifier)
    .field("Status", "✅ Available")
    .field("Time", now_stamp())
}

pub fn result_attachment(identifier: &str, document: &str) -> Attachment {
    Attachment::html(
        format!("{identifier}_result.html"),
        document,
        format!("📄 **Result file for {identifier}**"),
    )
}

pub fn batch_progress(index: usize, total_batches: usize, size: usize) -> String {
    format!("🔄 **Batch {index}/{total_batches} complete** ({size} numbers)")
}

pub fn summary(report: &BatchReport) -> RichMessage {
    let rate = report.success_rate();
    let severity = if rate > 50.0 {
        Severity::Success
    } else if rate > 0.0 {
        Severity::Warning
    } else {
        Severity::Error
    };

    RichMessage::new(
        "📊 Processing Complete!",
        "Result monitoring has finished processing all identifiers.",
        severity,
    )
    .field("✅ Successful", report.successful)
    .field("❌ Failed", report.failed())
    .field("📈 Success Rate", report.success_rate_display())
    .field("📋 Total Processed", report.total)
    .field("⏱️ Completed At", now_stamp())
}

pub fn identifier_source_failed(error: &SourceError) -> String {
    match error {
        SourceError::NotFound(path) => format!("❌ **File not found:** `{}`", path.display()),
        SourceError::Io(e) => format!("⚠️ **File error:** {e}"),
    }
}

pub fn no_identifiers() -> String {
    "❌ **No registration numbers found**".to_string()
}

pub fn no_valid_identifiers() -> String {
    "❌ **No valid registration numbers found**".to_string()
}

pub fn monitoring_complete(report: Option<&BatchReport>) -> String {
    match report {
        Some(report) => format!(
            "✅ Processing complete! {} results delivered.",
            report.successful
        ),
        None => "✅ Processing complete!".to_string(),
    }
}

pub fn monitoring_stopped() -> String {
    "🛑 **Result monitoring stopped**".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutcomeKind;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0h 0m");
        assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "3h 25m");
    }

    #[test]
    fn test_summary_severity_follows_success_rate() {
        let mut report = BatchReport::new();
        report.record(OutcomeKind::NotFound, false);
        assert_eq!(summary(&report).severity, Severity::Error);

        report.record(OutcomeKind::Found, true);
        assert_eq!(summary(&report).severity, Severity::Warning);

        report.record(OutcomeKind::Found, true);
        let message = summary(&report);
        assert_eq!(message.severity, Severity::Success);
        assert_eq!(message.field_value("📈 Success Rate"), Some("66.7%"));
        assert_eq!(message.field_value("❌ Failed"), Some("1"));
    }

    #[test]
    fn test_attachment_naming() {
        let attachment = result_attachment("12345678901", "<html/>");
        assert_eq!(attachment.filename, "12345678901_result.html");
        assert_eq!(attachment.content, b"<html/>".to_vec());
    }
}
