//! Sync status reporting.

use tokio::sync::mpsc::UnboundedSender;

/// How serious a status message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A status message sent over a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub message: String,
    pub severity: Severity,
}

/// Receiver for human-readable progress and failure messages.
///
/// Reporting is fire-and-forget: a sink cannot fail or stop a run.
pub trait StatusSink {
    fn report(&self, message: &str, severity: Severity);

    fn info(&self, message: &str) {
        self.report(message, Severity::Info);
    }

    fn warn(&self, message: &str) {
        self.report(message, Severity::Warning);
    }

    fn error(&self, message: &str) {
        self.report(message, Severity::Error);
    }
}

/// A sink that discards all messages.
pub struct SilentSink;

impl StatusSink for SilentSink {
    fn report(&self, _message: &str, _severity: Severity) {}
}

/// A sink that forwards to the `log` crate.
pub struct LogSink;

impl StatusSink for LogSink {
    fn report(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => log::info!("{}", message),
            Severity::Warning => log::warn!("{}", message),
            Severity::Error => log::error!("{}", message),
        }
    }
}

impl StatusSink for UnboundedSender<StatusEvent> {
    fn report(&self, message: &str, severity: Severity) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.send(StatusEvent {
            message: message.to_string(),
            severity,
        });
    }
}
