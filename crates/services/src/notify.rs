//! One-line user notifications emitted by services.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::messages::MessageKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: MessageKey,
}

impl Notification {
    #[must_use]
    pub fn success(message: MessageKey) -> Self {
        Self {
            level: NotificationLevel::Success,
            message,
        }
    }

    #[must_use]
    pub fn error(message: MessageKey) -> Self {
        Self {
            level: NotificationLevel::Error,
            message,
        }
    }

    #[must_use]
    pub fn info(message: MessageKey) -> Self {
        Self {
            level: NotificationLevel::Info,
            message,
        }
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Passes `result` through, emitting `message` as an error notification when it failed.
pub(crate) fn report_failure<T, E: fmt::Display>(
    notifier: &dyn Notifier,
    message: MessageKey,
    result: Result<T, E>,
) -> Result<T, E> {
    if let Err(err) = &result {
        tracing::warn!(error = %err, "{}", message.text());
        notifier.notify(Notification::error(message));
    }
    result
}

/// Writes notifications to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        let text = notification.message.text();
        match notification.level {
            NotificationLevel::Success => tracing::info!(target: "classroom::notify", level = "success", "{text}"),
            NotificationLevel::Info => tracing::info!(target: "classroom::notify", level = "info", "{text}"),
            NotificationLevel::Error => tracing::warn!(target: "classroom::notify", level = "error", "{text}"),
        }
    }
}

/// Keeps every notification in memory, for tests and headless callers.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.notifications().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        let shared = notifier.clone();
        shared.notify(Notification::error(MessageKey::GradesUpdateFailed));
        shared.notify(Notification::success(MessageKey::ExamValidated));
        assert_eq!(
            notifier.notifications(),
            vec![
                Notification::error(MessageKey::GradesUpdateFailed),
                Notification::success(MessageKey::ExamValidated),
            ]
        );
        assert_eq!(notifier.last().map(|n| n.level), Some(NotificationLevel::Success));
    }

    #[test]
    fn report_failure_notifies_only_on_error() {
        let notifier = RecordingNotifier::new();
        let ok: Result<u8, String> = Ok(1);
        assert_eq!(report_failure(&notifier, MessageKey::QuestionsLoadFailed, ok), Ok(1));
        assert!(notifier.notifications().is_empty());

        let failed: Result<u8, String> = Err("boom".into());
        assert!(report_failure(&notifier, MessageKey::QuestionsLoadFailed, failed).is_err());
        assert_eq!(
            notifier.last(),
            Some(Notification::error(MessageKey::QuestionsLoadFailed))
        );
    }
}
