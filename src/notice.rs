//! User-facing notices.
//!
//! Every handler that talks to the backend reports failures (and a few
//! confirmations) through a [`Notifier`] instead of letting the error escape
//! the screen that triggered it.

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(title = %notice.title, "{}", notice.message),
            _ => tracing::warn!(title = %notice.title, "{}", notice.message),
        }
    }
}

/// Keeps every notice it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }

    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        LogNotifier.notify(notice.clone());
        self.notices.lock().push(notice);
    }
}
