use thiserror::Error;

use crate::notice::{Notice, NoticeLevel};

#[derive(Debug, Error)]
pub enum AppError {
    /// Local precondition failed; the gateway was never contacted.
    #[error("{title}: {message}")]
    Precondition { title: String, message: String },

    #[error("{0}")]
    Validation(String),

    /// Error reported by the backend. The message is passed through verbatim.
    #[error("{message}")]
    Gateway { message: String, code: Option<String> },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn precondition(title: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Precondition {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        AppError::Gateway {
            message: message.into(),
            code: None,
        }
    }

    /// True when the failure was detected locally, before any write.
    pub fn is_local(&self) -> bool {
        matches!(self, AppError::Precondition { .. } | AppError::Validation(_))
    }

    /// User-facing rendering of this error. `fallback` is shown when the
    /// underlying message is empty.
    pub fn notice(&self, fallback: &str) -> Notice {
        match self {
            AppError::Precondition { title, message } => Notice {
                level: NoticeLevel::Warning,
                title: title.clone(),
                message: message.clone(),
            },
            AppError::Gateway { message, .. } | AppError::Auth(message)
                if message.trim().is_empty() =>
            {
                Notice::error(fallback)
            }
            AppError::Gateway { message, .. } => Notice::error(message.clone()),
            other => {
                let message = other.to_string();
                if message.trim().is_empty() {
                    Notice::error(fallback)
                } else {
                    Notice::error(message)
                }
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_message_is_passed_through() {
        let err = AppError::Gateway {
            message: "duplicate key value violates unique constraint".to_string(),
            code: Some("23505".to_string()),
        };
        let notice = err.notice("Failed to save budget");
        assert_eq!(notice.title, "Error");
        assert_eq!(notice.message, "duplicate key value violates unique constraint");
    }

    #[test]
    fn empty_gateway_message_uses_fallback() {
        let notice = AppError::gateway("").notice("Failed to load budget");
        assert_eq!(notice.message, "Failed to load budget");
    }

    #[test]
    fn precondition_keeps_its_title() {
        let err = AppError::precondition("No wedding selected", "Select a wedding first.");
        assert!(err.is_local());
        let notice = err.notice("unused");
        assert_eq!(notice.title, "No wedding selected");
        assert_eq!(notice.level, NoticeLevel::Warning);
    }
}
