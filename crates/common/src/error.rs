//! Error types for crowdsource-rs.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Network Errors ===
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected status {status}: {text}")]
    Status { status: u16, text: String },

    #[error("Decode error: {0}")]
    Decode(String),

    // === Page Errors ===
    #[error("Element not found: #{0}")]
    MissingElement(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // === Setup Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns a stable machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Http(_) => "HTTP_ERROR",
            Self::Status { .. } => "STATUS_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::MissingElement(_) => "MISSING_ELEMENT",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error came from talking to the backend.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. } | Self::Decode(_))
    }

    /// Short text suitable for embedding in a widget's fallback markup.
    ///
    /// Mirrors the status text a browser reports for a failed request.
    #[must_use]
    pub fn status_text(&self) -> String {
        match self {
            Self::Status { status, text } if text.is_empty() => status.to_string(),
            Self::Status { text, .. } => text.clone(),
            Self::Decode(_) => "parsererror".to_string(),
            _ => "error".to_string(),
        }
    }
}

// === From implementations ===

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
                text: status.canonical_reason().unwrap_or_default().to_string(),
            };
        }
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {err}"))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::Http("x".into()).error_code(), "HTTP_ERROR");
        assert_eq!(
            AppError::MissingElement("survey".into()).error_code(),
            "MISSING_ELEMENT"
        );
    }

    #[test]
    fn test_network_classification() {
        assert!(AppError::Status { status: 500, text: String::new() }.is_network_error());
        assert!(AppError::Decode("bad".into()).is_network_error());
        assert!(!AppError::InvalidState("closed".into()).is_network_error());
    }

    #[test]
    fn test_status_text() {
        let err = AppError::Status { status: 404, text: "Not Found".into() };
        assert_eq!(err.status_text(), "Not Found");
        let err = AppError::Status { status: 599, text: String::new() };
        assert_eq!(err.status_text(), "599");
        assert_eq!(AppError::Decode("eof".into()).status_text(), "parsererror");
    }

    #[test]
    fn test_display() {
        let err = AppError::MissingElement("map".into());
        assert_eq!(err.to_string(), "Element not found: #map");
    }
}
