// src/error.rs

//! Unified error handling for the menu crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a status was received, or the body read failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Server answered with a rejecting status
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// HTML was required but the response carried something else
    #[error("{url} is not HTML (content type: {content_type})")]
    NotHtml { url: String, content_type: String },

    /// Content store write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catalog query or write failed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// No catalog connection could be opened within the retry budget
    #[error("Catalog unavailable after {attempts} attempts: {message}")]
    CatalogUnavailable { attempts: u32, message: String },
}

impl AppError {
    /// Create a rejecting-status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a catalog error.
    pub fn catalog(message: impl fmt::Display) -> Self {
        Self::Catalog(message.to_string())
    }

    /// Whether this error must abort the whole run instead of a single item.
    ///
    /// Without a catalog no progress can be recorded, so only
    /// [`AppError::CatalogUnavailable`] is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CatalogUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_catalog_unavailable_is_fatal() {
        let fatal = AppError::CatalogUnavailable {
            attempts: 5,
            message: "refused".into(),
        };
        assert!(fatal.is_fatal());
        assert!(!AppError::status("http://x.test/", 404).is_fatal());
        assert!(!AppError::catalog("constraint").is_fatal());
    }

    #[test]
    fn status_error_mentions_url() {
        let err = AppError::status("http://x.test/menu", 503);
        assert_eq!(err.to_string(), "http://x.test/menu answered with status 503");
    }
}
