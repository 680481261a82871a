//! Error types for the iPlayer crawler
//!
//! This module defines all error types used throughout the library.
//! IplayerError implements Serialize so front ends can forward it as a plain string.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for iPlayer crawl operations
#[derive(Error, Debug)]
pub enum IplayerError {
    /// HTTP request failed or returned an unsuccessful status
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// A page contained something that could not be interpreted
    #[error("Failed to parse page: {0}")]
    ParseError(String),

    /// Invalid URL format, or not an iPlayer URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Requested page was not found (HTTP 404)
    #[error("Page not found: {0}")]
    NotFound(String),

    /// The same series name points at two different pages
    #[error("Series '{name}' already links to {existing} but {found} was also found")]
    SeriesConflict {
        name: String,
        existing: String,
        found: String,
    },

    /// A series task panicked or was cancelled before reporting
    #[error("Series task failed: {0}")]
    TaskFailed(String),
}

impl From<url::ParseError> for IplayerError {
    fn from(err: url::ParseError) -> Self {
        IplayerError::InvalidUrl(err.to_string())
    }
}

/// Serialize IplayerError as its display string
impl Serialize for IplayerError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for iPlayer crawl operations
pub type Result<T> = std::result::Result<T, IplayerError>;
