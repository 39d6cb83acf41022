//! Error types
//!
//! Only conditions that stop a whole extraction (or stop the extractor from
//! being built) live here. A field that cannot be found or parsed is not an
//! error; its extractor returns `None` or an empty collection.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// No usable markup could be obtained for the page.
    #[error("snapshot unavailable: {0}")]
    SnapshotUnavailable(String),

    #[error("invalid selector for {field}: '{selector}' ({reason})")]
    InvalidSelector {
        field: String,
        selector: String,
        reason: String,
    },

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported product url: {0}")]
    UnsupportedUrl(String),
}

impl ExtractError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::SnapshotUnavailable(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
