//! Errors reported by host collaborators.
//!
//! Nothing in the core returns these to its own callers: the orchestrator,
//! watcher and profile detector log them and fall back. They exist so platform
//! implementations can say *why* a call was refused.

/// A download platform call failed or was refused.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The platform refused the request (the browser's `lastError`).
    #[error("download rejected: {0}")]
    Rejected(String),
    /// URL scheme or syntax the platform cannot fetch.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Filename the platform will not write.
    #[error("invalid filename: {0}")]
    InvalidFilename(String),
    /// No download with this id is known.
    #[error("unknown download id {0}")]
    UnknownId(u64),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The key-value settings store failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
