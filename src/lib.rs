//! Chatdesk - conversation timeline controller
//!
//! This library drives the chat message panel of the chatdesk messaging
//! front end. It reconciles a paginated, append-and-prepend message history
//! with a live viewport: auto-follow versus unread counting, and scroll
//! anchoring while older history is spliced in above the current view.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod history;
pub mod message;
pub mod panel;
pub mod render;
pub mod settings;
pub mod timeline;

#[cfg(test)]
mod tests;

/// Result type alias for Chatdesk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Chatdesk operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// History fetch rejected by the collaborator
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// History fetch did not resolve in time
    #[error("Fetch timed out after {0} ms")]
    Timeout(u64),

    /// Settings could not be loaded or saved
    #[error("Settings error: {0}")]
    Settings(String),

    /// General I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}

/// Install a `tracing` subscriber that writes to the file at `path`
///
/// For front ends that own the terminal. Fails when the file cannot be
/// created or a global subscriber is already installed.
pub fn init_file_logging<P: AsRef<std::path::Path>>(path: P) -> Result<()> {
    let file = std::fs::File::create(path)?;
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init()
        .map_err(|e| Error::Io(format!("Failed to install log subscriber: {}", e)))
}
