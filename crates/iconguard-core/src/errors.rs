//! Error types for the iconguard core library.
//!
//! The validators are total and report problems as [`crate::models::Issue`]
//! records; these errors only cover profile loading and session misuse.

/// Top-level error enum for the iconguard core library.
#[derive(Debug, thiserror::Error)]
pub enum IconGuardError {
    #[error("Profile error: {0}")]
    Profile(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type IconGuardResult<T> = Result<T, IconGuardError>;
