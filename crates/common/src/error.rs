//! Error types shared across RepCoach crates.

use std::path::PathBuf;

/// Top-level error type for RepCoach operations.
#[derive(Debug, thiserror::Error)]
pub enum RepcoachError {
    #[error("Pose source error: {message}")]
    PoseSource { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using RepcoachError.
pub type RepcoachResult<T> = Result<T, RepcoachError>;

impl RepcoachError {
    pub fn pose_source(msg: impl Into<String>) -> Self {
        Self::PoseSource {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
