use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveDocsError {
    #[error("Failed to fetch {url}: {cause}")]
    Fetch { url: String, cause: FetchFailure },

    #[error("Downloaded archive is not a valid zip file: {0}")]
    CorruptDownload(PathBuf),

    #[error("Cannot read archive {path}: {reason}")]
    ArchiveRead { path: PathBuf, reason: String },

    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why an archive download did not produce a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Timeout(Duration),
    Status(u16),
    Transport(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(after) => write!(f, "timed out after {} seconds", after.as_secs()),
            Self::Status(code) => write!(f, "HTTP error {code}"),
            Self::Transport(message) => write!(f, "network error: {message}"),
        }
    }
}

impl ArchiveDocsError {
    pub fn fetch(url: impl Into<String>, cause: FetchFailure) -> Self {
        Self::Fetch {
            url: url.into(),
            cause,
        }
    }

    pub fn archive_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArchiveRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Fetch { .. } => 4,
            Self::CorruptDownload(_) => 5,
            Self::ArchiveRead { .. } => 6,
            Self::UnknownEncoding(_) | Self::Config(_) => 3,
            Self::Io(_) | Self::Serialization(_) => 10,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveDocsError>;
