//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Slack API or Socket Mode failure.
    Slack(String),
    /// Cache provider API failure.
    Purge(String),
    /// A remote call exceeded its deadline.
    Timeout(String),
    /// A request carried more URIs than a single purge accepts.
    SizeLimit(String),
    /// Caller is not authorized to perform the requested action.
    Unauthorized(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// The process is shutting down and refuses new remote work.
    ShuttingDown(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::Purge(msg) => write!(f, "purge: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::SizeLimit(msg) => write!(f, "size limit: {msg}"),
            Self::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::ShuttingDown(msg) => write!(f, "shutting down: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Purge(err.to_string())
    }
}
