//! Error types for the federator application.

use federated_search::SearchError;

/// Top-level error type for the federator CLI.
#[derive(Debug, thiserror::Error)]
pub enum FederatorError {
    /// Configuration file or flag error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The federated search itself failed.
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, FederatorError>;
