//! Error types for the tree engines and the benchmark harness.

use thiserror::Error;

/// Result type alias for tree operations
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors that can occur in the tree engines
#[derive(Error, Debug)]
pub enum TreeError {
    /// The tree was constructed with an order below the supported minimum
    #[error("Invalid configuration: order {order} is below the minimum of {min}")]
    InvalidConfiguration { order: usize, min: usize },

    /// Key not found (for operations whose contract reports a miss)
    #[error("Key not found")]
    KeyNotFound,

    /// A structural invariant does not hold
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// I/O error while loading a workload file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument supplied to the harness or its CLI
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl TreeError {
    /// Create a corruption error with a message
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Whether this is the expected, recoverable not-found outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound)
    }
}
