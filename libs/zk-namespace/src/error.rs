//! Error types for namespace resolution.
//!
//! Callers branch on the variant: configuration problems are fatal, connection
//! problems may be transient, resolution problems concern the requested node.

use thiserror::Error;
use zk_config::ParamsError;

use crate::client::SessionStatus;

/// Top-level error type for the zk-namespace crate.
#[derive(Debug, Error)]
pub enum ZkError {
    /// Connection parameters missing or invalid, malformed URL or node path.
    #[error("configuration error: {0}")]
    Config(String),

    /// Session could not be established or was lost, including retry exhaustion.
    #[error("connection error: {0}")]
    Connection(String),

    /// The node does not exist or its value could not be read.
    #[error("failed to resolve '{path}': {reason}")]
    Resolution { path: String, reason: String },

    /// A byte-stream primitive was invoked on the stream adapter.
    #[error("not supported operation: {0}")]
    Unsupported(&'static str),

    /// The operation is not valid in the session's current state.
    #[error("cannot {op}: session is {state}")]
    Lifecycle {
        op: &'static str,
        state: SessionStatus,
    },

    /// A caller-supplied deadline elapsed.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl ZkError {
    /// Returns true for failures a retry may fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ZkError::Connection(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ZkError::Config(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ZkError::Unsupported(_))
    }

    pub(crate) fn resolution(path: &str, reason: impl ToString) -> Self {
        ZkError::Resolution {
            path: path.to_owned(),
            reason: reason.to_string(),
        }
    }
}

impl From<ParamsError> for ZkError {
    fn from(err: ParamsError) -> Self {
        ZkError::Config(err.to_string())
    }
}

/// Shorthand result alias for namespace operations.
pub type ZkResult<T> = Result<T, ZkError>;
