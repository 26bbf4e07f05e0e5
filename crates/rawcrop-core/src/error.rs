//! Error types shared across the client core.
//!
//! Every gateway failure is one of
//! [`GatewayError::Validation`], [`GatewayError::NotFound`] or
//! [`GatewayError::Transport`]. Controller-level failures wrap it in
//! [`WorkflowError`].

use thiserror::Error;

use crate::crop::GeometryError;
use crate::workflow::WorkflowState;

/// Failures reported by the remote processing gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Bad file format or out-of-range crop geometry. User-correctable.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The server does not know the referenced identifier.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure, server failure or an unreadable response.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    /// The taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Validation(_) => ErrorKind::Validation,
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::Transport(_) => ErrorKind::Transport,
        }
    }
}

/// Error taxonomy used to decide how the view reacts to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Shown inline, no state change.
    Validation,
    /// Forces a return to the empty state.
    NotFound,
    /// Dismissible notification, state rolled back.
    Transport,
}

/// Failures of workflow controller operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// A mutating operation is already in flight.
    #[error("Another operation is in progress")]
    Busy,

    /// The operation needs an active file record.
    #[error("No active file")]
    NoActiveRecord,

    /// No file at the given position.
    #[error("No file at position {0}")]
    NoSuchFile(usize),

    /// The operation is not allowed from the current state.
    #[error("Cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: WorkflowState,
    },

    /// The source dimensions of the active file are not known yet.
    #[error("Source dimensions of '{0}' are not known yet")]
    UnknownDimensions(String),

    /// Clear-all was started without an explicit confirmation.
    #[error("Clearing all files requires confirmation")]
    ClearNotConfirmed,

    /// The crop box cannot be turned into a valid request.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// The remote service rejected or failed the operation.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl WorkflowError {
    /// The taxonomy bucket this error is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Gateway(e) => e.kind(),
            _ => ErrorKind::Validation,
        }
    }
}
