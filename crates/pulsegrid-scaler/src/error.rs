//! Scaler error types.

use thiserror::Error;

use pulsegrid_aws::{AuthError, BackendError};

/// Errors from scaler construction and polling.
///
/// The configuration variants (`MissingMetadata`, `UnknownTrigger`,
/// `Auth`) only occur at construction; `Backend` is the per-poll query
/// error and leaves the scaler pollable.
#[derive(Debug, Error)]
pub enum ScalerError {
    #[error("missing required metadata key: {0}")]
    MissingMetadata(&'static str),

    #[error("unknown trigger type: {0}")]
    UnknownTrigger(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type alias for scaler operations.
pub type ScalerResult<T> = Result<T, ScalerError>;
