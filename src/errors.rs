//! Error taxonomy shared by the path layer and its backends.
//!
//! The path layer never translates backend failures: whatever a
//! `BlobBackend` returns is handed to the caller as-is.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("container `{0}` not found")]
    ContainerNotFound(String),
    #[error("container `{0}` already exists")]
    ContainerAlreadyExists(String),
    #[error("container `{name}` invalid: {reason}")]
    InvalidContainerName { name: String, reason: String },
    #[error("blob `{blob}` not found in container `{container}`")]
    BlobNotFound { container: String, blob: String },
    #[error("invalid blob name `{0}`")]
    InvalidBlobName(String),
    #[error("no path class registered for `{0}`")]
    UnsupportedScheme(String),
    #[error("`{uri}` is not a `{prefix}` path")]
    WrongPrefix { uri: String, prefix: &'static str },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;

impl BlobError {
    /// True for the "object is not there" family of errors.
    pub fn is_not_found(&self) -> bool {
        match self {
            BlobError::ContainerNotFound(_) | BlobError::BlobNotFound { .. } => true,
            BlobError::Io(err) => err.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
