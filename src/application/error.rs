//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("cannot load forest from {path}: {message}")]
    Source { path: PathBuf, message: String },

    /// A gesture arrived while another one was still being delivered.
    #[error("a selection change is already in progress")]
    MutationInProgress,

    /// The store behind a view has been dropped.
    #[error("view is detached from its selection store")]
    ViewDetached,
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
