//! Error types for session-keeper.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::RuntimeError;

/// Main error type for session handler operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A configured option is not a recognized session directive.
    #[error("the session option '{0}' is invalid")]
    OptionInvalid(String),

    /// The configured save path does not exist or is not a directory.
    #[error("the session directory '{}' does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The configured save path cannot be written to.
    #[error("the session directory '{}' is not writable", .0.display())]
    DirectoryNotWritable(PathBuf),

    /// The operation requires an active session.
    #[error("the session has not been started")]
    NotStarted,

    /// The session is already active.
    #[error("the session has already been started")]
    AlreadyStarted,

    /// The requested key is not present in the session.
    #[error("the session key '{0}' does not exist")]
    KeyNotFound(String),

    /// The runtime failed to start the session.
    #[error("the session has failed to start")]
    StartFailed(#[source] RuntimeError),

    /// The runtime failed to clear the session data.
    #[error("the session has failed to unset")]
    UnsetFailed(#[source] RuntimeError),

    /// The runtime failed to destroy the session.
    #[error("the session has failed to destroy")]
    DestroyFailed(#[source] RuntimeError),

    /// The runtime failed to write and close the session.
    #[error("the session has failed to write-close")]
    WriteCloseFailed(#[source] RuntimeError),

    /// The runtime failed to replace the session ID.
    #[error("the session has failed to regenerate its ID")]
    RegenerateIdFailed(#[source] RuntimeError),

    /// The runtime refused the session name.
    #[error("the session has failed to set its name")]
    SetNameFailed(#[source] RuntimeError),

    /// The runtime refused the session ID.
    #[error("the session has failed to set its ID")]
    SetIdFailed(#[source] RuntimeError),

    /// A stored value could not be converted to the requested type.
    #[error("the session value '{key}' has an unexpected type: {source}")]
    ValueType {
        key: String,
        source: serde_json::Error,
    },

    /// Internal runtime fault outside a named operation.
    #[error("session runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Convenience Result type for session handler operations.
pub type Result<T> = std::result::Result<T, SessionError>;
