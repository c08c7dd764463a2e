//! The session primitives a handler delegates to.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use super::{SessionId, SessionOption, SessionStatus};

/// Failure reported by a session runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Sessions are disabled in this runtime.
    #[error("sessions are disabled")]
    Disabled,

    /// The primitive is not allowed while a session is open.
    #[error("cannot {0} while a session is active")]
    SessionActive(&'static str),

    /// The primitive requires an open session.
    #[error("no session is active")]
    SessionInactive,

    /// The session name was refused.
    #[error("invalid session name: '{0}'")]
    InvalidName(String),

    /// The session ID was refused.
    #[error("invalid session ID: '{0}'")]
    InvalidId(String),

    /// A directive value was refused.
    #[error("invalid value '{value}' for directive '{option}'")]
    InvalidOptionValue {
        option: SessionOption,
        value: String,
    },

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,
}

/// Convenience Result type for runtime primitives.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

/// The native session mechanism behind a [`SessionHandler`](super::SessionHandler).
///
/// Methods take `&self`; implementations hold their state behind interior
/// mutability so that one runtime can back several handlers, the way a
/// process-wide session mechanism would. Primitives that can fail return a
/// [`RuntimeError`]; the handler translates it into an operation-specific
/// error. Lifecycle preconditions are checked by the handler before calling
/// in, but runtimes must still refuse what they cannot do.
pub trait SessionRuntime {
    /// Current status of the mechanism.
    fn status(&self) -> SessionStatus;

    /// Apply a configuration directive.
    fn set_option(&self, option: SessionOption, value: &str) -> RuntimeResult<()>;

    /// Value previously applied for a directive, if any.
    fn option(&self, option: SessionOption) -> Option<String>;

    /// Set the directory session data is saved under.
    fn set_save_path(&self, path: &Path) -> RuntimeResult<()>;

    /// Open a new session or resume the one named by the current ID.
    fn start(&self) -> RuntimeResult<()>;

    /// Remove every key from the open session.
    fn unset_all(&self) -> RuntimeResult<()>;

    /// Destroy the stored record of the open session and close it.
    fn destroy(&self) -> RuntimeResult<()>;

    /// Persist the open session and close it.
    fn write_close(&self) -> RuntimeResult<()>;

    /// Move the open session to a fresh ID.
    fn regenerate_id(&self, delete_old: bool) -> RuntimeResult<()>;

    /// Current session ID, if one has been assigned.
    fn id(&self) -> Option<SessionId>;

    /// Use `id` for the next session start.
    fn set_id(&self, id: &str) -> RuntimeResult<()>;

    /// Current session name.
    fn name(&self) -> String;

    /// Change the session name.
    fn set_name(&self, name: &str) -> RuntimeResult<()>;

    /// Check if the open session holds `key`.
    fn contains(&self, key: &str) -> RuntimeResult<bool>;

    /// Read the value stored under `key`.
    fn read(&self, key: &str) -> RuntimeResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: Value) -> RuntimeResult<()>;

    /// Remove `key`, returning its value.
    fn remove(&self, key: &str) -> RuntimeResult<Option<Value>>;

    /// Keys present in the open session.
    fn keys(&self) -> RuntimeResult<Vec<String>>;
}
