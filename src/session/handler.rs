//! Session handler facade.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{MemoryRuntime, SessionId, SessionOption, SessionRuntime, SessionStatus};
use crate::config::SessionsConfig;
use crate::error::SessionError;
use crate::Result;

/// Object-oriented access to a session runtime.
///
/// The handler validates its configuration once, at construction, and then
/// checks the session status before every call it forwards. Runtime failures
/// come back as the [`SessionError`] variant naming the operation that failed.
///
/// ```
/// use serde_json::json;
/// use session_keeper::{MemoryRuntime, SessionHandler, SessionsConfig};
///
/// let config = SessionsConfig::new().with_option("name", "APPSESSID");
/// let handler = SessionHandler::with_runtime(config, MemoryRuntime::new())?;
///
/// handler.start()?;
/// handler.set("user_id", json!(42))?;
/// assert_eq!(handler.get("user_id")?, json!(42));
/// handler.write_close()?;
/// # Ok::<(), session_keeper::SessionError>(())
/// ```
#[derive(Debug)]
pub struct SessionHandler<R: SessionRuntime = MemoryRuntime> {
    configuration: SessionsConfig,
    runtime: R,
}

impl SessionHandler<MemoryRuntime> {
    /// Create a handler over the process-wide in-memory runtime.
    pub fn new(configuration: SessionsConfig) -> Result<Self> {
        Self::with_runtime(configuration, MemoryRuntime::global())
    }
}

impl<R: SessionRuntime> SessionHandler<R> {
    /// Create a handler over `runtime`.
    ///
    /// Fails with [`SessionError::OptionInvalid`] if any configured option is
    /// not a recognized directive; nothing is applied in that case.
    pub fn with_runtime(configuration: SessionsConfig, runtime: R) -> Result<Self> {
        let handler = Self {
            configuration,
            runtime,
        };
        handler.configure()?;
        Ok(handler)
    }

    fn configure(&self) -> Result<()> {
        let mut options = Vec::with_capacity(self.configuration.options().len());
        for (name, value) in self.configuration.options() {
            let option: SessionOption = name.parse()?;
            options.push((option, value.as_str()));
        }

        for (option, value) in options {
            match self.runtime.set_option(option, value) {
                Ok(()) => debug!(option = %option, value = %value, "Session directive applied"),
                Err(e) => warn!(option = %option, value = %value, error = %e, "Session directive refused"),
            }
        }
        Ok(())
    }

    fn apply_save_path(&self) -> Result<()> {
        let Some(path) = self.configuration.save_path() else {
            return Ok(());
        };

        if !path.is_dir() {
            return Err(SessionError::DirectoryNotFound(path.to_path_buf()));
        }
        if !is_writable(path) {
            return Err(SessionError::DirectoryNotWritable(path.to_path_buf()));
        }
        if self.status().is_active() {
            return Err(SessionError::AlreadyStarted);
        }

        self.runtime
            .set_save_path(path)
            .map_err(SessionError::StartFailed)?;
        if let Err(e) = self.runtime.set_option(SessionOption::GcProbability, "1") {
            warn!(error = %e, "Could not enable session garbage collection");
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.status().is_active() {
            Ok(())
        } else {
            Err(SessionError::NotStarted)
        }
    }

    /// Get the configuration this handler was built from.
    pub fn configuration(&self) -> &SessionsConfig {
        &self.configuration
    }

    /// Get the underlying runtime.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Get the status of the session mechanism.
    pub fn status(&self) -> SessionStatus {
        self.runtime.status()
    }

    /// Start a new session or resume an existing one.
    pub fn start(&self) -> Result<()> {
        if self.status().is_active() {
            return Err(SessionError::AlreadyStarted);
        }

        self.apply_save_path()?;
        self.runtime.start().map_err(SessionError::StartFailed)?;

        info!(
            name = %self.runtime.name(),
            session_id = %self.runtime.id().map(|id| id.to_string()).unwrap_or_default(),
            "Session started"
        );
        Ok(())
    }

    /// Remove all session data and destroy the session.
    pub fn destroy(&self) -> Result<()> {
        self.ensure_active()?;

        self.runtime.unset_all().map_err(SessionError::UnsetFailed)?;
        self.runtime.destroy().map_err(SessionError::DestroyFailed)?;

        info!("Session destroyed");
        Ok(())
    }

    /// Write the session data and close the session.
    pub fn write_close(&self) -> Result<()> {
        self.ensure_active()?;

        self.runtime
            .write_close()
            .map_err(SessionError::WriteCloseFailed)?;

        info!("Session written and closed");
        Ok(())
    }

    /// Replace the session ID with a new one, keeping the data.
    ///
    /// With `delete_old`, the record stored under the old ID is removed.
    pub fn regenerate_id(&self, delete_old: bool) -> Result<()> {
        self.ensure_active()?;

        self.runtime
            .regenerate_id(delete_old)
            .map_err(SessionError::RegenerateIdFailed)?;

        info!(delete_old, "Session ID regenerated");
        Ok(())
    }

    /// Get the session name.
    pub fn name(&self) -> String {
        self.runtime.name()
    }

    /// Set the session name.
    ///
    /// The runtime refuses this while a session is active.
    pub fn set_name(&self, name: &str) -> Result<()> {
        self.runtime
            .set_name(name)
            .map_err(SessionError::SetNameFailed)
    }

    /// Get the current session ID, if one has been assigned.
    pub fn id(&self) -> Option<SessionId> {
        self.runtime.id()
    }

    /// Set the ID the next [`start`](Self::start) resumes.
    pub fn set_id(&self, id: &str) -> Result<()> {
        if self.status().is_active() {
            return Err(SessionError::AlreadyStarted);
        }
        self.runtime.set_id(id).map_err(SessionError::SetIdFailed)
    }

    /// Check if the session holds `key`.
    pub fn has(&self, key: &str) -> Result<bool> {
        self.ensure_active()?;
        Ok(self.runtime.contains(key)?)
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Value> {
        self.ensure_active()?;

        let value = self
            .runtime
            .read(key)?
            .ok_or_else(|| SessionError::KeyNotFound(key.into()))?;
        debug!(key = %key, "Session value read");
        Ok(value)
    }

    /// Get the value stored under `key`, deserialized as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.get(key)?;
        serde_json::from_value(value).map_err(|source| SessionError::ValueType {
            key: key.into(),
            source,
        })
    }

    /// Get the value stored under `key`, storing and returning `default` if
    /// the key is absent.
    pub fn get_defaulted(&self, key: &str, default: impl Into<Value>) -> Result<Value> {
        self.ensure_active()?;

        if let Some(value) = self.runtime.read(key)? {
            return Ok(value);
        }

        let default = default.into();
        self.runtime.write(key, default.clone())?;
        debug!(key = %key, "Session default stored");
        Ok(default)
    }

    /// Store `value` under `key`.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.ensure_active()?;
        self.runtime.write(key, value.into())?;
        debug!(key = %key, "Session value written");
        Ok(())
    }

    /// Remove `key` from the session.
    pub fn unset(&self, key: &str) -> Result<()> {
        self.ensure_active()?;

        if !self.runtime.contains(key)? {
            return Err(SessionError::KeyNotFound(key.into()));
        }
        self.runtime.remove(key)?;
        debug!(key = %key, "Session value removed");
        Ok(())
    }

    /// List the keys held by the session.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.ensure_active()?;
        Ok(self.runtime.keys()?)
    }
}

/// Check if the current process may create files in `dir`.
#[cfg(unix)]
fn is_writable(dir: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(path) = CString::new(dir.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `path` is a valid NUL-terminated string for the duration of the call.
    unsafe { libc::access(path.as_ptr(), libc::W_OK) == 0 }
}

/// Check if the current process may create files in `dir`.
#[cfg(not(unix))]
fn is_writable(dir: &Path) -> bool {
    std::fs::metadata(dir)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}
