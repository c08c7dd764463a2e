//! # session-keeper
//!
//! Typed session handling over a pluggable session runtime.
//!
//! This crate wraps a session mechanism with a small facade: configuration
//! directives are checked against a fixed allow-list, every operation checks
//! the session status first, and runtime failures come back as distinct
//! error variants instead of bare booleans.
//!
//! ## Features
//!
//! - **Directive allow-list**: unknown configuration keys are rejected up front
//! - **Lifecycle checks**: `NotStarted` / `AlreadyStarted` instead of silent no-ops
//! - **Key accessors**: `has`, `get`, `get_defaulted`, `set`, `unset` over JSON values
//! - **Runtime seam**: the [`SessionRuntime`] trait, with an in-memory implementation
//!
//! ## Quick Start
//!
//! ```no_run
//! use session_keeper::{SessionHandler, SessionsConfig};
//!
//! fn main() -> session_keeper::Result<()> {
//!     // Initialize logging
//!     session_keeper::logging::try_init().ok();
//!
//!     let config = SessionsConfig::new()
//!         .with_option("name", "APPSESSID")
//!         .with_option("use_strict_mode", "1");
//!
//!     // Uses the process-wide in-memory runtime
//!     let session = SessionHandler::new(config)?;
//!     session.start()?;
//!
//!     let visits = session.get_defaulted("visits", 0)?;
//!     session.set("visits", visits.as_u64().unwrap_or(0) + 1)?;
//!
//!     session.write_close()?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use config::{ConfigError, SessionsConfig};
pub use error::{Result, SessionError};
pub use session::{
    MemoryRuntime, RuntimeError, SessionHandler, SessionId, SessionOption, SessionRuntime,
    SessionStatus,
};
