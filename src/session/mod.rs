//! Session management module.
//!
//! This module provides the session handler facade, the runtime seam it
//! delegates to, and an in-memory runtime implementation.

mod handler;
mod id;
mod memory;
mod option;
mod runtime;
mod status;

pub use handler::SessionHandler;
pub use id::SessionId;
pub use memory::{MemoryRuntime, DEFAULT_SESSION_NAME};
pub use option::{parse_flag, SessionOption};
pub use runtime::{RuntimeError, RuntimeResult, SessionRuntime};
pub use status::SessionStatus;
