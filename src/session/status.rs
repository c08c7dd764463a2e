//! Session status.

use std::fmt;

/// Availability and lifecycle status of the session mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    /// Sessions are unavailable.
    Disabled,
    /// Sessions are available but none is open.
    #[default]
    None,
    /// A session is open.
    Active,
}

impl SessionStatus {
    /// Check if a session is currently open.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }

    /// Check if the mechanism can open a session at all.
    pub fn is_available(&self) -> bool {
        !matches!(self, SessionStatus::Disabled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Disabled => "disabled",
            SessionStatus::None => "none",
            SessionStatus::Active => "active",
        };
        f.write_str(s)
    }
}
