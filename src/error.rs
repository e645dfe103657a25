//! Error taxonomy for hook installation and lifecycle violations.
//!
//! Only structural failures surface as errors. Redundant operations (duplicate attach,
//! detaching an unknown listener, unregistering against an unknown window) are absorbed
//! where they happen and logged at debug level.

use thiserror::Error;

use crate::message::WindowId;

/// Failures surfaced to whoever registers listeners.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The platform refused to replace the window's dispatch entry point. There is no
    /// degraded mode; the window is left unhooked.
    #[error("failed to install dispatch hook on window {window}: {reason}")]
    HookInstallationFailed { window: WindowId, reason: String },

    /// A lifecycle violation, e.g. attaching to a hook whose window was already destroyed.
    #[error("invalid hook state for window {window}: cannot {operation} after destroy")]
    InvalidState {
        window: WindowId,
        operation: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, HookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_window_in_hex() {
        let err = HookError::InvalidState {
            window: WindowId(0x10),
            operation: "attach",
        };
        assert_eq!(
            err.to_string(),
            "invalid hook state for window 0x10: cannot attach after destroy"
        );

        let err = HookError::HookInstallationFailed {
            window: WindowId(0x2A),
            reason: "access denied".into(),
        };
        assert!(err.to_string().contains("0x2a"));
        assert!(err.to_string().ends_with("access denied"));
    }
}
