//! Session and controller error types.

use ofctl_types::{DatapathId, PortNo};
use thiserror::Error;

/// Failure reported by a switch session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The session to the switch is gone
    #[error("Switch {0} is disconnected")]
    Disconnected(DatapathId),

    /// The switch refused the request
    #[error("Request rejected by switch: {reason}")]
    Rejected { reason: String },

    /// The request did not complete in time
    #[error("Request timed out: {operation}")]
    Timeout { operation: String },

    /// Transport-level failure
    #[error("Session I/O error: {message}")]
    Io { message: String },
}

impl SessionError {
    /// Creates a rejection error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        SessionError::Rejected {
            reason: reason.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(operation: impl Into<String>) -> Self {
        SessionError::Timeout {
            operation: operation.into(),
        }
    }

    /// Creates an I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        SessionError::Io {
            message: message.into(),
        }
    }

    /// Returns true if repeating the request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Timeout { .. } | SessionError::Io { .. })
    }
}

/// Error type for controller application failures.
#[derive(Debug, Clone, Error)]
pub enum ControlError {
    /// A flow entry could not be installed
    #[error("Failed to {operation} on switch {dpid} after {attempts} attempt(s): {source}")]
    Installation {
        dpid: DatapathId,
        operation: String,
        attempts: u32,
        #[source]
        source: SessionError,
    },

    /// A packet could not be sent
    #[error("Failed to emit packet on switch {dpid}: {source}")]
    Emission {
        dpid: DatapathId,
        #[source]
        source: SessionError,
    },

    /// A packet-in payload could not be interpreted
    #[error("Malformed frame from switch {dpid} port {in_port}: {reason}")]
    MalformedFrame {
        dpid: DatapathId,
        in_port: PortNo,
        reason: String,
    },

    /// Some policy entries could not be installed on connect
    #[error("Policy push to switch {dpid} incomplete: {failed} of {total} entries failed")]
    PolicyPush {
        dpid: DatapathId,
        failed: usize,
        total: usize,
    },
}

impl ControlError {
    /// Creates an installation error.
    pub fn installation(
        dpid: DatapathId,
        operation: impl Into<String>,
        attempts: u32,
        source: SessionError,
    ) -> Self {
        ControlError::Installation {
            dpid,
            operation: operation.into(),
            attempts,
            source,
        }
    }

    /// Creates an emission error.
    pub fn emission(dpid: DatapathId, source: SessionError) -> Self {
        ControlError::Emission { dpid, source }
    }

    /// Creates a malformed frame error.
    pub fn malformed_frame(dpid: DatapathId, in_port: PortNo, reason: impl Into<String>) -> Self {
        ControlError::MalformedFrame {
            dpid,
            in_port,
            reason: reason.into(),
        }
    }

    /// Creates a partial policy push error.
    pub fn policy_push(dpid: DatapathId, failed: usize, total: usize) -> Self {
        ControlError::PolicyPush { dpid, failed, total }
    }
}

/// Result type for controller applications.
pub type ControlResult<T> = Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as _;

    #[test]
    fn test_retryable() {
        assert!(SessionError::timeout("flow_mod").is_retryable());
        assert!(SessionError::io("broken pipe").is_retryable());
        assert!(!SessionError::rejected("table full").is_retryable());
        assert!(!SessionError::Disconnected(DatapathId::new(1)).is_retryable());
    }

    #[test]
    fn test_installation_error_keeps_source() {
        let err = ControlError::installation(
            DatapathId::new(1),
            "install flow",
            3,
            SessionError::rejected("table full"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to install flow on switch 0000000000000001 after 3 attempt(s): Request rejected by switch: table full"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_policy_push_message() {
        let err = ControlError::policy_push(DatapathId::new(2), 1, 4);
        assert_eq!(
            err.to_string(),
            "Policy push to switch 0000000000000002 incomplete: 1 of 4 entries failed"
        );
    }
}
