//! Error handling for the back handler.
//!
//! Only a few things can go wrong, and most of them are loud on purpose:
//!
//! - the host has no usable history (`HistoryUnavailable`), which would
//!   otherwise strand the user unable to leave the app;
//! - the host refused a history call (`HostRejected`);
//! - an event name other than `hardwareBackPress` was requested
//!   (`UnsupportedEvent`);
//! - a listener re-entered the dispatch or navigation machinery
//!   (`ReentrantDispatch`, `ReentrantNavigation`).
//!
//! Failing to attach a depth stamp to an entry payload is *not* an error. The
//! tracker recovers by substituting a minimal stamped payload, see
//! [`StampedState`](crate::StampedState).
//!
//! # Examples
//!
//! ```
//! use back_handler::BackHandlerError;
//!
//! let err = BackHandlerError::UnsupportedEvent { name: "keypress".into() };
//! assert_eq!(err.to_string(), "Unsupported event: keypress");
//! assert!(!err.is_reentrancy());
//! ```

use std::fmt;

/// Result alias used throughout the crate.
pub type BackHandlerResult<T> = Result<T, BackHandlerError>;

/// Errors surfaced by the back handler and its history hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackHandlerError {
    /// The host environment has no history support.
    HistoryUnavailable { message: String },

    /// The host rejected a history operation.
    HostRejected {
        operation: &'static str,
        message: String,
    },

    /// Event name other than `hardwareBackPress`.
    UnsupportedEvent { name: String },

    /// A listener triggered a nested dispatch.
    ReentrantDispatch,

    /// A navigation change was fed in while listeners were being dispatched.
    ReentrantNavigation { operation: &'static str },
}

impl BackHandlerError {
    /// Shorthand for a [`HostRejected`](Self::HostRejected) error.
    pub fn host_rejected(operation: &'static str, message: impl Into<String>) -> Self {
        Self::HostRejected {
            operation,
            message: message.into(),
        }
    }

    /// Whether this error reports out-of-contract nesting.
    pub fn is_reentrancy(&self) -> bool {
        matches!(
            self,
            Self::ReentrantDispatch | Self::ReentrantNavigation { .. }
        )
    }
}

impl fmt::Display for BackHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HistoryUnavailable { message } => {
                write!(f, "History unavailable: {}", message)
            }
            Self::HostRejected { operation, message } => {
                write!(f, "Host rejected {}: {}", operation, message)
            }
            Self::UnsupportedEvent { name } => {
                write!(f, "Unsupported event: {}", name)
            }
            Self::ReentrantDispatch => {
                write!(f, "Back-press dispatch re-entered from a listener")
            }
            Self::ReentrantNavigation { operation } => {
                write!(f, "{} called during back-press dispatch", operation)
            }
        }
    }
}

impl std::error::Error for BackHandlerError {}
