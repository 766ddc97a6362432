//! Logging abstraction layer.
//!
//! The macros below forward to either [`log`](https://docs.rs/log) or
//! [`tracing`](https://docs.rs/tracing) depending on the enabled feature, and
//! always log under the `back_handler` target so hosts can filter the
//! back-button machinery separately (`RUST_LOG=back_handler=debug`).
//!
//! | Feature    | Backend         | Default |
//! |------------|-----------------|---------|
//! | `log`      | `log` crate     | yes     |
//! | `tracing`  | `tracing` crate | no      |
//!
//! Enable at most one backend. With neither enabled the macros expand to
//! nothing.
//!
//! | Macro         | Used for                                        |
//! |---------------|-------------------------------------------------|
//! | `trace_log!`  | per-listener dispatch steps                     |
//! | `debug_log!`  | depth stamping and popstate classification      |
//! | `info_log!`   | synthetic root creation, leaving the app        |
//! | `warn_log!`   | out-of-contract re-entrancy                     |
//! | `error_log!`  | host history failures                           |
//!
//! ```ignore
//! use back_handler::{debug_log, warn_log};
//!
//! debug_log!("stamped entry with depth {}", depth);
//! warn_log!("popstate delivered during listener dispatch");
//! ```

/// Log target shared by every macro in this module.
#[doc(hidden)]
pub const LOG_TARGET: &str = "back_handler";

/// Emit a **trace**-level message under the `back_handler` target.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit a **debug**-level message under the `back_handler` target.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit an **info**-level message under the `back_handler` target.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::info!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit a **warn**-level message under the `back_handler` target.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit an **error**-level message under the `back_handler` target.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::error!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}
