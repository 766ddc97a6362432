//! Back handler configuration.
//!
//! ```
//! use back_handler::BackHandlerConfig;
//!
//! let config = BackHandlerConfig::new()
//!     .with_stamp_key("myAppDepth")
//!     .with_exit_at_root(false);
//!
//! assert_eq!(config.stamp_key(), "myAppDepth");
//! assert!(!config.exit_at_root());
//! assert!(config.root_on_first_interaction());
//! ```

/// Stamp key used when none is configured.
pub const DEFAULT_STAMP_KEY: &str = "backHandlerIndex";

/// Window event treated as the user's first interaction.
pub const DEFAULT_FIRST_INTERACTION_EVENT: &str = "focusin";

/// Prefix of session-scoped stamp keys.
const SESSION_KEY_PREFIX: &str = "backHandler";

/// Settings for a [`BackHandler`](crate::BackHandler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackHandlerConfig {
    stamp_key: String,
    exit_at_root: bool,
    root_on_first_interaction: bool,
    first_interaction_event: String,
}

impl BackHandlerConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self {
            stamp_key: DEFAULT_STAMP_KEY.to_string(),
            exit_at_root: true,
            root_on_first_interaction: true,
            first_interaction_event: DEFAULT_FIRST_INTERACTION_EVENT.to_string(),
        }
    }

    /// Configuration whose stamp key is unique to one page lifetime.
    ///
    /// Entries left over from an earlier page load keep their old stamps under
    /// a different key and therefore read as [`Depth::ROOT`](crate::Depth::ROOT).
    pub fn for_session(started_at_ms: u64) -> Self {
        Self::new().with_stamp_key(format!("{SESSION_KEY_PREFIX}{started_at_ms}"))
    }

    /// Key under which depths are stored in entry payloads.
    pub fn with_stamp_key(mut self, key: impl Into<String>) -> Self {
        self.stamp_key = key.into();
        self
    }

    /// Whether an unclaimed back press on the root entry leaves the app.
    pub fn with_exit_at_root(mut self, enabled: bool) -> Self {
        self.exit_at_root = enabled;
        self
    }

    /// Whether the first interaction creates the synthetic root entry.
    pub fn with_root_on_first_interaction(mut self, enabled: bool) -> Self {
        self.root_on_first_interaction = enabled;
        self
    }

    /// Window event the browser binding listens to for the first interaction.
    pub fn with_first_interaction_event(mut self, event: impl Into<String>) -> Self {
        self.first_interaction_event = event.into();
        self
    }

    pub fn stamp_key(&self) -> &str {
        &self.stamp_key
    }

    pub fn exit_at_root(&self) -> bool {
        self.exit_at_root
    }

    pub fn root_on_first_interaction(&self) -> bool {
        self.root_on_first_interaction
    }

    pub fn first_interaction_event(&self) -> &str {
        &self.first_interaction_event
    }
}

impl Default for BackHandlerConfig {
    fn default() -> Self {
        Self::new()
    }
}
