//! The public back-handler API.
//!
//! [`BackHandler`] is the one object an app creates at startup. It owns the
//! listener registry, the depth tracker and the history host, and exposes
//! the three app-facing operations
//! ([`add_event_listener`](BackHandler::add_event_listener),
//! [`remove_event_listener`](BackHandler::remove_event_listener),
//! [`exit_app`](BackHandler::exit_app)) next to the integration surface the
//! host wiring calls into.
//!
//! All entry creation in the app must go through
//! [`push_state`](BackHandler::push_state); entries pushed behind the
//! handler's back read as the root depth.
//!
//! # Example
//!
//! ```
//! use back_handler::{BackEvent, BackHandler, EntryState, Listener, MemoryHistory};
//! use serde_json::json;
//!
//! let handler = BackHandler::new(MemoryHistory::new("/"));
//! handler.handle_first_interaction().unwrap();
//! handler
//!     .push_state(EntryState::new(json!({ "modal": true })), "", Some("/#modal"))
//!     .unwrap();
//!
//! let close_modal = Listener::new(|| true);
//! let subscription = handler.add_event_listener(BackEvent::HardwareBackPress, close_modal);
//!
//! handler.host_mut().press_back();
//! let outcome = handler.handle_popstate().unwrap();
//! assert!(outcome.is_absorbed());
//!
//! subscription.remove();
//! assert_eq!(handler.listener_count(), 0);
//! ```

use crate::config::BackHandlerConfig;
use crate::error::{BackHandlerError, BackHandlerResult};
use crate::history::HistoryHost;
use crate::listener::{Listener, ListenerRegistry, Subscription};
use crate::state::Depth;
use crate::tracker::{DepthTracker, PopOutcome};
use crate::debug_log;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// BackEvent
// ============================================================================

/// Events a [`BackHandler`] accepts listeners for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackEvent {
    /// The user asked to go back.
    HardwareBackPress,
}

impl BackEvent {
    /// Event name as written by apps.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HardwareBackPress => "hardwareBackPress",
        }
    }
}

impl fmt::Display for BackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackEvent {
    type Err = BackHandlerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "hardwareBackPress" => Ok(Self::HardwareBackPress),
            other => Err(BackHandlerError::UnsupportedEvent {
                name: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// BackHandler
// ============================================================================

/// Back-button emulation over a [`HistoryHost`].
pub struct BackHandler<H: HistoryHost> {
    config: BackHandlerConfig,
    registry: ListenerRegistry,
    tracker: DepthTracker,
    host: RefCell<H>,
}

impl<H: HistoryHost> BackHandler<H> {
    /// Handler with the default configuration.
    pub fn new(host: H) -> Self {
        Self::with_config(host, BackHandlerConfig::default())
    }

    pub fn with_config(host: H, config: BackHandlerConfig) -> Self {
        debug_log!("Back handler created, stamp key '{}'", config.stamp_key());
        Self {
            config,
            registry: ListenerRegistry::new(),
            tracker: DepthTracker::new(),
            host: RefCell::new(host),
        }
    }

    // ------------------------------------------------------------------------
    // App-facing API
    // ------------------------------------------------------------------------

    /// Register a back-press listener. The newest listener is asked first.
    pub fn add_event_listener(&self, event: BackEvent, listener: Listener) -> Subscription {
        debug_log!("add_event_listener({})", event);
        self.registry.register(listener)
    }

    /// Remove a listener registered with
    /// [`add_event_listener`](Self::add_event_listener). Unknown listeners
    /// are ignored.
    pub fn remove_event_listener(&self, event: BackEvent, listener: &Listener) {
        if !self.registry.unregister(listener) {
            debug_log!("remove_event_listener({}): listener not registered", event);
        }
    }

    /// Drop every listener and leave the app.
    ///
    /// The registry is emptied before the host is asked to go back, so no
    /// listener can intercept the exit. Hosts without history support make
    /// this fail with [`BackHandlerError::HistoryUnavailable`].
    pub fn exit_app(&self) -> BackHandlerResult<()> {
        self.registry.clear();
        self.tracker.exit(&self.host)
    }

    // ------------------------------------------------------------------------
    // Integration surface
    // ------------------------------------------------------------------------

    /// Push a new entry stamped with the next depth.
    pub fn push_state(
        &self,
        state: H::State,
        title: &str,
        url: Option<&str>,
    ) -> BackHandlerResult<Depth> {
        self.tracker
            .create_entry(&self.host, self.config.stamp_key(), state, title, url)
    }

    /// Overwrite the current entry, keeping its depth.
    pub fn replace_state(
        &self,
        state: H::State,
        title: &str,
        url: Option<&str>,
    ) -> BackHandlerResult<Depth> {
        self.tracker
            .replace_entry(&self.host, self.config.stamp_key(), state, title, url)
    }

    /// Feed a `popstate` notification from the host.
    pub fn handle_popstate(&self) -> BackHandlerResult<PopOutcome> {
        self.tracker
            .handle_notification(&self.host, &self.registry, &self.config)
    }

    /// Feed the user's first interaction with the page.
    pub fn handle_first_interaction(&self) -> BackHandlerResult<Option<Depth>> {
        self.tracker
            .handle_first_interaction(&self.host, &self.config)
    }

    pub fn last_seen(&self) -> Depth {
        self.tracker.last_seen()
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether [`exit_app`](Self::exit_app) is in progress.
    pub fn is_exiting(&self) -> bool {
        self.tracker.is_exiting()
    }

    pub fn config(&self) -> &BackHandlerConfig {
        &self.config
    }

    /// Borrow the history host.
    ///
    /// Panics if the host is mutably borrowed, which only happens inside a
    /// host call.
    pub fn host(&self) -> Ref<'_, H> {
        self.host.borrow()
    }

    /// Mutably borrow the history host.
    pub fn host_mut(&self) -> RefMut<'_, H> {
        self.host.borrow_mut()
    }

    /// Consume the handler and hand back its host.
    pub fn into_host(self) -> H {
        self.host.into_inner()
    }
}

impl<H: HistoryHost> fmt::Debug for BackHandler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackHandler")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}
