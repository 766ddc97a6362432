//! # back-handler
//!
//! Hardware back-button emulation for browser-hosted single-page apps.
//!
//! Apps that model their screens as a stack want the browser's back gesture
//! (back button, swipe back, Alt+Left) to close the modal or pop the screen on
//! top before it ever leaves the page. This crate tracks a synthetic depth for
//! every history entry the app pushes, tells forward and backward `popstate`
//! notifications apart, and lets registered listeners claim a back press.
//! A claimed press is undone with a compensating forward step, so the URL
//! stays put and only app logic runs.
//!
//! # Quick start
//!
//! ```
//! use back_handler::{BackEvent, BackHandler, EntryState, Listener, MemoryHistory};
//!
//! let handler = BackHandler::new(MemoryHistory::new("/"));
//!
//! // First interaction: give the handler a root entry it controls.
//! handler.handle_first_interaction().unwrap();
//!
//! // Every screen push goes through the handler.
//! handler.push_state(EntryState::null(), "", Some("/details")).unwrap();
//!
//! handler.add_event_listener(BackEvent::HardwareBackPress, Listener::new(|| true));
//!
//! handler.host_mut().press_back();
//! assert!(handler.handle_popstate().unwrap().is_absorbed());
//! ```
//!
//! In a browser, enable the `web` feature and call `web::init()`, which
//! binds to `window.history` and listens to `popstate` and `focusin`.
//!
//! # Feature flags
//!
//! | Feature   | Default | Description                                   |
//! |-----------|---------|-----------------------------------------------|
//! | `log`     | yes     | Log through the `log` crate                   |
//! | `tracing` | no      | Log through the `tracing` crate               |
//! | `web`     | no      | `window.history` host and event wiring        |
//!
//! `log` and `tracing` are mutually exclusive.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod handler;
pub mod history;
pub mod listener;
pub mod logging;
pub mod state;
pub mod tracker;
#[cfg(feature = "web")]
#[cfg_attr(docsrs, doc(cfg(feature = "web")))]
pub mod web;

pub use config::{BackHandlerConfig, DEFAULT_STAMP_KEY};
pub use error::{BackHandlerError, BackHandlerResult};
pub use handler::{BackEvent, BackHandler};
pub use history::{HistoryHost, HostCall, MemoryEntry, MemoryHistory};
pub use listener::{BackPressOutcome, Listener, ListenerRegistry, Subscription};
pub use state::{Depth, EntryState, StampedState};
pub use tracker::{DepthTracker, Direction, PopOutcome};
