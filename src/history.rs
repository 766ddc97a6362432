//! History hosts: the back/forward list the handler drives.
//!
//! [`HistoryHost`] is the seam between the depth tracker and whatever keeps the
//! real entry list: `window.history` in a browser (see the `web` module) or
//! [`MemoryHistory`] for tests and non-browser shells.
//!
//! Hosts never call back into the handler. Moving through the list (`go`,
//! or the user pressing back) makes the host deliver a notification later,
//! which the embedding layer forwards to
//! [`BackHandler::handle_popstate`](crate::BackHandler::handle_popstate).

use crate::error::{BackHandlerError, BackHandlerResult};
use crate::state::{Depth, EntryState, StampedState};
use crate::trace_log;

// ============================================================================
// HistoryHost trait
// ============================================================================

/// Host-side history operations used by the back handler.
pub trait HistoryHost {
    /// Payload type stored with each entry.
    type State: StampedState;

    /// Append an entry after the current one, discarding forward entries.
    fn push_state(
        &mut self,
        state: Self::State,
        title: &str,
        url: Option<&str>,
    ) -> BackHandlerResult<()>;

    /// Overwrite the current entry.
    fn replace_state(
        &mut self,
        state: Self::State,
        title: &str,
        url: Option<&str>,
    ) -> BackHandlerResult<()>;

    /// Stamp carried by the current entry under `key`.
    fn current_stamp(&self, key: &str) -> Option<Depth>;

    /// URL of the current entry.
    fn current_url(&self) -> Option<String>;

    /// Move `delta` entries through the list.
    fn go(&mut self, delta: i32) -> BackHandlerResult<()>;

    /// Move one entry back.
    fn back(&mut self) -> BackHandlerResult<()> {
        self.go(-1)
    }

    /// Move one entry forward.
    fn forward(&mut self) -> BackHandlerResult<()> {
        self.go(1)
    }
}

// ============================================================================
// MemoryHistory
// ============================================================================

/// An entry in a [`MemoryHistory`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntry {
    pub state: EntryState,
    pub title: String,
    pub url: String,
}

/// Programmatic call recorded by [`MemoryHistory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Push { url: String },
    Replace { url: String },
    Go(i32),
}

/// In-memory back/forward list.
///
/// Behaves like a browser tab: pushing truncates forward entries, moving
/// queues a notification, and going back past the first entry leaves the
/// page. User gestures ([`press_back`](Self::press_back),
/// [`press_forward`](Self::press_forward)) move the list without being
/// recorded in [`calls`](Self::calls), so tests can tell them apart from
/// what the handler did.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<MemoryEntry>,
    current: usize,
    pending: usize,
    calls: Vec<HostCall>,
    exited: bool,
    supported: bool,
    reject_moves: bool,
}

impl MemoryHistory {
    /// A history holding one unstamped entry at `initial_url`.
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            entries: vec![MemoryEntry {
                state: EntryState::null(),
                title: String::new(),
                url: initial_url.into(),
            }],
            current: 0,
            pending: 0,
            calls: Vec::new(),
            exited: false,
            supported: true,
            reject_moves: false,
        }
    }

    /// A host without history support: every operation fails.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new("about:blank")
        }
    }

    fn ensure_supported(&self) -> BackHandlerResult<()> {
        if self.supported {
            Ok(())
        } else {
            Err(BackHandlerError::HistoryUnavailable {
                message: "memory history created without support".to_string(),
            })
        }
    }

    fn ensure_cloneable(operation: &'static str, state: &EntryState) -> BackHandlerResult<()> {
        if state.is_cloneable() {
            Ok(())
        } else {
            Err(BackHandlerError::host_rejected(
                operation,
                "DataCloneError: entry payload could not be cloned",
            ))
        }
    }

    fn resolve_url(&self, url: Option<&str>) -> String {
        url.map_or_else(|| self.current_entry().url.clone(), str::to_string)
    }

    /// Move without recording; returns whether the current entry changed.
    fn travel(&mut self, delta: i32) -> bool {
        if self.exited || delta == 0 {
            return false;
        }
        let target = self.current as i64 + i64::from(delta);
        if target < 0 {
            trace_log!("Memory history went back past its first entry");
            self.exited = true;
            return false;
        }
        let Ok(target) = usize::try_from(target) else {
            return false;
        };
        if target >= self.entries.len() {
            return false;
        }
        self.current = target;
        self.pending += 1;
        true
    }

    /// Simulate the user pressing the browser back button.
    pub fn press_back(&mut self) -> bool {
        self.travel(-1)
    }

    /// Simulate the user pressing the browser forward button.
    pub fn press_forward(&mut self) -> bool {
        self.travel(1)
    }

    /// Consume one queued notification.
    pub fn take_notification(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        true
    }

    /// Number of queued notifications.
    pub fn pending_notifications(&self) -> usize {
        self.pending
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_entry(&self) -> &MemoryEntry {
        &self.entries[self.current]
    }

    /// Programmatic calls made so far, oldest first.
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Forget recorded calls.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Whether the page was left by going back past the first entry.
    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// Make every following `go` fail, as a browser does once the document
    /// is being torn down.
    pub fn set_reject_moves(&mut self, reject: bool) {
        self.reject_moves = reject;
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HistoryHost for MemoryHistory {
    type State = EntryState;

    fn push_state(
        &mut self,
        state: EntryState,
        title: &str,
        url: Option<&str>,
    ) -> BackHandlerResult<()> {
        self.ensure_supported()?;
        Self::ensure_cloneable("pushState", &state)?;
        let url = self.resolve_url(url);
        self.entries.truncate(self.current + 1);
        self.entries.push(MemoryEntry {
            state,
            title: title.to_string(),
            url: url.clone(),
        });
        self.current += 1;
        self.calls.push(HostCall::Push { url });
        Ok(())
    }

    fn replace_state(
        &mut self,
        state: EntryState,
        title: &str,
        url: Option<&str>,
    ) -> BackHandlerResult<()> {
        self.ensure_supported()?;
        Self::ensure_cloneable("replaceState", &state)?;
        let url = self.resolve_url(url);
        self.entries[self.current] = MemoryEntry {
            state,
            title: title.to_string(),
            url: url.clone(),
        };
        self.calls.push(HostCall::Replace { url });
        Ok(())
    }

    fn current_stamp(&self, key: &str) -> Option<Depth> {
        self.current_entry().state.stamp(key)
    }

    fn current_url(&self) -> Option<String> {
        Some(self.current_entry().url.clone())
    }

    fn go(&mut self, delta: i32) -> BackHandlerResult<()> {
        self.ensure_supported()?;
        if self.reject_moves {
            return Err(BackHandlerError::host_rejected(
                "go",
                "history traversal refused",
            ));
        }
        self.calls.push(HostCall::Go(delta));
        self.travel(delta);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_and_navigate() {
        let mut history = MemoryHistory::new("/");
        history
            .push_state(EntryState::null(), "", Some("/users"))
            .unwrap();
        history
            .push_state(EntryState::null(), "", Some("/users/123"))
            .unwrap();
        assert_eq!(history.current_entry().url, "/users/123");
        assert_eq!(history.pending_notifications(), 0);

        history.back().unwrap();
        assert_eq!(history.current_entry().url, "/users");
        assert!(history.take_notification());

        history.forward().unwrap();
        assert_eq!(history.current_entry().url, "/users/123");
        assert_eq!(
            history.calls(),
            &[
                HostCall::Push {
                    url: "/users".to_string()
                },
                HostCall::Push {
                    url: "/users/123".to_string()
                },
                HostCall::Go(-1),
                HostCall::Go(1),
            ]
        );
    }

    #[test]
    fn test_push_truncates_forward() {
        let mut history = MemoryHistory::new("/");
        history.push_state(EntryState::null(), "", Some("/a")).unwrap();
        history.push_state(EntryState::null(), "", Some("/b")).unwrap();
        assert!(history.press_back());
        history.push_state(EntryState::null(), "", Some("/c")).unwrap();

        let urls: Vec<_> = history.entries().iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["/", "/a", "/c"]);
        assert!(!history.press_forward());
    }

    #[test]
    fn test_push_without_url_keeps_current() {
        let mut history = MemoryHistory::new("/home");
        history.push_state(EntryState::null(), "", None).unwrap();
        assert_eq!(history.current_url().as_deref(), Some("/home"));
        assert_eq!(history.entries().len(), 2);
    }

    #[test]
    fn test_replace() {
        let mut history = MemoryHistory::new("/");
        history
            .replace_state(EntryState::new(json!({ "k": 1 })), "t", Some("/posts"))
            .unwrap();
        assert_eq!(history.entries().len(), 1);
        assert_eq!(history.current_entry().url, "/posts");
        assert_eq!(history.current_stamp("k"), Some(Depth::new(1)));
    }

    #[test]
    fn test_back_past_first_entry_exits() {
        let mut history = MemoryHistory::new("/");
        history.back().unwrap();
        assert!(history.has_exited());
        assert_eq!(history.pending_notifications(), 0);
        assert!(!history.press_forward());
    }

    #[test]
    fn test_forward_at_end_is_noop() {
        let mut history = MemoryHistory::new("/");
        history.forward().unwrap();
        assert_eq!(history.current_index(), 0);
        assert!(!history.take_notification());
    }

    #[test]
    fn test_uncloneable_payload_rejected() {
        let mut history = MemoryHistory::new("/");
        let err = history
            .push_state(EntryState::uncloneable(json!({ "node": "div" })), "", Some("/a"))
            .unwrap_err();
        assert!(matches!(
            err,
            BackHandlerError::HostRejected {
                operation: "pushState",
                ..
            }
        ));
        assert!(history
            .replace_state(EntryState::uncloneable(json!({})), "", None)
            .is_err());
        assert_eq!(history.entries().len(), 1);
        assert!(history.calls().is_empty());
    }

    #[test]
    fn test_rejected_moves() {
        let mut history = MemoryHistory::new("/");
        history.push_state(EntryState::null(), "", Some("/a")).unwrap();
        history.set_reject_moves(true);
        assert!(history.back().is_err());
        assert_eq!(history.current_entry().url, "/a");

        history.set_reject_moves(false);
        history.back().unwrap();
        assert_eq!(history.current_entry().url, "/");
    }

    #[test]
    fn test_unsupported_host() {
        let mut history = MemoryHistory::unsupported();
        assert!(matches!(
            history.back(),
            Err(BackHandlerError::HistoryUnavailable { .. })
        ));
        assert!(history
            .push_state(EntryState::null(), "", None)
            .is_err());
        assert!(history.calls().is_empty());
    }
}
