//! History depth tracking and popstate interpretation.
//!
//! Browsers do not tell a page which way a `popstate` went. The tracker
//! recovers the direction by stamping every entry it creates with an
//! increasing [`Depth`] and comparing the stamp of the entry that became
//! current with the last one it saw:
//!
//! | Stamp read vs. last seen | Direction | Then                                    |
//! |--------------------------|-----------|-----------------------------------------|
//! | greater                  | forward   | nothing                                 |
//! | less or equal, claimed   | backward  | `forward()` to undo the browser's step  |
//! | root, unclaimed          | backward  | `back()` to leave the app               |
//! | non-root, unclaimed      | backward  | nothing, the back step stands           |
//!
//! Equal stamps count as backward so a duplicated notification is never
//! mistaken for a forward move.
//!
//! Entries the tracker did not create read as [`Depth::ROOT`]. The synthetic
//! root entry, pushed on the user's first interaction, sits on top of the
//! page's initial entry so that pressing back from the first real screen
//! lands on a root-stamped entry instead of leaving the page outright.

use crate::config::BackHandlerConfig;
use crate::error::{BackHandlerError, BackHandlerResult};
use crate::history::HistoryHost;
use crate::listener::ListenerRegistry;
use crate::state::{stamp_or_replace, Depth, StampedState};
use crate::{debug_log, error_log, info_log, warn_log};
use std::cell::{Cell, RefCell};

// ============================================================================
// Outcomes
// ============================================================================

/// Direction of a history notification relative to the last seen depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// What the tracker did about a history notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopOutcome {
    /// Forward move, including the tracker's own compensation step.
    Forward { depth: Depth },
    /// A listener claimed the back press; a compensating `forward()` was issued.
    Absorbed { depth: Depth },
    /// Unclaimed back press on the root entry; `back()` was issued to leave.
    Exited,
    /// Unclaimed back press on a stamped entry; the browser's step stands.
    Propagated { depth: Depth },
    /// The app asked to exit; another `back()` was issued.
    Exiting { depth: Depth },
}

impl PopOutcome {
    /// Depth of the entry that was current when the notification arrived.
    pub fn depth(self) -> Depth {
        match self {
            Self::Forward { depth }
            | Self::Absorbed { depth }
            | Self::Propagated { depth }
            | Self::Exiting { depth } => depth,
            Self::Exited => Depth::ROOT,
        }
    }

    /// Whether the notification was classified as a backward move.
    pub fn is_backward(self) -> bool {
        !matches!(self, Self::Forward { .. })
    }

    /// Whether a listener claimed the back press.
    pub fn is_absorbed(self) -> bool {
        matches!(self, Self::Absorbed { .. })
    }
}

// ============================================================================
// DepthTracker
// ============================================================================

/// Resets a flag when dropped.
struct FlagGuard<'a>(&'a Cell<bool>);

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn logged<T>(result: BackHandlerResult<T>, operation: &str) -> BackHandlerResult<T> {
    result.map_err(|err| {
        error_log!("History {} failed: {}", operation, err);
        err
    })
}

type WriteEntry<H> =
    fn(&mut H, <H as HistoryHost>::State, &str, Option<&str>) -> BackHandlerResult<()>;

/// Stamp `state` and hand it to the host through `write`.
///
/// A host that refuses the payload itself (a browser throwing
/// `DataCloneError`) gets one more try with a stamp-only payload.
#[allow(clippy::too_many_arguments)]
fn write_entry<H: HistoryHost>(
    host: &RefCell<H>,
    key: &str,
    depth: Depth,
    state: H::State,
    title: &str,
    url: Option<&str>,
    operation: &'static str,
    write: WriteEntry<H>,
) -> BackHandlerResult<()> {
    let (state, replaced) = stamp_or_replace(state, key, depth);
    if replaced {
        debug_log!(
            "Entry payload cannot carry '{}'; replaced with a stamp-only payload",
            key
        );
    }
    let result = write(&mut host.borrow_mut(), state, title, url);
    match result {
        Err(err @ BackHandlerError::HostRejected { .. }) if !replaced => {
            debug_log!(
                "Host refused the entry payload ({}); retrying with a stamp-only payload",
                err
            );
            let stamped = <H::State as StampedState>::stamped(key, depth);
            logged(write(&mut host.borrow_mut(), stamped, title, url), operation)
        }
        other => logged(other, operation),
    }
}

/// Depth bookkeeping for one page lifetime.
#[derive(Debug, Default)]
pub struct DepthTracker {
    /// Stamp of the entry currently shown.
    last_seen: Cell<Depth>,
    /// Highest stamp ever issued; stamps are never handed out twice.
    highest: Cell<Depth>,
    /// Set while a notification is being handled.
    handling: Cell<bool>,
    /// Set between an exit request and the page going away.
    exiting: Cell<bool>,
}

impl DepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp of the entry currently shown, as far as the tracker knows.
    pub fn last_seen(&self) -> Depth {
        self.last_seen.get()
    }

    /// Highest stamp issued so far.
    pub fn highest_issued(&self) -> Depth {
        self.highest.get()
    }

    /// Whether a notification is being handled right now.
    pub fn is_handling(&self) -> bool {
        self.handling.get()
    }

    /// Whether an exit was requested and the page has not gone away yet.
    pub fn is_exiting(&self) -> bool {
        self.exiting.get()
    }

    /// Classify a stamp against the last seen depth without recording it.
    pub fn classify(&self, stamp: Depth) -> Direction {
        if stamp <= self.last_seen.get() {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    /// Classify a stamp and make it the last seen depth.
    pub fn observe(&self, stamp: Depth) -> Direction {
        let direction = self.classify(stamp);
        debug_log!(
            "popstate: depth {} -> {} ({:?})",
            self.last_seen.get(),
            stamp,
            direction
        );
        self.last_seen.set(stamp);
        direction
    }

    fn next_stamp(&self) -> Depth {
        self.highest.get().max(self.last_seen.get()).next()
    }

    fn ensure_not_handling(&self, operation: &'static str) -> BackHandlerResult<()> {
        if self.handling.get() {
            warn_log!("{} rejected: back-press dispatch in progress", operation);
            return Err(BackHandlerError::ReentrantNavigation { operation });
        }
        Ok(())
    }

    /// Stamp `state` with the next depth and push it through the host.
    ///
    /// Payloads that cannot take the stamp, or that the host refuses to
    /// store, are replaced by a stamp-only payload. The depth is committed
    /// only once the host accepted the entry.
    pub fn create_entry<H: HistoryHost>(
        &self,
        host: &RefCell<H>,
        key: &str,
        state: H::State,
        title: &str,
        url: Option<&str>,
    ) -> BackHandlerResult<Depth> {
        self.ensure_not_handling("pushState")?;

        let depth = self.next_stamp();
        write_entry(
            host,
            key,
            depth,
            state,
            title,
            url,
            "pushState",
            H::push_state,
        )?;

        self.highest.set(depth);
        self.last_seen.set(depth);
        self.exiting.set(false);
        debug_log!("Pushed entry with depth {}", depth);
        Ok(depth)
    }

    /// Overwrite the current entry, keeping its depth.
    pub fn replace_entry<H: HistoryHost>(
        &self,
        host: &RefCell<H>,
        key: &str,
        state: H::State,
        title: &str,
        url: Option<&str>,
    ) -> BackHandlerResult<Depth> {
        self.ensure_not_handling("replaceState")?;

        let depth = self.last_seen.get();
        write_entry(
            host,
            key,
            depth,
            state,
            title,
            url,
            "replaceState",
            H::replace_state,
        )?;
        debug_log!("Replaced entry at depth {}", depth);
        Ok(depth)
    }

    /// React to the host's notification that the current entry changed.
    pub fn handle_notification<H: HistoryHost>(
        &self,
        host: &RefCell<H>,
        registry: &ListenerRegistry,
        config: &BackHandlerConfig,
    ) -> BackHandlerResult<PopOutcome> {
        self.ensure_not_handling("popstate")?;
        self.handling.set(true);
        let _guard = FlagGuard(&self.handling);

        let stamp = host
            .borrow()
            .current_stamp(config.stamp_key())
            .unwrap_or(Depth::ROOT);
        let direction = self.observe(stamp);

        if direction == Direction::Forward {
            self.exiting.set(false);
            return Ok(PopOutcome::Forward { depth: stamp });
        }

        if !self.exiting.get() {
            let handled = registry.dispatch()?;
            if handled && !self.exiting.get() {
                debug_log!("Back press at depth {} absorbed", stamp);
                logged(host.borrow_mut().forward(), "forward")?;
                return Ok(PopOutcome::Absorbed { depth: stamp });
            }
        }

        if self.exiting.get() {
            info_log!("Leaving the app, stepping back from depth {}", stamp);
            if let Err(err) = logged(host.borrow_mut().back(), "back") {
                self.exiting.set(false);
                return Err(err);
            }
            return Ok(PopOutcome::Exiting { depth: stamp });
        }

        if stamp.is_root() && config.exit_at_root() {
            info_log!("Back pressed on the root entry, leaving the app");
            logged(host.borrow_mut().back(), "back")?;
            return Ok(PopOutcome::Exited);
        }

        Ok(PopOutcome::Propagated { depth: stamp })
    }

    /// Push the synthetic root entry if nothing has been stamped yet.
    ///
    /// Returns the root's depth when it was created.
    pub fn handle_first_interaction<H: HistoryHost>(
        &self,
        host: &RefCell<H>,
        config: &BackHandlerConfig,
    ) -> BackHandlerResult<Option<Depth>> {
        if !config.root_on_first_interaction() || !self.last_seen.get().is_root() {
            return Ok(None);
        }
        let url = host.borrow().current_url();
        let depth = self.create_entry(
            host,
            config.stamp_key(),
            <H::State as StampedState>::empty(),
            "",
            url.as_deref(),
        )?;
        info_log!("Created synthetic root entry at depth {}", depth);
        Ok(Some(depth))
    }

    /// Start leaving the app by stepping back through the host.
    ///
    /// Inside a dispatch the step is deferred until the dispatch finishes.
    /// Every backward notification after that keeps stepping back until the
    /// page goes away.
    pub fn exit<H: HistoryHost>(&self, host: &RefCell<H>) -> BackHandlerResult<()> {
        self.exiting.set(true);
        if self.handling.get() {
            debug_log!("Exit requested during dispatch; deferred");
            return Ok(());
        }
        info_log!("Leaving the app from depth {}", self.last_seen.get());
        let result = logged(host.borrow_mut().back(), "back");
        if result.is_err() {
            self.exiting.set(false);
        }
        result
    }
}
