//! Back-press listeners and the registry that dispatches to them.
//!
//! Listeners are tried newest first: the last screen to register is the one
//! on top of the app's navigation stack, so it gets the first chance to
//! consume the gesture. Dispatch stops at the first listener that reports
//! [`BackPressOutcome::Handled`].
//!
//! # Example
//!
//! ```
//! use back_handler::{Listener, ListenerRegistry};
//!
//! let registry = ListenerRegistry::new();
//! let close_modal = Listener::new(|| true);
//! let subscription = registry.register(close_modal);
//!
//! assert_eq!(registry.dispatch(), Ok(true));
//! subscription.remove();
//! assert_eq!(registry.dispatch(), Ok(false));
//! ```
//!
//! # Re-entrancy
//!
//! A dispatch iterates over a snapshot of the registry. Listeners may add or
//! remove listeners while running; the change applies from the next dispatch
//! on. Starting another dispatch from inside a listener is unsupported and is
//! rejected with [`BackHandlerError::ReentrantDispatch`].

use crate::error::{BackHandlerError, BackHandlerResult};
use crate::{trace_log, warn_log};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

// ============================================================================
// BackPressOutcome
// ============================================================================

/// What a listener made of a back press.
///
/// Only [`Handled`](Self::Handled) claims the gesture. `NotHandled` and
/// `Unset` both let dispatch continue to the next listener; `Unset` exists for
/// listeners that have no opinion (the `()` return).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackPressOutcome {
    /// The listener consumed the back press.
    Handled,
    /// The listener looked at the back press and declined it.
    NotHandled,
    /// The listener returned nothing.
    #[default]
    Unset,
}

impl BackPressOutcome {
    /// Whether the back press was claimed.
    pub fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

impl From<bool> for BackPressOutcome {
    fn from(handled: bool) -> Self {
        if handled {
            Self::Handled
        } else {
            Self::NotHandled
        }
    }
}

impl From<Option<bool>> for BackPressOutcome {
    fn from(handled: Option<bool>) -> Self {
        handled.map_or(Self::Unset, Self::from)
    }
}

impl From<()> for BackPressOutcome {
    fn from((): ()) -> Self {
        Self::Unset
    }
}

// ============================================================================
// Listener
// ============================================================================

/// A back-press callback.
///
/// Cloning a `Listener` clones the handle, not the closure. Two handles are
/// equal when they point at the same closure, which is how
/// [`ListenerRegistry::unregister`] finds the entry to remove.
#[derive(Clone)]
pub struct Listener {
    callback: Rc<dyn Fn() -> BackPressOutcome>,
}

impl Listener {
    /// Wrap a closure returning `bool`, `Option<bool>`, `()` or
    /// [`BackPressOutcome`].
    pub fn new<F, R>(callback: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: Into<BackPressOutcome>,
    {
        Self {
            callback: Rc::new(move || callback().into()),
        }
    }

    /// Invoke the callback.
    pub fn call(&self) -> BackPressOutcome {
        (self.callback)()
    }

    /// Whether both handles refer to the same closure.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("callback", &Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

// ============================================================================
// ListenerRegistry
// ============================================================================

#[derive(Default)]
struct RegistryInner {
    listeners: RefCell<Vec<Listener>>,
    dispatching: Cell<bool>,
}

impl RegistryInner {
    fn unregister(&self, listener: &Listener) -> bool {
        if self.dispatching.get() {
            warn_log!("Listener removed during dispatch; takes effect on the next back press");
        }
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|l| l.ptr_eq(listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Resets the dispatching flag even if a listener panics.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Ordered collection of back-press listeners, newest first.
#[derive(Default)]
pub struct ListenerRegistry {
    inner: Rc<RegistryInner>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener in front of every existing one.
    pub fn register(&self, listener: Listener) -> Subscription {
        if self.inner.dispatching.get() {
            warn_log!("Listener registered during dispatch; takes effect on the next back press");
        }
        self.inner.listeners.borrow_mut().insert(0, listener.clone());
        trace_log!(
            "Registered back-press listener ({} total)",
            self.inner.listeners.borrow().len()
        );
        Subscription {
            registry: Rc::downgrade(&self.inner),
            listener,
        }
    }

    /// Remove the first registration of `listener`.
    ///
    /// Returns `false` when the listener was not registered; that is not an
    /// error.
    pub fn unregister(&self, listener: &Listener) -> bool {
        self.inner.unregister(listener)
    }

    /// Offer the back press to each listener in turn until one claims it.
    pub fn dispatch(&self) -> BackHandlerResult<bool> {
        if self.inner.dispatching.replace(true) {
            warn_log!("Nested back-press dispatch rejected");
            return Err(BackHandlerError::ReentrantDispatch);
        }
        let _guard = DispatchGuard(&self.inner.dispatching);

        let snapshot = self.inner.listeners.borrow().clone();
        for (position, listener) in snapshot.iter().enumerate() {
            let outcome = listener.call();
            trace_log!("Listener #{} returned {:?}", position, outcome);
            if outcome.is_handled() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.inner.listeners.borrow_mut().clear();
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.listeners.borrow().is_empty()
    }

    /// Whether a dispatch is running right now.
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.get()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .field("dispatching", &self.is_dispatching())
            .finish()
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle returned by [`ListenerRegistry::register`].
///
/// Dropping the handle keeps the listener registered; call
/// [`remove`](Self::remove) to take it out.
#[derive(Debug, Clone)]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    listener: Listener,
}

impl Subscription {
    /// Unregister the listener this subscription was created for.
    ///
    /// Calling it twice, or after the registry is gone, does nothing.
    pub fn remove(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.unregister(&self.listener))
    }

    /// The subscribed listener.
    pub fn listener(&self) -> &Listener {
        &self.listener
    }
}

// ============================================================================
// Tests
// ============================================================================
