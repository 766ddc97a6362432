//! History entry payloads and the depth stamps attached to them.
//!
//! Every entry pushed through the back handler carries a [`Depth`] inside its
//! state payload, stored under a reserved key. Payloads that cannot take an
//! extra key (primitives, `null`, frozen objects) are replaced by a minimal
//! object holding only the stamp, so the depth survives even when the caller's
//! data does not.
//!
//! ```
//! use back_handler::{Depth, EntryState, StampedState};
//! use serde_json::json;
//!
//! let state = EntryState::new(json!({ "screen": "settings" }));
//! let stamped = state.try_stamp("backHandlerIndex", Depth::new(3)).unwrap();
//! assert_eq!(stamped.stamp("backHandlerIndex"), Some(Depth::new(3)));
//!
//! let frozen = EntryState::frozen(json!({ "screen": "settings" }));
//! assert!(frozen.try_stamp("backHandlerIndex", Depth::new(3)).is_err());
//! ```

use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// Depth
// ============================================================================

/// Position of a history entry in the app's synthetic navigation stack.
///
/// [`Depth::ROOT`] is what unstamped entries read as: entries created before
/// the handler took over, or by code that bypassed it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Depth(u64);

impl Depth {
    /// Depth of unstamped entries.
    pub const ROOT: Self = Self(0);

    /// Wrap a raw depth value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw depth value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the root sentinel.
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }

    /// The depth following this one.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u64> for Depth {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// StampedState
// ============================================================================

/// A history state payload that can carry a depth stamp.
///
/// Implemented by [`EntryState`] for in-memory hosts and by
/// `wasm_bindgen::JsValue` when the `web` feature is enabled.
pub trait StampedState: Sized {
    /// Payload used for entries the handler creates itself.
    fn empty() -> Self;

    /// Attach `depth` under `key`, keeping the rest of the payload.
    ///
    /// Hands the payload back unchanged in `Err` when it cannot be extended.
    fn try_stamp(self, key: &str, depth: Depth) -> Result<Self, Self>;

    /// A payload holding nothing but the stamp.
    fn stamped(key: &str, depth: Depth) -> Self;

    /// Read the stamp stored under `key`, if any.
    fn stamp(&self, key: &str) -> Option<Depth>;
}

/// Stamp `state`, falling back to a stamp-only payload.
///
/// The second value reports whether the caller's payload was discarded.
pub fn stamp_or_replace<S: StampedState>(state: S, key: &str, depth: Depth) -> (S, bool) {
    match state.try_stamp(key, depth) {
        Ok(stamped) => (stamped, false),
        Err(_) => (S::stamped(key, depth), true),
    }
}

// ============================================================================
// EntryState
// ============================================================================

/// JSON entry payload for in-memory history hosts.
///
/// The `frozen` flag models objects that refuse new keys, and the
/// `uncloneable` flag models payloads a browser cannot copy into history
/// (objects holding functions or DOM nodes); [`MemoryHistory`] rejects those.
///
/// Only JSON objects take a stamp. A JSON array has nowhere to put a key, so
/// array payloads are replaced by a stamp-only payload here, whereas a JS
/// array pushed through the browser binding carries the stamp as an extra
/// property and keeps its elements.
///
/// [`MemoryHistory`]: crate::MemoryHistory
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryState {
    value: Value,
    frozen: bool,
    uncloneable: bool,
}

impl EntryState {
    /// Mutable payload.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Payload that refuses new keys.
    pub fn frozen(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            frozen: true,
            ..Self::default()
        }
    }

    /// Mutable payload that history hosts refuse to store.
    pub fn uncloneable(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            uncloneable: true,
            ..Self::default()
        }
    }

    /// The `null` payload.
    pub fn null() -> Self {
        Self::default()
    }

    /// Underlying JSON value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether new keys are refused.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether a history host can store the payload.
    pub fn is_cloneable(&self) -> bool {
        !self.uncloneable
    }

    /// Consume the payload and return its JSON value.
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl From<Value> for EntryState {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl StampedState for EntryState {
    fn empty() -> Self {
        Self::null()
    }

    fn try_stamp(mut self, key: &str, depth: Depth) -> Result<Self, Self> {
        if self.frozen {
            return Err(self);
        }
        match &mut self.value {
            Value::Object(fields) => {
                fields.insert(key.to_string(), Value::from(depth.get()));
                Ok(self)
            }
            _ => Err(self),
        }
    }

    fn stamped(key: &str, depth: Depth) -> Self {
        let mut fields = Map::new();
        fields.insert(key.to_string(), Value::from(depth.get()));
        Self::new(Value::Object(fields))
    }

    fn stamp(&self, key: &str) -> Option<Depth> {
        self.value.get(key).and_then(Value::as_u64).map(Depth::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "backHandlerIndex";

    #[test]
    fn test_depth_ordering() {
        assert!(Depth::ROOT.is_root());
        assert_eq!(Depth::ROOT.next(), Depth::new(1));
        assert!(Depth::new(2) > Depth::new(1));
        assert_eq!(Depth::new(u64::MAX).next(), Depth::new(u64::MAX));
        assert_eq!(Depth::new(7).to_string(), "7");
    }

    #[test]
    fn test_object_keeps_fields() {
        let state = EntryState::new(json!({ "screen": "inbox" }));
        let stamped = state.try_stamp(KEY, Depth::new(4)).unwrap();
        assert_eq!(stamped.value()["screen"], "inbox");
        assert_eq!(stamped.stamp(KEY), Some(Depth::new(4)));
    }

    #[test]
    fn test_restamp_overwrites() {
        let state = EntryState::stamped(KEY, Depth::new(1));
        let stamped = state.try_stamp(KEY, Depth::new(2)).unwrap();
        assert_eq!(stamped.stamp(KEY), Some(Depth::new(2)));
    }

    #[test]
    fn test_non_extensible_payloads_refused() {
        for state in [
            EntryState::null(),
            EntryState::new(json!(42)),
            EntryState::new(json!("screen")),
            EntryState::new(json!([1, 2])),
            EntryState::frozen(json!({ "screen": "inbox" })),
        ] {
            let original = state.clone();
            assert_eq!(state.try_stamp(KEY, Depth::new(1)), Err(original));
        }
    }

    #[test]
    fn test_stamp_keeps_uncloneable_flag() {
        let state = EntryState::uncloneable(json!({ "node": "div" }));
        let stamped = state.try_stamp(KEY, Depth::new(1)).unwrap();
        assert!(!stamped.is_cloneable());
        assert!(EntryState::stamped(KEY, Depth::new(1)).is_cloneable());
    }

    #[test]
    fn test_stamp_or_replace() {
        let (state, replaced) =
            stamp_or_replace(EntryState::new(json!({ "a": 1 })), KEY, Depth::new(2));
        assert!(!replaced);
        assert_eq!(state.value()["a"], 1);

        let (state, replaced) = stamp_or_replace(EntryState::new(json!(5)), KEY, Depth::new(3));
        assert!(replaced);
        assert_eq!(state.value(), &json!({ "backHandlerIndex": 3 }));
    }

    #[test]
    fn test_missing_or_foreign_stamp() {
        assert_eq!(EntryState::null().stamp(KEY), None);
        assert_eq!(EntryState::new(json!({ "backHandlerIndex": "x" })).stamp(KEY), None);
        assert_eq!(EntryState::stamped("other", Depth::new(1)).stamp(KEY), None);
    }
}
