//! Browser binding over `window.history` (`web` feature).
//!
//! [`BrowserHistory`] implements [`HistoryHost`] with `web_sys::History`, and
//! [`install`] wires the window's `popstate` and first-interaction events to a
//! shared [`BackHandler`].
//!
//! ```ignore
//! use back_handler::{web, BackEvent, Listener};
//!
//! let (handler, _binding) = web::init()?;
//! handler.add_event_listener(BackEvent::HardwareBackPress, Listener::new(|| close_modal()));
//! // keep `_binding` alive for the page lifetime
//! ```

use crate::config::BackHandlerConfig;
use crate::error::{BackHandlerError, BackHandlerResult};
use crate::handler::BackHandler;
use crate::history::HistoryHost;
use crate::state::{Depth, StampedState};
use crate::{error_log, info_log};
use js_sys::{Object, Reflect};
use std::fmt;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, History, Window};

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

// ============================================================================
// JsValue payloads
// ============================================================================

impl StampedState for JsValue {
    fn empty() -> Self {
        JsValue::NULL
    }

    fn try_stamp(self, key: &str, depth: Depth) -> Result<Self, Self> {
        if !self.is_object() || !Object::is_extensible(self.unchecked_ref::<Object>()) {
            return Err(self);
        }
        match Reflect::set(
            &self,
            &JsValue::from_str(key),
            &JsValue::from_f64(depth.get() as f64),
        ) {
            Ok(true) => Ok(self),
            _ => Err(self),
        }
    }

    fn stamped(key: &str, depth: Depth) -> Self {
        let object = Object::new();
        // A fresh plain object always accepts the key.
        let _ = Reflect::set(
            &object,
            &JsValue::from_str(key),
            &JsValue::from_f64(depth.get() as f64),
        );
        object.into()
    }

    fn stamp(&self, key: &str) -> Option<Depth> {
        if !self.is_object() {
            return None;
        }
        Reflect::get(self, &JsValue::from_str(key))
            .ok()?
            .as_f64()
            .filter(|value| value.is_finite() && *value >= 0.0 && value.fract() == 0.0)
            .map(|value| Depth::new(value as u64))
    }
}

// ============================================================================
// BrowserHistory
// ============================================================================

/// `window.history` as a [`HistoryHost`].
#[derive(Debug, Clone)]
pub struct BrowserHistory {
    window: Window,
    history: History,
}

impl BrowserHistory {
    /// Bind to the global window's history.
    pub fn new() -> BackHandlerResult<Self> {
        let window = web_sys::window().ok_or_else(|| BackHandlerError::HistoryUnavailable {
            message: "no global window".to_string(),
        })?;
        let history = window
            .history()
            .map_err(|err| BackHandlerError::HistoryUnavailable {
                message: describe(&err),
            })?;
        Ok(Self { window, history })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl HistoryHost for BrowserHistory {
    type State = JsValue;

    fn push_state(
        &mut self,
        state: JsValue,
        title: &str,
        url: Option<&str>,
    ) -> BackHandlerResult<()> {
        self.history
            .push_state_with_url(&state, title, url)
            .map_err(|err| BackHandlerError::host_rejected("pushState", describe(&err)))
    }

    fn replace_state(
        &mut self,
        state: JsValue,
        title: &str,
        url: Option<&str>,
    ) -> BackHandlerResult<()> {
        self.history
            .replace_state_with_url(&state, title, url)
            .map_err(|err| BackHandlerError::host_rejected("replaceState", describe(&err)))
    }

    fn current_stamp(&self, key: &str) -> Option<Depth> {
        self.history.state().ok()?.stamp(key)
    }

    fn current_url(&self) -> Option<String> {
        self.window.location().href().ok()
    }

    fn go(&mut self, delta: i32) -> BackHandlerResult<()> {
        self.history
            .go_with_delta(delta)
            .map_err(|err| BackHandlerError::host_rejected("go", describe(&err)))
    }

    fn back(&mut self) -> BackHandlerResult<()> {
        self.history
            .back()
            .map_err(|err| BackHandlerError::host_rejected("back", describe(&err)))
    }

    fn forward(&mut self) -> BackHandlerResult<()> {
        self.history
            .forward()
            .map_err(|err| BackHandlerError::host_rejected("forward", describe(&err)))
    }
}

// ============================================================================
// Window event wiring
// ============================================================================

/// Configuration with a stamp key unique to this page load.
pub fn session_config() -> BackHandlerConfig {
    BackHandlerConfig::for_session(js_sys::Date::now() as u64)
}

/// Window listeners installed by [`install`]. Dropping it detaches them.
pub struct BrowserBinding {
    window: Window,
    first_interaction_event: String,
    popstate: Closure<dyn FnMut(Event)>,
    first_interaction: Closure<dyn FnMut(Event)>,
}

impl fmt::Debug for BrowserBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserBinding")
            .field("first_interaction_event", &self.first_interaction_event)
            .finish_non_exhaustive()
    }
}

impl Drop for BrowserBinding {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("popstate", self.popstate.as_ref().unchecked_ref());
        let _ = self.window.remove_event_listener_with_callback(
            &self.first_interaction_event,
            self.first_interaction.as_ref().unchecked_ref(),
        );
    }
}

/// Forward window `popstate` and first-interaction events to `handler`.
pub fn install(handler: Rc<BackHandler<BrowserHistory>>) -> BackHandlerResult<BrowserBinding> {
    let window = handler.host().window().clone();
    let first_interaction_event = handler.config().first_interaction_event().to_string();

    let popstate = {
        let handler = Rc::clone(&handler);
        Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_event: Event| {
            if let Err(err) = handler.handle_popstate() {
                error_log!("popstate handling failed: {}", err);
            }
        }))
    };
    window
        .add_event_listener_with_callback("popstate", popstate.as_ref().unchecked_ref())
        .map_err(|err| BackHandlerError::host_rejected("addEventListener", describe(&err)))?;

    let first_interaction = {
        let handler = Rc::clone(&handler);
        Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_event: Event| {
            if let Err(err) = handler.handle_first_interaction() {
                error_log!("first interaction handling failed: {}", err);
            }
        }))
    };
    if let Err(err) = window.add_event_listener_with_callback(
        &first_interaction_event,
        first_interaction.as_ref().unchecked_ref(),
    ) {
        let _ = window
            .remove_event_listener_with_callback("popstate", popstate.as_ref().unchecked_ref());
        return Err(BackHandlerError::host_rejected(
            "addEventListener",
            describe(&err),
        ));
    }

    info_log!(
        "Back handler listening to popstate and {}",
        first_interaction_event
    );
    Ok(BrowserBinding {
        window,
        first_interaction_event,
        popstate,
        first_interaction,
    })
}

/// Create a handler over `window.history` with a session-scoped stamp key and
/// install it.
pub fn init() -> BackHandlerResult<(Rc<BackHandler<BrowserHistory>>, BrowserBinding)> {
    let handler = Rc::new(BackHandler::with_config(
        BrowserHistory::new()?,
        session_config(),
    ));
    let binding = install(Rc::clone(&handler))?;
    Ok((handler, binding))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use crate::{BackEvent, Listener};
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const KEY: &str = "backHandlerIndex";

    fn object_with_screen() -> Object {
        let object = Object::new();
        Reflect::set(&object, &"screen".into(), &"list".into()).unwrap();
        object
    }

    #[wasm_bindgen_test]
    fn test_plain_object_keeps_fields() {
        let state: JsValue = object_with_screen().into();
        let stamped = state.try_stamp(KEY, Depth::new(3)).unwrap();
        assert_eq!(stamped.stamp(KEY), Some(Depth::new(3)));
        assert_eq!(
            Reflect::get(&stamped, &"screen".into()).unwrap().as_string().as_deref(),
            Some("list")
        );
    }

    #[wasm_bindgen_test]
    fn test_array_keeps_elements() {
        let array = js_sys::Array::of2(&1.into(), &2.into());
        let stamped = JsValue::from(array).try_stamp(KEY, Depth::new(2)).unwrap();
        assert_eq!(stamped.stamp(KEY), Some(Depth::new(2)));
        assert_eq!(stamped.unchecked_ref::<js_sys::Array>().length(), 2);
    }

    #[wasm_bindgen_test]
    fn test_frozen_and_sealed_objects_refused() {
        let frozen: JsValue = Object::freeze(&object_with_screen()).into();
        let sealed: JsValue = Object::seal(&object_with_screen()).into();
        for state in [frozen, sealed] {
            let refused = state.try_stamp(KEY, Depth::new(1)).unwrap_err();
            assert_eq!(refused.stamp(KEY), None);
        }
        assert_eq!(JsValue::stamped(KEY, Depth::new(1)).stamp(KEY), Some(Depth::new(1)));
    }

    #[wasm_bindgen_test]
    fn test_primitives_refused() {
        for state in [JsValue::from_f64(3.5), JsValue::NULL, JsValue::from_str("text")] {
            assert!(state.try_stamp(KEY, Depth::new(1)).is_err());
        }
    }

    #[wasm_bindgen_test]
    fn test_stamp_ignores_non_depth_values() {
        for value in [JsValue::from_str("x"), JsValue::from_f64(-1.0), JsValue::from_f64(1.5)] {
            let object = Object::new();
            Reflect::set(&object, &KEY.into(), &value).unwrap();
            assert_eq!(JsValue::from(object).stamp(KEY), None);
        }
        assert_eq!(JsValue::from_f64(2.0).stamp(KEY), None);
    }

    #[wasm_bindgen_test]
    fn test_install_and_drop() {
        let handler = Rc::new(BackHandler::with_config(
            BrowserHistory::new().unwrap(),
            session_config(),
        ));
        let presses = Rc::new(Cell::new(0));
        {
            let presses = Rc::clone(&presses);
            handler.add_event_listener(
                BackEvent::HardwareBackPress,
                Listener::new(move || {
                    presses.set(presses.get() + 1);
                    false
                }),
            );
        }
        let binding = install(Rc::clone(&handler)).unwrap();
        assert!(format!("{:?}", binding).contains("focusin"));
        let window = handler.host().window().clone();

        window.dispatch_event(&Event::new("focusin").unwrap()).unwrap();
        assert_eq!(handler.last_seen(), Depth::new(1));

        // Same entry again: a duplicate notification reaches the listener.
        window.dispatch_event(&Event::new("popstate").unwrap()).unwrap();
        assert_eq!(presses.get(), 1);

        drop(binding);
        window.dispatch_event(&Event::new("popstate").unwrap()).unwrap();
        assert_eq!(presses.get(), 1);
    }
}
