//! Test utilities for back-handler integration tests
//!
//! Provides a memory-backed handler, notification pumping and recording
//! listeners.

#![allow(dead_code)]

use back_handler::*;
use std::cell::RefCell;
use std::rc::Rc;

/// Route crate logs to the test harness (`RUST_LOG=back_handler=trace`).
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Handler over a fresh memory history at `/`.
pub fn memory_handler() -> BackHandler<MemoryHistory> {
    init_logging();
    BackHandler::new(MemoryHistory::new("/"))
}

/// Handler with the synthetic root entry and one pushed screen per url.
pub fn handler_with_screens(urls: &[&str]) -> BackHandler<MemoryHistory> {
    let handler = memory_handler();
    handler
        .handle_first_interaction()
        .expect("root entry should be created");
    for url in urls {
        handler
            .push_state(EntryState::null(), "", Some(url))
            .expect("push should succeed");
    }
    handler.host_mut().clear_calls();
    handler
}

/// Deliver every queued notification to the handler.
pub fn settle(handler: &BackHandler<MemoryHistory>) -> Vec<PopOutcome> {
    let mut outcomes = Vec::new();
    loop {
        let pending = handler.host_mut().take_notification();
        if !pending {
            return outcomes;
        }
        outcomes.push(handler.handle_popstate().expect("popstate should succeed"));
    }
}

/// Simulate the browser back button and deliver the resulting notifications.
pub fn press_back(handler: &BackHandler<MemoryHistory>) -> Vec<PopOutcome> {
    let moved = handler.host_mut().press_back();
    assert!(moved, "back button had nowhere to go");
    settle(handler)
}

/// Simulate the browser forward button and deliver the resulting notifications.
pub fn press_forward(handler: &BackHandler<MemoryHistory>) -> Vec<PopOutcome> {
    let moved = handler.host_mut().press_forward();
    assert!(moved, "forward button had nowhere to go");
    settle(handler)
}

/// Deltas of every `go` call the handler made.
pub fn go_calls(handler: &BackHandler<MemoryHistory>) -> Vec<i32> {
    handler
        .host()
        .calls()
        .iter()
        .filter_map(|call| match call {
            HostCall::Go(delta) => Some(*delta),
            _ => None,
        })
        .collect()
}

pub fn current_url(handler: &BackHandler<MemoryHistory>) -> String {
    handler.host().current_entry().url.clone()
}

pub type CallLog = Rc<RefCell<Vec<&'static str>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Listener that records `name` and returns `handled`.
pub fn recording_listener(log: &CallLog, name: &'static str, handled: bool) -> Listener {
    let log = Rc::clone(log);
    Listener::new(move || {
        log.borrow_mut().push(name);
        handled
    })
}
