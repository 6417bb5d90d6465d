//! In-memory collaborators
//!
//! Used by the test suites and by headless embedders that feed key events
//! from their own source.

use std::collections::{BTreeSet, HashMap, HashSet};

use parking_lot::Mutex;

use crate::error::CaptureError;
use crate::host::{GlobalCapture, KeyEventListener, SubscriptionId, WindowHost, WindowListener};
use crate::matcher::ShortcutCallback;
use crate::models::{KeyEventSnapshot, WindowId};
use crate::parser::normalize;

#[derive(Default)]
struct HostState {
    next_window: u64,
    next_subscription: u64,
    windows: BTreeSet<WindowId>,
    key_listeners: HashMap<WindowId, Vec<(SubscriptionId, KeyEventListener)>>,
    created_listeners: Vec<(SubscriptionId, WindowListener)>,
    closed_listeners: Vec<(SubscriptionId, WindowListener)>,
}

impl HostState {
    fn next_subscription(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        SubscriptionId(self.next_subscription)
    }
}

/// Window host backed by plain maps
///
/// Listeners are cloned out of the lock before they run.
#[derive(Default)]
pub struct MockWindowHost {
    state: Mutex<HostState>,
}

impl MockWindowHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a window and notify creation listeners
    pub fn open_window(&self) -> WindowId {
        let (window, listeners) = {
            let mut state = self.state.lock();
            state.next_window += 1;
            let window = WindowId(state.next_window);
            state.windows.insert(window);
            let listeners: Vec<WindowListener> = state
                .created_listeners
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect();
            (window, listeners)
        };

        for listener in listeners {
            listener(window);
        }
        window
    }

    /// Close a window, drop its key listeners and notify close listeners
    pub fn close_window(&self, window: WindowId) {
        let listeners: Vec<WindowListener> = {
            let mut state = self.state.lock();
            if !state.windows.remove(&window) {
                return;
            }
            state.key_listeners.remove(&window);
            state
                .closed_listeners
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect()
        };

        for listener in listeners {
            listener(window);
        }
    }

    /// Deliver a key event to a window, returning how many listeners ran
    pub fn send_key(&self, window: WindowId, snapshot: &KeyEventSnapshot) -> usize {
        let listeners: Vec<KeyEventListener> = self
            .state
            .lock()
            .key_listeners
            .get(&window)
            .map(|listeners| listeners.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        for listener in &listeners {
            listener(snapshot);
        }
        listeners.len()
    }

    pub fn key_listener_count(&self, window: WindowId) -> usize {
        self.state
            .lock()
            .key_listeners
            .get(&window)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn creation_listener_count(&self) -> usize {
        self.state.lock().created_listeners.len()
    }

    pub fn close_listener_count(&self) -> usize {
        self.state.lock().closed_listeners.len()
    }
}

impl WindowHost for MockWindowHost {
    fn windows(&self) -> Vec<WindowId> {
        self.state.lock().windows.iter().copied().collect()
    }

    fn subscribe_key_events(&self, window: WindowId, listener: KeyEventListener) -> SubscriptionId {
        let mut state = self.state.lock();
        let subscription = state.next_subscription();
        state
            .key_listeners
            .entry(window)
            .or_default()
            .push((subscription, listener));
        subscription
    }

    fn unsubscribe_key_events(&self, window: WindowId, subscription: SubscriptionId) {
        let mut state = self.state.lock();
        let now_empty = match state.key_listeners.get_mut(&window) {
            Some(listeners) => {
                listeners.retain(|(id, _)| *id != subscription);
                listeners.is_empty()
            }
            None => false,
        };
        if now_empty {
            state.key_listeners.remove(&window);
        }
    }

    fn subscribe_window_created(&self, listener: WindowListener) -> SubscriptionId {
        let mut state = self.state.lock();
        let subscription = state.next_subscription();
        state.created_listeners.push((subscription, listener));
        subscription
    }

    fn unsubscribe_window_created(&self, subscription: SubscriptionId) {
        self.state
            .lock()
            .created_listeners
            .retain(|(id, _)| *id != subscription);
    }

    fn subscribe_window_closed(&self, listener: WindowListener) -> Option<SubscriptionId> {
        let mut state = self.state.lock();
        let subscription = state.next_subscription();
        state.closed_listeners.push((subscription, listener));
        Some(subscription)
    }

    fn unsubscribe_window_closed(&self, subscription: SubscriptionId) {
        self.state
            .lock()
            .closed_listeners
            .retain(|(id, _)| *id != subscription);
    }
}

/// OS capture stand-in that records bindings
#[derive(Default)]
pub struct MockGlobalCapture {
    bindings: Mutex<HashMap<String, ShortcutCallback>>,
    denied: Mutex<HashSet<String>>,
}

impl MockGlobalCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend another process owns `accelerator`
    pub fn deny(&self, accelerator: &str) {
        self.denied.lock().insert(canonical(accelerator));
    }

    /// Simulate the OS firing a binding; false when nothing is captured
    pub fn trigger(&self, accelerator: &str) -> bool {
        let callback = self.bindings.lock().get(&canonical(accelerator)).cloned();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn is_captured(&self, accelerator: &str) -> bool {
        self.bindings.lock().contains_key(&canonical(accelerator))
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.lock().len()
    }
}

impl GlobalCapture for MockGlobalCapture {
    fn capture(&self, accelerator: &str, callback: ShortcutCallback) -> Result<(), CaptureError> {
        let key = canonical(accelerator);
        if self.denied.lock().contains(&key) {
            return Err(CaptureError::AlreadyRegistered(accelerator.to_string()));
        }
        self.bindings.lock().insert(key, callback);
        Ok(())
    }

    fn release(&self, accelerator: &str) {
        if self.bindings.lock().remove(&canonical(accelerator)).is_none() {
            tracing::warn!(accelerator, "release of an accelerator that was never captured");
        }
    }
}

fn canonical(accelerator: &str) -> String {
    normalize(accelerator)
        .map(|accel| accel.to_string())
        .unwrap_or_else(|_| accelerator.to_string())
}
