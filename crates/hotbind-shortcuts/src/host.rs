//! Collaborator interfaces
//!
//! The crate never talks to a windowing system or the OS directly. A
//! [`WindowHost`] delivers key events and window lifecycle notifications,
//! and a [`GlobalCapture`] owns OS-level hotkeys. Both are implemented by the
//! embedding application; [`crate::mock`] has in-memory versions.

use std::fmt;
use std::sync::Arc;

use crate::error::CaptureError;
use crate::matcher::ShortcutCallback;
use crate::models::{KeyEventSnapshot, WindowId};

/// Handle returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Listener for a window's key events
pub type KeyEventListener = Arc<dyn Fn(&KeyEventSnapshot) + Send + Sync>;

/// Listener for window lifecycle notifications
pub type WindowListener = Arc<dyn Fn(WindowId) + Send + Sync>;

/// Source of windows and their key events
///
/// Implementations must not hold internal locks while invoking listeners:
/// listeners may call back into the shortcut manager.
pub trait WindowHost: Send + Sync {
    /// All currently open windows
    fn windows(&self) -> Vec<WindowId>;

    /// Whether a window is currently open
    fn is_open(&self, window: WindowId) -> bool {
        self.windows().contains(&window)
    }

    /// Attach a listener to one window's key-event stream
    fn subscribe_key_events(&self, window: WindowId, listener: KeyEventListener) -> SubscriptionId;

    /// Detach a key-event listener
    fn unsubscribe_key_events(&self, window: WindowId, subscription: SubscriptionId);

    /// Attach a process-wide "window created" listener
    fn subscribe_window_created(&self, listener: WindowListener) -> SubscriptionId;

    /// Detach a "window created" listener
    fn unsubscribe_window_created(&self, subscription: SubscriptionId);

    /// Attach a "window closed" listener, if the host reports closures
    fn subscribe_window_closed(&self, _listener: WindowListener) -> Option<SubscriptionId> {
        None
    }

    /// Detach a "window closed" listener
    fn unsubscribe_window_closed(&self, _subscription: SubscriptionId) {}
}

/// OS-level exclusive hotkey capture
///
/// Best effort: the OS may refuse a binding owned by another process.
/// `capture` must not invoke the callback before it returns.
pub trait GlobalCapture: Send + Sync {
    /// Capture `accelerator` system-wide and fire `callback` when pressed
    fn capture(&self, accelerator: &str, callback: ShortcutCallback) -> Result<(), CaptureError>;

    /// Release a previously captured accelerator
    fn release(&self, accelerator: &str);
}
