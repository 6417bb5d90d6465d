//! Key-event matching against normalized accelerators

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::models::{
    KeyEventSnapshot, KeyEventType, ModifierFlag, NormalizedAccelerator, Platform, WindowId,
};
use crate::parser::modifier_to_snapshot_flag;

/// Callback fired when a shortcut matches
pub type ShortcutCallback = Arc<dyn Fn() + Send + Sync>;

/// Snapshot flags that must be held for `accelerator`
pub fn required_flags(accelerator: &NormalizedAccelerator, platform: Platform) -> BTreeSet<ModifierFlag> {
    accelerator
        .modifiers
        .iter()
        .map(|modifier| modifier_to_snapshot_flag(*modifier, platform))
        .collect()
}

/// Decide whether a key event triggers `accelerator`
///
/// Key-up events never match. In non-strict mode extra held modifiers are
/// ignored; in strict mode the held set must equal the required set.
pub fn matches(
    snapshot: &KeyEventSnapshot,
    accelerator: &NormalizedAccelerator,
    strict: bool,
    platform: Platform,
) -> bool {
    if snapshot.event_type == KeyEventType::Up {
        return false;
    }

    if snapshot.key.to_lowercase() != accelerator.key {
        return false;
    }

    let required = required_flags(accelerator, platform);
    if !required.iter().all(|flag| snapshot.is_held(*flag)) {
        return false;
    }

    if strict {
        return ModifierFlag::ALL
            .iter()
            .filter(|flag| !required.contains(*flag))
            .all(|flag| !snapshot.is_held(*flag));
    }

    true
}

/// A callback bound to one normalized accelerator
///
/// This is the record the registry stores and the window host invokes for
/// every delivered key event.
#[derive(Clone)]
pub struct ShortcutHandler {
    pub accelerator: NormalizedAccelerator,
    pub strict: bool,
    pub platform: Platform,
    /// Window the handler is attached to; `None` for global bindings
    pub window: Option<WindowId>,
    callback: ShortcutCallback,
}

impl ShortcutHandler {
    pub fn new(
        accelerator: NormalizedAccelerator,
        strict: bool,
        platform: Platform,
        window: Option<WindowId>,
        callback: ShortcutCallback,
    ) -> Self {
        ShortcutHandler {
            accelerator,
            strict,
            platform,
            window,
            callback,
        }
    }

    /// Run the matcher and fire the callback on a match
    pub fn handle(&self, snapshot: &KeyEventSnapshot) -> bool {
        if !matches(snapshot, &self.accelerator, self.strict, self.platform) {
            return false;
        }

        tracing::debug!(
            accelerator = %self.accelerator,
            window = ?self.window,
            "shortcut matched"
        );
        (self.callback)();
        true
    }

    /// Fire the callback without matching (OS-level bindings)
    pub fn fire(&self) {
        (self.callback)();
    }
}

impl fmt::Debug for ShortcutHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutHandler")
            .field("accelerator", &self.accelerator)
            .field("strict", &self.strict)
            .field("platform", &self.platform)
            .field("window", &self.window)
            .finish()
    }
}
