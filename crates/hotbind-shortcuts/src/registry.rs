//! Shortcut registry with one store per scope
//!
//! Pure bookkeeping: `set` overwrites, `delete` removes, and nothing here
//! touches a collaborator. Callers detach subscriptions before replacing or
//! deleting an entry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::host::SubscriptionId;
use crate::matcher::{ShortcutCallback, ShortcutHandler};
use crate::models::{NormalizedAccelerator, ShortcutOptions, WindowId};

/// Composite key for window-scoped entries
pub type LocalKey = (NormalizedAccelerator, WindowId);

/// A handler attached to one window's key-event stream
#[derive(Debug, Clone)]
pub struct LocalEntry {
    pub handler: Arc<ShortcutHandler>,
    pub window: WindowId,
    pub subscription: SubscriptionId,
}

/// A window-creation hook that applies one accelerator to new windows
#[derive(Clone)]
pub struct OnAllEntry {
    pub subscription: SubscriptionId,
    pub callback: ShortcutCallback,
    pub options: ShortcutOptions,
}

impl std::fmt::Debug for OnAllEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnAllEntry")
            .field("subscription", &self.subscription)
            .field("options", &self.options)
            .finish()
    }
}

/// An OS-level binding
#[derive(Debug, Clone)]
pub struct GlobalEntry {
    pub handler: Arc<ShortcutHandler>,
    /// Accelerator string handed to the capture backend
    pub capture_key: String,
}

/// Registry for active shortcut entries
#[derive(Debug, Default)]
pub struct ShortcutRegistry {
    local: HashMap<LocalKey, LocalEntry>,
    on_all: HashMap<NormalizedAccelerator, OnAllEntry>,
    global: HashMap<NormalizedAccelerator, GlobalEntry>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Local scope

    pub fn get_local(&self, key: &LocalKey) -> Option<&LocalEntry> {
        self.local.get(key)
    }

    /// Store an entry, returning the one it replaced
    pub fn set_local(&mut self, key: LocalKey, entry: LocalEntry) -> Option<LocalEntry> {
        self.local.insert(key, entry)
    }

    pub fn delete_local(&mut self, key: &LocalKey) -> Option<LocalEntry> {
        self.local.remove(key)
    }

    /// Accelerators registered on one window
    pub fn local_accelerators(&self, window: WindowId) -> Vec<NormalizedAccelerator> {
        let mut accelerators: Vec<NormalizedAccelerator> = self
            .local
            .keys()
            .filter(|(_, w)| *w == window)
            .map(|(accelerator, _)| accelerator.clone())
            .collect();
        accelerators.sort();
        accelerators
    }

    /// Remove every entry belonging to one window
    pub fn remove_window(&mut self, window: WindowId) -> Vec<LocalEntry> {
        let keys: Vec<LocalKey> = self
            .local
            .keys()
            .filter(|(_, w)| *w == window)
            .cloned()
            .collect();
        keys.iter().filter_map(|key| self.local.remove(key)).collect()
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    // All-windows scope

    pub fn get_on_all(&self, accelerator: &NormalizedAccelerator) -> Option<&OnAllEntry> {
        self.on_all.get(accelerator)
    }

    pub fn set_on_all(
        &mut self,
        accelerator: NormalizedAccelerator,
        entry: OnAllEntry,
    ) -> Option<OnAllEntry> {
        self.on_all.insert(accelerator, entry)
    }

    pub fn delete_on_all(&mut self, accelerator: &NormalizedAccelerator) -> Option<OnAllEntry> {
        self.on_all.remove(accelerator)
    }

    pub fn on_all_accelerators(&self) -> Vec<NormalizedAccelerator> {
        let mut accelerators: Vec<NormalizedAccelerator> = self.on_all.keys().cloned().collect();
        accelerators.sort();
        accelerators
    }

    // Global scope

    pub fn get_global(&self, accelerator: &NormalizedAccelerator) -> Option<&GlobalEntry> {
        self.global.get(accelerator)
    }

    pub fn set_global(
        &mut self,
        accelerator: NormalizedAccelerator,
        entry: GlobalEntry,
    ) -> Option<GlobalEntry> {
        self.global.insert(accelerator, entry)
    }

    pub fn delete_global(&mut self, accelerator: &NormalizedAccelerator) -> Option<GlobalEntry> {
        self.global.remove(accelerator)
    }

    pub fn global_accelerators(&self) -> Vec<NormalizedAccelerator> {
        let mut accelerators: Vec<NormalizedAccelerator> = self.global.keys().cloned().collect();
        accelerators.sort();
        accelerators
    }

    /// Drain every global entry
    pub fn take_globals(&mut self) -> Vec<(NormalizedAccelerator, GlobalEntry)> {
        self.global.drain().collect()
    }

    /// Empty every store, handing back what was registered
    pub fn drain(&mut self) -> (Vec<LocalEntry>, Vec<OnAllEntry>, Vec<GlobalEntry>) {
        (
            self.local.drain().map(|(_, entry)| entry).collect(),
            self.on_all.drain().map(|(_, entry)| entry).collect(),
            self.global.drain().map(|(_, entry)| entry).collect(),
        )
    }

    /// Check if all three stores are empty
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.on_all.is_empty() && self.global.is_empty()
    }
}
