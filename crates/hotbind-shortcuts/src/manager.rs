//! Shortcut manager that ties parsing, matching and the registry to the
//! window host and the OS capture backend
//!
//! All registry mutations go through a single lock. Collaborator calls and
//! user callbacks run with the lock released, so a callback may register or
//! unregister shortcuts itself.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ParseError, ShortcutError};
use crate::host::{GlobalCapture, SubscriptionId, WindowHost, WindowListener};
use crate::matcher::{ShortcutCallback, ShortcutHandler};
use crate::models::{NormalizedAccelerator, Platform, ShortcutOptions, WindowId};
use crate::parser::ToAccelerator;
use crate::registry::{GlobalEntry, LocalEntry, OnAllEntry, ShortcutRegistry};

/// Manager-wide configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Decides what `CommandOrControl` resolves to
    pub platform: Platform,
    /// Drop a window's local entries when the host reports it closed
    pub cleanup_on_close: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            platform: Platform::current(),
            cleanup_on_close: true,
        }
    }
}

/// Public entry point for registering shortcuts in every scope
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone)]
pub struct ShortcutManager {
    inner: Arc<ManagerInner>,
}

pub(crate) struct ManagerInner {
    registry: Mutex<ShortcutRegistry>,
    windows: Arc<dyn WindowHost>,
    capture: Arc<dyn GlobalCapture>,
    config: ManagerConfig,
    close_subscription: Mutex<Option<SubscriptionId>>,
    /// Held across a whole global capture or release
    global_slot: Mutex<()>,
}

impl ShortcutManager {
    /// Create a manager with default configuration
    pub fn new(windows: Arc<dyn WindowHost>, capture: Arc<dyn GlobalCapture>) -> Self {
        Self::with_config(windows, capture, ManagerConfig::default())
    }

    /// Create a manager with explicit configuration
    pub fn with_config(
        windows: Arc<dyn WindowHost>,
        capture: Arc<dyn GlobalCapture>,
        config: ManagerConfig,
    ) -> Self {
        let inner = Arc::new(ManagerInner {
            registry: Mutex::new(ShortcutRegistry::new()),
            windows,
            capture,
            config,
            close_subscription: Mutex::new(None),
            global_slot: Mutex::new(()),
        });

        if config.cleanup_on_close {
            let weak = Arc::downgrade(&inner);
            let listener: WindowListener = Arc::new(move |window| {
                if let Some(inner) = weak.upgrade() {
                    inner.forget_window(window);
                }
            });
            let subscription = inner.windows.subscribe_window_closed(listener);
            if subscription.is_none() {
                debug!("window host does not report closed windows; cleanup is manual");
            }
            *inner.close_subscription.lock() = subscription;
        }

        ShortcutManager { inner }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    // Local scope

    /// Register a shortcut on one window
    ///
    /// An existing registration for the same accelerator and window is
    /// fully unregistered first, so exactly one handler stays active.
    /// Fails with [`ShortcutError::WindowClosed`] when the host does not
    /// report `window` as open.
    pub fn register<A, F>(
        &self,
        accelerator: &A,
        callback: F,
        window: WindowId,
        options: ShortcutOptions,
    ) -> Result<(), ShortcutError>
    where
        A: ToAccelerator + ?Sized,
        F: Fn() + Send + Sync + 'static,
    {
        let accelerator = accelerator.to_accelerator()?;
        self.inner
            .register_local(&accelerator, Arc::new(callback), window, options)
    }

    /// Remove a shortcut from one window; no-op when absent
    pub fn unregister<A>(&self, accelerator: &A, window: WindowId) -> Result<(), ShortcutError>
    where
        A: ToAccelerator + ?Sized,
    {
        let accelerator = accelerator.to_accelerator()?;
        self.inner.unregister_local(&accelerator, window);
        Ok(())
    }

    /// Remove every shortcut registered on one window
    pub fn unregister_all(&self, window: WindowId) {
        let entries = self.inner.registry.lock().remove_window(window);
        for entry in &entries {
            self.inner
                .windows
                .unsubscribe_key_events(entry.window, entry.subscription);
        }
        debug!(%window, removed = entries.len(), "unregistered all local shortcuts");
    }

    pub fn is_registered_local<A>(&self, accelerator: &A, window: WindowId) -> bool
    where
        A: ToAccelerator + ?Sized,
    {
        match accelerator.to_accelerator() {
            Ok(accelerator) => self
                .inner
                .registry
                .lock()
                .get_local(&(accelerator, window))
                .is_some(),
            Err(_) => false,
        }
    }

    /// Accelerators currently registered on a window
    pub fn registered_local(&self, window: WindowId) -> Vec<NormalizedAccelerator> {
        self.inner.registry.lock().local_accelerators(window)
    }

    /// Drop a window's entries without detaching them
    ///
    /// Called automatically on window close when the host reports closures.
    pub fn forget_window(&self, window: WindowId) {
        self.inner.forget_window(window);
    }

    // All-windows scope

    /// Register a shortcut on every open window and every window created later
    pub fn register_on_all<A, F>(
        &self,
        accelerator: &A,
        callback: F,
        options: ShortcutOptions,
    ) -> Result<(), ShortcutError>
    where
        A: ToAccelerator + ?Sized,
        F: Fn() + Send + Sync + 'static,
    {
        let accelerator = accelerator.to_accelerator()?;
        ManagerInner::register_on_all(&self.inner, &accelerator, Arc::new(callback), options);
        Ok(())
    }

    /// Remove an all-windows shortcut and unregister it from open windows
    pub fn unregister_on_all<A>(&self, accelerator: &A) -> Result<(), ShortcutError>
    where
        A: ToAccelerator + ?Sized,
    {
        let accelerator = accelerator.to_accelerator()?;
        self.inner.unregister_on_all(&accelerator);
        Ok(())
    }

    pub fn is_registered_on_all<A>(&self, accelerator: &A) -> bool
    where
        A: ToAccelerator + ?Sized,
    {
        match accelerator.to_accelerator() {
            Ok(accelerator) => self.inner.registry.lock().get_on_all(&accelerator).is_some(),
            Err(_) => false,
        }
    }

    pub fn registered_on_all(&self) -> Vec<NormalizedAccelerator> {
        self.inner.registry.lock().on_all_accelerators()
    }

    // Global scope

    /// Capture a shortcut system-wide
    ///
    /// Replaces any earlier global binding for the same accelerator. If the
    /// backend refuses the capture nothing is stored.
    pub fn register_global<A, F>(&self, accelerator: &A, callback: F) -> Result<(), ShortcutError>
    where
        A: ToAccelerator + ?Sized,
        F: Fn() + Send + Sync + 'static,
    {
        let accelerator = accelerator.to_accelerator()?;
        self.inner.register_global(&accelerator, Arc::new(callback))
    }

    /// Release a system-wide shortcut; no-op when absent
    pub fn unregister_global<A>(&self, accelerator: &A) -> Result<(), ShortcutError>
    where
        A: ToAccelerator + ?Sized,
    {
        let accelerator = accelerator.to_accelerator()?;
        self.inner.unregister_global(&accelerator);
        Ok(())
    }

    /// Release every system-wide shortcut owned by this manager
    pub fn unregister_all_global(&self) {
        let _slot = self.inner.global_slot.lock();
        let entries = self.inner.registry.lock().take_globals();
        for (accelerator, entry) in &entries {
            debug!(%accelerator, "releasing global shortcut");
            self.inner.capture.release(&entry.capture_key);
        }
        info!(released = entries.len(), "released all global shortcuts");
    }

    pub fn is_registered_global<A>(&self, accelerator: &A) -> bool
    where
        A: ToAccelerator + ?Sized,
    {
        match accelerator.to_accelerator() {
            Ok(accelerator) => self.inner.registry.lock().get_global(&accelerator).is_some(),
            Err(_) => false,
        }
    }

    pub fn registered_global(&self) -> Vec<NormalizedAccelerator> {
        self.inner.registry.lock().global_accelerators()
    }

    pub(crate) fn inner(&self) -> &Arc<ManagerInner> {
        &self.inner
    }
}

impl ManagerInner {
    pub(crate) fn register_local(
        &self,
        accelerator: &NormalizedAccelerator,
        callback: ShortcutCallback,
        window: WindowId,
        options: ShortcutOptions,
    ) -> Result<(), ShortcutError> {
        if !self.windows.is_open(window) {
            return Err(ShortcutError::WindowClosed(window));
        }
        let key = (accelerator.clone(), window);

        let previous = self.registry.lock().delete_local(&key);
        if let Some(previous) = previous {
            self.windows
                .unsubscribe_key_events(previous.window, previous.subscription);
        }

        let handler = Arc::new(ShortcutHandler::new(
            accelerator.clone(),
            options.strict,
            self.config.platform,
            Some(window),
            callback,
        ));
        let listener_handler = Arc::clone(&handler);
        let subscription = self.windows.subscribe_key_events(
            window,
            Arc::new(move |snapshot| {
                listener_handler.handle(snapshot);
            }),
        );

        let replaced = self.registry.lock().set_local(
            key,
            LocalEntry {
                handler,
                window,
                subscription,
            },
        );
        // Another registration slipped in between the two critical sections
        if let Some(replaced) = replaced {
            self.windows
                .unsubscribe_key_events(replaced.window, replaced.subscription);
        }

        // The close notification may have run before the entry was stored
        if !self.windows.is_open(window) {
            self.unregister_local(accelerator, window);
            return Err(ShortcutError::WindowClosed(window));
        }

        debug!(%accelerator, %window, strict = options.strict, "registered local shortcut");
        Ok(())
    }

    pub(crate) fn is_window_open(&self, window: WindowId) -> bool {
        self.windows.is_open(window)
    }

    pub(crate) fn unregister_local(&self, accelerator: &NormalizedAccelerator, window: WindowId) {
        let removed = self.registry.lock().delete_local(&(accelerator.clone(), window));
        if let Some(entry) = removed {
            self.windows
                .unsubscribe_key_events(entry.window, entry.subscription);
            debug!(%accelerator, %window, "unregistered local shortcut");
        }
    }

    fn forget_window(&self, window: WindowId) {
        let removed = self.registry.lock().remove_window(window);
        if !removed.is_empty() {
            debug!(%window, removed = removed.len(), "dropped shortcuts of closed window");
        }
    }

    pub(crate) fn register_on_all(
        this: &Arc<Self>,
        accelerator: &NormalizedAccelerator,
        callback: ShortcutCallback,
        options: ShortcutOptions,
    ) {
        // Hook first: a window created during enumeration is registered twice,
        // which is harmless because local registration is idempotent.
        let weak: Weak<ManagerInner> = Arc::downgrade(this);
        let hook_accelerator = accelerator.clone();
        let hook_callback = Arc::clone(&callback);
        let subscription = this.windows.subscribe_window_created(Arc::new(move |window| {
            if let Some(inner) = weak.upgrade() {
                if let Err(error) =
                    inner.register_local(&hook_accelerator, Arc::clone(&hook_callback), window, options)
                {
                    debug!(accelerator = %hook_accelerator, %error, "skipped new window");
                }
            }
        }));

        let open_windows = this.windows.windows();
        for window in &open_windows {
            if let Err(error) = this.register_local(accelerator, Arc::clone(&callback), *window, options) {
                debug!(%accelerator, %error, "window closed during registration");
            }
        }

        let previous = this.registry.lock().set_on_all(
            accelerator.clone(),
            OnAllEntry {
                subscription,
                callback,
                options,
            },
        );
        if let Some(previous) = previous {
            this.windows
                .unsubscribe_window_created(previous.subscription);
            debug!(%accelerator, "replaced window-creation hook");
        }

        info!(
            %accelerator,
            windows = open_windows.len(),
            strict = options.strict,
            "registered shortcut on all windows"
        );
    }

    pub(crate) fn unregister_on_all(&self, accelerator: &NormalizedAccelerator) {
        let removed = self.registry.lock().delete_on_all(accelerator);
        if let Some(entry) = removed {
            self.windows.unsubscribe_window_created(entry.subscription);
        }

        let open_windows = self.windows.windows();
        for window in &open_windows {
            self.unregister_local(accelerator, *window);
        }

        info!(%accelerator, windows = open_windows.len(), "unregistered shortcut from all windows");
    }

    pub(crate) fn register_global(
        &self,
        accelerator: &NormalizedAccelerator,
        callback: ShortcutCallback,
    ) -> Result<(), ShortcutError> {
        let _slot = self.global_slot.lock();
        self.release_global(accelerator);

        let handler = Arc::new(ShortcutHandler::new(
            accelerator.clone(),
            false,
            self.config.platform,
            None,
            callback,
        ));
        let capture_key = accelerator.to_string();
        let fire_handler = Arc::clone(&handler);
        let fire: ShortcutCallback = Arc::new(move || {
            debug!(accelerator = %fire_handler.accelerator, "global shortcut fired");
            fire_handler.fire();
        });

        if let Err(source) = self.capture.capture(&capture_key, fire) {
            warn!(%accelerator, error = %source, "global capture refused");
            return Err(ShortcutError::Capture {
                accelerator: capture_key,
                source,
            });
        }

        self.registry.lock().set_global(
            accelerator.clone(),
            GlobalEntry {
                handler,
                capture_key,
            },
        );

        debug!(%accelerator, "registered global shortcut");
        Ok(())
    }

    pub(crate) fn unregister_global(&self, accelerator: &NormalizedAccelerator) {
        let _slot = self.global_slot.lock();
        self.release_global(accelerator);
    }

    fn release_global(&self, accelerator: &NormalizedAccelerator) {
        let removed = self.registry.lock().delete_global(accelerator);
        if let Some(entry) = removed {
            self.capture.release(&entry.capture_key);
            debug!(%accelerator, "unregistered global shortcut");
        }
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        if let Some(subscription) = self.close_subscription.get_mut().take() {
            self.windows.unsubscribe_window_closed(subscription);
        }

        let (local, on_all, global) = self.registry.get_mut().drain();
        for entry in &on_all {
            self.windows.unsubscribe_window_created(entry.subscription);
        }
        for entry in &local {
            self.windows
                .unsubscribe_key_events(entry.window, entry.subscription);
        }
        for entry in &global {
            self.capture.release(&entry.capture_key);
        }

        if !(local.is_empty() && on_all.is_empty() && global.is_empty()) {
            debug!(
                local = local.len(),
                on_all = on_all.len(),
                global = global.len(),
                "released shortcuts of dropped manager"
            );
        }
    }
}

/// Normalize an accelerator without touching any registry
pub fn validate_accelerator(accelerator: &str) -> Result<NormalizedAccelerator, ParseError> {
    accelerator.to_accelerator()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockGlobalCapture, MockWindowHost};
    use crate::models::{KeyEventSnapshot, ModifierFlag};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup() -> (Arc<MockWindowHost>, Arc<MockGlobalCapture>, ShortcutManager) {
        let host = Arc::new(MockWindowHost::new());
        let capture = Arc::new(MockGlobalCapture::new());
        let manager = ShortcutManager::with_config(
            host.clone(),
            capture.clone(),
            ManagerConfig {
                platform: Platform::Linux,
                cleanup_on_close: true,
            },
        );
        (host, capture, manager)
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_register_then_unregister() {
        let (host, _, manager) = setup();
        let window = host.open_window();

        manager
            .register("Ctrl+S", || {}, window, ShortcutOptions::default())
            .unwrap();
        assert!(manager.is_registered_local("ctrl+s", window));
        assert_eq!(host.key_listener_count(window), 1);

        manager.unregister("Control+S", window).unwrap();
        assert!(!manager.is_registered_local("Ctrl+S", window));
        assert_eq!(host.key_listener_count(window), 0);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let (host, _, manager) = setup();
        let window = host.open_window();
        assert!(manager.unregister("Ctrl+S", window).is_ok());
        assert!(manager.unregister_on_all("Ctrl+S").is_ok());
        assert!(manager.unregister_global("Ctrl+S").is_ok());
    }

    #[test]
    fn test_register_twice_keeps_latest_only() {
        let (host, _, manager) = setup();
        let window = host.open_window();
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();

        manager
            .register("Ctrl+S", first_cb, window, ShortcutOptions::default())
            .unwrap();
        manager
            .register("ctrl+s", second_cb, window, ShortcutOptions::default())
            .unwrap();

        assert_eq!(host.key_listener_count(window), 1);
        host.send_key(window, &KeyEventSnapshot::key_down("s").with(ModifierFlag::Control));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_aborts_before_mutation() {
        let (host, capture, manager) = setup();
        let window = host.open_window();

        assert!(matches!(
            manager.register("Ctrl+Shift", || {}, window, ShortcutOptions::default()),
            Err(ShortcutError::Parse(_))
        ));
        assert!(manager.register_on_all("A+B", || {}, ShortcutOptions::default()).is_err());
        assert!(manager.register_global("", || {}).is_err());

        assert_eq!(host.key_listener_count(window), 0);
        assert_eq!(host.creation_listener_count(), 0);
        assert_eq!(capture.binding_count(), 0);
        assert!(manager.registered_local(window).is_empty());
    }

    #[test]
    fn test_callback_may_reenter_manager() {
        let (host, _, manager) = setup();
        let window = host.open_window();
        let reentrant = manager.clone();

        manager
            .register(
                "Escape",
                move || {
                    let _ = reentrant.unregister("Escape", window);
                },
                window,
                ShortcutOptions::default(),
            )
            .unwrap();

        host.send_key(window, &KeyEventSnapshot::key_down("Escape"));
        assert!(!manager.is_registered_local("Escape", window));
    }

    #[test]
    fn test_unregister_all_for_window() {
        let (host, _, manager) = setup();
        let w1 = host.open_window();
        let w2 = host.open_window();
        let options = ShortcutOptions::default();

        manager.register("Ctrl+S", || {}, w1, options).unwrap();
        manager.register("Ctrl+O", || {}, w1, options).unwrap();
        manager.register("Ctrl+S", || {}, w2, options).unwrap();

        manager.unregister_all(w1);
        assert!(manager.registered_local(w1).is_empty());
        assert_eq!(host.key_listener_count(w1), 0);
        assert!(manager.is_registered_local("Ctrl+S", w2));
    }

    #[test]
    fn test_window_close_drops_entries() {
        let (host, _, manager) = setup();
        let window = host.open_window();
        manager
            .register("Ctrl+W", || {}, window, ShortcutOptions::default())
            .unwrap();

        host.close_window(window);
        assert!(!manager.is_registered_local("Ctrl+W", window));
    }

    #[test]
    fn test_close_cleanup_can_be_disabled() {
        let host = Arc::new(MockWindowHost::new());
        let capture = Arc::new(MockGlobalCapture::new());
        let manager = ShortcutManager::with_config(
            host.clone(),
            capture,
            ManagerConfig {
                platform: Platform::Linux,
                cleanup_on_close: false,
            },
        );
        let window = host.open_window();
        manager
            .register("Ctrl+W", || {}, window, ShortcutOptions::default())
            .unwrap();

        host.close_window(window);
        assert!(manager.is_registered_local("Ctrl+W", window));

        manager.forget_window(window);
        assert!(!manager.is_registered_local("Ctrl+W", window));
    }

    #[test]
    fn test_register_on_all_covers_future_windows() {
        let (host, _, manager) = setup();
        let existing = host.open_window();

        manager
            .register_on_all("Ctrl+N", || {}, ShortcutOptions::default())
            .unwrap();
        assert!(manager.is_registered_on_all("ctrl+n"));
        assert!(manager.is_registered_local("Ctrl+N", existing));

        let created = host.open_window();
        assert!(manager.is_registered_local("Ctrl+N", created));
        assert_eq!(host.key_listener_count(created), 1);
    }

    #[test]
    fn test_register_on_all_replaces_hook() {
        let (host, _, manager) = setup();
        let window = host.open_window();
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();

        manager
            .register_on_all("Ctrl+N", first_cb, ShortcutOptions::default())
            .unwrap();
        manager
            .register_on_all("Ctrl+N", second_cb, ShortcutOptions::default())
            .unwrap();
        assert_eq!(host.creation_listener_count(), 1);

        let created = host.open_window();
        let press = KeyEventSnapshot::key_down("n").with(ModifierFlag::Control);
        host.send_key(window, &press);
        host.send_key(created, &press);

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unregister_on_all_stops_propagation() {
        let (host, _, manager) = setup();
        let window = host.open_window();
        manager
            .register_on_all("Ctrl+N", || {}, ShortcutOptions::default())
            .unwrap();

        manager.unregister_on_all("Ctrl+N").unwrap();
        assert!(!manager.is_registered_on_all("Ctrl+N"));
        assert!(!manager.is_registered_local("Ctrl+N", window));
        assert_eq!(host.creation_listener_count(), 0);

        let later = host.open_window();
        assert!(!manager.is_registered_local("Ctrl+N", later));
    }

    #[test]
    fn test_register_global_last_wins() {
        let (_, capture, manager) = setup();
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();

        manager.register_global("Alt+Space", first_cb).unwrap();
        manager.register_global("space+alt", second_cb).unwrap();

        assert_eq!(capture.binding_count(), 1);
        assert!(capture.trigger("Alt+Space"));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert!(manager.is_registered_global("Alt+Space"));
    }

    #[test]
    fn test_global_capture_refused() {
        let (_, capture, manager) = setup();
        capture.deny("Ctrl+Alt+Delete");

        let result = manager.register_global("Ctrl+Alt+Delete", || {});
        assert!(matches!(result, Err(ShortcutError::Capture { .. })));
        assert!(!manager.is_registered_global("Ctrl+Alt+Delete"));
        assert_eq!(capture.binding_count(), 0);
    }

    #[test]
    fn test_unregister_all_global() {
        let (_, capture, manager) = setup();
        manager.register_global("F1", || {}).unwrap();
        manager.register_global("F2", || {}).unwrap();

        manager.unregister_all_global();
        assert!(manager.registered_global().is_empty());
        assert_eq!(capture.binding_count(), 0);
    }

    #[test]
    fn test_queries_on_malformed_are_false() {
        let (host, _, manager) = setup();
        let window = host.open_window();
        assert!(!manager.is_registered_local("A+B", window));
        assert!(!manager.is_registered_on_all(""));
        assert!(!manager.is_registered_global("Ctrl+"));
    }

    #[test]
    fn test_validate_accelerator() {
        assert!(validate_accelerator("CmdOrCtrl+Shift+P").is_ok());
        assert!(validate_accelerator("Ctrl+Shift").is_err());
    }
}
