//! Shared fixtures for the workspace-level scenario tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hotbind_shortcuts::mock::{MockGlobalCapture, MockWindowHost};
use hotbind_shortcuts::{ManagerConfig, ModifierFlag, Platform, ShortcutManager};

/// Route `tracing` output through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A manager over fresh in-memory collaborators, pinned to one platform
pub fn manager_for(platform: Platform) -> (Arc<MockWindowHost>, Arc<MockGlobalCapture>, ShortcutManager) {
    init_tracing();
    let host = Arc::new(MockWindowHost::new());
    let capture = Arc::new(MockGlobalCapture::new());
    let manager = ShortcutManager::with_config(
        host.clone(),
        capture.clone(),
        ManagerConfig {
            platform,
            cleanup_on_close: true,
        },
    );
    (host, capture, manager)
}

/// A callback paired with the counter it bumps
pub fn counting() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    (hits, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

/// Snapshot flag a user holds for CommandOrControl
pub fn platform_modifier(platform: Platform) -> ModifierFlag {
    match platform {
        Platform::MacOs => ModifierFlag::Meta,
        Platform::Windows | Platform::Linux => ModifierFlag::Control,
    }
}
