//! Keyboard shortcuts bound to accelerator strings in three scopes
//!
//! This crate provides:
//! - Accelerator parsing and normalization (`CmdOrCtrl+Shift+P`)
//! - Key-event matching with strict and non-strict modifier semantics
//! - A registry for window-local, all-windows and OS-global shortcuts
//! - A manager that keeps registrations idempotent and follows new windows
//! - Declarative keymaps loaded from JSON or YAML
//!
//! The crate does not capture input itself. Key events, window lifecycle and
//! OS hotkeys come from the [`WindowHost`] and [`GlobalCapture`] traits.
//!
//! ```
//! use std::sync::Arc;
//! use hotbind_shortcuts::mock::{MockGlobalCapture, MockWindowHost};
//! use hotbind_shortcuts::{KeyEventSnapshot, ModifierFlag, ShortcutManager, ShortcutOptions};
//!
//! let host = Arc::new(MockWindowHost::new());
//! let manager = ShortcutManager::new(host.clone(), Arc::new(MockGlobalCapture::new()));
//!
//! let window = host.open_window();
//! manager.register("Ctrl+Shift+A", || println!("fired"), window, ShortcutOptions::default())?;
//! assert!(manager.is_registered_local("shift+ctrl+a", window));
//! # Ok::<(), hotbind_shortcuts::ShortcutError>(())
//! ```

pub mod error;
pub mod host;
pub mod keymap;
pub mod manager;
pub mod matcher;
pub mod mock;
pub mod models;
pub mod parser;
pub mod registry;

// Re-export public types
pub use error::{CaptureError, KeymapError, MalformedReason, ParseError, ShortcutError};
pub use host::{GlobalCapture, KeyEventListener, SubscriptionId, WindowHost, WindowListener};
pub use keymap::{ActionTable, Keymap, KeymapBinding, KeymapConflict, Scope};
pub use manager::{validate_accelerator, ManagerConfig, ShortcutManager};
pub use matcher::{matches, ShortcutCallback, ShortcutHandler};
pub use models::{
    KeyEventSnapshot, KeyEventType, Modifier, ModifierFlag, NormalizedAccelerator, Platform,
    ShortcutOptions, WindowId,
};
pub use parser::{normalize, ToAccelerator};
pub use registry::ShortcutRegistry;
