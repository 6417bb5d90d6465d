//! Declarative keymaps loaded from JSON or YAML
//!
//! # File Format
//!
//! ```json
//! {
//!   "bindings": [
//!     { "accelerator": "CmdOrCtrl+Shift+P", "action": "palette.open", "scope": "all" },
//!     { "accelerator": "Ctrl+W", "action": "window.close", "scope": "local", "window": 1, "strict": true },
//!     { "accelerator": "Alt+Space", "action": "launcher.toggle", "scope": "global" }
//!   ]
//! }
//! ```
//!
//! Actions are names resolved against an [`ActionTable`] when the keymap is
//! applied to a [`ShortcutManager`].

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{KeymapError, ShortcutError};
use crate::manager::{ManagerInner, ShortcutManager};
use crate::matcher::ShortcutCallback;
use crate::models::{NormalizedAccelerator, ShortcutOptions, WindowId};
use crate::parser::normalize;

/// Registration scope of a keymap binding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// One window, named by `window`
    Local,
    /// Every open and future window
    #[default]
    All,
    /// System-wide
    Global,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Local => write!(f, "local"),
            Scope::All => write!(f, "all"),
            Scope::Global => write!(f, "global"),
        }
    }
}

/// One binding in a keymap document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeymapBinding {
    pub accelerator: String,
    pub action: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowId>,
    #[serde(default)]
    pub strict: bool,
}

impl KeymapBinding {
    pub fn new(accelerator: impl Into<String>, action: impl Into<String>, scope: Scope) -> Self {
        KeymapBinding {
            accelerator: accelerator.into(),
            action: action.into(),
            scope,
            window: None,
            strict: false,
        }
    }

    pub fn options(&self) -> ShortcutOptions {
        ShortcutOptions {
            strict: self.strict,
        }
    }
}

/// Where a resolved binding is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Local(WindowId),
    All,
    Global,
}

/// Two or more bindings claiming the same accelerator in the same scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeymapConflict {
    pub accelerator: NormalizedAccelerator,
    pub scope: Scope,
    pub window: Option<WindowId>,
    pub actions: Vec<String>,
}

/// A set of declarative bindings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keymap {
    #[serde(default)]
    pub bindings: Vec<KeymapBinding>,
}

impl Keymap {
    pub fn from_json(content: &str) -> Result<Self, KeymapError> {
        serde_json::from_str(content).map_err(|e| KeymapError::InvalidJson(e.to_string()))
    }

    pub fn from_yaml(content: &str) -> Result<Self, KeymapError> {
        serde_yaml::from_str(content).map_err(|e| KeymapError::InvalidYaml(e.to_string()))
    }

    /// Load a keymap, picking the format from the file extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeymapError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let content = fs::read_to_string(path)?;
        match extension.as_str() {
            "json" => Self::from_json(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            other => Err(KeymapError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Write the keymap as pretty JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), KeymapError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| KeymapError::Serialize(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// `<config dir>/hotbind/keymap.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hotbind").join("keymap.json"))
    }

    /// Parse every accelerator and report duplicate bindings
    pub fn validate(&self) -> Result<Vec<KeymapConflict>, KeymapError> {
        let resolved = self.resolve()?;

        let mut by_slot: HashMap<(NormalizedAccelerator, Scope, Option<WindowId>), Vec<String>> =
            HashMap::new();
        for (binding, accelerator, _) in &resolved {
            by_slot
                .entry((accelerator.clone(), binding.scope, binding.window))
                .or_default()
                .push(binding.action.clone());
        }

        let mut conflicts: Vec<KeymapConflict> = by_slot
            .into_iter()
            .filter(|(_, actions)| actions.len() > 1)
            .map(|((accelerator, scope, window), actions)| KeymapConflict {
                accelerator,
                scope,
                window,
                actions,
            })
            .collect();
        conflicts.sort_by(|a, b| a.accelerator.cmp(&b.accelerator));
        Ok(conflicts)
    }

    fn resolve(&self) -> Result<Vec<(&KeymapBinding, NormalizedAccelerator, Target)>, KeymapError> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| {
                let accelerator = normalize(&binding.accelerator)
                    .map_err(|source| KeymapError::InvalidBinding { index, source })?;
                let target = match (binding.scope, binding.window) {
                    (Scope::Local, Some(window)) => Target::Local(window),
                    (Scope::Local, None) => return Err(KeymapError::MissingWindow { index }),
                    (scope, Some(_)) => return Err(KeymapError::UnexpectedWindow { index, scope }),
                    (Scope::All, None) => Target::All,
                    (Scope::Global, None) => Target::Global,
                };
                Ok((binding, accelerator, target))
            })
            .collect()
    }
}

/// Named callbacks that keymap actions resolve to
#[derive(Default, Clone)]
pub struct ActionTable {
    actions: HashMap<String, ShortcutCallback>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action callback
    pub fn insert<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(callback));
    }

    pub fn get(&self, name: &str) -> Option<ShortcutCallback> {
        self.actions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ShortcutManager {
    /// Register every binding of a keymap
    ///
    /// Accelerators, windows and actions are all checked before the first
    /// registration. A refused global capture, or a window closing while
    /// the keymap is applied, stops the application midway and leaves
    /// earlier bindings registered.
    pub fn apply_keymap(&self, keymap: &Keymap, actions: &ActionTable) -> Result<usize, KeymapError> {
        let resolved = keymap.resolve()?;
        let inner = self.inner();

        let mut planned = Vec::with_capacity(resolved.len());
        for (index, (binding, accelerator, target)) in resolved.into_iter().enumerate() {
            let callback = actions
                .get(&binding.action)
                .ok_or_else(|| KeymapError::UnknownAction {
                    index,
                    action: binding.action.clone(),
                })?;
            if let Target::Local(window) = target {
                if !inner.is_window_open(window) {
                    return Err(ShortcutError::WindowClosed(window).into());
                }
            }
            planned.push((binding, accelerator, target, callback));
        }

        for (binding, accelerator, target, callback) in &planned {
            let callback = Arc::clone(callback);
            match *target {
                Target::Local(window) => {
                    inner.register_local(accelerator, callback, window, binding.options())?
                }
                Target::All => {
                    ManagerInner::register_on_all(inner, accelerator, callback, binding.options())
                }
                Target::Global => inner.register_global(accelerator, callback)?,
            }
        }

        info!(bindings = planned.len(), "applied keymap");
        Ok(planned.len())
    }
}
