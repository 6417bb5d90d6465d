//! Core data models for accelerators and key events

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Canonical keyboard modifier
///
/// Ordering is the canonical display order used by [`NormalizedAccelerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Modifier {
    /// Command on macOS, Control everywhere else
    CommandOrControl,
    Control,
    Command,
    Alt,
    Shift,
    Super,
}

impl Modifier {
    /// All canonical modifiers
    pub const ALL: [Modifier; 6] = [
        Modifier::CommandOrControl,
        Modifier::Control,
        Modifier::Command,
        Modifier::Alt,
        Modifier::Shift,
        Modifier::Super,
    ];
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::CommandOrControl => write!(f, "CommandOrControl"),
            Modifier::Control => write!(f, "Control"),
            Modifier::Command => write!(f, "Command"),
            Modifier::Alt => write!(f, "Alt"),
            Modifier::Shift => write!(f, "Shift"),
            Modifier::Super => write!(f, "Super"),
        }
    }
}

/// Modifier state flag carried by a [`KeyEventSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierFlag {
    Control,
    Meta,
    Alt,
    Shift,
}

impl ModifierFlag {
    pub const ALL: [ModifierFlag; 4] = [
        ModifierFlag::Control,
        ModifierFlag::Meta,
        ModifierFlag::Alt,
        ModifierFlag::Shift,
    ];
}

impl fmt::Display for ModifierFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierFlag::Control => write!(f, "control"),
            ModifierFlag::Meta => write!(f, "meta"),
            ModifierFlag::Alt => write!(f, "alt"),
            ModifierFlag::Shift => write!(f, "shift"),
        }
    }
}

/// Host platform, decides what `CommandOrControl` means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(alias = "darwin")]
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    /// Platform the crate was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::current()
    }
}

/// Canonical form of an accelerator string
///
/// Two raw accelerators that differ only in token case or order normalize
/// to equal values, so this type is used directly as a registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedAccelerator {
    pub modifiers: BTreeSet<Modifier>,
    /// Non-modifier key, lower-cased
    pub key: String,
}

impl NormalizedAccelerator {
    pub fn new(modifiers: impl IntoIterator<Item = Modifier>, key: &str) -> Self {
        NormalizedAccelerator {
            modifiers: modifiers.into_iter().collect(),
            key: key.to_lowercase(),
        }
    }

    /// Check whether the accelerator requires the given modifier
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

impl fmt::Display for NormalizedAccelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier)?;
        }
        write!(f, "{}", self.key)
    }
}

/// Key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventType {
    Down,
    Up,
}

/// One key event delivered by the window host, with its modifier state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEventSnapshot {
    pub event_type: KeyEventType,
    pub key: String,
    #[serde(default)]
    pub control: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyEventSnapshot {
    /// Key-down event with no modifiers held
    pub fn key_down(key: impl Into<String>) -> Self {
        KeyEventSnapshot {
            event_type: KeyEventType::Down,
            key: key.into(),
            control: false,
            meta: false,
            alt: false,
            shift: false,
        }
    }

    /// Key-up event with no modifiers held
    pub fn key_up(key: impl Into<String>) -> Self {
        KeyEventSnapshot {
            event_type: KeyEventType::Up,
            ..KeyEventSnapshot::key_down(key)
        }
    }

    /// Mark a modifier flag as held
    pub fn with(mut self, flag: ModifierFlag) -> Self {
        self.set_flag(flag, true);
        self
    }

    pub fn set_flag(&mut self, flag: ModifierFlag, held: bool) {
        match flag {
            ModifierFlag::Control => self.control = held,
            ModifierFlag::Meta => self.meta = held,
            ModifierFlag::Alt => self.alt = held,
            ModifierFlag::Shift => self.shift = held,
        }
    }

    /// Check whether a modifier flag is held
    pub fn is_held(&self, flag: ModifierFlag) -> bool {
        match flag {
            ModifierFlag::Control => self.control,
            ModifierFlag::Meta => self.meta,
            ModifierFlag::Alt => self.alt,
            ModifierFlag::Shift => self.shift,
        }
    }
}

/// Opaque identity of a window owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Per-registration options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShortcutOptions {
    /// Require the held modifier set to equal the accelerator's exactly
    pub strict: bool,
}

impl ShortcutOptions {
    /// Options with strict modifier matching enabled
    pub fn strict() -> Self {
        ShortcutOptions { strict: true }
    }
}
