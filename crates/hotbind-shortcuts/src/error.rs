//! Error types for shortcut operations

use std::fmt;

use thiserror::Error;

use crate::keymap::Scope;
use crate::models::WindowId;

/// Why an accelerator string was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// The accelerator was empty or only whitespace
    Empty,
    /// A `+`-separated token was empty (e.g. `Ctrl++A`)
    EmptyToken,
    /// Every token resolved to a modifier
    MissingKey,
    /// More than one token resolved to a non-modifier key
    MultipleKeys { first: String, second: String },
    /// A token passed as a modifier is not in the alias table
    UnknownModifier(String),
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::Empty => write!(f, "accelerator is empty"),
            MalformedReason::EmptyToken => write!(f, "accelerator contains an empty token"),
            MalformedReason::MissingKey => write!(f, "accelerator has no non-modifier key"),
            MalformedReason::MultipleKeys { first, second } => {
                write!(f, "accelerator has more than one key ('{}' and '{}')", first, second)
            }
            MalformedReason::UnknownModifier(token) => write!(f, "unknown modifier '{}'", token),
        }
    }
}

/// Errors that can occur while parsing an accelerator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Malformed accelerator '{accelerator}': {reason}")]
    MalformedAccelerator {
        accelerator: String,
        reason: MalformedReason,
    },
}

impl ParseError {
    pub(crate) fn malformed(accelerator: &str, reason: MalformedReason) -> Self {
        ParseError::MalformedAccelerator {
            accelerator: accelerator.to_string(),
            reason,
        }
    }

    /// The reason the accelerator was rejected
    pub fn reason(&self) -> &MalformedReason {
        match self {
            ParseError::MalformedAccelerator { reason, .. } => reason,
        }
    }
}

/// Errors reported by an OS-level global capture backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Accelerator already owned by another process: {0}")]
    AlreadyRegistered(String),

    #[error("Global capture is not supported on this platform")]
    Unsupported,

    #[error("Capture backend error: {0}")]
    Backend(String),
}

/// Errors returned by the shortcut manager
#[derive(Debug, Error)]
pub enum ShortcutError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to capture global accelerator '{accelerator}': {source}")]
    Capture {
        accelerator: String,
        #[source]
        source: CaptureError,
    },

    #[error("{0} is not open")]
    WindowClosed(WindowId),
}

/// Errors that can occur while loading or applying a keymap
#[derive(Debug, Error)]
pub enum KeymapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON keymap: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML keymap: {0}")]
    InvalidYaml(String),

    #[error("Failed to serialize keymap: {0}")]
    Serialize(String),

    #[error("Unsupported keymap format: {0}")]
    UnsupportedFormat(String),

    #[error("Binding {index} references unknown action '{action}'")]
    UnknownAction { index: usize, action: String },

    #[error("Binding {index} in local scope has no window")]
    MissingWindow { index: usize },

    #[error("Binding {index} in {scope} scope names a window")]
    UnexpectedWindow { index: usize, scope: Scope },

    #[error("Binding {index}: {source}")]
    InvalidBinding {
        index: usize,
        #[source]
        source: ParseError,
    },

    #[error("Shortcut error: {0}")]
    Shortcut(#[from] ShortcutError),
}
