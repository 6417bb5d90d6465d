//! Accelerator parsing and normalization
//!
//! Accelerators are `+`-delimited, case-insensitive token lists such as
//! `CmdOrCtrl+Shift+P`. Every token is either a modifier alias from a closed
//! table or the single non-modifier key. Token order does not matter.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{MalformedReason, ParseError};
use crate::models::{Modifier, ModifierFlag, NormalizedAccelerator, Platform};

/// Token delimiter in accelerator strings
pub const DELIMITER: char = '+';

/// Tokens of an accelerator split into modifiers and the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAccelerator<'a> {
    pub modifier_tokens: Vec<&'a str>,
    pub key_token: &'a str,
}

/// Resolve a modifier alias (case-insensitive)
pub fn resolve_modifier(token: &str) -> Option<Modifier> {
    match token.to_lowercase().as_str() {
        "commandorcontrol" | "cmdorctrl" => Some(Modifier::CommandOrControl),
        "control" | "ctrl" => Some(Modifier::Control),
        "command" | "cmd" => Some(Modifier::Command),
        "alt" | "option" | "altgr" => Some(Modifier::Alt),
        "shift" => Some(Modifier::Shift),
        "super" | "meta" => Some(Modifier::Super),
        _ => None,
    }
}

/// Split an accelerator into modifier tokens and its single key token
pub fn parse(raw: &str) -> Result<ParsedAccelerator<'_>, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::malformed(raw, MalformedReason::Empty));
    }

    let mut modifier_tokens = Vec::new();
    let mut key_token: Option<&str> = None;

    for part in raw.split(DELIMITER) {
        let token = part.trim();
        if token.is_empty() {
            return Err(ParseError::malformed(raw, MalformedReason::EmptyToken));
        }

        if resolve_modifier(token).is_some() {
            modifier_tokens.push(token);
            continue;
        }

        if let Some(first) = key_token {
            return Err(ParseError::malformed(
                raw,
                MalformedReason::MultipleKeys {
                    first: first.to_string(),
                    second: token.to_string(),
                },
            ));
        }
        key_token = Some(token);
    }

    let key_token = key_token.ok_or_else(|| ParseError::malformed(raw, MalformedReason::MissingKey))?;

    Ok(ParsedAccelerator {
        modifier_tokens,
        key_token,
    })
}

/// Map modifier tokens to a canonical set, collapsing duplicates
pub fn normalize_modifiers<'a, I>(tokens: I) -> Result<BTreeSet<Modifier>, ParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    let tokens: Vec<&str> = tokens.into_iter().collect();
    let mut modifiers = BTreeSet::new();
    for token in &tokens {
        let modifier = resolve_modifier(token).ok_or_else(|| {
            ParseError::malformed(
                &tokens.join("+"),
                MalformedReason::UnknownModifier(token.to_string()),
            )
        })?;
        modifiers.insert(modifier);
    }
    Ok(modifiers)
}

/// Canonical form of the non-modifier key
///
/// Keys pass through as given apart from lower-casing.
pub fn normalize_non_modifier(token: &str) -> String {
    token.to_lowercase()
}

/// Parse and normalize an accelerator in one step
pub fn normalize(raw: &str) -> Result<NormalizedAccelerator, ParseError> {
    let parsed = parse(raw)?;
    let modifiers = normalize_modifiers(parsed.modifier_tokens.iter().copied())?;
    Ok(NormalizedAccelerator {
        modifiers,
        key: normalize_non_modifier(parsed.key_token),
    })
}

impl FromStr for NormalizedAccelerator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

/// Anything that can be turned into a normalized accelerator
pub trait ToAccelerator {
    fn to_accelerator(&self) -> Result<NormalizedAccelerator, ParseError>;
}

impl ToAccelerator for str {
    fn to_accelerator(&self) -> Result<NormalizedAccelerator, ParseError> {
        normalize(self)
    }
}

impl ToAccelerator for String {
    fn to_accelerator(&self) -> Result<NormalizedAccelerator, ParseError> {
        normalize(self)
    }
}

impl ToAccelerator for NormalizedAccelerator {
    fn to_accelerator(&self) -> Result<NormalizedAccelerator, ParseError> {
        Ok(self.clone())
    }
}

/// Snapshot flag that reports whether `modifier` is held
pub fn modifier_to_snapshot_flag(modifier: Modifier, platform: Platform) -> ModifierFlag {
    match modifier {
        Modifier::CommandOrControl => match platform {
            Platform::MacOs => ModifierFlag::Meta,
            Platform::Windows | Platform::Linux => ModifierFlag::Control,
        },
        Modifier::Control => ModifierFlag::Control,
        Modifier::Command => ModifierFlag::Meta,
        Modifier::Alt => ModifierFlag::Alt,
        Modifier::Shift => ModifierFlag::Shift,
        Modifier::Super => ModifierFlag::Meta,
    }
}
