//! Property-based tests for accelerator normalization and matching

use proptest::prelude::*;
use hotbind_shortcuts::parser::modifier_to_snapshot_flag;
use hotbind_shortcuts::*;

/// Alias spellings for each canonical modifier
fn alias_strategy() -> impl Strategy<Value = (&'static str, Modifier)> {
    prop_oneof![
        Just(("CommandOrControl", Modifier::CommandOrControl)),
        Just(("CmdOrCtrl", Modifier::CommandOrControl)),
        Just(("Control", Modifier::Control)),
        Just(("Ctrl", Modifier::Control)),
        Just(("Command", Modifier::Command)),
        Just(("Cmd", Modifier::Command)),
        Just(("Alt", Modifier::Alt)),
        Just(("Option", Modifier::Alt)),
        Just(("AltGr", Modifier::Alt)),
        Just(("Shift", Modifier::Shift)),
        Just(("Super", Modifier::Super)),
        Just(("Meta", Modifier::Super)),
    ]
}

/// Non-modifier keys
fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9]".prop_map(|s| s.to_string()),
        (1u8..=24u8).prop_map(|n| format!("F{}", n)),
        Just("Enter".to_string()),
        Just("Escape".to_string()),
        Just("PageDown".to_string()),
        Just("Space".to_string()),
    ]
}

fn platform_strategy() -> impl Strategy<Value = Platform> {
    prop_oneof![Just(Platform::MacOs), Just(Platform::Windows), Just(Platform::Linux)]
}

/// Randomly flip the case of each character
fn scramble_case(input: &str, mask: u64) -> String {
    input
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if mask & (1 << (i % 64)) != 0 {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

proptest! {
    /// Shuffling tokens and changing case never changes the normalized form
    #[test]
    fn prop_normalization_ignores_order_and_case(
        aliases in prop::collection::vec(alias_strategy(), 0..5),
        key in key_strategy(),
        seed in any::<u64>(),
        mask in any::<u64>(),
    ) {
        let mut tokens: Vec<String> = aliases.iter().map(|(alias, _)| alias.to_string()).collect();
        tokens.push(key.clone());
        let original = tokens.join("+");

        let len = tokens.len();
        tokens.rotate_left((seed as usize) % len);
        let shuffled = scramble_case(&tokens.join("+"), mask);

        let a = normalize(&original).unwrap();
        let b = normalize(&shuffled).unwrap();
        prop_assert_eq!(&a, &b);

        let expected: std::collections::BTreeSet<Modifier> =
            aliases.iter().map(|(_, modifier)| *modifier).collect();
        prop_assert_eq!(a.modifiers, expected);
        prop_assert_eq!(a.key, key.to_lowercase());
    }

    /// The canonical display form parses back to the same accelerator
    #[test]
    fn prop_display_is_parseable(
        aliases in prop::collection::vec(alias_strategy(), 0..5),
        key in key_strategy(),
    ) {
        let modifiers = aliases.iter().map(|(_, modifier)| *modifier);
        let accel = NormalizedAccelerator::new(modifiers, &key);
        prop_assert_eq!(normalize(&accel.to_string()).unwrap(), accel);
    }

    /// Key-up events never match, whatever the modifier state
    #[test]
    fn prop_key_up_never_matches(
        aliases in prop::collection::vec(alias_strategy(), 0..5),
        key in key_strategy(),
        held in prop::collection::vec(any::<bool>(), 4),
        strict in any::<bool>(),
        platform in platform_strategy(),
    ) {
        let accel = NormalizedAccelerator::new(aliases.iter().map(|(_, m)| *m), &key);
        let mut event = KeyEventSnapshot::key_up(key.clone());
        for (flag, on) in ModifierFlag::ALL.iter().zip(held) {
            event.set_flag(*flag, on);
        }
        prop_assert!(!matches(&event, &accel, strict, platform));
    }

    /// A strict match is always a non-strict match
    #[test]
    fn prop_strict_implies_non_strict(
        aliases in prop::collection::vec(alias_strategy(), 0..5),
        key in key_strategy(),
        held in prop::collection::vec(any::<bool>(), 4),
        platform in platform_strategy(),
    ) {
        let accel = NormalizedAccelerator::new(aliases.iter().map(|(_, m)| *m), &key);
        let mut event = KeyEventSnapshot::key_down(key.clone());
        for (flag, on) in ModifierFlag::ALL.iter().zip(held) {
            event.set_flag(*flag, on);
        }
        if matches(&event, &accel, true, platform) {
            prop_assert!(matches(&event, &accel, false, platform));
        }
    }

    /// Holding exactly the required flags satisfies strict matching
    #[test]
    fn prop_exact_flags_match_strict(
        aliases in prop::collection::vec(alias_strategy(), 0..5),
        key in key_strategy(),
        platform in platform_strategy(),
    ) {
        let accel = NormalizedAccelerator::new(aliases.iter().map(|(_, m)| *m), &key);
        let mut event = KeyEventSnapshot::key_down(key.to_uppercase());
        for modifier in &accel.modifiers {
            event.set_flag(modifier_to_snapshot_flag(*modifier, platform), true);
        }
        prop_assert!(matches(&event, &accel, true, platform));
    }
}
