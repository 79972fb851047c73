//! Trigger encoding, parsing and matching
//!
//! A [`Trigger`] is the pair of a [`Mask`] and a set of held non-modifier
//! keys. Descriptors are whitespace-separated tokens:
//!
//! ```text
//! "button1"            plain left drag/click
//! "shift A"            A pressed while shift is physically held
//! "ctrl double-click button1"
//! "shift scroll"
//! "not mapped"         never matches live input
//! ```
//!
//! Triggers are interned: parsing equal descriptors (or constructing equal
//! values) hands out the same shared instance, so equality checks usually
//! short-circuit on pointer identity.

mod keys;
mod mask;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::error::BindingError;

pub use keys::{KeyCode, KeySet};
pub use mask::Mask;

/// Descriptor of the trigger that never matches
pub const NOT_MAPPED_DESCRIPTOR: &str = "not mapped";

#[derive(Debug, PartialEq, Eq, Hash)]
struct TriggerData {
    mask: Mask,
    keys: KeySet,
}

/// Value-interned triggers
static INTERNED: Lazy<Mutex<HashSet<Arc<TriggerData>>>> = Lazy::new(Default::default);

/// Descriptor string → parsed trigger
static PARSED: Lazy<Mutex<HashMap<String, Trigger>>> = Lazy::new(Default::default);

static NOT_MAPPED: Lazy<Trigger> =
    Lazy::new(|| Trigger::new(Mask::NOT_MAPPED, KeySet::new()));

/// Immutable (mask, held keys) pair identifying what input starts a behaviour
#[derive(Clone)]
pub struct Trigger(Arc<TriggerData>);

impl Trigger {
    /// Returns the interned trigger for the given mask and keys
    ///
    /// Modifier keys are dropped from `keys`; they are expressed through the mask.
    pub fn new(mask: Mask, keys: impl IntoIterator<Item = KeyCode>) -> Self {
        let data = TriggerData {
            mask,
            keys: keys.into_iter().filter(|key| !key.is_modifier()).collect(),
        };

        let mut interned = INTERNED.lock();
        if let Some(existing) = interned.get(&data) {
            return Self(existing.clone());
        }
        let data = Arc::new(data);
        interned.insert(data.clone());
        Self(data)
    }

    /// The trigger that never matches live input
    pub fn not_mapped() -> Self {
        NOT_MAPPED.clone()
    }

    /// Parses a whitespace-separated descriptor
    ///
    /// # Errors
    /// `InvalidTriggerSyntax` when a token is neither a modifier keyword nor
    /// a key name, or the descriptor is blank.
    pub fn parse(descriptor: &str) -> Result<Self, BindingError> {
        if let Some(cached) = PARSED.lock().get(descriptor) {
            return Ok(cached.clone());
        }

        let trigger = Self::parse_uncached(descriptor)?;
        PARSED
            .lock()
            .insert(descriptor.to_string(), trigger.clone());
        Ok(trigger)
    }

    fn parse_uncached(descriptor: &str) -> Result<Self, BindingError> {
        let tokens: Vec<&str> = descriptor.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(BindingError::syntax(descriptor, ""));
        }
        if tokens.len() == 2
            && tokens[0].eq_ignore_ascii_case("not")
            && tokens[1].eq_ignore_ascii_case("mapped")
        {
            return Ok(Self::not_mapped());
        }

        let mut mask = Mask::empty();
        let mut keys = KeySet::new();
        for token in tokens {
            if let Some(bit) = Mask::from_keyword(token) {
                mask |= bit;
            } else if let Some(key) = KeyCode::from_name(token) {
                keys.insert(key);
            } else {
                return Err(BindingError::syntax(descriptor, token));
            }
        }
        Ok(Self::new(mask, keys))
    }

    /// Canonical descriptor: modifier keywords in fixed order, then key names
    pub fn format(&self) -> String {
        self.to_string()
    }

    pub fn mask(&self) -> Mask {
        self.0.mask
    }

    pub fn keys(&self) -> &KeySet {
        &self.0.keys
    }

    /// True when no pointer button or scroll bit is required
    pub fn is_key_triggered(&self) -> bool {
        !self.0.mask.intersects(Mask::BUTTONS | Mask::SCROLL)
    }

    pub fn is_not_mapped(&self) -> bool {
        self.0.mask.contains(Mask::NOT_MAPPED)
    }

    /// Exact match: the live mask equals ours and exactly our keys are held
    pub fn matches(&self, mask: Mask, held: &KeySet) -> bool {
        !self.is_not_mapped() && self.0.mask == mask && self.0.keys == *held
    }

    /// Whether an in-progress drag started by this trigger should stay alive
    ///
    /// Every required bit except `double-click` and `scroll` must still be
    /// set in the live mask, and every key of the trigger must still be held.
    /// Additional live bits or keys are ignored.
    pub fn matches_for_termination(&self, mask: Mask, held: &KeySet) -> bool {
        let required = self.0.mask - (Mask::DOUBLE_CLICK | Mask::SCROLL | Mask::NOT_MAPPED);
        !self.is_not_mapped() && mask.contains(required) && self.0.keys.is_subset(held)
    }

    /// Pointer identity, the fast path of equality for interned triggers
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Trigger {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for Trigger {}

impl Hash for Trigger {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_not_mapped() {
            return f.write_str(NOT_MAPPED_DESCRIPTOR);
        }
        let keys = self.0.keys.iter().filter_map(|key| key.name());
        let descriptor = itertools::join(self.0.mask.keywords().chain(keys), " ");
        f.write_str(&descriptor)
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trigger({:?})", self.to_string())
    }
}

impl FromStr for Trigger {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[KeyCode]) -> KeySet {
        list.iter().copied().collect()
    }

    #[test]
    fn test_parse_modifiers_and_keys() {
        let trigger = Trigger::parse("shift ctrl A").unwrap();
        assert_eq!(trigger.mask(), Mask::SHIFT | Mask::CTRL);
        assert_eq!(*trigger.keys(), keys(&[KeyCode::A]));
        assert!(trigger.is_key_triggered());
    }

    #[test]
    fn test_aliases_and_token_order_do_not_matter() {
        let a = Trigger::parse("cmd control button1").unwrap();
        let b = Trigger::parse("button1   meta ctrl").unwrap();
        assert_eq!(a, b);
        assert!(a.ptr_eq(&b), "equal triggers should be interned");
        assert!(!a.is_key_triggered());
    }

    #[test]
    fn test_format_is_canonical() {
        let trigger = Trigger::parse("SPACE win shift double-click A").unwrap();
        assert_eq!(trigger.format(), "shift win double-click A SPACE");
        assert_eq!(Trigger::parse("windows scroll").unwrap().format(), "win scroll");
    }

    #[test]
    fn test_format_parse_round_trip() {
        for descriptor in [
            "button1",
            "B shift",
            "ctrl alt altGraph meta win button3",
            "double-click button2",
            "scroll shift",
            "F5 Q W",
            "not mapped",
        ] {
            let parsed = Trigger::parse(descriptor).unwrap();
            let reparsed = Trigger::parse(&parsed.format()).unwrap();
            assert_eq!(parsed, reparsed, "round trip of {descriptor:?}");
        }
    }

    #[test]
    fn test_invalid_tokens_are_rejected() {
        let err = Trigger::parse("shift banana").unwrap_err();
        assert_eq!(
            err,
            BindingError::InvalidTriggerSyntax {
                descriptor: "shift banana".into(),
                token: "banana".into(),
            }
        );
        assert!(Trigger::parse("   ").is_err());
        assert!(Trigger::parse("button1 | all").is_err());
    }

    #[test]
    fn test_not_mapped_never_matches() {
        let trigger = Trigger::parse("not mapped").unwrap();
        assert!(trigger.is_not_mapped());
        assert!(trigger.ptr_eq(&Trigger::not_mapped()));
        assert!(!trigger.matches(Mask::NOT_MAPPED, &KeySet::new()));
        assert!(!trigger.matches_for_termination(Mask::all(), &KeySet::new()));
    }

    #[test]
    fn test_matches_is_exact() {
        let trigger = Trigger::parse("shift A").unwrap();
        assert!(trigger.matches(Mask::SHIFT, &keys(&[KeyCode::A])));
        assert!(!trigger.matches(Mask::SHIFT, &keys(&[KeyCode::A, KeyCode::B])));
        assert!(!trigger.matches(Mask::SHIFT | Mask::CTRL, &keys(&[KeyCode::A])));
        assert!(!trigger.matches(Mask::empty(), &keys(&[KeyCode::A])));
    }

    #[test]
    fn test_termination_uses_containment() {
        let trigger = Trigger::parse("ctrl double-click button1 SPACE").unwrap();
        let held = keys(&[KeyCode::Space, KeyCode::Z]);

        // double-click is not required to keep the drag alive
        assert!(trigger.matches_for_termination(Mask::CTRL | Mask::BUTTON1 | Mask::SHIFT, &held));
        // button released
        assert!(!trigger.matches_for_termination(Mask::CTRL, &held));
        // key released
        assert!(!trigger.matches_for_termination(
            Mask::CTRL | Mask::BUTTON1,
            &keys(&[KeyCode::Z])
        ));
    }

    #[test]
    fn test_modifier_keys_are_not_held_keys() {
        let trigger = Trigger::new(Mask::SHIFT, [KeyCode::Shift, KeyCode::A]);
        assert_eq!(*trigger.keys(), keys(&[KeyCode::A]));
    }
}
