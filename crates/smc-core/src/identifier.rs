//! Interned names for states, events and actions.
//!
//! Every name that appears in a state machine source is turned into an [`Id`]
//! once, so the compiler stages can copy, hash and compare names cheaply.

use std::{
    cmp::Ordering,
    fmt,
    sync::{Mutex, OnceLock},
};

use serde::{Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner shared by all compiler stages.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> &'static Mutex<DefaultStringInterner> {
    INTERNER.get_or_init(|| Mutex::new(DefaultStringInterner::new()))
}

/// Interned name of a state, event or action.
///
/// Equality and hashing work on the interned symbol. Ordering compares the
/// underlying text, so ordered collections of `Id`s sort by name.
///
/// # Examples
///
/// ```
/// use smc_core::identifier::Id;
///
/// let locked = Id::new("Locked");
/// let unlocked = Id::new("Unlocked");
///
/// assert_eq!(locked, "Locked");
/// assert!(locked < unlocked);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    ///
    /// # Examples
    ///
    /// ```
    /// use smc_core::identifier::Id;
    ///
    /// let state = Id::new("Locked");
    /// let event = Id::new("Coin");
    /// assert_ne!(state, event);
    /// ```
    pub fn new(name: &str) -> Self {
        let mut interner = interner().lock().expect("Failed to acquire interner lock");
        Self(interner.get_or_intern(name))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner().lock().expect("Failed to acquire interner lock");
        let str_value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        f.write_str(str_value)
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        let interner = interner().lock().expect("Failed to acquire interner lock");
        let lhs = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        let rhs = interner
            .resolve(other.0)
            .expect("Symbol should exist in interner");
        lhs.cmp(rhs)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Id {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "Locked"`
    fn eq(&self, other: &str) -> bool {
        let interner = interner().lock().expect("Failed to acquire interner lock");
        let self_str = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        self_str == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_new() {
        let id1 = Id::new("Locked");
        let id2 = Id::new("Locked");
        let id3 = Id::new("Unlocked");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "Locked");
    }

    #[test]
    fn test_display_trait() {
        let id = Id::new("alarmOn");
        assert_eq!(format!("{id}"), "alarmOn");
    }

    #[test]
    fn test_from_trait() {
        let id1: Id = "Coin".into();
        let id2 = Id::from(&String::from("Coin"));

        assert_eq!(id1, id2);
        assert_eq!(id1, "Coin");
    }

    #[test]
    fn test_hash_and_eq() {
        let id1 = Id::new("key1");
        let id2 = Id::new("key1");
        let id3 = Id::new("key2");

        let mut map = HashMap::new();
        map.insert(id1, "value1");
        map.insert(id3, "value2");

        assert_eq!(map.get(&id2), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_ordering_follows_text() {
        // Intern in reverse order so symbol order disagrees with text order.
        let zeta = Id::new("zeta_order");
        let beta = Id::new("beta_order");
        let alpha = Id::new("alpha_order");

        let sorted: Vec<Id> = [zeta, alpha, beta].into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        assert_eq!(sorted, vec![alpha, beta, zeta]);
        assert_eq!(alpha.cmp(&alpha), Ordering::Equal);
    }

    #[test]
    fn test_partial_eq_str() {
        let id = Id::new("Pass");

        assert!(id == "Pass");
        assert!(id != "Coin");

        let empty = Id::new("");
        assert!(empty == "");
        assert!(empty != "non-empty");
    }

    #[test]
    fn test_partial_eq_str_ref() {
        let id = Id::new("Reset");
        let name = String::from("Reset");
        let other = String::from("Coin");

        assert!(id == name.as_str());
        assert!(id != other.as_str());
    }

    proptest! {
        #[test]
        fn ordering_matches_string_ordering(a in "[a-zA-Z_][a-zA-Z0-9_]{0,8}", b in "[a-zA-Z_][a-zA-Z0-9_]{0,8}") {
            prop_assert_eq!(Id::new(&a).cmp(&Id::new(&b)), a.cmp(&b));
        }
    }
}
