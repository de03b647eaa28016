//! Parameter store: the operator's current input for one command.
//!
//! Each declared parameter gets exactly one slot whose shape follows the field
//! mode: a scalar, an ordered set, or a counted multiset. Mutators never fail;
//! an unknown key or an operation that doesn't fit the slot is ignored.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::syntax::{FieldMode, Syntax};

/// Storage for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Slot {
    Scalar(Option<String>),
    Set(IndexSet<String>),
    Multiset(IndexMap<String, u32>),
}

impl Slot {
    fn for_mode(mode: FieldMode) -> Self {
        match mode {
            FieldMode::Plain
            | FieldMode::SpecialPrefix
            | FieldMode::SimpleRadio
            | FieldMode::ComplexRadio => Slot::Scalar(None),
            FieldMode::MultiSelectSet => Slot::Set(IndexSet::new()),
            FieldMode::MultiSelectMultiset => Slot::Multiset(IndexMap::new()),
        }
    }

    fn clear(&mut self) {
        match self {
            Slot::Scalar(value) => *value = None,
            Slot::Set(set) => set.clear(),
            Slot::Multiset(map) => map.clear(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Slot::Scalar(value) => value.as_deref().unwrap_or_default().is_empty(),
            Slot::Set(set) => set.is_empty(),
            Slot::Multiset(map) => map.is_empty(),
        }
    }
}

/// Current parameter values keyed by field `original_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterStore {
    slots: IndexMap<String, Slot>,
}

impl ParameterStore {
    /// One empty slot per parameter of `syntax`. The keyword gets no slot.
    pub fn for_syntax(syntax: &Syntax) -> Self {
        let slots = syntax
            .parameters()
            .iter()
            .map(|f| (f.original_name().to_string(), Slot::for_mode(f.mode())))
            .collect();
        Self { slots }
    }

    pub fn slot(&self, key: &str) -> Option<&Slot> {
        self.slots.get(key)
    }

    /// Reset every slot to empty, keeping the declared keys.
    pub fn clear(&mut self) {
        for slot in self.slots.values_mut() {
            slot.clear();
        }
    }

    /// True if the field has something the serializer could render.
    pub fn has_content(&self, key: &str) -> bool {
        self.slots.get(key).is_some_and(|s| !s.is_empty())
    }

    // ── Scalar ──────────────────────────────────────────────────

    pub fn set_scalar(&mut self, key: &str, value: impl Into<String>) {
        if let Some(Slot::Scalar(current)) = self.slots.get_mut(key) {
            *current = Some(value.into());
        }
    }

    pub fn clear_scalar(&mut self, key: &str) {
        if let Some(Slot::Scalar(current)) = self.slots.get_mut(key) {
            *current = None;
        }
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.slots.get(key) {
            Some(Slot::Scalar(value)) => value.as_deref(),
            _ => None,
        }
    }

    // ── Ordered set ─────────────────────────────────────────────

    /// Append `token` unless it is already selected.
    pub fn add_to_set(&mut self, key: &str, token: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            return;
        }
        if let Some(Slot::Set(set)) = self.slots.get_mut(key) {
            set.insert(token);
        }
    }

    pub fn remove_from_set(&mut self, key: &str, token: &str) {
        if let Some(Slot::Set(set)) = self.slots.get_mut(key) {
            set.shift_remove(token);
        }
    }

    pub fn set(&self, key: &str) -> Option<&IndexSet<String>> {
        match self.slots.get(key) {
            Some(Slot::Set(set)) => Some(set),
            _ => None,
        }
    }

    // ── Counted multiset ────────────────────────────────────────

    /// Add `delta` to the token's count, inserting it at `delta` when absent.
    /// A resulting count of zero or less removes the token.
    pub fn increment_multiset(&mut self, key: &str, token: impl Into<String>, delta: i64) {
        let token = token.into();
        if token.is_empty() {
            return;
        }
        let current = self
            .multiset(key)
            .and_then(|m| m.get(&token))
            .copied()
            .map_or(0, i64::from);
        self.set_multiset_count(key, token, current.saturating_add(delta));
    }

    /// Set the token's count directly; `count <= 0` deletes it.
    /// An existing token keeps its position.
    pub fn set_multiset_count(&mut self, key: &str, token: impl Into<String>, count: i64) {
        let token = token.into();
        if token.is_empty() {
            return;
        }
        let Some(Slot::Multiset(map)) = self.slots.get_mut(key) else {
            return;
        };
        if count <= 0 {
            map.shift_remove(&token);
        } else {
            map.insert(token, u32::try_from(count).unwrap_or(u32::MAX));
        }
    }

    pub fn remove_from_multiset(&mut self, key: &str, token: &str) {
        if let Some(Slot::Multiset(map)) = self.slots.get_mut(key) {
            map.shift_remove(token);
        }
    }

    pub fn multiset(&self, key: &str) -> Option<&IndexMap<String, u32>> {
        match self.slots.get(key) {
            Some(Slot::Multiset(map)) => Some(map),
            _ => None,
        }
    }
}
