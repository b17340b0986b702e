//! Append-only rule storage with tombstones.
//!
//! Slots are kept sparsely, keyed by id, and are never compacted, so an id
//! stays valid (or fails lookup predictably) for the whole session. Ids
//! below `next_id` with no stored slot are vacant.

use im::OrdMap;

use crate::core::RuleId;
use crate::rules::Rule;

/// One slot of the table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Slot {
    /// Skipped by an import; may still be filled by a later import.
    #[default]
    Vacant,
    /// A live rule.
    Live(Rule),
    /// The rule was removed. The id is never handed out again.
    Removed,
}

static VACANT: Slot = Slot::Vacant;

impl Slot {
    #[must_use]
    pub fn rule(&self) -> Option<&Rule> {
        match self {
            Slot::Live(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn rule_mut(&mut self) -> Option<&mut Rule> {
        match self {
            Slot::Live(rule) => Some(rule),
            _ => None,
        }
    }
}

/// Slot storage keyed by `RuleId`.
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    slots: OrdMap<RuleId, Slot>,
    next_id: u32,
}

impl RuleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule and return its new id.
    ///
    /// Returns the rule back once every id has been handed out.
    pub fn push(&mut self, rule: Rule) -> Result<RuleId, Rule> {
        let id = RuleId::new(self.next_id);
        let Some(next) = self.next_id.checked_add(1) else {
            return Err(rule);
        };
        self.slots.insert(id, Slot::Live(rule));
        self.next_id = next;
        Ok(id)
    }

    /// Store `rule` at `id`. Ids skipped over stay vacant.
    ///
    /// Returns the rule back if the slot is live or was removed, or if `id`
    /// is the last representable id.
    pub fn insert_at(&mut self, id: RuleId, rule: Rule) -> Result<(), Rule> {
        let Some(next) = id.raw().checked_add(1) else {
            return Err(rule);
        };
        if self.slots.contains_key(&id) {
            return Err(rule);
        }
        self.slots.insert(id, Slot::Live(rule));
        self.next_id = self.next_id.max(next);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.slots.get(&id).and_then(Slot::rule)
    }

    pub fn get_mut(&mut self, id: RuleId) -> Option<&mut Rule> {
        self.slots.get_mut(&id).and_then(Slot::rule_mut)
    }

    /// Tombstone `id`, returning the removed rule.
    pub fn remove(&mut self, id: RuleId) -> Option<Rule> {
        let slot = self.slots.get_mut(&id)?;
        match std::mem::replace(slot, Slot::Removed) {
            Slot::Live(rule) => Some(rule),
            previous => {
                *slot = previous;
                None
            }
        }
    }

    /// The slot at `id`, if the table reaches that far.
    #[must_use]
    pub fn slot(&self, id: RuleId) -> Option<&Slot> {
        match self.slots.get(&id) {
            Some(slot) => Some(slot),
            None if id.raw() < self.next_id => Some(&VACANT),
            None => None,
        }
    }

    /// Id the next `push` hands out.
    #[must_use]
    pub fn next_id(&self) -> RuleId {
        RuleId::new(self.next_id)
    }

    /// Live rules in id order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.slots
            .iter()
            .filter_map(|(id, slot)| slot.rule().map(|rule| (*id, rule)))
    }

    /// Number of live rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
