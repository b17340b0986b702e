//! Identifiers for rules and sprite instances.
//!
//! Both identifiers are allocated append-only and are never reused within a
//! session, so ids held by persisted saves or in-flight views either resolve
//! to the same object or fail predictably.
//!
//! ```
//! use tile_rules::core::{EntityId, RuleId};
//!
//! let rule = RuleId::new(3);
//! assert_eq!(rule.index(), 3);
//!
//! let sprite = EntityId(10);
//! assert_eq!(sprite.to_string(), "Sprite(10)");
//! ```

use serde::{Deserialize, Serialize};

/// Stable identifier of a rule in a project's rule table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleId(pub u32);

impl RuleId {
    /// Largest representable id.
    pub const MAX: RuleId = RuleId(u32::MAX);

    /// Create a rule id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Position of this rule in the append-only table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for RuleId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rule({})", self.0)
    }
}

/// Identifier of a sprite instance living in a `World`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Slot of this sprite in the world's sprite table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sprite({})", self.0)
    }
}
