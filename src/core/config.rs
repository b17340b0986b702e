//! Project and interpreter configuration.
//!
//! - `ProjectConfig`: how many background and sprite kinds a project has
//! - `KindCounts`: the pair of counts the codec and rule views need
//! - `VmConfig`: interpreter knobs, including the alternate-inclusion flag
//!
//! Kind counts are never stored inside a packed rule; they are supplied
//! from the project at pack/unpack time.

use serde::{Deserialize, Serialize};

/// Number of background and sprite kinds in a project.
///
/// Predicates inside every `WhenDo` are sized by these counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindCounts {
    /// Background (tile) kinds, indexed `0..backgrounds`.
    pub backgrounds: usize,
    /// Sprite kinds, indexed `0..sprites`.
    pub sprites: usize,
}

impl KindCounts {
    /// Create kind counts.
    #[must_use]
    pub const fn new(backgrounds: usize, sprites: usize) -> Self {
        Self { backgrounds, sprites }
    }

    /// Total number of entity kinds, backgrounds first.
    #[must_use]
    pub const fn total(self) -> usize {
        self.backgrounds + self.sprites
    }
}

/// Configuration for a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Background and sprite kind counts.
    pub kinds: KindCounts,

    /// Sprite kind controlled by the player, if any.
    pub player: Option<usize>,
}

impl ProjectConfig {
    /// Create a project configuration.
    pub fn new(backgrounds: usize, sprites: usize) -> Self {
        Self {
            kinds: KindCounts::new(backgrounds, sprites),
            player: None,
        }
    }

    /// Set the player sprite kind.
    #[must_use]
    pub fn with_player(mut self, kind: usize) -> Self {
        self.player = Some(kind);
        self
    }
}

/// Which stored attribute forms the "at least one of" group during matching.
///
/// The interpreter distinguishes a hard inclusion (every member must be
/// present) from an alternate inclusion group (at least one member must be
/// present). Stored predicates only carry `Include` and `Include2`, so this
/// flag selects which of the two plays the group role; the other one is a
/// hard requirement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlternateInclusion {
    /// `Include` is required, `Include2` members form the any-of group.
    #[default]
    Include2,
    /// `Include` members form the any-of group, `Include2` is required.
    Include,
}

/// Interpreter configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfig {
    /// Interpretation of the alternate inclusion group.
    pub alternate_inclusion: AlternateInclusion,

    /// Seed for the world RNG (portal destinations).
    pub seed: u64,

    /// Points awarded by `GameArg::ScoreUp10`.
    pub score_step: i64,
}

impl VmConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the alternate inclusion interpretation.
    #[must_use]
    pub fn with_alternate_inclusion(mut self, mode: AlternateInclusion) -> Self {
        self.alternate_inclusion = mode;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            alternate_inclusion: AlternateInclusion::default(),
            seed: 0,
            score_step: 10,
        }
    }
}
