//! # tile-rules
//!
//! Rule representation, symmetry expansion and neighborhood interpreter for
//! tile-grid puzzle games.
//!
//! Designers author small "if the neighborhood looks like X, do Y" rules.
//! This crate stores them compactly, derives their mirrored and rotated
//! variants, and evaluates them around every sprite each tick.
//!
//! ## Design Principles
//!
//! 1. **No duplicated variants**: a rule is stored once. Mirrored and
//!    rotated variants are `RuleView`s that map coordinates and directions
//!    on every read.
//!
//! 2. **Rules are read-only at runtime**: the project owns and edits rules;
//!    the interpreter only borrows them. The world is the only thing a tick
//!    mutates.
//!
//! 3. **Engine-agnostic**: matching reads through `TileGrid`, commands run
//!    through `GameEngine`. `World` is one implementation of both.
//!
//! ## Modules
//!
//! - `core`: ids, configuration, errors, RNG
//! - `rules`: rule model, predicates, directions, transforms, `RuleView`
//! - `codec`: `BitCursor` and the packed rule record
//! - `project`: the rule table with stable ids
//! - `vm`: matcher, dispatch, `World` and the tick driver
//!
//! ## Example
//!
//! ```
//! use tile_rules::core::{ProjectConfig, VmConfig};
//! use tile_rules::project::Project;
//! use tile_rules::rules::{ButtonArg, CommandType, MoveArg, RuleType};
//! use tile_rules::vm::{Simulation, TileGrid, World};
//!
//! let mut project = Project::new(ProjectConfig::new(1, 1).with_player(0));
//! let id = project.make_rule(0, RuleType::ButtonPress, ButtonArg::Down.bits()).unwrap();
//! {
//!     let mut view = project.view_mut(id).unwrap();
//!     let center = view.when_do(2, 2).unwrap();
//!     view.set_command_inst(center, 0, CommandType::Move);
//!     view.set_command_arg(center, 0, MoveArg::Down.bits());
//! }
//!
//! let config = VmConfig::default();
//! let mut world = World::new(4, 4, 0, project.kinds(), &config);
//! let player = world.spawn(1, 1, 0, None).unwrap();
//!
//! let sim = Simulation::new(&project, &config);
//! sim.step(&mut world, Some(ButtonArg::Down));
//! assert_eq!(world.position(player), Some((1, 2)));
//! ```

pub mod codec;
pub mod core;
pub mod project;
pub mod rules;
pub mod vm;

// Re-export commonly used types
pub use crate::core::{
    AlternateInclusion, EntityId, FormatError, FormatResult, KindCounts, ProjectConfig,
    ProjectError, RuleId, VmConfig,
};

pub use crate::rules::{
    Attribute, ButtonArg, Command, CommandType, Coord, Direction, GameArg, MoveArg,
    MoveDirection, Predicate, Rule, RuleType, RuleView, SpawnArg, SpriteArg, Symmetry, Transform,
    WhenDo,
};

pub use crate::codec::{pack, unpack, BitCursor};

pub use crate::project::Project;

pub use crate::vm::{
    Evaluator, GameEngine, GameStatus, Simulation, TickReport, TileGrid, World,
};
