//! Rule model and symmetry views.
//!
//! - `Rule`, `WhenDo`, `Command`: the stored, designer-authored data
//! - `Predicate`, `Attribute`: per-kind guards, two bits per kind
//! - `Direction`, `MoveDirection`: witness directions and motions
//! - `Symmetry`, `Transform`: which mirrored/rotated variants a rule implies
//! - `RuleView`: a transformed projection over a stored rule, for both
//!   evaluation and editing
//!
//! Transformed variants are never materialized. The interpreter walks
//! `RuleView::all_views()` and reads each one through its transform.

pub mod coord;
pub mod direction;
pub mod predicate;
pub mod rule;
pub mod transform;
pub mod view;

pub use coord::{Coord, WINDOW};
pub use direction::{Direction, MoveDirection};
pub use predicate::{packed_len, Attribute, Predicate};
pub use rule::{
    ButtonArg, Command, CommandType, GameArg, MoveArg, Rule, RuleType, SpawnArg, SpriteArg,
    WhenDo,
    MAX_COMMANDS, MAX_WHEN_DOS,
};
pub use transform::{transform_coord, transform_direction, Symmetry, Transform};
pub use view::{RuleStats, RuleView};
