//! Interfaces between the interpreter and the game.
//!
//! The interpreter is engine-agnostic. It reads the world through
//! `TileGrid` while matching and writes through `GameEngine` while running
//! commands. Keeping the two apart means every rule in a phase is matched
//! against the same world before any command changes it.
//!
//! Tile coordinates are signed: a neighborhood window centred near the edge
//! reaches past the grid, and such cells simply hold nothing.

use std::fmt::Debug;

use crate::rules::{GameArg, MoveDirection};

/// Read access to the grid, used during matching.
pub trait TileGrid {
    /// Handle of a sprite instance.
    type Entity: Copy + Eq + Debug;

    /// Background kind at a tile; `None` outside the grid.
    fn background_at(&self, col: i32, row: i32) -> Option<usize>;

    /// Sprite of `kind` occupying a tile, if any.
    fn sprite_at(&self, col: i32, row: i32, kind: usize) -> Option<Self::Entity>;

    /// Tile of a sprite; `None` if it no longer exists.
    fn position(&self, entity: Self::Entity) -> Option<(i32, i32)>;

    /// Current motion of a sprite; `None` when resting or gone.
    fn motion(&self, entity: Self::Entity) -> Option<MoveDirection>;
}

/// Write access to the game, used when commands run.
///
/// The first six operations are what every engine must provide. The hooks
/// after them back the remaining command types and default to doing
/// nothing, so a minimal engine can ignore them.
pub trait GameEngine {
    /// Handle of a sprite instance.
    type Entity: Copy + Eq + Debug;

    /// Place a new sprite; `dir` of `None` creates it resting.
    fn create_entity(
        &mut self,
        col: i32,
        row: i32,
        kind: usize,
        dir: Option<MoveDirection>,
    ) -> Option<Self::Entity>;

    /// Start (or redirect) a sprite's motion.
    fn move_entity(&mut self, entity: Self::Entity, dir: MoveDirection);

    /// Turn a sprite around; `dir` is its new direction.
    fn reverse_entity(&mut self, entity: Self::Entity, dir: MoveDirection);

    fn stop_entity(&mut self, entity: Self::Entity);

    fn destroy_entity(&mut self, entity: Self::Entity);

    /// Commit the tick: apply pending motion and per-round bookkeeping.
    fn advance(&mut self);

    /// Repaint a tile with a background kind.
    fn paint(&mut self, _col: i32, _row: i32, _background: usize) {}

    /// Teleport a sprite to a tile of the given background kind.
    fn portal(&mut self, _entity: Self::Entity, _background: usize) {}

    /// Suppress rules for a sprite kind during the next round.
    fn block_rules(&mut self, _kind: usize) {}

    /// Win, lose, score and level changes.
    fn game_event(&mut self, _event: GameArg) {}
}
