//! Neighborhood matching and command dispatch.
//!
//! ## Evaluation
//!
//! Evaluating one rule view for one sprite happens in two explicit steps:
//!
//! 1. **Self qualifies.** The centre cell stands for the sprite itself. Its
//!    guard is what selected the rule in the first place (sprite kind and
//!    direction), so it is not re-checked here, and its commands always run
//!    first.
//! 2. **Neighbours must all pass.** Every cell within Manhattan distance 2
//!    that has an entry is checked in scan order (column-major). The first
//!    failing guard abandons the rule with nothing queued.
//!
//! A successful evaluation yields a `Firing`: the commands to run, already
//! read through the view's transform and bound to target tiles and
//! witnesses. Nothing touches the engine until `dispatch`.
//!
//! ## Guards
//!
//! Per cell, kinds are visited backgrounds first, then sprites, in ascending
//! kind order. `Exclude` fails on presence, a hard inclusion fails on
//! absence, and the alternate inclusion group needs at least one present
//! member. Which stored attribute plays which role is set by
//! `AlternateInclusion`.

use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::core::{AlternateInclusion, KindCounts, RuleId, VmConfig};
use crate::rules::{
    Attribute, Command, CommandType, Coord, GameArg, MoveArg, MoveDirection, Rule, RuleView,
    SpawnArg, SpriteArg, Transform,
};

use super::engine::{GameEngine, TileGrid};

/// Outcome of checking one cell's guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guard<T> {
    Fail,
    /// The guard holds; the first present included sprite, if any.
    Pass(Option<T>),
}

/// A command bound to the tile and sprite it acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingCommand<T> {
    /// Command as seen through the view.
    pub command: Command,
    /// Absolute tile of the cell that carried the command.
    pub col: i32,
    pub row: i32,
    /// The sprite at that cell: the evaluated sprite for the centre, the
    /// captured witness elsewhere.
    pub target: Option<T>,
    /// Motion of `target` when the rule matched.
    pub motion: Option<MoveDirection>,
}

/// A matched rule view, ready to dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Firing<T> {
    /// Stored rule the matched view reads from.
    pub rule: Option<RuleId>,
    pub transform: Option<Transform>,
    pub sprite: T,
    /// Witnesses captured within distance 1 of the centre, in scan order.
    pub witnesses: SmallVec<[T; 4]>,
    pub commands: Vec<PendingCommand<T>>,
}

/// Matches rule views against a grid.
#[derive(Clone, Debug)]
pub struct Evaluator {
    kinds: KindCounts,
    alternate: AlternateInclusion,
}

impl Evaluator {
    #[must_use]
    pub fn new(kinds: KindCounts, config: &VmConfig) -> Self {
        Self {
            kinds,
            alternate: config.alternate_inclusion,
        }
    }

    /// The (hard, any-of) attribute pair in effect.
    fn roles(&self) -> (Attribute, Attribute) {
        match self.alternate {
            AlternateInclusion::Include2 => (Attribute::Include, Attribute::Include2),
            AlternateInclusion::Include => (Attribute::Include2, Attribute::Include),
        }
    }

    /// Check entry `wd` of `view` against the tile at `(col, row)`.
    pub fn guard_at<G: TileGrid>(
        &self,
        grid: &G,
        view: &RuleView<&Rule>,
        wd: usize,
        col: i32,
        row: i32,
    ) -> Guard<G::Entity> {
        let (hard, any_of) = self.roles();
        let mut group = false;
        let mut group_hit = false;
        let mut witness = None;

        let background = grid.background_at(col, row);
        for kind in 0..self.kinds.backgrounds {
            let attr = view.background_attr(wd, kind).unwrap_or_default();
            let present = background == Some(kind);
            if (attr == Attribute::Exclude && present) || (attr == hard && !present) {
                return Guard::Fail;
            }
            if attr == any_of {
                group = true;
                group_hit |= present;
            }
        }

        for kind in 0..self.kinds.sprites {
            let attr = view.sprite_attr(wd, kind).unwrap_or_default();
            if attr == Attribute::DontCare {
                continue;
            }
            let found = grid.sprite_at(col, row, kind);
            let present = found.is_some();
            if (attr == Attribute::Exclude && present) || (attr == hard && !present) {
                return Guard::Fail;
            }
            if attr == any_of {
                group = true;
                group_hit |= present;
            }
            if attr != Attribute::Exclude && witness.is_none() {
                witness = found;
            }
        }

        if group && !group_hit {
            return Guard::Fail;
        }
        Guard::Pass(witness)
    }

    /// Match `view` around `sprite`.
    ///
    /// Returns `None` if any neighbour guard fails or the sprite is gone.
    pub fn evaluate<G: TileGrid>(
        &self,
        grid: &G,
        sprite: G::Entity,
        view: &RuleView<&Rule>,
    ) -> Option<Firing<G::Entity>> {
        let (col, row) = grid.position(sprite)?;
        let mut firing = Firing {
            rule: view.source_id(),
            transform: view.view_transform(),
            sprite,
            witnesses: SmallVec::new(),
            commands: Vec::new(),
        };

        // Self always qualifies.
        if let Some(center) = view.when_do(2, 2) {
            push_commands(&mut firing.commands, view, center, (col, row), Some(sprite), grid);
        }

        // Neighbours must all pass.
        let mut carriers: SmallVec<[(usize, (i32, i32), Option<G::Entity>); 12]> = SmallVec::new();
        for cell in Coord::neighborhood() {
            let Some(wd) = view.when_do(cell.col, cell.row) else {
                continue;
            };
            let (dx, dy) = cell.offset();
            let tile = (col + dx, row + dy);
            match self.guard_at(grid, view, wd, tile.0, tile.1) {
                Guard::Fail => {
                    trace!(rule = ?firing.rule, transform = ?firing.transform, %cell, "guard failed");
                    return None;
                }
                Guard::Pass(witness) => {
                    if cell.distance() <= 1 {
                        firing.witnesses.extend(witness);
                    }
                    if view.command_count(wd) > 0 {
                        carriers.push((wd, tile, witness));
                    }
                }
            }
        }

        for (wd, tile, witness) in carriers {
            push_commands(&mut firing.commands, view, wd, tile, witness, grid);
        }
        Some(firing)
    }
}

fn push_commands<G: TileGrid>(
    out: &mut Vec<PendingCommand<G::Entity>>,
    view: &RuleView<&Rule>,
    wd: usize,
    (col, row): (i32, i32),
    target: Option<G::Entity>,
    grid: &G,
) {
    let motion = target.and_then(|t| grid.motion(t));
    out.extend(
        (0..view.command_count(wd))
            .map_while(|cid| view.command(wd, cid))
            .map(|command| PendingCommand {
                command,
                col,
                row,
                target,
                motion,
            }),
    );
}

/// Run one command against the engine.
///
/// Returns whether the engine was called, or for spawns whether the sprite
/// was placed. Commands that need a target sprite are skipped when their
/// cell captured none.
pub fn dispatch_command<E: GameEngine>(engine: &mut E, pending: &PendingCommand<E::Entity>) -> bool {
    let Command { inst, arg } = pending.command;
    match inst {
        CommandType::Move => {
            let Some(target) = pending.target else {
                return false;
            };
            match MoveArg::from_bits(arg) {
                Some(MoveArg::Stop) => engine.stop_entity(target),
                Some(MoveArg::UTurn) => match pending.motion {
                    Some(dir) => engine.reverse_entity(target, dir.opposite()),
                    None => return false,
                },
                Some(_) => match MoveDirection::from_bits(arg) {
                    Some(dir) => engine.move_entity(target, dir),
                    None => return false,
                },
                None => {
                    warn!(arg, "unknown move argument");
                    return false;
                }
            }
        }
        CommandType::Paint => engine.paint(pending.col, pending.row, arg as usize),
        CommandType::Spawn => {
            let SpawnArg { kind, motion } = SpawnArg::from_bits(arg);
            return engine
                .create_entity(pending.col, pending.row, kind as usize, motion)
                .is_some();
        }
        CommandType::SpriteOp => match (SpriteArg::from_bits(arg), pending.target) {
            (Some(SpriteArg::Remove), Some(target)) => engine.destroy_entity(target),
            _ => return false,
        },
        CommandType::GameOp => match GameArg::from_bits(arg) {
            Some(event) => engine.game_event(event),
            None => {
                warn!(arg, "unknown game argument");
                return false;
            }
        },
        CommandType::Portal => match pending.target {
            Some(target) => engine.portal(target, arg as usize),
            None => return false,
        },
        CommandType::BlockRules => engine.block_rules(arg as usize),
    }
    true
}

/// Run every command of a firing in order; returns how many reached the
/// engine.
pub fn dispatch<E: GameEngine>(engine: &mut E, firing: &Firing<E::Entity>) -> usize {
    let sent = firing
        .commands
        .iter()
        .filter(|pending| dispatch_command(engine, pending))
        .count();
    trace!(rule = ?firing.rule, sprite = ?firing.sprite, sent, "dispatched firing");
    sent
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashMap;

    use super::*;
    use crate::rules::{Direction, RuleType, Symmetry, WhenDo};

    const KINDS: KindCounts = KindCounts::new(2, 3);

    #[derive(Default)]
    struct Grid {
        backgrounds: FxHashMap<(i32, i32), usize>,
        sprites: FxHashMap<(i32, i32), (u32, usize)>,
        motions: FxHashMap<u32, MoveDirection>,
    }

    impl Grid {
        fn with_sprite(mut self, id: u32, kind: usize, at: (i32, i32)) -> Self {
            self.sprites.insert(at, (id, kind));
            self
        }

        fn with_background(mut self, kind: usize, at: (i32, i32)) -> Self {
            self.backgrounds.insert(at, kind);
            self
        }
    }

    impl TileGrid for Grid {
        type Entity = u32;

        fn background_at(&self, col: i32, row: i32) -> Option<usize> {
            self.backgrounds.get(&(col, row)).copied()
        }

        fn sprite_at(&self, col: i32, row: i32, kind: usize) -> Option<u32> {
            self.sprites
                .get(&(col, row))
                .filter(|(_, k)| *k == kind)
                .map(|(id, _)| *id)
        }

        fn position(&self, entity: u32) -> Option<(i32, i32)> {
            self.sprites
                .iter()
                .find(|(_, (id, _))| *id == entity)
                .map(|(pos, _)| *pos)
        }

        fn motion(&self, entity: u32) -> Option<MoveDirection> {
            self.motions.get(&entity).copied()
        }
    }

    fn rule_with(cell: Coord, setup: impl FnOnce(&mut WhenDo)) -> Rule {
        let mut rule = Rule::new(RuleType::ContextChange, 0);
        let mut wd = WhenDo::new(cell, KINDS);
        setup(&mut wd);
        rule.when_dos.push(wd);
        rule
    }

    fn evaluate(grid: &Grid, rule: &Rule, config: &VmConfig) -> Option<Firing<u32>> {
        let view = RuleView::new(rule, RuleId(0), KINDS);
        Evaluator::new(KINDS, config).evaluate(grid, 1, &view)
    }

    #[test]
    fn test_center_commands_bind_to_self() {
        let grid = Grid::default().with_sprite(1, 0, (5, 5));
        let rule = rule_with(Coord::CENTER, |wd| {
            wd.sprites.set(0, Attribute::Include);
            wd.commands.push(Command::movement(MoveArg::Right));
        });
        let firing = evaluate(&grid, &rule, &VmConfig::default()).unwrap();
        assert_eq!(firing.commands.len(), 1);
        assert_eq!(firing.commands[0].target, Some(1));
        assert_eq!((firing.commands[0].col, firing.commands[0].row), (5, 5));
    }

    #[test]
    fn test_exclude_background() {
        let grid = Grid::default()
            .with_sprite(1, 0, (5, 5))
            .with_background(1, (4, 5));
        let rule = rule_with(Coord::new(1, 2), |wd| {
            wd.background.set(1, Attribute::Exclude);
        });
        assert!(evaluate(&grid, &rule, &VmConfig::default()).is_none());

        let grid = Grid::default()
            .with_sprite(1, 0, (5, 5))
            .with_background(0, (4, 5));
        assert!(evaluate(&grid, &rule, &VmConfig::default()).is_some());
    }

    #[test]
    fn test_witness_capture_and_targets() {
        let grid = Grid::default()
            .with_sprite(1, 0, (5, 5))
            .with_sprite(7, 2, (6, 5));
        let rule = rule_with(Coord::new(3, 2), |wd| {
            wd.sprites.set(2, Attribute::Include);
            wd.commands.push(Command::new(CommandType::SpriteOp, SpriteArg::Remove as u8));
        });
        let firing = evaluate(&grid, &rule, &VmConfig::default()).unwrap();
        assert_eq!(firing.witnesses.as_slice(), &[7]);
        assert_eq!(firing.commands[0].target, Some(7));
        assert_eq!((firing.commands[0].col, firing.commands[0].row), (6, 5));
    }

    #[test]
    fn test_far_witness_not_recorded() {
        let grid = Grid::default()
            .with_sprite(1, 0, (5, 5))
            .with_sprite(8, 1, (7, 5));
        let rule = rule_with(Coord::new(4, 2), |wd| {
            wd.sprites.set(1, Attribute::Include);
        });
        let firing = evaluate(&grid, &rule, &VmConfig::default()).unwrap();
        assert!(firing.witnesses.is_empty());
    }

    #[test]
    fn test_cells_past_grid_edge_are_empty() {
        let grid = Grid::default().with_sprite(1, 0, (0, 0));
        let include = rule_with(Coord::new(1, 2), |wd| {
            wd.background.set(0, Attribute::Include);
        });
        assert!(evaluate(&grid, &include, &VmConfig::default()).is_none());

        let exclude = rule_with(Coord::new(1, 2), |wd| {
            wd.background.set(0, Attribute::Exclude);
        });
        assert!(evaluate(&grid, &exclude, &VmConfig::default()).is_some());
    }

    #[test]
    fn test_alternate_group_needs_one_member() {
        let grid = Grid::default()
            .with_sprite(1, 0, (5, 5))
            .with_background(1, (5, 4));
        let rule = rule_with(Coord::new(2, 1), |wd| {
            wd.background.set(0, Attribute::Include2);
            wd.background.set(1, Attribute::Include2);
        });
        let config = VmConfig::default();
        assert!(evaluate(&grid, &rule, &config).is_some());

        let empty = Grid::default().with_sprite(1, 0, (5, 5));
        assert!(evaluate(&empty, &rule, &config).is_none());
    }

    #[test]
    fn test_transformed_view_reads_rotated_cells() {
        let grid = Grid::default()
            .with_sprite(1, 0, (5, 5))
            .with_sprite(4, 1, (5, 4));
        let mut rule = rule_with(Coord::new(3, 2), |wd| {
            wd.sprites.set(1, Attribute::Include);
            wd.direction = Direction::Right;
            wd.commands.push(Command::movement(MoveArg::Right));
        });
        rule.symmetry = Symmetry::LeftRotate;

        let base = RuleView::new(&rule, RuleId(0), KINDS);
        let evaluator = Evaluator::new(KINDS, &VmConfig::default());
        assert!(evaluator.evaluate(&grid, 1, &base).is_none());

        let rotated = base.derived_views()[0];
        let firing = evaluator.evaluate(&grid, 1, &rotated).unwrap();
        assert_eq!(firing.transform, Some(Transform::LeftRotate));
        assert_eq!(firing.commands[0].command, Command::movement(MoveArg::Up));
        assert_eq!((firing.commands[0].col, firing.commands[0].row), (5, 4));
    }

    #[test]
    fn test_missing_sprite_never_fires() {
        let grid = Grid::default();
        let rule = rule_with(Coord::CENTER, |_| {});
        assert!(evaluate(&grid, &rule, &VmConfig::default()).is_none());
    }
}
