//! Read/write projections over a stored rule.
//!
//! A `RuleView` wraps one `Rule` and, optionally, a `Transform`. It never
//! copies `WhenDo` data: coordinates, directions, the button argument and
//! directional move arguments are mapped on every read, and writes go back
//! through the inverse transform so they land on the right stored entry.
//!
//! The base view (no transform) carries the rule's id and is the editable
//! one. Transformed views carry no id and exist for evaluation and preview.
//!
//! `R` is the borrow of the rule: `&Rule` for read-only views (copyable, and
//! the only kind that can hand out derived views) or `&mut Rule` for
//! editing.
//!
//! ```
//! use tile_rules::core::{KindCounts, RuleId};
//! use tile_rules::rules::{Coord, Direction, Rule, RuleType, RuleView, Symmetry};
//!
//! let kinds = KindCounts::new(2, 2);
//! let mut rule = Rule::new(RuleType::ContextChange, 0).with_symmetry(Symmetry::HorzMirror);
//!
//! let mut editor = RuleView::new(&mut rule, RuleId(0), kinds);
//! let wd = editor.make_when_do(3, 2).unwrap();
//! editor.set_witness_direction(wd, Direction::Right);
//!
//! let base = RuleView::new(&rule, RuleId(0), kinds);
//! let mirrored = base.derived_views()[0];
//! let wd = mirrored.when_do(1, 2).unwrap();
//! assert_eq!(mirrored.witness_direction(wd), Some(Direction::Left));
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};

use smallvec::SmallVec;

use crate::core::{KindCounts, RuleId};

use super::coord::Coord;
use super::direction::Direction;
use super::predicate::{Attribute, Predicate};
use super::rule::{
    ButtonArg, Command, CommandType, GameArg, MoveArg, Rule, RuleType, SpawnArg, WhenDo,
};
use super::rule::{MAX_COMMANDS, MAX_WHEN_DOS};
use super::transform::{Symmetry, Transform};

/// Counts over the inner 3×3 of a rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuleStats {
    pub when_dos: usize,
    pub commands: usize,
    pub attributes: usize,
}

/// A possibly transformed projection of one rule.
#[derive(Clone, Copy, Debug)]
pub struct RuleView<R> {
    rule: R,
    id: Option<RuleId>,
    transform: Option<Transform>,
    kinds: KindCounts,
}

impl<R> RuleView<R> {
    /// The editable base view of a stored rule.
    pub fn new(rule: R, id: RuleId, kinds: KindCounts) -> Self {
        Self {
            rule,
            id: Some(id),
            transform: None,
            kinds,
        }
    }

    /// A transformed view with no persisted identity.
    pub fn transformed(rule: R, transform: Transform, kinds: KindCounts) -> Self {
        Self {
            rule,
            id: None,
            transform: Some(transform),
            kinds,
        }
    }

    /// Id of the viewed rule; `None` for transformed views.
    #[must_use]
    pub fn rule_id(&self) -> Option<RuleId> {
        match self.transform {
            None => self.id,
            Some(_) => None,
        }
    }

    /// Id of the stored rule a view was derived from, if it has one.
    #[must_use]
    pub fn source_id(&self) -> Option<RuleId> {
        self.id
    }

    /// Transform applied by this view; `None` for the base view.
    #[must_use]
    pub fn view_transform(&self) -> Option<Transform> {
        self.transform
    }

    /// Kind counts used to size new predicates.
    #[must_use]
    pub fn kinds(&self) -> KindCounts {
        self.kinds
    }

    /// Stored coordinate addressed by a view coordinate.
    fn stored_coord(&self, coord: Coord) -> Coord {
        match self.transform {
            Some(t) => t.inverse().apply_coord(coord),
            None => coord,
        }
    }
}

impl<'a> RuleView<&'a Rule> {
    /// Sibling views implied by the rule's symmetry tag.
    ///
    /// One view for a single mirror or rotation, three (left, double,
    /// right) for `Rotate3Way`, none for `None`.
    #[must_use]
    pub fn derived_views(&self) -> SmallVec<[RuleView<&'a Rule>; 3]> {
        self.rule
            .symmetry
            .derived_transforms()
            .iter()
            .map(|&t| RuleView {
                rule: self.rule,
                id: self.id,
                transform: Some(t),
                kinds: self.kinds,
            })
            .collect()
    }

    /// The base view followed by every derived view.
    #[must_use]
    pub fn all_views(&self) -> SmallVec<[RuleView<&'a Rule>; 4]> {
        let base = RuleView {
            transform: None,
            ..*self
        };
        std::iter::once(base).chain(self.derived_views()).collect()
    }
}

impl<R: Deref<Target = Rule>> RuleView<R> {
    /// The stored rule, untransformed.
    #[must_use]
    pub fn base_rule(&self) -> &Rule {
        &self.rule
    }

    /// A read-only copy of this view.
    #[must_use]
    pub fn as_view(&self) -> RuleView<&Rule> {
        RuleView {
            rule: &*self.rule,
            id: self.id,
            transform: self.transform,
            kinds: self.kinds,
        }
    }

    #[must_use]
    pub fn symmetry(&self) -> Symmetry {
        self.rule.symmetry
    }

    #[must_use]
    pub fn rule_type(&self) -> RuleType {
        self.rule.rule_type
    }

    /// The rule argument; a `ButtonPress` direction button is transformed.
    #[must_use]
    pub fn rule_arg(&self) -> u8 {
        match (self.transform, self.rule.rule_type) {
            (Some(t), RuleType::ButtonPress) => t.apply_bits(self.rule.rule_arg),
            _ => self.rule.rule_arg,
        }
    }

    /// The button of a `ButtonPress` rule.
    #[must_use]
    pub fn button(&self) -> Option<ButtonArg> {
        match self.rule.rule_type {
            RuleType::ButtonPress => ButtonArg::from_bits(self.rule_arg()),
            _ => None,
        }
    }

    /// Direction the evaluated sprite must have for this rule to apply.
    ///
    /// Collision and context rules use the centre entry's witness
    /// direction; button rules use the pressed direction (`AnyDir` for the
    /// A/B buttons).
    #[must_use]
    pub fn dir_from_rule(&self) -> Direction {
        match self.rule.rule_type {
            RuleType::Collision | RuleType::ContextChange => self
                .when_do(2, 2)
                .and_then(|wd| self.witness_direction(wd))
                .unwrap_or(Direction::AnyDir),
            RuleType::ButtonPress => self
                .button()
                .and_then(|b| Direction::from_bits(b.bits()))
                .filter(|d| d.as_move().is_some())
                .unwrap_or(Direction::AnyDir),
            RuleType::NegationCheck => Direction::AnyDir,
        }
    }

    /// Index of the entry shown at view cell `(col, row)`.
    #[must_use]
    pub fn when_do(&self, col: u8, row: u8) -> Option<usize> {
        let coord = Coord::new(col, row);
        if !coord.in_window() {
            return None;
        }
        self.rule.find(self.stored_coord(coord))
    }

    /// Number of stored entries.
    #[must_use]
    pub fn when_do_count(&self) -> usize {
        self.rule.when_dos.len()
    }

    fn entry(&self, wd: usize) -> Option<&WhenDo> {
        self.rule.when_dos.get(wd)
    }

    /// View coordinate of entry `wd`.
    #[must_use]
    pub fn when_do_coord(&self, wd: usize) -> Option<Coord> {
        let stored = self.entry(wd)?.coord;
        Some(match self.transform {
            Some(t) => t.apply_coord(stored),
            None => stored,
        })
    }

    #[must_use]
    pub fn background_attr(&self, wd: usize, kind: usize) -> Option<Attribute> {
        self.entry(wd)?.background.get(kind)
    }

    #[must_use]
    pub fn sprite_attr(&self, wd: usize, kind: usize) -> Option<Attribute> {
        self.entry(wd)?.sprites.get(kind)
    }

    /// Number of constrained kinds in entry `wd`.
    #[must_use]
    pub fn attr_count(&self, wd: usize) -> usize {
        self.entry(wd)
            .map_or(0, |e| e.background.constrained() + e.sprites.constrained())
    }

    /// The sprite kind witnessed at `(col, row)`: the first included sprite
    /// kind, provided no background kind is included there.
    ///
    /// With `editor` set, negation rules never report a witness.
    #[must_use]
    pub fn find_witness_kind(&self, col: u8, row: u8, editor: bool) -> Option<usize> {
        if editor && self.rule.rule_type == RuleType::NegationCheck {
            return None;
        }
        let entry = self.entry(self.when_do(col, row)?)?;
        if entry.background.kinds_with(Attribute::Include).next().is_some() {
            return None;
        }
        entry.sprites.kinds_with(Attribute::Include).next()
    }

    /// Witness direction of entry `wd`, transformed.
    #[must_use]
    pub fn witness_direction(&self, wd: usize) -> Option<Direction> {
        let dir = self.entry(wd)?.direction;
        Some(match self.transform {
            Some(t) => t.apply_direction(dir),
            None => dir,
        })
    }

    /// Number of commands in entry `wd` (0 when absent).
    #[must_use]
    pub fn command_count(&self, wd: usize) -> usize {
        self.entry(wd).map_or(0, |e| e.commands.len())
    }

    /// Command `cid` of entry `wd`; move arguments and spawn motions are
    /// transformed.
    #[must_use]
    pub fn command(&self, wd: usize, cid: usize) -> Option<Command> {
        let mut cmd = *self.entry(wd)?.commands.get(cid)?;
        if let Some(t) = self.transform {
            cmd.arg = transform_arg(t, cmd.inst, cmd.arg);
        }
        Some(cmd)
    }

    /// Sprite kinds the centre entry includes (either inclusion set).
    #[must_use]
    pub fn sprite_kinds(&self) -> Vec<usize> {
        let Some(center) = self.when_do(2, 2).and_then(|wd| self.entry(wd)) else {
            return Vec::new();
        };
        center
            .sprites
            .iter()
            .enumerate()
            .filter(|(_, a)| matches!(a, Attribute::Include | Attribute::Include2))
            .map(|(kind, _)| kind)
            .collect()
    }

    /// Whether the centre entry includes sprite `kind`.
    #[must_use]
    pub fn has_sprite_kind(&self, kind: usize) -> bool {
        self.when_do(2, 2)
            .and_then(|wd| self.sprite_attr(wd, kind))
            .is_some_and(|a| matches!(a, Attribute::Include | Attribute::Include2))
    }

    /// Whether entry `wd` constrains nothing.
    #[must_use]
    pub fn when_do_vacuous(&self, wd: usize) -> bool {
        self.entry(wd).map_or(true, WhenDo::is_vacuous)
    }

    /// Whether the inner 3×3 constrains nothing.
    #[must_use]
    pub fn is_vacuous(&self) -> bool {
        self.rule.is_vacuous()
    }

    /// Entry, command and attribute counts over the inner 3×3.
    #[must_use]
    pub fn stats(&self) -> RuleStats {
        let mut stats = RuleStats::default();
        for col in 1..=3 {
            for row in 1..=3 {
                if let Some(wd) = self.when_do(col, row) {
                    stats.when_dos += 1;
                    stats.commands += self.command_count(wd);
                    stats.attributes += self.attr_count(wd);
                }
            }
        }
        stats
    }
}

impl<R: DerefMut<Target = Rule>> RuleView<R> {
    pub fn set_symmetry(&mut self, symmetry: Symmetry) {
        self.rule.symmetry = symmetry;
    }

    pub fn set_rule_type(&mut self, rule_type: RuleType) {
        self.rule.rule_type = rule_type;
    }

    /// Set the rule argument, mapping a button back through the transform.
    pub fn set_rule_arg(&mut self, arg: u8) {
        self.rule.rule_arg = match (self.transform, self.rule.rule_type) {
            (Some(t), RuleType::ButtonPress) => t.inverse().apply_bits(arg),
            _ => arg,
        };
    }

    /// Index of the entry at view cell `(col, row)`, creating an
    /// unconstrained one if none exists.
    ///
    /// Returns `None` for cells outside the window or when the rule already
    /// holds `MAX_WHEN_DOS` entries.
    pub fn make_when_do(&mut self, col: u8, row: u8) -> Option<usize> {
        let coord = Coord::new(col, row);
        if !coord.in_window() {
            return None;
        }
        if let Some(existing) = self.when_do(col, row) {
            return Some(existing);
        }
        if self.rule.when_dos.len() >= MAX_WHEN_DOS {
            return None;
        }
        let stored = self.stored_coord(coord);
        self.rule.when_dos.push(WhenDo::new(stored, self.kinds));
        Some(self.rule.when_dos.len() - 1)
    }

    fn entry_mut(&mut self, wd: usize) -> Option<&mut WhenDo> {
        self.rule.when_dos.get_mut(wd)
    }

    /// Set a background attribute, returning the previous value.
    pub fn set_background_attr(&mut self, wd: usize, kind: usize, attr: Attribute) -> Option<Attribute> {
        self.entry_mut(wd)?.background.set(kind, attr)
    }

    /// Set a sprite attribute, returning the previous value.
    pub fn set_sprite_attr(&mut self, wd: usize, kind: usize, attr: Attribute) -> Option<Attribute> {
        self.entry_mut(wd)?.sprites.set(kind, attr)
    }

    /// Set the witness direction of entry `wd` as seen through this view.
    pub fn set_witness_direction(&mut self, wd: usize, dir: Direction) -> Option<Direction> {
        let stored = match self.transform {
            Some(t) => t.inverse().apply_direction(dir),
            None => dir,
        };
        let entry = self.entry_mut(wd)?;
        entry.direction = stored;
        Some(dir)
    }

    /// Slot `cid` of entry `wd`, appending a default command when `cid` is
    /// exactly one past the end. Gaps and overflow are refused.
    fn slot_mut(&mut self, wd: usize, cid: usize) -> Option<&mut Command> {
        let commands = &mut self.entry_mut(wd)?.commands;
        if cid == commands.len() && cid < MAX_COMMANDS {
            commands.push(Command::default());
        }
        commands.get_mut(cid)
    }

    /// Set the instruction of command `cid`.
    pub fn set_command_inst(&mut self, wd: usize, cid: usize, inst: CommandType) -> Option<CommandType> {
        let slot = self.slot_mut(wd, cid)?;
        slot.inst = inst;
        Some(inst)
    }

    /// Set the argument of command `cid`, as seen through this view.
    pub fn set_command_arg(&mut self, wd: usize, cid: usize, arg: u8) -> Option<u8> {
        let inverse = self.transform.map(Transform::inverse);
        let slot = self.slot_mut(wd, cid)?;
        slot.arg = match inverse {
            Some(t) => transform_arg(t, slot.inst, arg),
            None => arg,
        };
        Some(arg)
    }

    /// Remove command `cid`, shifting later commands down.
    ///
    /// Returns the remaining command count (0 when the entry is absent).
    pub fn remove_command(&mut self, wd: usize, cid: usize) -> usize {
        let Some(entry) = self.entry_mut(wd) else {
            return 0;
        };
        if cid < entry.commands.len() {
            entry.commands.remove(cid);
        }
        entry.commands.len()
    }
}

/// Map the directional part of a command argument through `t`.
fn transform_arg(t: Transform, inst: CommandType, arg: u8) -> u8 {
    match inst {
        CommandType::Move => t.apply_bits(arg),
        CommandType::Spawn => match SpawnArg::from_bits(arg) {
            SpawnArg {
                kind,
                motion: Some(dir),
            } => SpawnArg::new(kind, Some(t.apply_move(dir))).bits(),
            SpawnArg { motion: None, .. } => arg,
        },
        _ => arg,
    }
}

fn attr_labels(background: &Predicate, sprites: &Predicate, attr: Attribute) -> String {
    background
        .kinds_with(attr)
        .map(|k| format!("b{k}"))
        .chain(sprites.kinds_with(attr).map(|k| format!("s{k}")))
        .collect::<Vec<_>>()
        .join(":")
}

fn command_arg_label(cmd: Command) -> String {
    match cmd.inst {
        CommandType::Move => MoveArg::from_bits(cmd.arg)
            .map_or_else(|| cmd.arg.to_string(), |a| a.label().to_string()),
        CommandType::GameOp => GameArg::from_bits(cmd.arg)
            .map_or_else(|| cmd.arg.to_string(), |a| a.label().to_string()),
        CommandType::Paint | CommandType::Spawn | CommandType::Portal | CommandType::BlockRules => {
            cmd.arg.to_string()
        }
        CommandType::SpriteOp => "remove".to_string(),
    }
}

/// Line-oriented dump of the rule as seen through the view.
impl<R: Deref<Target = Rule>> fmt::Display for RuleView<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule_id() {
            Some(id) => writeln!(f, "id:{}", id.raw())?,
            None => writeln!(f, "id:-")?,
        }
        let arg = self.button().map_or("none", ButtonArg::label);
        writeln!(f, "rule:{}:{}", self.rule_type().label(), arg)?;
        for (wd, entry) in self.rule.when_dos.iter().enumerate() {
            let coord = self.when_do_coord(wd).unwrap_or(entry.coord);
            writeln!(f, "tile:{}:{}", coord.col, coord.row)?;
            for attr in [Attribute::Include, Attribute::Include2, Attribute::Exclude] {
                writeln!(f, "{}:{}", attr.label(), attr_labels(&entry.background, &entry.sprites, attr))?;
            }
            for cid in 0..entry.commands.len() {
                if let Some(cmd) = self.command(wd, cid) {
                    writeln!(f, "cmd:{}:{}", cmd.inst.label(), command_arg_label(cmd))?;
                }
            }
        }
        Ok(())
    }
}
