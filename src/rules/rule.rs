//! Rule data model.
//!
//! A `Rule` is a rule type, a small argument, a symmetry tag and a list of
//! `WhenDo` entries. Each `WhenDo` sits at one cell of the 5×5 neighborhood
//! window and pairs a guard (background and sprite predicates plus a
//! witness direction) with up to `MAX_COMMANDS` commands.
//!
//! Every enum here is stored in four bits on the wire (commands use a full
//! byte), so no vocabulary may grow past 16 values.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::KindCounts;

use super::coord::Coord;
use super::direction::{Direction, MoveDirection};
use super::predicate::Predicate;
use super::transform::Symmetry;

/// Maximum commands per `WhenDo` (four-bit counter, capped by the editor).
pub const MAX_COMMANDS: usize = 4;

/// Maximum `WhenDo` entries a rule may carry (four-bit counter).
pub const MAX_WHEN_DOS: usize = 15;

/// What causes a rule to be considered for a sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RuleType {
    /// A controller button was pressed.
    ButtonPress = 0,
    /// The sprite's neighborhood (or its own motion) matches.
    ContextChange = 1,
    /// The sprite is about to move into an occupied tile.
    Collision = 2,
    /// A pattern that must never occur.
    NegationCheck = 3,
}

impl RuleType {
    pub const ALL: [RuleType; 4] = [
        RuleType::ButtonPress,
        RuleType::ContextChange,
        RuleType::Collision,
        RuleType::NegationCheck,
    ];

    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::ButtonPress),
            1 => Some(Self::ContextChange),
            2 => Some(Self::Collision),
            3 => Some(Self::NegationCheck),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ButtonPress => "press",
            Self::ContextChange => "change",
            Self::Collision => "collide",
            Self::NegationCheck => "negate",
        }
    }
}

/// Controller buttons, used as the argument of `ButtonPress` rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ButtonArg {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
    A = 4,
    B = 5,
}

impl ButtonArg {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Left),
            1 => Some(Self::Up),
            2 => Some(Self::Right),
            3 => Some(Self::Down),
            4 => Some(Self::A),
            5 => Some(Self::B),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::A => "A",
            Self::B => "B",
        }
    }
}

/// Instruction of a command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandType {
    /// Move, stop or reverse a sprite (`MoveArg`).
    #[default]
    Move = 0,
    /// Paint the tile with a background kind.
    Paint = 1,
    /// Spawn a sprite of a kind at the tile, resting or moving (`SpawnArg`).
    Spawn = 2,
    /// Sprite state change (`SpriteArg`).
    SpriteOp = 3,
    /// Game-level effect (`GameArg`).
    GameOp = 4,
    /// Teleport the witness to a random tile of a background kind.
    Portal = 5,
    /// Suppress rules for a sprite kind during the next round.
    BlockRules = 6,
}

impl CommandType {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Move),
            1 => Some(Self::Paint),
            2 => Some(Self::Spawn),
            3 => Some(Self::SpriteOp),
            4 => Some(Self::GameOp),
            5 => Some(Self::Portal),
            6 => Some(Self::BlockRules),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Paint => "paint",
            Self::Spawn => "spawn",
            Self::SpriteOp => "sprite",
            Self::GameOp => "game",
            Self::Portal => "portal",
            Self::BlockRules => "block",
        }
    }
}

/// Argument of a `Move` command. Only the first four are directional.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MoveArg {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
    Stop = 4,
    UTurn = 5,
}

impl MoveArg {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Left),
            1 => Some(Self::Up),
            2 => Some(Self::Right),
            3 => Some(Self::Down),
            4 => Some(Self::Stop),
            5 => Some(Self::UTurn),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::Stop => "stop",
            Self::UTurn => "u-turn",
        }
    }
}

/// Argument of a `SpriteOp` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpriteArg {
    /// Destroy the sprite witnessed at the command's cell.
    Remove = 0,
}

impl SpriteArg {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Remove),
            _ => None,
        }
    }
}

/// Argument of a `Spawn` command: sprite kind in the low nibble, motion in
/// the high nibble.
///
/// High nibbles outside the four cardinals spawn the sprite resting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnArg {
    pub kind: u8,
    pub motion: Option<MoveDirection>,
}

impl SpawnArg {
    /// High nibble written for a resting spawn.
    const RESTING: u8 = Direction::Resting.bits();

    /// `kind` is truncated to four bits.
    #[must_use]
    pub const fn new(kind: u8, motion: Option<MoveDirection>) -> Self {
        Self {
            kind: kind & 0xF,
            motion,
        }
    }

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            kind: bits & 0xF,
            motion: MoveDirection::from_bits(bits >> 4),
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        let high = match self.motion {
            Some(dir) => dir.bits(),
            None => Self::RESTING,
        };
        (high << 4) | self.kind
    }
}

/// Argument of a `GameOp` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameArg {
    Win = 0,
    Lose = 1,
    ScoreUp10 = 2,
    NextLevel = 3,
}

impl GameArg {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Win),
            1 => Some(Self::Lose),
            2 => Some(Self::ScoreUp10),
            3 => Some(Self::NextLevel),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Lose => "lose",
            Self::ScoreUp10 => "score10",
            Self::NextLevel => "next-level",
        }
    }
}

/// One instruction with its byte-sized argument.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    pub inst: CommandType,
    pub arg: u8,
}

impl Command {
    #[must_use]
    pub const fn new(inst: CommandType, arg: u8) -> Self {
        Self { inst, arg }
    }

    /// A `Move` command.
    #[must_use]
    pub const fn movement(arg: MoveArg) -> Self {
        Self::new(CommandType::Move, arg.bits())
    }

    /// A `GameOp` command.
    #[must_use]
    pub const fn game(arg: GameArg) -> Self {
        Self::new(CommandType::GameOp, arg as u8)
    }

    /// A `Spawn` command.
    #[must_use]
    pub const fn spawn(arg: SpawnArg) -> Self {
        Self::new(CommandType::Spawn, arg.bits())
    }
}

/// A guarded group of commands attached to one neighborhood cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhenDo {
    /// Cell in the 5×5 window, `(2,2)` is the centre.
    pub coord: Coord,
    /// One attribute per background kind.
    pub background: Predicate,
    /// One attribute per sprite kind.
    pub sprites: Predicate,
    /// Direction the witness sprite must have.
    pub direction: Direction,
    /// Commands executed in order when the rule fires.
    pub commands: SmallVec<[Command; MAX_COMMANDS]>,
}

impl WhenDo {
    /// An unconstrained entry at `coord` with predicates sized to `kinds`.
    #[must_use]
    pub fn new(coord: Coord, kinds: KindCounts) -> Self {
        Self {
            coord,
            background: Predicate::new(kinds.backgrounds),
            sprites: Predicate::new(kinds.sprites),
            direction: Direction::AnyDir,
            commands: SmallVec::new(),
        }
    }

    /// Whether the guard constrains nothing.
    #[must_use]
    pub fn is_vacuous(&self) -> bool {
        self.background.is_vacuous() && self.sprites.is_vacuous()
    }

    /// A vacuous entry without commands; dropped when packing.
    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.is_vacuous() && self.commands.is_empty()
    }

    /// Whether both predicates are sized to `kinds`.
    #[must_use]
    pub fn fits(&self, kinds: KindCounts) -> bool {
        self.background.len() == kinds.backgrounds && self.sprites.len() == kinds.sprites
    }
}

/// A designer-authored rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_type: RuleType,
    /// Button id for `ButtonPress` rules, otherwise unused.
    pub rule_arg: u8,
    /// Guarded commands; no two share a coordinate.
    pub when_dos: Vec<WhenDo>,
    /// Which transformed variants are derived from this rule.
    pub symmetry: Symmetry,
}

impl Rule {
    /// An empty rule.
    #[must_use]
    pub fn new(rule_type: RuleType, rule_arg: u8) -> Self {
        Self {
            rule_type,
            rule_arg,
            when_dos: Vec::new(),
            symmetry: Symmetry::None,
        }
    }

    /// Set the symmetry tag.
    #[must_use]
    pub fn with_symmetry(mut self, symmetry: Symmetry) -> Self {
        self.symmetry = symmetry;
        self
    }

    /// Index of the entry stored at `coord`.
    #[must_use]
    pub fn find(&self, coord: Coord) -> Option<usize> {
        self.when_dos.iter().position(|wd| wd.coord == coord)
    }

    /// Whether every entry in the inner 3×3 constrains nothing.
    #[must_use]
    pub fn is_vacuous(&self) -> bool {
        self.when_dos
            .iter()
            .filter(|wd| wd.coord.col.abs_diff(2) <= 1 && wd.coord.row.abs_diff(2) <= 1)
            .all(WhenDo::is_vacuous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::predicate::Attribute;

    #[test]
    fn test_spawn_arg_nibbles() {
        let moving = SpawnArg::new(1, Some(MoveDirection::Right));
        assert_eq!(moving.bits(), 0x21);
        assert_eq!(SpawnArg::from_bits(0x21), moving);

        let resting = SpawnArg::new(4, None);
        assert_eq!(resting.bits(), 0x44);
        assert_eq!(SpawnArg::from_bits(0xF4), resting);
        assert_eq!(SpawnArg::from_bits(0x04).motion, Some(MoveDirection::Left));
    }

    #[test]
    fn test_when_do_defaults() {
        let wd = WhenDo::new(Coord::CENTER, KindCounts::new(3, 5));
        assert_eq!(wd.direction, Direction::AnyDir);
        assert_eq!(wd.background.len(), 3);
        assert_eq!(wd.sprites.len(), 5);
        assert!(wd.is_vacuous());
        assert!(wd.is_no_op());
        assert!(wd.fits(KindCounts::new(3, 5)));
    }

    #[test]
    fn test_commands_make_entry_meaningful() {
        let mut wd = WhenDo::new(Coord::new(1, 2), KindCounts::new(1, 1));
        wd.commands.push(Command::movement(MoveArg::Stop));
        assert!(wd.is_vacuous());
        assert!(!wd.is_no_op());
    }

    #[test]
    fn test_rule_find() {
        let kinds = KindCounts::new(2, 2);
        let mut rule = Rule::new(RuleType::ContextChange, 0);
        rule.when_dos.push(WhenDo::new(Coord::CENTER, kinds));
        rule.when_dos.push(WhenDo::new(Coord::new(3, 2), kinds));

        assert_eq!(rule.find(Coord::new(3, 2)), Some(1));
        assert_eq!(rule.find(Coord::new(0, 0)), None);
    }

    #[test]
    fn test_rule_vacuity_ignores_outer_ring() {
        let kinds = KindCounts::new(2, 2);
        let mut rule = Rule::new(RuleType::ContextChange, 0);
        let mut outer = WhenDo::new(Coord::new(0, 2), kinds);
        outer.background.set(0, Attribute::Include);
        rule.when_dos.push(outer);
        assert!(rule.is_vacuous());

        let mut inner = WhenDo::new(Coord::new(2, 1), kinds);
        inner.sprites.set(1, Attribute::Exclude);
        rule.when_dos.push(inner);
        assert!(!rule.is_vacuous());
    }

    #[test]
    fn test_enum_bits() {
        for rt in RuleType::ALL {
            assert_eq!(RuleType::from_bits(rt.bits()), Some(rt));
        }
        assert_eq!(CommandType::from_bits(7), None);
        assert_eq!(MoveArg::from_bits(5), Some(MoveArg::UTurn));
        assert_eq!(ButtonArg::from_bits(4), Some(ButtonArg::A));
        assert_eq!(GameArg::from_bits(2), Some(GameArg::ScoreUp10));
    }

    #[test]
    fn test_rule_serialization() {
        let mut rule = Rule::new(RuleType::ButtonPress, ButtonArg::Up.bits());
        let mut wd = WhenDo::new(Coord::CENTER, KindCounts::new(1, 2));
        wd.commands.push(Command::movement(MoveArg::Up));
        rule.when_dos.push(wd);

        let json = serde_json::to_string(&rule).unwrap();
        let deserialized: Rule = serde_json::from_str(&json).unwrap();
        assert_eq!(rule, deserialized);
    }
}
