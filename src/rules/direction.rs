//! Movement and witness directions.
//!
//! Directions `0..4` run clockwise starting at `Left`, so a quarter turn is
//! a ±1 step modulo 4 and a half turn is +2. Rows grow downward.

use serde::{Deserialize, Serialize};

/// One of the four cardinal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MoveDirection {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
}

impl MoveDirection {
    /// All four directions in wire order.
    pub const ALL: [MoveDirection; 4] = [
        MoveDirection::Left,
        MoveDirection::Up,
        MoveDirection::Right,
        MoveDirection::Down,
    ];

    /// Decode from the low two bits of a wire value.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Left),
            1 => Some(Self::Up),
            2 => Some(Self::Right),
            3 => Some(Self::Down),
            _ => None,
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Column delta of one step.
    #[must_use]
    pub const fn dx(self) -> i32 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
            Self::Up | Self::Down => 0,
        }
    }

    /// Row delta of one step.
    #[must_use]
    pub const fn dy(self) -> i32 {
        match self {
            Self::Up => -1,
            Self::Down => 1,
            Self::Left | Self::Right => 0,
        }
    }

    /// Rotate clockwise by `steps` quarter turns.
    #[must_use]
    pub const fn turn(self, steps: u8) -> Self {
        match (self as u8 + steps) % 4 {
            0 => Self::Left,
            1 => Self::Up,
            2 => Self::Right,
            _ => Self::Down,
        }
    }

    /// The reverse direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        self.turn(2)
    }
}

/// Direction a witness sprite must have for a guard to hold.
///
/// The first four values are the cardinal directions (a sprite moving that
/// way). `Resting`, `Moving` and `AnyDir` are unaffected by rule transforms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
    Resting = 4,
    Moving = 5,
    #[default]
    AnyDir = 6,
}

impl Direction {
    /// All seven values in wire order.
    pub const ALL: [Direction; 7] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Resting,
        Direction::Moving,
        Direction::AnyDir,
    ];

    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Left),
            1 => Some(Self::Up),
            2 => Some(Self::Right),
            3 => Some(Self::Down),
            4 => Some(Self::Resting),
            5 => Some(Self::Moving),
            6 => Some(Self::AnyDir),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// The cardinal direction, if this is one.
    #[must_use]
    pub const fn as_move(self) -> Option<MoveDirection> {
        MoveDirection::from_bits(self as u8)
    }

    /// Whether a sprite with the given motion (`None` = resting) satisfies
    /// this direction.
    #[must_use]
    pub fn matches(self, motion: Option<MoveDirection>) -> bool {
        match self {
            Self::AnyDir => true,
            Self::Moving => motion.is_some(),
            Self::Resting => motion.is_none(),
            cardinal => motion == cardinal.as_move(),
        }
    }
}

impl From<MoveDirection> for Direction {
    fn from(dir: MoveDirection) -> Self {
        match dir {
            MoveDirection::Left => Self::Left,
            MoveDirection::Up => Self::Up,
            MoveDirection::Right => Self::Right,
            MoveDirection::Down => Self::Down,
        }
    }
}
