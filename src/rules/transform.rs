//! Geometric rule transforms.
//!
//! A rule's `Symmetry` tag declares which mirrored or rotated variants the
//! engine should derive from it. Each variant is a `Transform`, a pure
//! mapping over window coordinates and directions. Rotations are about the
//! centre `(2,2)`; `LeftRotate` is a quarter turn counterclockwise on
//! screen, so a cell to the right of the centre moves above it and a sprite
//! moving right ends up moving up.
//!
//! ```
//! use tile_rules::rules::{Coord, Direction, Transform};
//!
//! let t = Transform::LeftRotate;
//! assert_eq!(t.apply_coord(Coord::new(3, 2)), Coord::new(2, 1));
//! assert_eq!(t.apply_direction(Direction::Right), Direction::Up);
//! assert_eq!(t.inverse().apply_coord(Coord::new(2, 1)), Coord::new(3, 2));
//! ```

use serde::{Deserialize, Serialize};

use super::coord::{Coord, WINDOW};
use super::direction::{Direction, MoveDirection};
use super::rule::{ButtonArg, MoveArg};

/// Symmetry tag stored on a rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Symmetry {
    #[default]
    None = 0,
    HorzMirror = 1,
    VertMirror = 2,
    LeftRotate = 3,
    DoubleRotate = 4,
    RightRotate = 5,
    /// Left, double and right rotations together.
    Rotate3Way = 6,
}

impl Symmetry {
    pub const ALL: [Symmetry; 7] = [
        Symmetry::None,
        Symmetry::HorzMirror,
        Symmetry::VertMirror,
        Symmetry::LeftRotate,
        Symmetry::DoubleRotate,
        Symmetry::RightRotate,
        Symmetry::Rotate3Way,
    ];

    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::None),
            1 => Some(Self::HorzMirror),
            2 => Some(Self::VertMirror),
            3 => Some(Self::LeftRotate),
            4 => Some(Self::DoubleRotate),
            5 => Some(Self::RightRotate),
            6 => Some(Self::Rotate3Way),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Transforms of the sibling views implied by this tag.
    #[must_use]
    pub const fn derived_transforms(self) -> &'static [Transform] {
        match self {
            Self::None => &[],
            Self::HorzMirror => &[Transform::HorzMirror],
            Self::VertMirror => &[Transform::VertMirror],
            Self::LeftRotate => &[Transform::LeftRotate],
            Self::DoubleRotate => &[Transform::DoubleRotate],
            Self::RightRotate => &[Transform::RightRotate],
            Self::Rotate3Way => &[
                Transform::LeftRotate,
                Transform::DoubleRotate,
                Transform::RightRotate,
            ],
        }
    }
}

/// A non-identity mirror or rotation of the neighborhood window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transform {
    /// Reflect across the centre column.
    HorzMirror,
    /// Reflect across the centre row.
    VertMirror,
    /// Quarter turn counterclockwise.
    LeftRotate,
    /// Half turn.
    DoubleRotate,
    /// Quarter turn clockwise.
    RightRotate,
}

impl Transform {
    pub const ALL: [Transform; 5] = [
        Transform::HorzMirror,
        Transform::VertMirror,
        Transform::LeftRotate,
        Transform::DoubleRotate,
        Transform::RightRotate,
    ];

    /// The transform undoing this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::LeftRotate => Self::RightRotate,
            Self::RightRotate => Self::LeftRotate,
            other => other,
        }
    }

    /// The symmetry tag naming this single transform.
    #[must_use]
    pub const fn symmetry(self) -> Symmetry {
        match self {
            Self::HorzMirror => Symmetry::HorzMirror,
            Self::VertMirror => Symmetry::VertMirror,
            Self::LeftRotate => Symmetry::LeftRotate,
            Self::DoubleRotate => Symmetry::DoubleRotate,
            Self::RightRotate => Symmetry::RightRotate,
        }
    }

    /// Map a window coordinate.
    #[must_use]
    pub fn apply_coord(self, coord: Coord) -> Coord {
        debug_assert!(coord.in_window(), "{coord} lies outside the window");
        let last = WINDOW - 1;
        match self {
            Self::HorzMirror => Coord::new(last - coord.col, coord.row),
            Self::VertMirror => Coord::new(coord.col, last - coord.row),
            Self::LeftRotate | Self::DoubleRotate | Self::RightRotate => {
                let (x, y) = coord.offset();
                let (x, y) = match self {
                    Self::LeftRotate => (y, -x),
                    Self::RightRotate => (-y, x),
                    _ => (-x, -y),
                };
                Coord::new((x + 2) as u8, (y + 2) as u8)
            }
        }
    }

    /// Map a cardinal direction.
    #[must_use]
    pub const fn apply_move(self, dir: MoveDirection) -> MoveDirection {
        match self {
            Self::HorzMirror => match dir {
                MoveDirection::Left => MoveDirection::Right,
                MoveDirection::Right => MoveDirection::Left,
                other => other,
            },
            Self::VertMirror => match dir {
                MoveDirection::Up => MoveDirection::Down,
                MoveDirection::Down => MoveDirection::Up,
                other => other,
            },
            Self::LeftRotate => dir.turn(3),
            Self::DoubleRotate => dir.turn(2),
            Self::RightRotate => dir.turn(1),
        }
    }

    /// Map a witness direction; `Resting`, `Moving` and `AnyDir` are fixed.
    #[must_use]
    pub fn apply_direction(self, dir: Direction) -> Direction {
        match dir.as_move() {
            Some(cardinal) => self.apply_move(cardinal).into(),
            None => dir,
        }
    }

    /// Map a raw direction-like byte (button or move argument); values past
    /// the four cardinals pass through.
    #[must_use]
    pub const fn apply_bits(self, bits: u8) -> u8 {
        match MoveDirection::from_bits(bits) {
            Some(cardinal) => self.apply_move(cardinal).bits(),
            None => bits,
        }
    }

    /// Map a button argument; `A` and `B` are fixed.
    #[must_use]
    pub fn apply_button(self, button: ButtonArg) -> ButtonArg {
        ButtonArg::from_bits(self.apply_bits(button.bits())).unwrap_or(button)
    }

    /// Map a move argument; `Stop` and `UTurn` are fixed.
    #[must_use]
    pub fn apply_move_arg(self, arg: MoveArg) -> MoveArg {
        MoveArg::from_bits(self.apply_bits(arg.bits())).unwrap_or(arg)
    }
}

/// Map `coord` through an optional transform.
#[must_use]
pub fn transform_coord(coord: Coord, transform: Option<Transform>) -> Coord {
    transform.map_or(coord, |t| t.apply_coord(coord))
}

/// Map `dir` through an optional transform.
#[must_use]
pub fn transform_direction(dir: Direction, transform: Option<Transform>) -> Direction {
    transform.map_or(dir, |t| t.apply_direction(dir))
}
