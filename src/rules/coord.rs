//! Coordinates inside the 5×5 neighborhood window.

use serde::{Deserialize, Serialize};

/// Width and height of the neighborhood window.
pub const WINDOW: u8 = 5;

/// A cell of the neighborhood window; `(2,2)` is the evaluated sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub col: u8,
    pub row: u8,
}

impl Coord {
    /// The centre cell, which always stands for the evaluated sprite.
    pub const CENTER: Coord = Coord { col: 2, row: 2 };

    #[must_use]
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// Whether the coordinate lies inside the 5×5 window.
    #[must_use]
    pub const fn in_window(self) -> bool {
        self.col < WINDOW && self.row < WINDOW
    }

    #[must_use]
    pub fn is_center(self) -> bool {
        self == Self::CENTER
    }

    /// Manhattan distance from the centre.
    #[must_use]
    pub const fn distance(self) -> u8 {
        self.col.abs_diff(2) + self.row.abs_diff(2)
    }

    /// Offset from the centre as `(dx, dy)`.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        (self.col as i32 - 2, self.row as i32 - 2)
    }

    /// The guarded neighborhood: cells within Manhattan distance 2 of the
    /// centre, centre excluded, in scan order (column-major).
    pub fn neighborhood() -> impl Iterator<Item = Coord> {
        (0..WINDOW)
            .flat_map(|col| (0..WINDOW).map(move |row| Coord::new(col, row)))
            .filter(|c| c.distance() <= 2 && !c.is_center())
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}
