use strum::VariantArray;

use crate::location::Location;

/// Which way a triangular cell points, determined by the parity of `r + c`.
///
/// A right-pointing triangle shares its vertical side with the cell to its
/// left; a left-pointing triangle shares it with the cell to its right. The
/// half triangles in the first and last row follow the same rule.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Orientation {
    /// Even `r + c`: the lateral neighbor is at `c - 1`.
    Right,
    /// Odd `r + c`: the lateral neighbor is at `c + 1`.
    Left,
}

impl Orientation {
    /// The orientation of the cell at `location`.
    pub fn of(location: Location) -> Self {
        if (location.0 + location.1) % 2 == 0 {
            Self::Right
        } else {
            Self::Left
        }
    }
}

/// The three directions out of a triangular cell: one across each edge.
///
/// Both row neighbors are always geometric candidates; the lateral neighbor
/// depends on the cell's [`Orientation`].
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum TriangleStep {
    /// Toward the previous row.
    Up,
    /// Toward the next row.
    Down,
    /// Across the vertical side, left or right per the orientation.
    Lateral,
}

impl TriangleStep {
    /// Attempt the step from `location` and return the resultant [`Location`].
    ///
    /// Steps off the board wrap around `usize` and are rejected by the grid's
    /// bounds check, never by this function.
    pub fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Up => location.offset_by((-1, 0)),
            Self::Down => location.offset_by((1, 0)),
            Self::Lateral => match Orientation::of(location) {
                Orientation::Right => location.offset_by((0, -1)),
                Orientation::Left => location.offset_by((0, 1)),
            },
        }
    }
}
