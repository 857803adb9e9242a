//! Grid location model.
//!
//! The warehouse floor is a rectilinear grid. Agents move between
//! orthogonally adjacent cells, so every distance is a Manhattan distance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell on the warehouse grid.
///
/// Equality and hashing are by coordinates only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Location {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Location {
    /// Creates a location.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another location.
    #[inline]
    pub fn distance_to(&self, other: &Location) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbours (west, east, south, north).
    pub fn neighbors(&self) -> [Location; 4] {
        [
            Location::new(self.x - 1, self.y),
            Location::new(self.x + 1, self.y),
            Location::new(self.x, self.y - 1),
            Location::new(self.x, self.y + 1),
        ]
    }

    /// Cell reached after walking `cells` steps toward `target`.
    ///
    /// Walks along x first, then along y. Clamps at `target`.
    pub fn step_toward(&self, target: &Location, cells: u32) -> Location {
        let dx = target.x.abs_diff(self.x);
        let along_x = cells.min(dx);
        let along_y = (cells - along_x).min(target.y.abs_diff(self.y));

        Location::new(
            self.x + (along_x as i32) * (target.x - self.x).signum(),
            self.y + (along_y as i32) * (target.y - self.y).signum(),
        )
    }

    /// Cells visited walking to `target`, x first. Excludes `self`, ends at `target`.
    pub fn path_to(&self, target: &Location) -> Vec<Location> {
        (1..=self.distance_to(target))
            .map(|k| self.step_toward(target, k))
            .collect()
    }
}

impl From<(i32, i32)> for Location {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
