use std::collections::VecDeque;

use itertools::Itertools;
use ndarray::Array2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::VariantArray;

use crate::disjoint_set::DisjointSet;
use crate::location::Location;
use crate::shape::TriangleStep;

/// A palette index as stored in the grid. Always `VOID` or in
/// `0..color_count`.
pub type ColorIndex = i16;

/// Cells carrying this sentinel are not part of the puzzle and never join a
/// region.
pub const VOID: ColorIndex = -1;

/// The triangular board: a rectangular array of color indices addressed
/// `(r, c)`.
///
/// `vside_rows` counts whole triangles along the vertical edge; the logical
/// row count is `2 * vside_rows + 1`, rows `0` and `rows - 1` being half
/// triangles. Dimensions are fixed at construction. The solver consumes a
/// [`Grid`] read-only and works on graph-level copies;
/// [`flood_fill`](Self::flood_fill) mutates in place and exists for hosts
/// replaying a solution against the original board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    vside_rows: usize,
    rows: usize,
    cols: usize,
    color_count: usize,
    cells: Array2<ColorIndex>,
}

impl Grid {
    /// A `(2 * vside_rows + 1) x cols` grid filled with color 0.
    pub fn new(vside_rows: usize, cols: usize, color_count: usize) -> Self {
        let rows = 2 * vside_rows + 1;
        Self {
            vside_rows,
            rows,
            cols,
            color_count: color_count.max(1),
            cells: Array2::from_elem((rows, cols), 0),
        }
    }

    /// Build a grid from row-major cell data.
    ///
    /// The column count is the longest row; missing cells and color indices
    /// outside `VOID..color_count` are stored as [`VOID`].
    pub fn from_rows(data: Vec<Vec<ColorIndex>>, color_count: usize) -> Self {
        let rows = data.len();
        let cols = data.iter().map(Vec::len).max().unwrap_or(0);
        Self::assemble(rows.saturating_sub(1) / 2, rows, cols, color_count, &data)
    }

    fn assemble(
        vside_rows: usize,
        rows: usize,
        cols: usize,
        color_count: usize,
        data: &[Vec<ColorIndex>],
    ) -> Self {
        let color_count = color_count.max(1);
        let cells = Array2::from_shape_fn((rows, cols), |index| {
            match data.get(index.0).and_then(|row| row.get(index.1)) {
                Some(&color) if (0..color_count as ColorIndex).contains(&color) => color,
                _ => VOID,
            }
        });

        Self {
            vside_rows,
            rows,
            cols,
            color_count,
            cells,
        }
    }

    /// Triangle count along the vertical edge.
    pub fn vside_rows(&self) -> usize {
        self.vside_rows
    }

    /// Logical row count, `2 * vside_rows + 1` for grids built here.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Palette size; every non-VOID cell's index is below this.
    pub fn color_count(&self) -> usize {
        self.color_count
    }

    /// The color at `location`, or [`None`] out of bounds.
    pub fn color_at(&self, location: Location) -> Option<ColorIndex> {
        self.cells.get(location.as_index()).copied()
    }

    /// Whether `location` is in bounds and not [`VOID`].
    pub fn is_live(&self, location: Location) -> bool {
        matches!(self.color_at(location), Some(color) if color != VOID)
    }

    /// The 0-3 in-bounds neighbors of `location` per the triangular
    /// adjacency rule: both row neighbors plus the single lateral neighbor
    /// selected by the cell's orientation.
    pub fn neighbors_of(&self, location: Location) -> Vec<Location> {
        TriangleStep::VARIANTS
            .iter()
            .map(|step| step.attempt_from(location))
            .filter(|neighbor| self.cells.get(neighbor.as_index()).is_some())
            .collect_vec()
    }

    /// Recolor the maximal same-colored connected region containing `start`
    /// to `new_color`, in place. No-op when the region already has
    /// `new_color` or `start` is out of bounds.
    pub fn flood_fill(&mut self, start: Location, new_color: ColorIndex) {
        let Some(old_color) = self.color_at(start) else {
            return;
        };
        if old_color == new_color {
            return;
        }

        self.cells[start.as_index()] = new_color;
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors_of(current) {
                // already-recolored cells no longer match old_color
                if self.color_at(neighbor) == Some(old_color) {
                    self.cells[neighbor.as_index()] = new_color;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    /// All cells in the same connected same-color region as `start`, in BFS
    /// discovery order. Empty for a VOID or out-of-bounds start.
    pub fn region_cells(&self, start: Location) -> Vec<Location> {
        let Some(target_color) = self.color_at(start) else {
            return Vec::new();
        };
        if target_color == VOID {
            return Vec::new();
        }

        let mut visited = Array2::from_elem((self.rows, self.cols), false);
        visited[start.as_index()] = true;
        let mut cells = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors_of(current) {
                if !visited[neighbor.as_index()] && self.color_at(neighbor) == Some(target_color) {
                    visited[neighbor.as_index()] = true;
                    cells.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }

        cells
    }

    /// The number of connected same-color regions over non-VOID cells,
    /// counted with a [`DisjointSet`] instead of the full adjacency graph.
    pub fn region_count(&self) -> usize {
        let mut sets = DisjointSet::new(self.rows * self.cols);
        let mut void_cells = 0;

        for (r, c) in (0..self.rows).cartesian_product(0..self.cols) {
            let location = Location(r, c);
            let Some(color) = self.color_at(location) else {
                continue;
            };
            if color == VOID {
                void_cells += 1;
                continue;
            }

            for neighbor in self.neighbors_of(location) {
                if self.color_at(neighbor) == Some(color) {
                    sets.union(r * self.cols + c, neighbor.0 * self.cols + neighbor.1);
                }
            }
        }

        // VOID cells stay singleton sets; they are not regions
        sets.count() - void_cells
    }
}

/// The wire shape hosts persist and post: `{rows, cols, colorCount, grid}`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridRepr {
    rows: usize,
    cols: usize,
    #[serde(default = "default_color_count")]
    color_count: usize,
    grid: Vec<Vec<ColorIndex>>,
}

fn default_color_count() -> usize {
    1
}

impl Serialize for Grid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GridRepr {
            rows: self.rows,
            cols: self.cols,
            color_count: self.color_count,
            grid: self
                .cells
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect_vec(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Grid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = GridRepr::deserialize(deserializer)?;

        // legacy files stored the grid column-major as grid[col][row]
        let data = if repr.grid.len() == repr.cols
            && repr.grid.first().map_or(false, |col| col.len() == repr.rows)
        {
            (0..repr.rows)
                .map(|r| {
                    (0..repr.cols)
                        .map(|c| {
                            repr.grid
                                .get(c)
                                .and_then(|col| col.get(r))
                                .copied()
                                .unwrap_or(VOID)
                        })
                        .collect_vec()
                })
                .collect_vec()
        } else {
            repr.grid
        };

        Ok(Self::assemble(
            repr.rows.saturating_sub(1) / 2,
            repr.rows,
            repr.cols,
            repr.color_count,
            &data,
        ))
    }
}
