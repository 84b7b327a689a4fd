use std::collections::{BTreeMap, BTreeSet, VecDeque};

use itertools::Itertools;
use ndarray::Array2;
use petgraph::graphmap::UnGraphMap;

use crate::grid::{ColorIndex, Grid, VOID};
use crate::location::Location;

/// Dense identifier of a region, assigned in row-major discovery order.
pub type RegionId = usize;

/// A maximal connected set of same-colored, non-VOID cells, reduced to one
/// node of the region graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionNode {
    /// This region's id.
    pub id: RegionId,
    /// Current color. Search states carry hypothetical colors; the builder's
    /// output carries the original grid coloring.
    pub color: ColorIndex,
    /// Cell count, maintained through merges.
    pub size: usize,
    /// Ids of regions currently sharing a border. Never contains `id`.
    pub neighbors: BTreeSet<RegionId>,
    /// One cell of the region in the original grid, used for reporting
    /// without re-enumerating the region.
    pub representative: Location,
}

/// A connected component of the region graph: region id to node, closed
/// under the `neighbors` relation. Keyed by a [`BTreeMap`] so iteration is
/// ascending-id, i.e. row-major discovery order.
pub type Island = BTreeMap<RegionId, RegionNode>;

/// Converts a [`Grid`] into its region graph in one coherent pass:
/// cluster cells into regions, link adjacent regions, then split the graph
/// into [`Island`]s.
pub struct GraphBuilder<'a> {
    grid: &'a Grid,
    void_color: ColorIndex,
    nodes: BTreeMap<RegionId, RegionNode>,
    adjacency: UnGraphMap<RegionId, ()>,
    // cell -> claimed region id, -1 while unclaimed
    assignment: Array2<i32>,
    next_id: RegionId,
}

impl<'a> GraphBuilder<'a> {
    /// A builder over `grid`, treating `void_color` cells as absent.
    pub fn new(grid: &'a Grid, void_color: ColorIndex) -> Self {
        Self {
            grid,
            void_color,
            nodes: BTreeMap::new(),
            adjacency: UnGraphMap::new(),
            assignment: Array2::from_elem((grid.rows(), grid.cols()), -1),
            next_id: 0,
        }
    }

    /// A builder using the standard [`VOID`] sentinel.
    pub fn with_default_void(grid: &'a Grid) -> Self {
        Self::new(grid, VOID)
    }

    /// Run the build and return the islands in discovery order.
    ///
    /// A grid with zero non-VOID cells yields zero islands.
    pub fn build_islands(mut self) -> Vec<Island> {
        self.build_global_graph();
        self.split_into_islands()
    }

    fn build_global_graph(&mut self) {
        for (r, c) in (0..self.grid.rows()).cartesian_product(0..self.grid.cols()) {
            let location = Location(r, c);
            let Some(color) = self.grid.color_at(location) else {
                continue;
            };
            if color == self.void_color || self.assignment[location.as_index()] != -1 {
                continue;
            }

            // claim the whole region, then link it before scanning on, so
            // neighbor lookups only ever see fully-resolved region ids
            let (id, cells) = self.claim_region(location, color);
            self.link_neighbors(&cells, id);
        }
    }

    /// Flood-fill from `start` over identical color, claiming every cell for
    /// a fresh region id. Returns the id and the claimed cells.
    fn claim_region(&mut self, start: Location, color: ColorIndex) -> (RegionId, Vec<Location>) {
        let id = self.next_id;
        self.next_id += 1;

        let mut node = RegionNode {
            id,
            color,
            size: 1,
            neighbors: BTreeSet::new(),
            representative: start,
        };
        self.adjacency.add_node(id);
        self.assignment[start.as_index()] = id as i32;

        let mut cells = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.grid.neighbors_of(current) {
                if !self.is_linkable(neighbor) {
                    continue;
                }
                if self.grid.color_at(neighbor) == Some(color)
                    && self.assignment[neighbor.as_index()] == -1
                {
                    self.assignment[neighbor.as_index()] = id as i32;
                    node.size += 1;
                    cells.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }

        self.nodes.insert(id, node);
        (id, cells)
    }

    /// Add bidirectional adjacency edges from the freshly claimed region to
    /// every already-assigned different region touching its cells.
    fn link_neighbors(&mut self, cells: &[Location], id: RegionId) {
        for &cell in cells {
            for neighbor in self.grid.neighbors_of(cell) {
                if !self.is_linkable(neighbor) {
                    continue;
                }
                let assigned = self.assignment[neighbor.as_index()];
                if assigned != -1 && assigned as RegionId != id {
                    self.adjacency.add_edge(id, assigned as RegionId, ());
                }
            }
        }
    }

    fn is_linkable(&self, location: Location) -> bool {
        matches!(self.grid.color_at(location), Some(color) if color != self.void_color)
    }

    /// BFS over the adjacency relation, visiting unvisited ids in ascending
    /// order, freezing each component into an [`Island`] with the node
    /// neighbor sets resolved from the graph.
    fn split_into_islands(self) -> Vec<Island> {
        let mut islands = Vec::new();
        let mut visited: BTreeSet<RegionId> = BTreeSet::new();

        for &start_id in self.nodes.keys() {
            if visited.contains(&start_id) {
                continue;
            }

            let mut island = Island::new();
            let mut queue = VecDeque::from([start_id]);
            visited.insert(start_id);

            while let Some(id) = queue.pop_front() {
                if let Some(node) = self.nodes.get(&id) {
                    let mut frozen = node.clone();
                    frozen.neighbors = self.adjacency.neighbors(id).collect();
                    island.insert(id, frozen);
                }
                for neighbor_id in self.adjacency.neighbors(id) {
                    if visited.insert(neighbor_id) {
                        queue.push_back(neighbor_id);
                    }
                }
            }

            islands.push(island);
        }

        islands
    }
}
