use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builder::{GraphBuilder, Island, RegionId};
use crate::grid::{ColorIndex, Grid};
use crate::location::Location;

/// Hard ceiling on IDA* depth limits. Exhausting it is a normal "no
/// solution found" outcome, not a proof of unsolvability.
pub const MAX_SEARCH_DEPTH: usize = 20;

/// One recoloring in a reported solution, phrased for hosts: the region is
/// its representative cell in the original pre-solve grid, and the color is
/// a palette string ready to render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    /// Representative cell of the region to recolor, valid against the
    /// original grid. Hosts wanting the full area re-derive it with
    /// [`Grid::region_cells`].
    pub region: Location,
    /// Palette string of the new color.
    pub color: String,
    /// Human-readable account of the step.
    pub description: String,
}

/// A minimum-length recoloring sequence across all islands.
///
/// Replaying `path` in order against the original grid leaves every island
/// single-colored; with more than one island, all end on the same color.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Total move count; always equals `path.len()`.
    pub steps: usize,
    /// The moves, island by island in discovery order.
    pub path: Vec<PathStep>,
}

impl Solution {
    fn trivial() -> Self {
        Self {
            steps: 0,
            path: Vec::new(),
        }
    }
}

/// Graph statistics observed at solve start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveMetadata {
    /// Connected components of the region graph.
    pub island_count: usize,
    /// Regions summed across all islands.
    pub region_count: usize,
    /// Name of the algorithm that produced the result.
    pub method: String,
}

/// Solver output: the solution, if one exists within the depth bound, plus
/// metadata. An absent solution is a legitimate, displayable outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveOutcome {
    /// The cheapest recoloring sequence found, or [`None`] if none exists
    /// within [`MAX_SEARCH_DEPTH`] per island.
    pub solution: Option<Solution>,
    /// Statistics at solve start.
    pub metadata: SolveMetadata,
}

const METHOD: &str = "MultiIslandSolver (IDA*)";

/// A candidate move discovered during search. Carries everything needed both
/// to apply it (region id) and to report it (representative, size for move
/// ordering).
#[derive(Clone, Copy, Debug)]
struct Move {
    region: RegionId,
    color: ColorIndex,
    size: usize,
    representative: Location,
}

/// Minimum-step solver over the region graph of a [`Grid`].
///
/// Decomposes the board into islands, searches each with iterative
/// deepening A* under an admissible distinct-color heuristic, and
/// coordinates a common target color when more than one island exists.
/// The search recurses over immutable state snapshots; a shared
/// cancellation token is honored at iteration boundaries.
pub struct MultiIslandSolver<'a> {
    grid: &'a Grid,
    void_color: ColorIndex,
    palette: Vec<String>,
    cancel: Arc<AtomicBool>,
}

impl<'a> MultiIslandSolver<'a> {
    /// A solver over `grid` with the given void sentinel and palette.
    pub fn new(grid: &'a Grid, void_color: ColorIndex, palette: Vec<String>) -> Self {
        Self {
            grid,
            void_color,
            palette,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the cancellation token. Setting the token aborts the solve at
    /// the next depth-limit or candidate-color boundary.
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = token;
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Compute a minimum-step solution for the whole board.
    pub fn solve(&self) -> SolveOutcome {
        // a board that is already one region (or has none) needs no graph;
        // region_count only understands the standard sentinel
        let quick_count = self.grid.region_count();
        if self.void_color == crate::grid::VOID && quick_count <= 1 {
            return SolveOutcome {
                solution: Some(Solution::trivial()),
                metadata: SolveMetadata {
                    island_count: quick_count,
                    region_count: quick_count,
                    method: METHOD.to_owned(),
                },
            };
        }

        let islands = GraphBuilder::new(self.grid, self.void_color).build_islands();
        let metadata = SolveMetadata {
            island_count: islands.len(),
            region_count: islands.iter().map(Island::len).sum(),
            method: METHOD.to_owned(),
        };
        debug!(
            islands = metadata.island_count,
            regions = metadata.region_count,
            "region graph built"
        );

        let solution = self.solve_islands(&islands);
        info!(
            islands = metadata.island_count,
            regions = metadata.region_count,
            steps = solution.as_ref().map(|s| s.steps),
            "solve finished"
        );

        SolveOutcome { solution, metadata }
    }

    fn solve_islands(&self, islands: &[Island]) -> Option<Solution> {
        match islands.len() {
            0 => Some(Solution::trivial()),
            // a lone island may converge on whatever color it likes
            1 => self.solve_single_island(&islands[0], None),
            _ => {
                let candidates: BTreeSet<ColorIndex> = islands
                    .iter()
                    .flat_map(|island| island.values().map(|node| node.color))
                    .collect();

                let mut best: Option<Solution> = None;
                for target in candidates {
                    if self.cancelled() {
                        return None;
                    }
                    debug!(color = i64::from(target), "trying global target color");

                    if let Some(candidate) = self.solve_for_target(islands, target) {
                        if best.as_ref().map_or(true, |b| candidate.steps < b.steps) {
                            best = Some(candidate);
                        }
                    }
                }
                best
            }
        }
    }

    /// Total cost of unifying every island on `target`. A candidate is
    /// discarded whenever any island cannot reach it within the bound.
    fn solve_for_target(&self, islands: &[Island], target: ColorIndex) -> Option<Solution> {
        let mut combined = Solution::trivial();
        for island in islands {
            let part = self.solve_single_island(island, Some(target))?;
            combined.steps += part.steps;
            combined.path.extend(part.path);
        }
        Some(combined)
    }

    /// IDA* over one island. `target` of [`None`] accepts any single color.
    fn solve_single_island(&self, island: &Island, target: Option<ColorIndex>) -> Option<Solution> {
        let distinct: BTreeSet<ColorIndex> = island.values().map(|node| node.color).collect();
        if distinct.len() == 1 {
            if let Some(&only) = distinct.iter().next() {
                if target.map_or(true, |t| t == only) {
                    return Some(Solution::trivial());
                }
            }
        }

        for limit in 0..=MAX_SEARCH_DEPTH {
            if self.cancelled() {
                return None;
            }
            debug!(limit, target_color = ?target, "deepening");

            let mut path = Vec::with_capacity(limit);
            if let Some(found) = self.dfs(island, 0, limit, &mut path, target) {
                return Some(self.format_path(&found));
            }
        }

        None
    }

    /// Depth-first search bounded by `limit`, pruning on `g + h`. `path` is
    /// restored on every exit, so sibling branches never observe each
    /// other's moves.
    fn dfs(
        &self,
        nodes: &Island,
        g: usize,
        limit: usize,
        path: &mut Vec<Move>,
        target: Option<ColorIndex>,
    ) -> Option<Vec<Move>> {
        let mut distinct: BTreeSet<ColorIndex> = BTreeSet::new();
        let mut has_target = false;
        for node in nodes.values() {
            distinct.insert(node.color);
            if target == Some(node.color) {
                has_target = true;
            }
        }

        if nodes.len() == 1 {
            let only = nodes.values().next()?;
            return match target {
                None => Some(path.clone()),
                Some(t) if only.color == t => Some(path.clone()),
                Some(t) => {
                    // uniform in the wrong color: one forced recolor, the
                    // only move in the search not drawn from a neighbor
                    if g + 1 <= limit {
                        let mut full = path.clone();
                        full.push(Move {
                            region: only.id,
                            color: t,
                            size: only.size,
                            representative: only.representative,
                        });
                        Some(full)
                    } else {
                        None
                    }
                }
            };
        }

        // each move removes at most one distinct color, so this is
        // admissible; a missing mandatory target reserves one extra repaint
        let h = match target {
            None => distinct.len() - 1,
            Some(_) if has_target => distinct.len() - 1,
            Some(_) => distinct.len(),
        };
        if g + h > limit {
            return None;
        }

        for mv in self.possible_moves(nodes) {
            let next = apply_move(nodes, mv.region, mv.color);
            path.push(mv);
            if let Some(found) = self.dfs(&next, g + 1, limit, path, target) {
                return Some(found);
            }
            path.pop();
        }

        None
    }

    /// One candidate per (region, neighbor color) pair, largest regions
    /// first. Ordering only; ties keep discovery order.
    fn possible_moves(&self, nodes: &Island) -> Vec<Move> {
        let mut moves = Vec::new();
        for node in nodes.values() {
            let neighbor_colors: BTreeSet<ColorIndex> = node
                .neighbors
                .iter()
                .filter_map(|id| nodes.get(id))
                .map(|neighbor| neighbor.color)
                .collect();

            for color in neighbor_colors {
                moves.push(Move {
                    region: node.id,
                    color,
                    size: node.size,
                    representative: node.representative,
                });
            }
        }

        moves.sort_by_key(|mv| std::cmp::Reverse(mv.size));
        moves
    }

    fn format_path(&self, raw: &[Move]) -> Solution {
        let path = raw
            .iter()
            .enumerate()
            .map(|(index, mv)| {
                let color = self.color_string(mv.color);
                PathStep {
                    region: mv.representative,
                    description: format!(
                        "Step {}: fill the region at ({}, {}) with {}",
                        index + 1,
                        mv.representative.0,
                        mv.representative.1,
                        color
                    ),
                    color,
                }
            })
            .collect_vec();

        Solution {
            steps: raw.len(),
            path,
        }
    }

    fn color_string(&self, color: ColorIndex) -> String {
        usize::try_from(color)
            .ok()
            .and_then(|index| self.palette.get(index))
            .cloned()
            .unwrap_or_else(|| format!("color #{color}"))
    }
}

/// Recolor `target_id` to `new_color` and absorb every neighbor that now
/// shares the color: sizes add up, external edges re-point at the target,
/// merged nodes leave the state. Pure; the input island is untouched, which
/// is what makes backtracking and cancellation safe.
pub fn apply_move(nodes: &Island, target_id: RegionId, new_color: ColorIndex) -> Island {
    let mut next = nodes.clone();

    let to_merge = match next.get_mut(&target_id) {
        Some(node) => {
            node.color = new_color;
            node.neighbors.iter().copied().collect_vec()
        }
        None => return next,
    };
    let to_merge = to_merge
        .into_iter()
        .filter(|id| next.get(id).map_or(false, |node| node.color == new_color))
        .collect_vec();

    for merge_id in to_merge {
        let Some(merged) = next.remove(&merge_id) else {
            continue;
        };

        for remote_id in merged.neighbors.iter().copied().filter(|&id| id != target_id) {
            if let Some(remote) = next.get_mut(&remote_id) {
                remote.neighbors.remove(&merge_id);
                remote.neighbors.insert(target_id);
            }
        }

        if let Some(node) = next.get_mut(&target_id) {
            node.size += merged.size;
            node.neighbors.remove(&merge_id);
            node.neighbors
                .extend(merged.neighbors.iter().copied().filter(|&id| id != target_id));
        }
    }

    if let Some(node) = next.get_mut(&target_id) {
        node.neighbors.remove(&target_id);
    }

    next
}
