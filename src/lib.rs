#![warn(missing_docs)]

//! # `triflood`
//!
//! A minimum-step solver for color-flood puzzles on a triangular grid, as
//! played in Kami-style mobile games: pick a connected same-colored region,
//! recolor it, and let it merge with adjacent regions of the new color until
//! the whole board is one color.
//!
//! Begin with a [`Grid`] (built directly, or deserialized from the host's
//! JSON shape), then either drive [`MultiIslandSolver`](solver::MultiIslandSolver)
//! synchronously or hand a [`SolveRequest`](client::SolveRequest) to a
//! [`SolverClient`](client::SolverClient) to run it on a background thread
//! with cancellation.
//!
//! # Internals
//! The board is not searched cell by cell. A [`GraphBuilder`](builder::GraphBuilder)
//! clusters cells into maximal same-colored regions and links adjacent
//! regions into an undirected graph, which then splits into connected
//! components ("islands") that no sequence of moves can ever join.
//!
//! Each island is searched independently with iterative deepening A* over
//! copy-on-write region-graph states: a move recolors one region to the
//! current color of one of its neighbors and absorbs every neighbor that now
//! matches. The number of distinct colors present, minus one, is an
//! admissible heuristic, since one move removes at most one color from the
//! board. When more than one island exists, every color present anywhere is
//! tried as the common target and the cheapest total wins; the exhaustive
//! enumeration is tractable only because palettes are small.

pub use builder::{GraphBuilder, Island, RegionId, RegionNode};
pub use client::{ClientError, SolveRequest, SolverClient};
pub use disjoint_set::DisjointSet;
pub use grid::{ColorIndex, Grid, VOID};
pub use location::Location;
pub use solver::{
    MultiIslandSolver, PathStep, SolveMetadata, SolveOutcome, Solution, MAX_SEARCH_DEPTH,
};

pub mod builder;
pub mod client;
pub mod disjoint_set;
pub mod grid;
pub mod location;
pub mod shape;
pub mod solver;
mod tests;
