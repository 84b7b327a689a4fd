#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet, VecDeque};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use itertools::Itertools;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::builder::{GraphBuilder, Island, RegionId};
    use crate::disjoint_set::DisjointSet;
    use crate::grid::{ColorIndex, Grid, VOID};
    use crate::location::Location;
    use crate::solver::{apply_move, MultiIslandSolver, SolveOutcome, Solution};
    use crate::client::{SolveRequest, SolverClient};

    fn palette(n: usize) -> Vec<String> {
        (0..n).map(|index| format!("c{index}")).collect_vec()
    }

    fn solve(grid: &Grid) -> SolveOutcome {
        MultiIslandSolver::new(grid, VOID, palette(grid.color_count())).solve()
    }

    /// Replay a solution against the original grid with flood fills.
    fn replay(grid: &Grid, solution: &Solution, palette: &[String]) -> Grid {
        let mut replayed = grid.clone();
        for step in &solution.path {
            let color = palette
                .iter()
                .position(|name| *name == step.color)
                .expect("path color should come from the palette") as ColorIndex;
            replayed.flood_fill(step.region, color);
        }
        replayed
    }

    /// The central correctness property: the path, applied in order, leaves
    /// every island uniform, and all islands on one color when there are
    /// several.
    fn assert_solves(grid: &Grid, outcome: &SolveOutcome, palette: &[String]) {
        let solution = outcome.solution.as_ref().expect("expected a solution");
        assert_eq!(solution.steps, solution.path.len());

        let replayed = replay(grid, solution, palette);
        let islands = GraphBuilder::with_default_void(&replayed).build_islands();
        assert!(islands.iter().all(|island| island.len() == 1));
        if islands.len() > 1 {
            assert!(islands
                .iter()
                .filter_map(|island| island.values().next())
                .map(|node| node.color)
                .all_equal());
        }
    }

    #[test]
    fn uniform_grid_solves_in_zero_steps() {
        let grid = Grid::new(2, 4, 3);
        let outcome = solve(&grid);

        let solution = outcome.solution.expect("uniform grid is already solved");
        assert_eq!(solution.steps, 0);
        assert!(solution.path.is_empty());
        assert_eq!(outcome.metadata.island_count, 1);
        assert_eq!(outcome.metadata.region_count, 1);
    }

    #[test]
    fn three_region_strip_needs_one_move() {
        // a single column chains vertically: A above B above A
        let grid = Grid::from_rows(vec![vec![0], vec![1], vec![0]], 2);
        let outcome = solve(&grid);

        let solution = outcome.solution.clone().expect("one move suffices");
        assert_eq!(solution.steps, 1);
        assert_eq!(solution.path[0].region, Location(1, 0));
        assert_eq!(solution.path[0].color, "c0");
        assert_solves(&grid, &outcome, &palette(2));
    }

    #[test]
    fn two_islands_across_void_need_one_move() {
        let grid = Grid::from_rows(
            vec![vec![0], vec![0], vec![VOID], vec![1], vec![1]],
            2,
        );
        let outcome = solve(&grid);

        assert_eq!(outcome.metadata.island_count, 2);
        assert_eq!(outcome.metadata.region_count, 2);
        assert_eq!(outcome.solution.as_ref().map(|s| s.steps), Some(1));
        assert_solves(&grid, &outcome, &palette(2));
    }

    #[test]
    fn exceeding_the_depth_bound_returns_no_solution() {
        // a 22-color chain needs 21 moves, past the bound; the heuristic
        // prunes every depth limit at the root so this stays instant
        let colors = 22;
        let grid = Grid::from_rows(
            (0..colors).map(|color| vec![color as ColorIndex]).collect_vec(),
            colors,
        );
        let outcome = solve(&grid);

        assert!(outcome.solution.is_none());
        assert_eq!(outcome.metadata.island_count, 1);
        assert_eq!(outcome.metadata.region_count, colors);
    }

    #[test]
    fn empty_and_all_void_grids_are_trivially_solved() {
        let all_void = Grid::from_rows(vec![vec![VOID, VOID], vec![VOID, VOID]], 3);
        assert_eq!(GraphBuilder::with_default_void(&all_void).build_islands().len(), 0);

        let outcome = solve(&all_void);
        assert_eq!(outcome.solution.as_ref().map(|s| s.steps), Some(0));
        assert_eq!(outcome.metadata.island_count, 0);
    }

    #[test]
    fn triangular_neighbor_rule() {
        let grid = Grid::new(1, 3, 2); // 3x3

        // even parity: lateral neighbor to the left
        let mid: BTreeSet<Location> = grid.neighbors_of(Location(1, 1)).into_iter().collect();
        assert_eq!(
            mid,
            BTreeSet::from([Location(0, 1), Location(2, 1), Location(1, 0)])
        );

        // top-left corner: the lateral step would leave the board
        assert_eq!(grid.neighbors_of(Location(0, 0)), vec![Location(1, 0)]);

        // odd parity: lateral neighbor to the right
        let top: BTreeSet<Location> = grid.neighbors_of(Location(0, 1)).into_iter().collect();
        assert_eq!(top, BTreeSet::from([Location(1, 1), Location(0, 2)]));
    }

    #[test]
    fn flood_fill_with_same_color_is_identity() {
        let grid = Grid::from_rows(vec![vec![0, 1, 1], vec![1, 0, 0], vec![0, 0, 1]], 2);
        let mut filled = grid.clone();
        filled.flood_fill(Location(1, 1), 0);
        assert_eq!(grid, filled);
    }

    #[test]
    fn region_cells_of_void_is_empty() {
        let grid = Grid::from_rows(vec![vec![0, VOID], vec![0, 1], vec![1, 1]], 2);
        assert!(grid.region_cells(Location(0, 1)).is_empty());

        let cells: BTreeSet<Location> =
            grid.region_cells(Location(0, 0)).into_iter().collect();
        assert_eq!(cells, BTreeSet::from([Location(0, 0), Location(1, 0)]));
    }

    #[test]
    fn builder_invariants_hold_with_voids() {
        let grid = Grid::from_rows(
            vec![
                vec![0, 1, 1, 0],
                vec![0, VOID, 1, 0],
                vec![2, VOID, 0, 0],
                vec![2, VOID, VOID, 1],
                vec![2, 2, VOID, 1],
            ],
            3,
        );
        let islands = GraphBuilder::with_default_void(&grid).build_islands();

        let live_cells = (0..grid.rows())
            .cartesian_product(0..grid.cols())
            .filter(|&(r, c)| grid.is_live(Location(r, c)))
            .count();
        let total_size: usize = islands
            .iter()
            .flat_map(|island| island.values())
            .map(|node| node.size)
            .sum();
        assert_eq!(total_size, live_cells);

        for island in &islands {
            for node in island.values() {
                assert!(!node.neighbors.contains(&node.id));
                // neighbors stay within the island
                assert!(node.neighbors.iter().all(|id| island.contains_key(id)));
                // the representative really carries the region's color
                assert_eq!(grid.color_at(node.representative), Some(node.color));
                if island.len() > 1 {
                    assert!(!node.neighbors.is_empty());
                }
            }
        }
    }

    #[test]
    fn region_count_agrees_with_the_graph() {
        let grid = Grid::from_rows(
            vec![vec![0, 1, 1, 0], vec![0, VOID, 1, 0], vec![2, VOID, 0, 0]],
            3,
        );
        let islands = GraphBuilder::with_default_void(&grid).build_islands();
        let regions: usize = islands.iter().map(Island::len).sum();
        assert_eq!(grid.region_count(), regions);
    }

    #[test]
    fn disjoint_set_counts_and_connects() {
        let mut sets = DisjointSet::new(6);
        assert_eq!(sets.count(), 6);
        assert!(!sets.connected(0, 5));

        sets.union(0, 1);
        sets.union(1, 2);
        sets.union(4, 5);
        assert_eq!(sets.count(), 3);
        assert!(sets.connected(0, 2));
        assert!(sets.connected(5, 4));
        assert!(!sets.connected(2, 4));

        // merging already-merged sets changes nothing
        sets.union(2, 0);
        assert_eq!(sets.count(), 3);
    }

    #[test]
    fn out_of_range_colors_load_as_void() {
        let grid = Grid::from_rows(vec![vec![0, 7], vec![-3, 1]], 2);
        assert_eq!(grid.color_at(Location(0, 1)), Some(VOID));
        assert_eq!(grid.color_at(Location(1, 0)), Some(VOID));
        assert_eq!(grid.color_at(Location(1, 1)), Some(1));
    }

    #[test]
    fn grid_json_round_trips() {
        let grid = Grid::from_rows(vec![vec![0, 1], vec![1, VOID], vec![0, 0]], 2);
        let encoded = serde_json::to_string(&grid).unwrap();
        assert!(encoded.contains("\"colorCount\":2"));

        let decoded: Grid = serde_json::from_str(&encoded).unwrap();
        assert_eq!(grid, decoded);
    }

    #[test]
    fn legacy_column_major_json_is_transposed() {
        // 3 rows x 2 cols stored the old way, as grid[col][row]
        let encoded = r#"{"rows":3,"cols":2,"colorCount":2,"grid":[[0,1,0],[1,0,0]]}"#;
        let grid: Grid = serde_json::from_str(encoded).unwrap();

        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 2);
        assert_eq!(grid.color_at(Location(0, 0)), Some(0));
        assert_eq!(grid.color_at(Location(0, 1)), Some(1));
        assert_eq!(grid.color_at(Location(1, 0)), Some(1));
        assert_eq!(grid.color_at(Location(2, 1)), Some(0));
    }

    #[test]
    fn path_steps_serialize_for_the_host() {
        let grid = Grid::from_rows(vec![vec![0], vec![1], vec![0]], 2);
        let outcome = solve(&grid);
        let encoded = serde_json::to_string(&outcome).unwrap();

        assert!(encoded.contains("\"islandCount\":1"));
        assert!(encoded.contains("\"regionCount\":3"));
        assert!(encoded.contains("\"region\":{\"r\":1,\"c\":0}"));
    }

    #[test]
    fn merge_application_re_points_external_edges() {
        // path graph 0 - 1 - 2 colored A B A; recoloring 0 to B absorbs 1
        let grid = Grid::from_rows(vec![vec![0], vec![1], vec![0]], 2);
        let islands = GraphBuilder::with_default_void(&grid).build_islands();
        let island = &islands[0];

        let next = apply_move(island, 0, 1);
        assert_eq!(next.len(), 2);
        let target = &next[&0];
        assert_eq!(target.color, 1);
        assert_eq!(target.size, 2);
        assert_eq!(target.neighbors, BTreeSet::from([2]));
        assert_eq!(next[&2].neighbors, BTreeSet::from([0]));
        // the input state is untouched
        assert_eq!(island.len(), 3);
    }

    #[test]
    fn pre_cancelled_solver_reports_nothing() {
        let grid = Grid::from_rows(vec![vec![0], vec![1], vec![0]], 2);
        let token = Arc::new(AtomicBool::new(true));
        let outcome = MultiIslandSolver::new(&grid, VOID, palette(2))
            .with_cancel_token(Arc::clone(&token))
            .solve();

        assert!(outcome.solution.is_none());
        assert!(token.load(Ordering::Relaxed));
    }

    #[test]
    fn client_delivers_a_result() {
        let grid = Grid::from_rows(vec![vec![0], vec![1], vec![0]], 2);
        let mut client = SolverClient::new();
        let rx = client.solve(SolveRequest {
            grid,
            void_color_index: VOID,
            palette: palette(2),
        });

        let outcome = rx.recv().unwrap().unwrap();
        assert_eq!(outcome.solution.map(|s| s.steps), Some(1));
    }

    #[test]
    fn terminated_solve_stays_silent() {
        // plenty of islands and candidate colors, so the worker crosses
        // many cancellation boundaries before it could ever finish
        let rows = (0..7)
            .flat_map(|_| vec![vec![0, 1, 2], vec![2, 0, 1], vec![VOID, VOID, VOID]])
            .take(21)
            .collect_vec();
        let grid = Grid::from_rows(rows, 3);

        let mut client = SolverClient::new();
        let rx = client.solve(SolveRequest {
            grid,
            void_color_index: VOID,
            palette: palette(3),
        });
        client.terminate();

        // the worker drops its sender without responding
        assert!(rx.recv().is_err());
    }

    #[test]
    fn serde_solve_request_defaults() {
        let encoded = r#"{"grid":{"rows":1,"cols":2,"colorCount":2,"grid":[[0,1]]}}"#;
        let request: SolveRequest = serde_json::from_str(encoded).unwrap();
        assert_eq!(request.void_color_index, VOID);
        assert!(request.palette.is_empty());
    }

    /// Exhaustive breadth-first search over the same move model, used as the
    /// minimality reference for the randomized check below.
    fn reference_minimum_steps(islands: &[Island]) -> Option<usize> {
        let candidates: BTreeSet<ColorIndex> = islands
            .iter()
            .flat_map(|island| island.values().map(|node| node.color))
            .collect();

        let key = |state: &[Island]| {
            format!(
                "{:?}",
                state
                    .iter()
                    .map(|island| {
                        island
                            .iter()
                            .map(|(id, node)| (*id, node.color, node.neighbors.clone()))
                            .collect_vec()
                    })
                    .collect_vec()
            )
        };
        let solved = |state: &[Island]| {
            state.iter().all(|island| island.len() == 1)
                && (state.len() <= 1
                    || state
                        .iter()
                        .filter_map(|island| island.values().next())
                        .map(|node| node.color)
                        .all_equal())
        };

        let start = islands.to_vec();
        let mut seen = HashSet::from([key(&start)]);
        let mut queue = VecDeque::from([(start, 0usize)]);

        while let Some((state, steps)) = queue.pop_front() {
            if solved(&state) {
                return Some(steps);
            }

            for (index, island) in state.iter().enumerate() {
                let mut moves: Vec<(RegionId, ColorIndex)> = Vec::new();
                for node in island.values() {
                    for id in &node.neighbors {
                        if let Some(neighbor) = island.get(id) {
                            moves.push((node.id, neighbor.color));
                        }
                    }
                    // a lone region has no neighbors; allow the repaint the
                    // solver appends as its forced final step
                    if island.len() == 1 && state.len() > 1 {
                        moves.extend(
                            candidates
                                .iter()
                                .filter(|&&color| color != node.color)
                                .map(|&color| (node.id, color)),
                        );
                    }
                }

                for (region, color) in moves {
                    let mut next = state.clone();
                    next[index] = apply_move(&state[index], region, color);
                    if seen.insert(key(&next)) {
                        queue.push_back((next, steps + 1));
                    }
                }
            }
        }

        None
    }

    #[test]
    fn random_small_grids_match_brute_force_minimum() {
        let mut rng = SmallRng::seed_from_u64(0x7121_f100d);

        for _ in 0..500 {
            let vside = rng.gen_range(0..=1usize);
            let cols = rng.gen_range(2..=3usize);
            let colors = rng.gen_range(2..=4usize);
            let rows = 2 * vside + 1;

            let data = (0..rows)
                .map(|_| {
                    (0..cols)
                        .map(|_| {
                            if rng.gen_bool(0.12) {
                                VOID
                            } else {
                                rng.gen_range(0..colors as ColorIndex)
                            }
                        })
                        .collect_vec()
                })
                .collect_vec();
            let grid = Grid::from_rows(data, colors);

            let islands = GraphBuilder::with_default_void(&grid).build_islands();
            let expected = reference_minimum_steps(&islands);

            let outcome = solve(&grid);
            assert_eq!(
                outcome.solution.as_ref().map(|s| s.steps),
                expected,
                "minimality mismatch on grid {grid:?}"
            );

            if outcome.solution.is_some() {
                assert_solves(&grid, &outcome, &palette(colors));
            }
        }
    }
}
