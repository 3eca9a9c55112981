#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic A* pathfinding and movement range queries over the tile grid.

mod range;

use std::{
    cmp::Reverse,
    collections::{BTreeSet, BinaryHeap, HashMap, HashSet},
};

use tactical_grid_core::{GridIndex, MovementType};
use tactical_grid_world::{query, TileRecord, World};
use tracing::{trace, warn};

pub use range::all_tiles_in_range;

/// Minimum-cost route between two tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridPath {
    steps: Vec<GridIndex>,
    cost: u32,
}

impl GridPath {
    /// Tiles visited in order, starting with the origin and ending at the target.
    #[must_use]
    pub fn steps(&self) -> &[GridIndex] {
        &self.steps
    }

    /// Cumulative cost of every step after the origin.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Number of moves along the path.
    #[must_use]
    pub fn move_count(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Consumes the path, yielding the visited tiles.
    #[must_use]
    pub fn into_steps(self) -> Vec<GridIndex> {
        self.steps
    }
}

/// Cost a unit moving with `movement` pays to enter `tile`.
#[must_use]
pub fn step_cost(tile: &TileRecord, movement: MovementType) -> u32 {
    if movement.ignores_terrain_cost() {
        1
    } else {
        tile.movement_cost()
    }
}

/// Recomputes the cumulative cost of walking `steps` with `movement`.
///
/// Returns `None` when any visited tile is missing from the grid.
#[must_use]
pub fn path_cost(world: &World, steps: &[GridIndex], movement: MovementType) -> Option<u32> {
    steps.iter().skip(1).try_fold(0_u32, |total, index| {
        let tile = query::tile(world, *index)?;
        Some(total.saturating_add(step_cost(tile, movement)))
    })
}

/// A* planner that owns reusable search buffers.
///
/// Search state lives here rather than on the tiles, so every call starts
/// from a clean slate: an index absent from the node map has an infinite
/// cost and no predecessor.
#[derive(Debug, Default)]
pub struct Pathfinder {
    nodes: HashMap<GridIndex, SearchNode>,
    open: BinaryHeap<Reverse<OpenEntry>>,
    closed: HashSet<GridIndex>,
    sequence: u64,
}

impl Pathfinder {
    /// Creates a pathfinder with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a minimum-cost path from `start` to `target`.
    ///
    /// Only tiles that permit `movement` and lie within `jump_power` height of
    /// the tile they are entered from are traversed. When `tile_set` is
    /// provided, tiles outside it are never visited.
    ///
    /// The open set is ordered by `f = g + h`, then by the lower heuristic,
    /// then by discovery order, which makes the returned path deterministic.
    pub fn find_path(
        &mut self,
        world: &World,
        start: GridIndex,
        target: GridIndex,
        movement: MovementType,
        jump_power: u32,
        tile_set: Option<&BTreeSet<GridIndex>>,
    ) -> Option<GridPath> {
        for endpoint in [start, target] {
            if !query::contains_tile(world, endpoint) {
                warn!(index = %endpoint, "pathfinding endpoint is not part of the grid");
                return None;
            }
        }

        let allowed = |index: GridIndex| tile_set.map_or(true, |set| set.contains(&index));
        if !allowed(start) || !allowed(target) {
            return None;
        }

        self.reset();
        let heuristic = query::step_distance(world, start, target);
        self.discover(start, 0, heuristic, None);

        while let Some(Reverse(entry)) = self.open.pop() {
            let current = entry.index;
            if self.closed.contains(&current) {
                continue;
            }

            let Some(node) = self.nodes.get(&current).copied() else {
                continue;
            };

            if current == target {
                let path = self.reconstruct(target, node.g);
                trace!(%start, %target, cost = path.cost, "path found");
                return Some(path);
            }

            let _ = self.closed.insert(current);

            for neighbor in query::walkable_neighbors(world, current, movement, jump_power) {
                if self.closed.contains(&neighbor) || !allowed(neighbor) {
                    continue;
                }

                let Some(tile) = query::tile(world, neighbor) else {
                    continue;
                };

                let tentative = node.g.saturating_add(step_cost(tile, movement));
                let known = self.nodes.get(&neighbor).map_or(u32::MAX, |known| known.g);
                if tentative < known {
                    let heuristic = query::step_distance(world, neighbor, target);
                    self.discover(neighbor, tentative, heuristic, Some(current));
                }
            }
        }

        trace!(%start, %target, "no path");
        None
    }

    /// Collects every tile reachable from `start` for at most `movement_range`.
    ///
    /// Candidates come from [`all_tiles_in_range`]; each one is kept only when
    /// a path through the candidate pool exists and costs no more than the
    /// budget. The cost is `O(range² · V log V)`, so hosts should cap the range
    /// on large grids.
    pub fn tiles_in_range(
        &mut self,
        world: &World,
        start: GridIndex,
        movement_range: u32,
        movement: MovementType,
        jump_power: u32,
    ) -> BTreeSet<GridIndex> {
        range::reachable(self, world, start, movement_range, movement, jump_power)
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.open.clear();
        self.closed.clear();
        self.sequence = 0;
    }

    fn discover(&mut self, index: GridIndex, g: u32, h: u32, predecessor: Option<GridIndex>) {
        let _ = self.nodes.insert(index, SearchNode { g, predecessor });
        self.open.push(Reverse(OpenEntry {
            f: g.saturating_add(h),
            h,
            sequence: self.sequence,
            index,
        }));
        self.sequence += 1;
    }

    fn reconstruct(&self, target: GridIndex, cost: u32) -> GridPath {
        let mut steps = vec![target];
        let mut cursor = target;
        while let Some(previous) = self.nodes.get(&cursor).and_then(|node| node.predecessor) {
            steps.push(previous);
            cursor = previous;
        }
        steps.reverse();
        GridPath { steps, cost }
    }
}

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    g: u32,
    predecessor: Option<GridIndex>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    f: u32,
    h: u32,
    sequence: u64,
    index: GridIndex,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use tactical_grid_core::{Command, NeighborScheme, TileSettings};
    use tactical_grid_world::apply;

    fn line_world(costs: &[u32]) -> World {
        let mut world = World::with_scheme(NeighborScheme::Rectangular);
        let mut events = Vec::new();
        for (column, cost) in costs.iter().enumerate() {
            apply(
                &mut world,
                Command::AddTile {
                    index: GridIndex::new(column as i32, 0),
                    translation: Vec3::ZERO,
                    settings: TileSettings::new(*cost, 1, MovementType::ANY),
                },
                &mut events,
            );
        }
        world
    }

    #[test]
    fn open_entries_order_by_f_then_h_then_discovery() {
        let early = OpenEntry {
            f: 4,
            h: 2,
            sequence: 0,
            index: GridIndex::new(9, 9),
        };
        let late = OpenEntry {
            sequence: 1,
            index: GridIndex::new(0, 0),
            ..early
        };
        let closer = OpenEntry {
            h: 1,
            sequence: 5,
            ..early
        };

        assert!(early < late);
        assert!(closer < early);
    }

    #[test]
    fn start_equal_to_target_is_a_single_step_path() {
        let world = line_world(&[1, 1]);
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder
            .find_path(
                &world,
                GridIndex::new(0, 0),
                GridIndex::new(0, 0),
                MovementType::GROUND,
                1,
                None,
            )
            .expect("trivial path");

        assert_eq!(path.steps(), &[GridIndex::new(0, 0)]);
        assert_eq!(path.cost(), 0);
        assert_eq!(path.move_count(), 0);
    }

    #[test]
    fn path_cost_sums_entered_tiles() {
        let world = line_world(&[9, 2, 3]);
        let steps = [
            GridIndex::new(0, 0),
            GridIndex::new(1, 0),
            GridIndex::new(2, 0),
        ];

        assert_eq!(path_cost(&world, &steps, MovementType::GROUND), Some(5));
        assert_eq!(path_cost(&world, &steps, MovementType::AERIAL), Some(2));
        assert_eq!(
            path_cost(&world, &[GridIndex::new(0, 0), GridIndex::new(5, 0)], MovementType::GROUND),
            None
        );
    }

    #[test]
    fn buffers_do_not_leak_between_searches() {
        let world = line_world(&[1, 1, 1, 1]);
        let mut pathfinder = Pathfinder::new();
        let first = pathfinder.find_path(
            &world,
            GridIndex::new(0, 0),
            GridIndex::new(3, 0),
            MovementType::GROUND,
            1,
            None,
        );
        let second = pathfinder.find_path(
            &world,
            GridIndex::new(3, 0),
            GridIndex::new(1, 0),
            MovementType::GROUND,
            1,
            None,
        );

        assert_eq!(first.map(|path| path.cost()), Some(3));
        let second = second.expect("reverse path");
        assert_eq!(
            second.steps(),
            &[
                GridIndex::new(3, 0),
                GridIndex::new(2, 0),
                GridIndex::new(1, 0)
            ]
        );
    }
}
