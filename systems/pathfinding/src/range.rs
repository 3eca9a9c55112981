//! Movement range queries built on top of the A* planner.

use std::collections::BTreeSet;

use tactical_grid_core::{GridIndex, MovementType};
use tactical_grid_world::{query, World};
use tracing::{debug, warn};

use crate::Pathfinder;

/// Registry tiles whose step distance from `start` is at most `range`.
///
/// The result is a superset of the tiles reachable within a movement budget
/// of `range`, because every step costs at least one. When the bounding square
/// holds more cells than the grid has tiles, the registry is scanned instead.
#[must_use]
pub fn all_tiles_in_range(world: &World, start: GridIndex, range: u32) -> BTreeSet<GridIndex> {
    let reach = i64::from(range);
    let side = reach * 2 + 1;
    let area = side.saturating_mul(side);
    let tile_count = i64::try_from(query::tile_count(world)).unwrap_or(i64::MAX);
    let within = |index: GridIndex| query::step_distance(world, start, index) <= range;

    if area > tile_count {
        return query::tiles(world)
            .map(|(index, _)| index)
            .filter(|index| within(*index))
            .collect();
    }

    let radius = i32::try_from(reach).unwrap_or(i32::MAX);
    let mut candidates = BTreeSet::new();
    for rows in -radius..=radius {
        for columns in -radius..=radius {
            let Some(index) = start.offset(columns, rows) else {
                continue;
            };
            if query::contains_tile(world, index) && within(index) {
                let _ = candidates.insert(index);
            }
        }
    }
    candidates
}

pub(crate) fn reachable(
    pathfinder: &mut Pathfinder,
    world: &World,
    start: GridIndex,
    movement_range: u32,
    movement: MovementType,
    jump_power: u32,
) -> BTreeSet<GridIndex> {
    if !query::contains_tile(world, start) {
        warn!(index = %start, "range query origin is not part of the grid");
        return BTreeSet::new();
    }

    let candidates = all_tiles_in_range(world, start, movement_range);
    let reached: BTreeSet<GridIndex> = candidates
        .iter()
        .copied()
        .filter(|candidate| {
            pathfinder
                .find_path(
                    world,
                    start,
                    *candidate,
                    movement,
                    jump_power,
                    Some(&candidates),
                )
                .is_some_and(|path| path.cost() <= movement_range)
        })
        .collect();

    debug!(
        %start,
        movement_range,
        candidates = candidates.len(),
        reached = reached.len(),
        "movement range resolved"
    );
    reached
}
