//! Terminal rendering of the tile grid.

use std::collections::BTreeMap;

use tactical_grid_core::{GridIndex, MovementType, NeighborScheme};
use tactical_grid_world::{query, World};

/// Draws the grid row by row, staggering odd rows of hexagonal grids.
///
/// `marks` override the terrain glyph of individual tiles. Cells without a
/// tile are left blank.
pub(crate) fn render(
    world: &World,
    columns: i32,
    rows: i32,
    marks: &BTreeMap<GridIndex, char>,
) -> String {
    let staggered = query::neighbor_scheme(world) == NeighborScheme::HexOffset;
    let mut output = String::new();

    for row in 0..rows {
        if staggered && row % 2 == 1 {
            output.push(' ');
        }
        let mut line = String::new();
        for column in 0..columns {
            let index = GridIndex::new(column, row);
            line.push(glyph(world, index, marks));
            line.push(' ');
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }
    output
}

fn glyph(world: &World, index: GridIndex, marks: &BTreeMap<GridIndex, char>) -> char {
    let Some(tile) = query::tile(world, index) else {
        return ' ';
    };
    if let Some(mark) = marks.get(&index) {
        return *mark;
    }

    if !tile.allowed_movement().permits(MovementType::GROUND) {
        return '~';
    }
    match tile.movement_cost() {
        1 => '.',
        cost @ 2..=9 => char::from_digit(cost, 10).unwrap_or('#'),
        _ => '#',
    }
}
