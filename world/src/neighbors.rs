//! Adjacency and step distance for the supported neighbor schemes.

use tactical_grid_core::{GridIndex, NeighborScheme};

const EVEN_ROW_OFFSETS: [(i32, i32); 6] = [(-1, 0), (1, 0), (-1, -1), (-1, 1), (0, -1), (0, 1)];
const ODD_ROW_OFFSETS: [(i32, i32); 6] = [(0, -1), (1, -1), (0, 1), (1, 1), (-1, 0), (1, 0)];
const CARDINAL_OFFSETS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Fixed-capacity iterator over up to six neighboring indices.
///
/// Iteration order is the scheme's canonical offset order and never depends
/// on registry layout.
#[derive(Clone, Debug, Default)]
pub struct NeighborIter {
    buffer: [Option<GridIndex>; 6],
    len: usize,
    cursor: usize,
}

impl NeighborIter {
    pub(crate) fn push(&mut self, index: GridIndex) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(index);
            self.len += 1;
        }
    }

    pub(crate) fn retain<F>(self, mut keep: F) -> NeighborIter
    where
        F: FnMut(GridIndex) -> bool,
    {
        let mut filtered = NeighborIter::default();
        for index in self {
            if keep(index) {
                filtered.push(index);
            }
        }
        filtered
    }
}

impl Iterator for NeighborIter {
    type Item = GridIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

/// Every index adjacent to `index` under `scheme`, regardless of registry
/// membership.
pub(crate) fn candidates(scheme: NeighborScheme, index: GridIndex) -> NeighborIter {
    let offsets: &[(i32, i32)] = match scheme {
        NeighborScheme::HexOffset if index.is_odd_row() => &ODD_ROW_OFFSETS,
        NeighborScheme::HexOffset => &EVEN_ROW_OFFSETS,
        NeighborScheme::Rectangular => &CARDINAL_OFFSETS,
    };

    let mut neighbors = NeighborIter::default();
    for &(columns, rows) in offsets {
        if let Some(neighbor) = index.offset(columns, rows) {
            neighbors.push(neighbor);
        }
    }
    neighbors
}

/// Minimum number of steps between two indices under `scheme`.
///
/// Hex distance is measured in cube coordinates after undoing the odd-row
/// shift, so it never overestimates the step count.
pub(crate) fn distance(scheme: NeighborScheme, from: GridIndex, to: GridIndex) -> u32 {
    match scheme {
        NeighborScheme::Rectangular => from.manhattan_distance(to),
        NeighborScheme::HexOffset => {
            let (from_q, from_r) = axial(from);
            let (to_q, to_r) = axial(to);
            let dq = to_q - from_q;
            let dr = to_r - from_r;
            let steps = (dq.abs() + dr.abs() + (dq + dr).abs()) / 2;
            u32::try_from(steps).unwrap_or(u32::MAX)
        }
    }
}

fn axial(index: GridIndex) -> (i64, i64) {
    let row = i64::from(index.row());
    let column = i64::from(index.column());
    (column - row.div_euclid(2), row)
}
