#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tactical grid engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative grid world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that render backends and systems react to deterministically.

use std::fmt;

use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Jump power that lets a unit traverse any height difference.
pub const UNLIMITED_JUMP: u32 = u32::MAX;

/// Commands that express all permissible grid mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Registers a new tile at the provided index.
    AddTile {
        /// Index the tile is registered under.
        index: GridIndex,
        /// Tile position relative to the grid origin.
        translation: Vec3,
        /// Terrain settings applied to the new tile.
        settings: TileSettings,
    },
    /// Removes a single tile together with its render instance.
    RemoveTile {
        /// Index of the tile to remove.
        index: GridIndex,
    },
    /// Destroys every tile of the grid.
    ClearGrid,
    /// Overrides the terrain settings of a tile overlapped by a modifier volume.
    ApplyTerrainSettings {
        /// Index of the affected tile.
        index: GridIndex,
        /// Cost charged for entering the tile.
        movement_cost: u32,
        /// Movement types allowed to enter the tile.
        allowed_movement: MovementType,
    },
    /// Raises or lowers state flags on a single tile.
    SetTileFlags {
        /// Index of the affected tile.
        index: GridIndex,
        /// Flags to raise or lower.
        flags: TileFlags,
        /// Raises the flags when `true`, lowers them otherwise.
        enabled: bool,
    },
    /// Lowers every state flag on every tile.
    ClearTileFlags,
    /// Records which character currently stands on a tile.
    SetOccupant {
        /// Index of the affected tile.
        index: GridIndex,
        /// Character occupying the tile, or `None` to vacate it.
        occupant: Option<OccupantId>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a tile was registered.
    TileAdded {
        /// Index of the new tile.
        index: GridIndex,
        /// Render instance allocated for the tile.
        handle: RenderHandle,
        /// Tile position relative to the grid origin.
        translation: Vec3,
    },
    /// Confirms that a tile and its render instance were removed.
    ///
    /// Render handles above `handle` shift down by one, matching a dense
    /// instance store.
    TileRemoved {
        /// Index of the removed tile.
        index: GridIndex,
        /// Render instance that was released.
        handle: RenderHandle,
    },
    /// Confirms that every tile was destroyed.
    GridCleared {
        /// Number of tiles that existed before the grid was cleared.
        removed: usize,
    },
    /// Reports that the terrain settings of a tile changed.
    TerrainApplied {
        /// Index of the affected tile.
        index: GridIndex,
        /// Settings now in effect for the tile.
        settings: TileSettings,
    },
    /// Reports that the visual highlight of a tile switched on or off.
    TileHighlightChanged {
        /// Index of the affected tile.
        index: GridIndex,
        /// Render instance whose highlight must be updated.
        handle: RenderHandle,
        /// Whether the instance should now be drawn highlighted.
        highlighted: bool,
    },
    /// Reports that the occupant of a tile changed.
    OccupantChanged {
        /// Index of the affected tile.
        index: GridIndex,
        /// Character now occupying the tile, if any.
        occupant: Option<OccupantId>,
    },
    /// Reports that a command could not be applied.
    CommandRejected {
        /// Reason the command failed.
        reason: GridError,
    },
}

/// Location of a single tile expressed as column and row coordinates.
///
/// Indices carry no validity of their own; a tile exists only while the
/// world's registry holds an entry for its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridIndex {
    column: i32,
    row: i32,
}

impl GridIndex {
    /// Creates a new grid index.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column component of the index.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row component of the index.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Reports whether the index lies on an odd row.
    #[must_use]
    pub const fn is_odd_row(&self) -> bool {
        self.row.rem_euclid(2) == 1
    }

    /// Returns the index displaced by the provided offsets, if it fits in `i32`.
    #[must_use]
    pub fn offset(self, columns: i32, rows: i32) -> Option<GridIndex> {
        Some(GridIndex::new(
            self.column.checked_add(columns)?,
            self.row.checked_add(rows)?,
        ))
    }

    /// Computes the Manhattan distance between two indices.
    #[must_use]
    pub fn manhattan_distance(self, other: GridIndex) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Adjacency rule shared by every tile of one grid.
///
/// A grid commits to a single scheme for its whole lifetime; the two schemes
/// produce incompatible neighborhoods and distances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborScheme {
    /// Hexagonal tiles laid out in rows where every odd row is shifted half a
    /// tile towards increasing columns. Each tile has up to six neighbors.
    #[default]
    HexOffset,
    /// Square tiles with the four cardinal neighbors only.
    Rectangular,
}

/// Dense slot of the render instance that draws a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderHandle(u32);

impl RenderHandle {
    /// Creates a new render handle wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric slot of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a character owned by the game entity system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccupantId(u32);

impl OccupantId {
    /// Creates a new occupant identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

bitflags! {
    /// Terrain domains a unit can traverse or a tile accepts.
    ///
    /// | tile \ unit    | GROUND | AQUATIC | AERIAL |
    /// |----------------|--------|---------|--------|
    /// | GROUND         | yes    | no      | no     |
    /// | AQUATIC        | no     | yes     | no     |
    /// | AERIAL         | no     | no      | yes    |
    /// | AMPHIBIOUS     | yes    | yes     | no     |
    /// | AERIAL_AQUATIC | no     | yes     | yes    |
    /// | HYDROPHOBIC    | yes    | no      | yes    |
    /// | ANY            | yes    | yes     | yes    |
    ///
    /// An empty mask blocks every unit.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MovementType: u8 {
        /// Movement over solid ground.
        const GROUND = 1 << 0;
        /// Movement through water.
        const AQUATIC = 1 << 1;
        /// Movement through the air.
        const AERIAL = 1 << 2;
        /// Ground and water.
        const AMPHIBIOUS = Self::GROUND.bits() | Self::AQUATIC.bits();
        /// Water and air.
        const AERIAL_AQUATIC = Self::AQUATIC.bits() | Self::AERIAL.bits();
        /// Ground and air.
        const HYDROPHOBIC = Self::GROUND.bits() | Self::AERIAL.bits();
        /// Every terrain domain.
        const ANY = Self::GROUND.bits() | Self::AQUATIC.bits() | Self::AERIAL.bits();
    }
}

impl MovementType {
    /// Reports whether a unit moving with `unit` may enter a tile allowing `self`.
    #[must_use]
    pub const fn permits(self, unit: MovementType) -> bool {
        self.bits() & unit.bits() != 0
    }

    /// Flying units pay a flat cost of one per step regardless of terrain.
    #[must_use]
    pub const fn ignores_terrain_cost(self) -> bool {
        self.contains(MovementType::AERIAL)
    }

    /// Debug color of a modifier volume allowing this movement combination.
    ///
    /// Ground contributes red, water blue and air green.
    #[must_use]
    pub fn volume_color(self) -> VolumeColor {
        let channel = |flag: MovementType| if self.contains(flag) { 0xff } else { 0x00 };
        VolumeColor::from_rgb(
            channel(MovementType::GROUND),
            channel(MovementType::AERIAL),
            channel(MovementType::AQUATIC),
        )
    }
}

impl Default for MovementType {
    fn default() -> Self {
        MovementType::ANY
    }
}

/// Color used to tint terrain modifier volumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VolumeColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl VolumeColor {
    /// Creates a new volume color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

bitflags! {
    /// Interaction state of a tile. The bits are independent.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TileFlags: u8 {
        /// The cursor currently rests on the tile.
        const HOVERED = 1 << 0;
        /// The tile belongs to the displayed movement range.
        const SELECTED = 1 << 1;
    }
}

/// Terrain settings attached to a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSettings {
    /// Cost charged for entering the tile. Always at least one.
    pub movement_cost: u32,
    /// Elevation compared against a unit's jump power.
    pub height: i32,
    /// Movement types allowed to enter the tile.
    pub allowed_movement: MovementType,
}

impl TileSettings {
    /// Creates settings with explicit values. A zero cost is raised to one.
    #[must_use]
    pub const fn new(movement_cost: u32, height: i32, allowed_movement: MovementType) -> Self {
        Self {
            movement_cost: if movement_cost == 0 { 1 } else { movement_cost },
            height,
            allowed_movement,
        }
    }
}

impl Default for TileSettings {
    fn default() -> Self {
        Self::new(1, 1, MovementType::ANY)
    }
}

/// Reasons a grid operation may fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum GridError {
    /// No grid definition was provided before building.
    #[error("no grid definition set before building")]
    ConfigurationMissing,
    /// The referenced tile is not part of the grid.
    #[error("grid does not contain a tile at {0}")]
    TileNotFound(GridIndex),
    /// A tile already exists at the requested index.
    #[error("grid already contains a tile at {0}")]
    DuplicateTile(GridIndex),
}

#[cfg(test)]
mod tests {
    use super::{GridError, GridIndex, MovementType, TileSettings};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = GridIndex::new(1, 1);
        let destination = GridIndex::new(4, -1);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn grid_index_round_trips_through_bincode() {
        let index = GridIndex::new(-3, 7);
        let bytes = bincode::serialize(&index).expect("serialize");
        let restored: GridIndex = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, index);
    }

    #[test]
    fn odd_rows_are_detected_for_negative_indices() {
        assert!(GridIndex::new(0, -1).is_odd_row());
        assert!(!GridIndex::new(0, -2).is_odd_row());
        assert!(GridIndex::new(5, 3).is_odd_row());
    }

    #[test]
    fn offset_rejects_overflow() {
        assert_eq!(GridIndex::new(i32::MAX, 0).offset(1, 0), None);
        assert_eq!(
            GridIndex::new(2, 2).offset(-1, 1),
            Some(GridIndex::new(1, 3))
        );
    }

    #[test]
    fn union_values_match_base_flags() {
        assert_eq!(MovementType::AMPHIBIOUS.bits(), 3);
        assert_eq!(MovementType::AERIAL_AQUATIC.bits(), 6);
        assert_eq!(MovementType::HYDROPHOBIC.bits(), 5);
        assert_eq!(MovementType::ANY.bits(), 7);
        assert!(MovementType::empty().is_empty());
    }

    #[test]
    fn permits_follows_truth_table() {
        let units = [
            MovementType::GROUND,
            MovementType::AQUATIC,
            MovementType::AERIAL,
        ];
        let table = [
            (MovementType::GROUND, [true, false, false]),
            (MovementType::AQUATIC, [false, true, false]),
            (MovementType::AERIAL, [false, false, true]),
            (MovementType::AMPHIBIOUS, [true, true, false]),
            (MovementType::AERIAL_AQUATIC, [false, true, true]),
            (MovementType::HYDROPHOBIC, [true, false, true]),
            (MovementType::ANY, [true, true, true]),
            (MovementType::empty(), [false, false, false]),
        ];

        for (tile, expected) in table {
            for (unit, allowed) in units.iter().zip(expected) {
                assert_eq!(tile.permits(*unit), allowed, "{tile:?} vs {unit:?}");
            }
        }
    }

    #[test]
    fn aerial_units_ignore_terrain_cost() {
        assert!(MovementType::AERIAL.ignores_terrain_cost());
        assert!(MovementType::HYDROPHOBIC.ignores_terrain_cost());
        assert!(!MovementType::AMPHIBIOUS.ignores_terrain_cost());
    }

    #[test]
    fn volume_color_sums_channels() {
        let color = MovementType::AMPHIBIOUS.volume_color();
        assert_eq!((color.red(), color.green(), color.blue()), (0xff, 0x00, 0xff));
        let none = MovementType::empty().volume_color();
        assert_eq!((none.red(), none.green(), none.blue()), (0, 0, 0));
    }

    #[test]
    fn zero_cost_settings_are_clamped() {
        let settings = TileSettings::new(0, 3, MovementType::GROUND);
        assert_eq!(settings.movement_cost, 1);
        assert_eq!(TileSettings::default().height, 1);
        assert_eq!(TileSettings::default().allowed_movement, MovementType::ANY);
    }

    #[test]
    fn errors_render_the_offending_index() {
        let message = GridError::DuplicateTile(GridIndex::new(2, 5)).to_string();
        assert_eq!(message, "grid already contains a tile at (2, 5)");
    }
}
