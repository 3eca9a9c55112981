#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure grid construction system that turns a definition into tile commands.

mod definition;

use glam::Vec3;
use tactical_grid_core::{Command, GridError, GridIndex, MovementType, TileSettings};
use tracing::{info, warn};

pub use definition::{ConfigError, GridDefinition};

/// Terrain override reported by a modifier volume overlapping a probed cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerrainModifier {
    /// Cost charged for entering the tile.
    pub movement_cost: u32,
    /// Movement types allowed to enter the tile.
    pub allowed_movement: MovementType,
}

impl TerrainModifier {
    /// Creates a new terrain modifier descriptor.
    #[must_use]
    pub const fn new(movement_cost: u32, allowed_movement: MovementType) -> Self {
        Self {
            movement_cost,
            allowed_movement,
        }
    }
}

/// Result of asking the environment whether a tile belongs at a position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProbeOutcome {
    /// Walkable ground was found.
    Ground {
        /// World position of the ground surface.
        location: Vec3,
        /// Modifier volume overlapping the cell, if any.
        terrain: Option<TerrainModifier>,
    },
    /// A blocking volume occupies the cell.
    Blocked,
    /// Nothing walkable lies below the cell.
    Miss,
}

/// Environment query answering whether ground exists below a candidate cell.
pub trait GroundProbe {
    /// Probes the environment at the provided world position.
    fn probe(&mut self, position: Vec3) -> ProbeOutcome;
}

impl<F> GroundProbe for F
where
    F: FnMut(Vec3) -> ProbeOutcome,
{
    fn probe(&mut self, position: Vec3) -> ProbeOutcome {
        self(position)
    }
}

/// Toggles controlling how a grid is (re)built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Destroys the existing grid before placing new tiles.
    pub rebuild: bool,
    /// Consults the ground probe. When disabled every cell becomes a tile.
    pub use_probe: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            rebuild: true,
            use_probe: true,
        }
    }
}

/// Counters describing the outcome of a build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Tiles emitted.
    pub placed: usize,
    /// Cells skipped because a blocking volume occupied them.
    pub blocked: usize,
    /// Cells skipped because no ground was found.
    pub missed: usize,
    /// Tiles whose terrain was overridden by a modifier volume.
    pub modified: usize,
}

/// System that emits tile commands for every accepted cell of a definition.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridBuilder {
    options: BuildOptions,
}

impl GridBuilder {
    /// Creates a builder using the provided options.
    #[must_use]
    pub const fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Emits the commands that populate a grid anchored at `origin`.
    ///
    /// Tile translations are relative to `origin`. Probed tiles sit one unit
    /// above the ground they were found on.
    /// A modifier volume that allows no movement type blocks its cell.
    pub fn build(
        &self,
        definition: Option<&GridDefinition>,
        origin: Vec3,
        mut probe: Option<&mut dyn GroundProbe>,
        out: &mut Vec<Command>,
    ) -> Result<BuildReport, GridError> {
        let Some(definition) = definition else {
            warn!("no grid definition set; nothing to build");
            return Err(GridError::ConfigurationMissing);
        };

        if self.options.rebuild {
            out.push(Command::ClearGrid);
        }

        let mut report = BuildReport::default();
        for row in 0..definition.rows {
            for column in 0..definition.columns {
                let Some(index) = cell_index(column, row) else {
                    continue;
                };
                let offset = definition.cell_offset(column, row);

                let outcome = match probe.as_deref_mut() {
                    Some(probe) if self.options.use_probe => probe.probe(origin + offset),
                    _ => {
                        out.push(Command::AddTile {
                            index,
                            translation: offset,
                            settings: TileSettings::default(),
                        });
                        report.placed += 1;
                        continue;
                    }
                };

                match outcome {
                    ProbeOutcome::Ground {
                        terrain: Some(terrain),
                        ..
                    } if terrain.allowed_movement.is_empty() => report.blocked += 1,
                    ProbeOutcome::Ground { location, terrain } => {
                        let translation = location + Vec3::Z - origin;
                        let mut settings = TileSettings::default();
                        if let Some(height) = definition.height_at(location.z - origin.z) {
                            settings.height = height;
                        }

                        out.push(Command::AddTile {
                            index,
                            translation,
                            settings,
                        });
                        report.placed += 1;

                        if let Some(terrain) = terrain {
                            out.push(Command::ApplyTerrainSettings {
                                index,
                                movement_cost: terrain.movement_cost,
                                allowed_movement: terrain.allowed_movement,
                            });
                            report.modified += 1;
                        }
                    }
                    ProbeOutcome::Blocked => report.blocked += 1,
                    ProbeOutcome::Miss => report.missed += 1,
                }
            }
        }

        info!(
            columns = definition.columns,
            rows = definition.rows,
            placed = report.placed,
            blocked = report.blocked,
            missed = report.missed,
            modified = report.modified,
            "grid built"
        );
        Ok(report)
    }
}

fn cell_index(column: u32, row: u32) -> Option<GridIndex> {
    Some(GridIndex::new(
        i32::try_from(column).ok()?,
        i32::try_from(row).ok()?,
    ))
}
