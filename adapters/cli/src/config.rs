//! Scenario files describing a grid and the terrain it is built over.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use glam::Vec3;
use serde::Deserialize;
use tactical_grid_core::MovementType;
use tactical_grid_system_builder::{GridDefinition, GroundProbe, ProbeOutcome, TerrainModifier};
use tactical_grid_system_selection::SelectionConfig;

/// Parsed scenario file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScenarioConfig {
    pub(crate) grid: GridDefinition,
    #[serde(default)]
    pub(crate) selection: SelectionConfig,
    #[serde(default)]
    pub(crate) terrain: Vec<TerrainEntry>,
    #[serde(default)]
    pub(crate) void: Vec<CellEntry>,
    #[serde(default)]
    pub(crate) blocked: Vec<CellEntry>,
}

/// Modifier volume covering a single cell.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TerrainEntry {
    pub(crate) column: u32,
    pub(crate) row: u32,
    #[serde(default)]
    pub(crate) movement: MovementType,
    #[serde(default = "default_cost")]
    pub(crate) cost: u32,
    /// Ground elevation above the grid origin.
    #[serde(default)]
    pub(crate) elevation: f32,
}

fn default_cost() -> u32 {
    1
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CellEntry {
    pub(crate) column: u32,
    pub(crate) row: u32,
}

impl ScenarioConfig {
    pub(crate) fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        config
            .grid
            .validate()
            .context("scenario contains an unusable grid definition")?;
        Ok(config)
    }

    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("failed to load scenario {}", path.display()))
    }

    /// Probe answering from the scenario's terrain, void and blocked cells.
    pub(crate) fn probe(&self, origin: Vec3) -> ScriptedProbe {
        let at = |column: u32, row: u32| origin + self.grid.cell_offset(column, row);
        let mut cells = Vec::new();

        for entry in &self.void {
            cells.push((at(entry.column, entry.row), ProbeOutcome::Miss));
        }
        for entry in &self.blocked {
            cells.push((at(entry.column, entry.row), ProbeOutcome::Blocked));
        }
        for entry in &self.terrain {
            let position = at(entry.column, entry.row);
            cells.push((
                position,
                ProbeOutcome::Ground {
                    location: Vec3::new(position.x, position.y, origin.z + entry.elevation),
                    terrain: Some(TerrainModifier::new(entry.cost, entry.movement)),
                },
            ));
        }

        ScriptedProbe {
            cells,
            tolerance: self.grid.tile_step * 0.25,
            floor: origin.z,
        }
    }
}

/// Ground probe replaying a scenario. Unlisted cells are flat ground.
#[derive(Clone, Debug)]
pub(crate) struct ScriptedProbe {
    cells: Vec<(Vec3, ProbeOutcome)>,
    tolerance: f32,
    floor: f32,
}

impl GroundProbe for ScriptedProbe {
    fn probe(&mut self, position: Vec3) -> ProbeOutcome {
        self.cells
            .iter()
            .find(|(cell, _)| cell.truncate().distance(position.truncate()) <= self.tolerance)
            .map_or(
                ProbeOutcome::Ground {
                    location: Vec3::new(position.x, position.y, self.floor),
                    terrain: None,
                },
                |(_, outcome)| *outcome,
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactical_grid_core::NeighborScheme;

    const SCENARIO: &str = r#"
        [grid]
        columns = 4
        rows = 3
        scheme = "rectangular"

        [selection]
        range = 2

        [[terrain]]
        column = 1
        row = 1
        movement = "AQUATIC"
        cost = 3

        [[void]]
        column = 3
        row = 2

        [[blocked]]
        column = 0
        row = 2
    "#;

    #[test]
    fn scenario_parses_every_section() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).expect("valid scenario");

        assert_eq!(config.grid.scheme, NeighborScheme::Rectangular);
        assert_eq!(config.selection.range, 2);
        assert_eq!(config.terrain.len(), 1);
        assert_eq!(config.terrain[0].movement, MovementType::AQUATIC);
        assert_eq!(config.void, vec![CellEntry { column: 3, row: 2 }]);
    }

    #[test]
    fn bundled_scenario_parses() {
        let config =
            ScenarioConfig::from_toml_str(include_str!("../../../scenarios/river_crossing.toml"))
                .expect("bundled scenario is valid");

        assert_eq!(config.grid.scheme, NeighborScheme::HexOffset);
        assert_eq!(config.terrain[2].movement, MovementType::AMPHIBIOUS);
        assert_eq!(config.blocked.len(), 1);
    }

    #[test]
    fn invalid_grid_is_rejected_with_context() {
        let error = ScenarioConfig::from_toml_str("[grid]\ncolumns = 1\nrows = 1\ntile_step = -1.0\n")
            .expect_err("negative step");
        assert!(format!("{error:#}").contains("tile_step"));
    }

    #[test]
    fn probe_replays_listed_cells() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).expect("valid scenario");
        let origin = Vec3::new(5.0, 5.0, 2.0);
        let mut probe = config.probe(origin);

        let at = |column, row| origin + config.grid.cell_offset(column, row);
        assert_eq!(probe.probe(at(3, 2)), ProbeOutcome::Miss);
        assert_eq!(probe.probe(at(0, 2)), ProbeOutcome::Blocked);
        assert_eq!(
            probe.probe(at(1, 1)),
            ProbeOutcome::Ground {
                location: Vec3::new(6.0, 6.0, 2.0),
                terrain: Some(TerrainModifier::new(3, MovementType::AQUATIC)),
            }
        );
        assert_eq!(
            probe.probe(at(2, 0)),
            ProbeOutcome::Ground {
                location: Vec3::new(7.0, 5.0, 2.0),
                terrain: None,
            }
        );
    }
}
