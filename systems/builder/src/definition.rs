//! Grid definitions loaded from TOML.

use std::{
    fs,
    path::{Path, PathBuf},
};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tactical_grid_core::NeighborScheme;

/// Vertical spacing factor between hexagonal rows (`sin 60°`).
const HEX_ROW_FACTOR: f32 = 0.866_025_4;

/// Errors raised while loading or validating a grid definition.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The definition file could not be read.
    #[error("failed to read grid definition at {}", path.display())]
    Io {
        /// Location of the unreadable file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The definition is not valid TOML for the expected schema.
    #[error("failed to parse grid definition toml contents")]
    Parse(#[from] toml::de::Error),
    /// The definition parsed but describes an unusable grid.
    #[error("invalid grid definition: {reason}")]
    InvalidDefinition {
        /// Human readable explanation of the rejected value.
        reason: String,
    },
}

/// Dimensions and spacing of a grid to build.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridDefinition {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Distance between neighboring tile centres in world units.
    #[serde(default = "default_tile_step")]
    pub tile_step: f32,
    /// Layout and adjacency of the tiles.
    #[serde(default)]
    pub scheme: NeighborScheme,
    /// World units per height level. When unset every tile keeps the default height.
    #[serde(default)]
    pub height_step: Option<f32>,
}

fn default_tile_step() -> f32 {
    1.0
}

impl GridDefinition {
    /// Creates a definition with unit spacing and no height sampling.
    #[must_use]
    pub fn new(columns: u32, rows: u32, scheme: NeighborScheme) -> Self {
        Self {
            columns,
            rows,
            tile_step: default_tile_step(),
            scheme,
            height_step: None,
        }
    }

    /// Parses and validates a definition from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let definition: Self = toml::from_str(contents)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Reads, parses and validates a definition stored at `path`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Rejects spacings that cannot place tiles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tile_step.is_finite() || self.tile_step <= 0.0 {
            return Err(ConfigError::InvalidDefinition {
                reason: format!("tile_step must be positive, got {}", self.tile_step),
            });
        }

        if let Some(height_step) = self.height_step {
            if !height_step.is_finite() || height_step <= 0.0 {
                return Err(ConfigError::InvalidDefinition {
                    reason: format!("height_step must be positive, got {height_step}"),
                });
            }
        }

        if i32::try_from(self.columns).is_err() || i32::try_from(self.rows).is_err() {
            return Err(ConfigError::InvalidDefinition {
                reason: format!("{}x{} exceeds the addressable grid", self.columns, self.rows),
            });
        }

        Ok(())
    }

    /// Offset of the cell at (`column`, `row`) from the grid origin.
    ///
    /// Hexagonal rows are packed at `sin 60°` of the step and odd rows shift
    /// half a step along x.
    #[must_use]
    pub fn cell_offset(&self, column: u32, row: u32) -> Vec3 {
        let step = self.tile_step;
        match self.scheme {
            NeighborScheme::HexOffset => {
                let shift = if row % 2 == 1 { step / 2.0 } else { 0.0 };
                Vec3::new(
                    step * column as f32 + shift,
                    step * row as f32 * HEX_ROW_FACTOR,
                    0.0,
                )
            }
            NeighborScheme::Rectangular => {
                Vec3::new(step * column as f32, step * row as f32, 0.0)
            }
        }
    }

    /// Height level of ground found `elevation` units above the grid origin.
    #[must_use]
    pub fn height_at(&self, elevation: f32) -> Option<i32> {
        let step = self.height_step?;
        let levels = (elevation / step).round();
        if levels.is_finite() {
            Some((levels as i32).saturating_add(1))
        } else {
            None
        }
    }
}
