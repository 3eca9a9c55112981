#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure selection system translating cursor input into tile flag commands.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tactical_grid_core::{Command, GridIndex, MovementType, TileFlags};
use tactical_grid_system_pathfinding::Pathfinder;
use tactical_grid_world::{query, World};
use tracing::{debug, warn};

/// Tunables describing the movement range revealed on confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Movement budget used when revealing the range around a confirmed tile.
    pub range: u32,
    /// Movement type of the unit whose range is revealed.
    pub movement: MovementType,
    /// Maximum height difference crossed in a single step.
    pub jump_power: u32,
    /// Largest distance between the cursor and a tile centre that still hovers it.
    pub pick_radius: f32,
    /// Ceiling applied to `range` before querying.
    pub max_movement_range: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            range: 3,
            movement: MovementType::GROUND,
            jump_power: 1,
            pick_radius: 0.5,
            max_movement_range: 12,
        }
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SelectionInput {
    /// Cursor position projected into grid space, if it hit anything.
    pub cursor_world: Option<Vec3>,
    /// Indicates whether the player confirmed the hovered tile on this frame.
    pub confirm: bool,
}

impl SelectionInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(cursor_world: Option<Vec3>, confirm: bool) -> Self {
        Self {
            cursor_world,
            confirm,
        }
    }
}

/// Hover and selection state machine over the tile grid.
#[derive(Debug, Default)]
pub struct SelectionController {
    config: SelectionConfig,
    hovered: Option<GridIndex>,
    pathfinder: Pathfinder,
}

impl SelectionController {
    /// Creates a controller with nothing hovered.
    #[must_use]
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            hovered: None,
            pathfinder: Pathfinder::new(),
        }
    }

    /// Tile currently under the cursor.
    #[must_use]
    pub const fn hovered(&self) -> Option<GridIndex> {
        self.hovered
    }

    /// Configuration the controller was created with.
    #[must_use]
    pub const fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Consumes one frame of input and emits the flag commands it implies.
    pub fn handle(&mut self, world: &World, input: SelectionInput, out: &mut Vec<Command>) {
        let pick_radius = self.config.pick_radius;
        let resolved = input
            .cursor_world
            .and_then(|position| query::tile_at_world_position(world, position, pick_radius));

        if resolved != self.hovered {
            if let Some(previous) = self.hovered {
                if query::contains_tile(world, previous)
                    && !has_flag(world, previous, TileFlags::SELECTED)
                {
                    out.push(Command::SetTileFlags {
                        index: previous,
                        flags: TileFlags::HOVERED,
                        enabled: false,
                    });
                }
            }

            debug!(from = ?self.hovered, to = ?resolved, "hovered tile changed");
            self.hovered = resolved;

            if let Some(current) = resolved {
                out.push(Command::SetTileFlags {
                    index: current,
                    flags: TileFlags::HOVERED,
                    enabled: true,
                });
            }
        }

        if input.confirm {
            self.on_cursor_confirm(world, out);
        }
    }

    /// Reveals the movement range around the hovered tile.
    ///
    /// Does nothing when no tile is hovered or the hovered tile is already
    /// part of the displayed range. Otherwise every flag on the grid is
    /// cleared, each reachable tile is marked selected and the hovered tile
    /// regains its hover flag.
    pub fn on_cursor_confirm(&mut self, world: &World, out: &mut Vec<Command>) {
        let Some(origin) = self.hovered else {
            return;
        };
        if !query::contains_tile(world, origin) || has_flag(world, origin, TileFlags::SELECTED) {
            return;
        }

        let range = self.effective_range();
        let reached = self.pathfinder.tiles_in_range(
            world,
            origin,
            range,
            self.config.movement,
            self.config.jump_power,
        );
        debug!(%origin, range, tiles = reached.len(), "revealing movement range");

        out.push(Command::ClearTileFlags);
        out.extend(reached.into_iter().map(|index| Command::SetTileFlags {
            index,
            flags: TileFlags::SELECTED,
            enabled: true,
        }));
        out.push(Command::SetTileFlags {
            index: origin,
            flags: TileFlags::HOVERED,
            enabled: true,
        });
    }

    fn effective_range(&self) -> u32 {
        if self.config.range > self.config.max_movement_range {
            warn!(
                requested = self.config.range,
                ceiling = self.config.max_movement_range,
                "movement range clamped"
            );
            return self.config.max_movement_range;
        }
        self.config.range
    }
}

fn has_flag(world: &World, index: GridIndex, flag: TileFlags) -> bool {
    query::tile(world, index).is_some_and(|tile| tile.flags().contains(flag))
}
