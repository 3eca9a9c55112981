#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state management for the tactical grid engine.

mod neighbors;
mod registry;

use tactical_grid_core::{Command, Event, GridError, GridIndex, NeighborScheme, TileFlags};
use tracing::debug;

pub use neighbors::NeighborIter;
pub use registry::TileRecord;

use registry::TileRegistry;

/// Represents the authoritative tile grid.
#[derive(Debug, Default)]
pub struct World {
    scheme: NeighborScheme,
    registry: TileRegistry,
}

impl World {
    /// Creates an empty grid using the hexagonal offset scheme.
    #[must_use]
    pub fn new() -> Self {
        Self::with_scheme(NeighborScheme::HexOffset)
    }

    /// Creates an empty grid committed to the provided neighbor scheme.
    #[must_use]
    pub fn with_scheme(scheme: NeighborScheme) -> Self {
        Self {
            scheme,
            registry: TileRegistry::default(),
        }
    }

    fn update_flags(
        &mut self,
        index: GridIndex,
        flags: TileFlags,
        enabled: bool,
        out_events: &mut Vec<Event>,
    ) -> Result<(), GridError> {
        let handle = self
            .registry
            .handle_for(index)
            .ok_or(GridError::TileNotFound(index))?;
        let record = self
            .registry
            .get_mut(index)
            .ok_or(GridError::TileNotFound(index))?;

        let was_highlighted = record.is_highlighted();
        let mut updated = record.flags();
        updated.set(flags, enabled);
        record.set_flags(updated);

        if record.is_highlighted() != was_highlighted {
            out_events.push(Event::TileHighlightChanged {
                index,
                handle,
                highlighted: record.is_highlighted(),
            });
        }
        Ok(())
    }

    fn clear_flags(&mut self, out_events: &mut Vec<Event>) {
        let mut unlit = Vec::new();
        for (index, record) in self.registry.iter_mut() {
            if record.is_highlighted() {
                record.set_flags(TileFlags::empty());
                unlit.push(index);
            }
        }

        for index in unlit {
            if let Some(handle) = self.registry.handle_for(index) {
                out_events.push(Event::TileHighlightChanged {
                    index,
                    handle,
                    highlighted: false,
                });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that cannot be applied leave the world untouched and emit
/// [`Event::CommandRejected`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let outcome = match command {
        Command::AddTile {
            index,
            translation,
            settings,
        } => world
            .registry
            .add_tile(index, translation, settings)
            .map(|handle| {
                out_events.push(Event::TileAdded {
                    index,
                    handle,
                    translation,
                });
            }),
        Command::RemoveTile { index } => world
            .registry
            .remove_tile(index)
            .map(|handle| out_events.push(Event::TileRemoved { index, handle }))
            .ok_or(GridError::TileNotFound(index)),
        Command::ClearGrid => {
            let removed = world.registry.clear();
            out_events.push(Event::GridCleared { removed });
            Ok(())
        }
        Command::ApplyTerrainSettings {
            index,
            movement_cost,
            allowed_movement,
        } => match world.registry.get_mut(index) {
            Some(record) => {
                let mut settings = record.settings();
                settings.movement_cost = movement_cost.max(1);
                settings.allowed_movement = allowed_movement;
                record.set_settings(settings);
                out_events.push(Event::TerrainApplied { index, settings });
                Ok(())
            }
            None => Err(GridError::TileNotFound(index)),
        },
        Command::SetTileFlags {
            index,
            flags,
            enabled,
        } => world.update_flags(index, flags, enabled, out_events),
        Command::ClearTileFlags => {
            world.clear_flags(out_events);
            Ok(())
        }
        Command::SetOccupant { index, occupant } => match world.registry.get_mut(index) {
            Some(record) => {
                record.set_occupant(occupant);
                out_events.push(Event::OccupantChanged { index, occupant });
                Ok(())
            }
            None => Err(GridError::TileNotFound(index)),
        },
    };

    if let Err(reason) = outcome {
        debug!(%reason, "grid command rejected");
        out_events.push(Event::CommandRejected { reason });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use tactical_grid_core::{GridIndex, MovementType, NeighborScheme, OccupantId, RenderHandle};
    use tracing::warn;

    use super::{neighbors, NeighborIter, TileRecord, World};

    /// Neighbor scheme the grid was created with.
    #[must_use]
    pub fn neighbor_scheme(world: &World) -> NeighborScheme {
        world.scheme
    }

    /// Reports whether the grid holds a tile at the provided index.
    #[must_use]
    pub fn contains_tile(world: &World, index: GridIndex) -> bool {
        world.registry.contains(index)
    }

    /// Retrieves the tile stored at the provided index.
    #[must_use]
    pub fn tile(world: &World, index: GridIndex) -> Option<&TileRecord> {
        world.registry.get(index)
    }

    /// Iterates over every tile in ascending index order.
    pub fn tiles(world: &World) -> impl Iterator<Item = (GridIndex, &TileRecord)> {
        world.registry.iter()
    }

    /// Number of tiles currently registered.
    #[must_use]
    pub fn tile_count(world: &World) -> usize {
        world.registry.len()
    }

    /// Render instance drawing the tile at the provided index.
    #[must_use]
    pub fn render_handle(world: &World, index: GridIndex) -> Option<RenderHandle> {
        world.registry.handle_for(index)
    }

    /// Tile drawn by the provided render instance.
    #[must_use]
    pub fn tile_for_handle(world: &World, handle: RenderHandle) -> Option<GridIndex> {
        world.registry.index_for_handle(handle)
    }

    /// Character standing on the tile at the provided index.
    #[must_use]
    pub fn occupant(world: &World, index: GridIndex) -> Option<OccupantId> {
        world.registry.get(index).and_then(TileRecord::occupant)
    }

    /// Minimum number of steps between two indices under the grid's scheme.
    #[must_use]
    pub fn step_distance(world: &World, from: GridIndex, to: GridIndex) -> u32 {
        neighbors::distance(world.scheme, from, to)
    }

    /// Registered tiles adjacent to `index`.
    ///
    /// Returns nothing when `index` itself is not registered.
    #[must_use]
    pub fn neighbors(world: &World, index: GridIndex) -> NeighborIter {
        if !world.registry.contains(index) {
            warn!(%index, "grid does not contain a tile with the provided index");
            return NeighborIter::default();
        }

        neighbors::candidates(world.scheme, index)
            .retain(|neighbor| world.registry.contains(neighbor))
    }

    /// Registered neighbors a unit can step onto from `index`.
    ///
    /// A neighbor qualifies when it permits `movement` and its height differs
    /// from the origin's by at most `jump_power`.
    #[must_use]
    pub fn walkable_neighbors(
        world: &World,
        index: GridIndex,
        movement: MovementType,
        jump_power: u32,
    ) -> NeighborIter {
        let Some(origin) = world.registry.get(index) else {
            warn!(%index, "grid does not contain a tile with the provided index");
            return NeighborIter::default();
        };

        neighbors::candidates(world.scheme, index).retain(|neighbor| {
            world.registry.get(neighbor).is_some_and(|tile| {
                tile.allowed_movement().permits(movement)
                    && tile.height().abs_diff(origin.height()) <= jump_power
            })
        })
    }

    /// Tile whose centre lies closest to `position` within `radius`.
    ///
    /// `position` is expressed relative to the grid origin. Ties keep the
    /// lowest index.
    #[must_use]
    pub fn tile_at_world_position(world: &World, position: Vec3, radius: f32) -> Option<GridIndex> {
        let radius_squared = radius * radius;
        let mut closest: Option<(f32, GridIndex)> = None;

        for (index, record) in world.registry.iter() {
            let distance_squared = record.translation().distance_squared(position);
            if distance_squared > radius_squared {
                continue;
            }

            match closest {
                Some((best, _)) if best <= distance_squared => {}
                _ => closest = Some((distance_squared, index)),
            }
        }

        closest.map(|(_, index)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use tactical_grid_core::{MovementType, OccupantId, RenderHandle, TileSettings};

    fn add(world: &mut World, column: i32, row: i32, settings: TileSettings) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::AddTile {
                index: GridIndex::new(column, row),
                translation: Vec3::new(column as f32, row as f32, 0.0),
                settings,
            },
            &mut events,
        );
        events
    }

    fn square(world: &mut World, size: i32) {
        for row in 0..size {
            for column in 0..size {
                let _ = add(world, column, row, TileSettings::default());
            }
        }
    }

    #[test]
    fn add_tile_emits_handle() {
        let mut world = World::new();
        let events = add(&mut world, 2, 3, TileSettings::default());

        assert_eq!(
            events,
            vec![Event::TileAdded {
                index: GridIndex::new(2, 3),
                handle: RenderHandle::new(0),
                translation: Vec3::new(2.0, 3.0, 0.0),
            }]
        );
        assert!(query::contains_tile(&world, GridIndex::new(2, 3)));
    }

    #[test]
    fn zero_cost_from_struct_literal_is_stored_as_one() {
        let mut world = World::with_scheme(NeighborScheme::Rectangular);
        let free = TileSettings {
            movement_cost: 0,
            height: 1,
            allowed_movement: MovementType::ANY,
        };
        let _ = add(&mut world, 0, 0, free);

        let tile = query::tile(&world, GridIndex::new(0, 0)).expect("tile added");
        assert_eq!(tile.movement_cost(), 1);
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut world = World::new();
        let _ = add(&mut world, 0, 0, TileSettings::default());
        let events = add(&mut world, 0, 0, TileSettings::default());

        assert_eq!(
            events,
            vec![Event::CommandRejected {
                reason: GridError::DuplicateTile(GridIndex::new(0, 0)),
            }]
        );
        assert_eq!(query::tile_count(&world), 1);
    }

    #[test]
    fn removing_missing_tile_is_rejected() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RemoveTile {
                index: GridIndex::new(1, 1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::CommandRejected {
                reason: GridError::TileNotFound(GridIndex::new(1, 1)),
            }]
        );
    }

    #[test]
    fn terrain_settings_keep_height() {
        let mut world = World::new();
        let _ = add(&mut world, 0, 0, TileSettings::new(1, 4, MovementType::ANY));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyTerrainSettings {
                index: GridIndex::new(0, 0),
                movement_cost: 3,
                allowed_movement: MovementType::AQUATIC,
            },
            &mut events,
        );

        let tile = query::tile(&world, GridIndex::new(0, 0)).expect("tile");
        assert_eq!(tile.movement_cost(), 3);
        assert_eq!(tile.height(), 4);
        assert_eq!(tile.allowed_movement(), MovementType::AQUATIC);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn highlight_events_follow_flag_transitions() {
        let mut world = World::new();
        let _ = add(&mut world, 0, 0, TileSettings::default());
        let index = GridIndex::new(0, 0);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SetTileFlags {
                index,
                flags: TileFlags::HOVERED,
                enabled: true,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SetTileFlags {
                index,
                flags: TileFlags::SELECTED,
                enabled: true,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SetTileFlags {
                index,
                flags: TileFlags::HOVERED,
                enabled: false,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::TileHighlightChanged {
                index,
                handle: RenderHandle::new(0),
                highlighted: true,
            }]
        );
        let tile = query::tile(&world, index).expect("tile");
        assert_eq!(tile.flags(), TileFlags::SELECTED);
    }

    #[test]
    fn clear_flags_unlights_every_tile() {
        let mut world = World::new();
        square(&mut world, 2);
        let mut events = Vec::new();
        for index in [GridIndex::new(0, 0), GridIndex::new(1, 1)] {
            apply(
                &mut world,
                Command::SetTileFlags {
                    index,
                    flags: TileFlags::SELECTED | TileFlags::HOVERED,
                    enabled: true,
                },
                &mut events,
            );
        }
        events.clear();

        apply(&mut world, Command::ClearTileFlags, &mut events);

        assert_eq!(events.len(), 2);
        assert!(query::tiles(&world).all(|(_, tile)| tile.flags().is_empty()));
    }

    #[test]
    fn neighbors_are_filtered_by_registry() {
        let mut world = World::new();
        square(&mut world, 3);

        let corner: Vec<_> = query::neighbors(&world, GridIndex::new(0, 0)).collect();
        assert_eq!(corner, vec![GridIndex::new(1, 0), GridIndex::new(0, 1)]);

        let centre: Vec<_> = query::neighbors(&world, GridIndex::new(1, 1)).collect();
        assert_eq!(centre.len(), 6);
    }

    #[test]
    fn neighbors_of_missing_origin_are_empty() {
        let world = World::new();
        assert_eq!(query::neighbors(&world, GridIndex::new(0, 0)).count(), 0);
        assert_eq!(
            query::walkable_neighbors(&world, GridIndex::new(0, 0), MovementType::ANY, 1).count(),
            0
        );
    }

    #[test]
    fn neighbor_relation_is_symmetric() {
        for scheme in [NeighborScheme::HexOffset, NeighborScheme::Rectangular] {
            let mut world = World::with_scheme(scheme);
            square(&mut world, 5);
            let indices: Vec<_> = query::tiles(&world).map(|(index, _)| index).collect();
            for a in &indices {
                for b in query::neighbors(&world, *a) {
                    assert!(
                        query::neighbors(&world, b).any(|back| back == *a),
                        "{b} lists no edge back to {a} under {scheme:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn walkable_neighbors_respect_mask_and_jump() {
        let mut world = World::with_scheme(NeighborScheme::Rectangular);
        let _ = add(&mut world, 1, 1, TileSettings::new(1, 1, MovementType::ANY));
        let _ = add(&mut world, 1, 0, TileSettings::new(1, 1, MovementType::AQUATIC));
        let _ = add(&mut world, 2, 1, TileSettings::new(1, 4, MovementType::GROUND));
        let _ = add(&mut world, 1, 2, TileSettings::new(1, 2, MovementType::GROUND));
        let _ = add(&mut world, 0, 1, TileSettings::new(1, 1, MovementType::empty()));

        let walkable: Vec<_> =
            query::walkable_neighbors(&world, GridIndex::new(1, 1), MovementType::GROUND, 1)
                .collect();
        assert_eq!(walkable, vec![GridIndex::new(1, 2)]);

        let jumper: Vec<_> =
            query::walkable_neighbors(&world, GridIndex::new(1, 1), MovementType::GROUND, 3)
                .collect();
        assert_eq!(jumper, vec![GridIndex::new(2, 1), GridIndex::new(1, 2)]);
    }

    #[test]
    fn occupant_is_recorded_by_reference() {
        let mut world = World::new();
        let _ = add(&mut world, 0, 0, TileSettings::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetOccupant {
                index: GridIndex::new(0, 0),
                occupant: Some(OccupantId::new(7)),
            },
            &mut events,
        );

        assert_eq!(
            query::occupant(&world, GridIndex::new(0, 0)),
            Some(OccupantId::new(7))
        );
    }

    #[test]
    fn cursor_resolution_picks_nearest_tile() {
        let mut world = World::new();
        square(&mut world, 3);

        assert_eq!(
            query::tile_at_world_position(&world, Vec3::new(1.2, 0.9, 0.0), 0.5),
            Some(GridIndex::new(1, 1))
        );
        assert_eq!(
            query::tile_at_world_position(&world, Vec3::new(9.0, 9.0, 0.0), 0.5),
            None
        );
    }

    #[test]
    fn removal_keeps_handles_dense() {
        let mut world = World::new();
        square(&mut world, 2);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RemoveTile {
                index: GridIndex::new(0, 0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::TileRemoved {
                index: GridIndex::new(0, 0),
                handle: RenderHandle::new(0),
            }]
        );
        assert_eq!(
            query::tile_for_handle(&world, RenderHandle::new(0)),
            Some(GridIndex::new(1, 0))
        );
        assert_eq!(
            query::render_handle(&world, GridIndex::new(1, 1)),
            Some(RenderHandle::new(2))
        );
    }

    #[test]
    fn clear_grid_forgets_every_tile() {
        let mut world = World::new();
        square(&mut world, 3);
        let mut events = Vec::new();
        apply(&mut world, Command::ClearGrid, &mut events);

        assert_eq!(events, vec![Event::GridCleared { removed: 9 }]);
        for row in 0..3 {
            for column in 0..3 {
                assert!(!query::contains_tile(&world, GridIndex::new(column, row)));
            }
        }
    }
}
