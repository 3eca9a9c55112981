//! Arena of tiles keyed by grid index.

use std::collections::BTreeMap;

use glam::Vec3;
use tactical_grid_core::{
    GridError, GridIndex, MovementType, OccupantId, RenderHandle, TileFlags, TileSettings,
};

/// Mutable per-tile state owned by the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct TileRecord {
    settings: TileSettings,
    flags: TileFlags,
    occupant: Option<OccupantId>,
    translation: Vec3,
}

impl TileRecord {
    fn new(translation: Vec3, settings: TileSettings) -> Self {
        Self {
            settings: TileSettings {
                movement_cost: settings.movement_cost.max(1),
                ..settings
            },
            flags: TileFlags::empty(),
            occupant: None,
            translation,
        }
    }

    /// Terrain settings currently applied to the tile.
    #[must_use]
    pub const fn settings(&self) -> TileSettings {
        self.settings
    }

    /// Cost charged for entering the tile.
    #[must_use]
    pub const fn movement_cost(&self) -> u32 {
        self.settings.movement_cost
    }

    /// Elevation of the tile.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.settings.height
    }

    /// Movement types allowed to enter the tile.
    #[must_use]
    pub const fn allowed_movement(&self) -> MovementType {
        self.settings.allowed_movement
    }

    /// Interaction flags raised on the tile.
    #[must_use]
    pub const fn flags(&self) -> TileFlags {
        self.flags
    }

    /// Whether the tile's render instance is drawn highlighted.
    #[must_use]
    pub const fn is_highlighted(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Character standing on the tile, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<OccupantId> {
        self.occupant
    }

    /// Tile position relative to the grid origin.
    #[must_use]
    pub const fn translation(&self) -> Vec3 {
        self.translation
    }

    pub(crate) fn set_settings(&mut self, settings: TileSettings) {
        self.settings = settings;
    }

    pub(crate) fn set_flags(&mut self, flags: TileFlags) {
        self.flags = flags;
    }

    pub(crate) fn set_occupant(&mut self, occupant: Option<OccupantId>) {
        self.occupant = occupant;
    }
}

/// Owns every tile record together with the render instance slot drawing it.
///
/// Render handles are dense slots: the instance list mirrors a backend that
/// shifts later instances down when one is removed. The registry applies the
/// same shift to its own mapping so handles stay valid after removals.
#[derive(Clone, Debug, Default)]
pub(crate) struct TileRegistry {
    records: BTreeMap<GridIndex, TileRecord>,
    handles: BTreeMap<GridIndex, RenderHandle>,
    instances: Vec<GridIndex>,
}

impl TileRegistry {
    pub(crate) fn add_tile(
        &mut self,
        index: GridIndex,
        translation: Vec3,
        settings: TileSettings,
    ) -> Result<RenderHandle, GridError> {
        if self.records.contains_key(&index) {
            return Err(GridError::DuplicateTile(index));
        }

        let slot = u32::try_from(self.instances.len()).unwrap_or(u32::MAX);
        let handle = RenderHandle::new(slot);
        let _ = self
            .records
            .insert(index, TileRecord::new(translation, settings));
        let _ = self.handles.insert(index, handle);
        self.instances.push(index);
        Ok(handle)
    }

    pub(crate) fn remove_tile(&mut self, index: GridIndex) -> Option<RenderHandle> {
        let _ = self.records.remove(&index)?;
        let handle = self.handles.remove(&index)?;
        let slot = usize::try_from(handle.get()).ok()?;
        if slot < self.instances.len() {
            let _ = self.instances.remove(slot);
        }

        for shifted in &self.instances[slot.min(self.instances.len())..] {
            if let Some(entry) = self.handles.get_mut(shifted) {
                *entry = RenderHandle::new(entry.get().saturating_sub(1));
            }
        }

        Some(handle)
    }

    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        self.handles.clear();
        self.instances.clear();
        removed
    }

    pub(crate) fn contains(&self, index: GridIndex) -> bool {
        self.records.contains_key(&index)
    }

    pub(crate) fn get(&self, index: GridIndex) -> Option<&TileRecord> {
        self.records.get(&index)
    }

    pub(crate) fn get_mut(&mut self, index: GridIndex) -> Option<&mut TileRecord> {
        self.records.get_mut(&index)
    }

    pub(crate) fn handle_for(&self, index: GridIndex) -> Option<RenderHandle> {
        self.handles.get(&index).copied()
    }

    pub(crate) fn index_for_handle(&self, handle: RenderHandle) -> Option<GridIndex> {
        let slot = usize::try_from(handle.get()).ok()?;
        self.instances.get(slot).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (GridIndex, &TileRecord)> {
        self.records.iter().map(|(index, record)| (*index, record))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (GridIndex, &mut TileRecord)> {
        self.records
            .iter_mut()
            .map(|(index, record)| (*index, record))
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let record_keys: Vec<_> = self.records.keys().collect();
        let handle_keys: Vec<_> = self.handles.keys().collect();
        if record_keys != handle_keys || self.instances.len() != self.records.len() {
            return false;
        }

        self.instances.iter().enumerate().all(|(slot, index)| {
            self.handles.get(index).map(RenderHandle::get) == u32::try_from(slot).ok()
        })
    }
}
