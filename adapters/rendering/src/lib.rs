#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for tactical grid adapters.

use anyhow::Result as AnyResult;
use glam::Vec3;
use std::{error::Error, fmt};
use tactical_grid_core::{Event, GridIndex, RenderHandle, VolumeColor};

/// RGBA color used when presenting tiles and volumes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self::new(
            red as f32 / 255.0,
            green as f32 / 255.0,
            blue as f32 / 255.0,
            1.0,
        )
    }

    /// Formats the color as `#rrggbb`, ignoring alpha.
    #[must_use]
    pub fn to_hex(self) -> String {
        let byte = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            byte(self.red),
            byte(self.green),
            byte(self.blue)
        )
    }
}

impl From<VolumeColor> for Color {
    fn from(color: VolumeColor) -> Self {
        Self::from_rgb_u8(color.red(), color.green(), color.blue())
    }
}

/// Instance store drawing one mesh instance per tile.
///
/// Instances are dense: removing one shifts every later instance down by one
/// slot, which the world mirrors in the handles it reports.
pub trait TileInstanceBackend {
    /// Adds an instance at `translation` and returns the slot it occupies.
    fn add_instance(&mut self, translation: Vec3) -> AnyResult<RenderHandle>;

    /// Removes the instance stored at `handle`.
    fn remove_instance(&mut self, handle: RenderHandle) -> AnyResult<()>;

    /// Removes every instance.
    fn clear_instances(&mut self) -> AnyResult<()>;

    /// Switches the highlight of the instance stored at `handle`.
    fn set_highlight(&mut self, handle: RenderHandle, highlighted: bool) -> AnyResult<()>;
}

/// Maps the player's cursor to a position in grid space.
pub trait CursorProjector {
    /// Position under the cursor, or `None` when it points at nothing.
    fn project_cursor(&mut self) -> Option<Vec3>;
}

/// Forwards world events to the instance backend.
///
/// Fails when the backend allocates a slot different from the handle the
/// world assigned, since every later highlight would address the wrong tile.
pub fn present<B>(events: &[Event], backend: &mut B) -> AnyResult<()>
where
    B: TileInstanceBackend + ?Sized,
{
    for event in events {
        match event {
            Event::TileAdded {
                index,
                handle,
                translation,
            } => {
                let allocated = backend.add_instance(*translation)?;
                if allocated != *handle {
                    return Err(RenderingError::HandleMismatch {
                        index: *index,
                        expected: *handle,
                        allocated,
                    }
                    .into());
                }
            }
            Event::TileRemoved { handle, .. } => backend.remove_instance(*handle)?,
            Event::GridCleared { .. } => backend.clear_instances()?,
            Event::TileHighlightChanged {
                handle,
                highlighted,
                ..
            } => backend.set_highlight(*handle, *highlighted)?,
            Event::TerrainApplied { .. }
            | Event::OccupantChanged { .. }
            | Event::CommandRejected { .. } => {}
        }
    }
    Ok(())
}

/// Instance drawn by the headless backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileInstance {
    translation: Vec3,
    highlighted: bool,
}

impl TileInstance {
    /// Position of the instance relative to the grid origin.
    #[must_use]
    pub const fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Whether the instance is drawn highlighted.
    #[must_use]
    pub const fn is_highlighted(&self) -> bool {
        self.highlighted
    }
}

/// In-memory dense instance store for tests and terminal adapters.
#[derive(Clone, Debug, Default)]
pub struct HeadlessInstances {
    instances: Vec<TileInstance>,
}

impl HeadlessInstances {
    /// Creates an empty instance store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Reports whether the store holds no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instance stored at `handle`.
    #[must_use]
    pub fn instance(&self, handle: RenderHandle) -> Option<&TileInstance> {
        self.instances.get(slot(handle)?)
    }

    /// Handles of every highlighted instance in slot order.
    pub fn highlighted(&self) -> impl Iterator<Item = RenderHandle> + '_ {
        self.instances
            .iter()
            .enumerate()
            .filter(|(_, instance)| instance.highlighted)
            .filter_map(|(slot, _)| u32::try_from(slot).ok().map(RenderHandle::new))
    }

    fn instance_mut(&mut self, handle: RenderHandle) -> Result<&mut TileInstance, RenderingError> {
        let len = self.instances.len();
        slot(handle)
            .and_then(|slot| self.instances.get_mut(slot))
            .ok_or(RenderingError::UnknownHandle { handle, len })
    }
}

impl TileInstanceBackend for HeadlessInstances {
    fn add_instance(&mut self, translation: Vec3) -> AnyResult<RenderHandle> {
        let handle = RenderHandle::new(u32::try_from(self.instances.len())?);
        self.instances.push(TileInstance {
            translation,
            highlighted: false,
        });
        Ok(handle)
    }

    fn remove_instance(&mut self, handle: RenderHandle) -> AnyResult<()> {
        let _ = self.instance_mut(handle)?;
        if let Some(slot) = slot(handle) {
            let _ = self.instances.remove(slot);
        }
        Ok(())
    }

    fn clear_instances(&mut self) -> AnyResult<()> {
        self.instances.clear();
        Ok(())
    }

    fn set_highlight(&mut self, handle: RenderHandle, highlighted: bool) -> AnyResult<()> {
        self.instance_mut(handle)?.highlighted = highlighted;
        Ok(())
    }
}

fn slot(handle: RenderHandle) -> Option<usize> {
    usize::try_from(handle.get()).ok()
}

/// Errors raised while mirroring the grid into an instance store.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// The backend placed a new tile in a different slot than the world expects.
    HandleMismatch {
        /// Tile whose instance was added.
        index: GridIndex,
        /// Handle reported by the world.
        expected: RenderHandle,
        /// Slot chosen by the backend.
        allocated: RenderHandle,
    },
    /// A handle did not address a live instance.
    UnknownHandle {
        /// Offending handle.
        handle: RenderHandle,
        /// Number of live instances at the time.
        len: usize,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandleMismatch {
                index,
                expected,
                allocated,
            } => write!(
                f,
                "tile {index} was drawn in slot {} but the grid assigned slot {}",
                allocated.get(),
                expected.get()
            ),
            Self::UnknownHandle { handle, len } => write!(
                f,
                "render handle {} is out of range for {len} instances",
                handle.get()
            ),
        }
    }
}

impl Error for RenderingError {}
