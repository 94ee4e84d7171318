/// Seams to the rendering engine.
///
/// The visibility subsystem never rasterizes anything itself. The host
/// engine implements `ProbeRenderer` (off-screen render, readback, camera
/// query, group creation) and hands back its own instanced-draw objects
/// as `RenderableGroup`s.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use crate::error::Result;
use super::instance_batch::{InstanceBatch, RenderGroup};
use super::probe_camera::ProbeCamera;
use super::probe_scene::ProbeScene;

/// Where a probe render goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTarget {
    /// Fixed-size RGBA8 off-screen target, cleared to `ColorCode::BACKGROUND`
    Offscreen { width: u32, height: u32 },
    /// The visible framebuffer (debug frames only)
    Screen,
}

/// An engine-side instanced draw of unit boxes with flat per-instance colors.
///
/// Created by `ProbeRenderer::create_group()` from an `InstanceBatch`.
/// The engine downcasts through `as_any()` when drawing a `ProbeScene`.
pub trait RenderableGroup: Send + Sync + fmt::Debug {
    /// Render group the batch was built for
    fn group(&self) -> RenderGroup;

    /// Number of instances drawn
    fn instance_count(&self) -> u32;

    fn as_any(&self) -> &dyn Any;
}

/// Rendering engine interface consumed by the visibility render pass.
///
/// Calls are blocking from the caller's point of view.
pub trait ProbeRenderer: Send + Sync {
    /// Upload a batch and wrap it in an engine-side instanced draw.
    fn create_group(&mut self, batch: &InstanceBatch) -> Result<Arc<dyn RenderableGroup>>;

    /// Snapshot of the camera the user currently looks through.
    fn active_camera(&self) -> Result<ProbeCamera>;

    /// Draw every group of `scene` from `camera` into `target`.
    ///
    /// Off-screen renders clear color and depth first. Groups must be drawn
    /// unlit with their exact instance colors (no blending, no MSAA) so the
    /// read-back values match the allocated codes.
    fn render(&mut self, scene: &ProbeScene, camera: &ProbeCamera, target: ProbeTarget) -> Result<()>;

    /// Copy the last off-screen render into `pixels`
    /// (`width * height * 4` bytes, RGBA8, row-major).
    fn read_pixels(&mut self, width: u32, height: u32, pixels: &mut [u8]) -> Result<()>;
}
