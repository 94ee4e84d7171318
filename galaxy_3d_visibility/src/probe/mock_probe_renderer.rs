/// Mock ProbeRenderer for unit tests (no GPU required)
///
/// "Renders" by writing one pixel per visible instance color of every
/// group currently in the probe scene; the rest of the target stays
/// background. Tests choose which codes are visible and inspect the
/// recorded calls.

use std::any::Any;
use std::sync::Arc;
use rustc_hash::FxHashSet;
use crate::color::ColorCode;
use crate::engine_bail;
use crate::error::Result;
use super::instance_batch::{InstanceBatch, RenderGroup};
use super::probe_camera::ProbeCamera;
use super::probe_renderer::{ProbeRenderer, ProbeTarget, RenderableGroup};
use super::probe_scene::ProbeScene;

// ============================================================================
// Mock Group
// ============================================================================

#[derive(Debug)]
pub struct MockGroup {
    pub group: RenderGroup,
    pub codes: Vec<ColorCode>,
}

impl RenderableGroup for MockGroup {
    fn group(&self) -> RenderGroup {
        self.group
    }

    fn instance_count(&self) -> u32 {
        self.codes.len() as u32
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Renderer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    CreateGroup { group: RenderGroup, instances: usize },
    Render { target: ProbeTarget, groups: Vec<RenderGroup> },
    ReadPixels { width: u32, height: u32 },
}

#[derive(Default)]
pub struct MockProbeRenderer {
    pub calls: Vec<MockCall>,
    /// Instance colors that survive the depth test
    pub visible: FxHashSet<ColorCode>,
    /// Last off-screen frame, as RGBA8 pixels in draw order
    pub frame: Vec<ColorCode>,
    pub camera: ProbeCamera,
    pub fail_render: bool,
    pub fail_read: bool,
}

impl MockProbeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_visible(&mut self, codes: &[ColorCode]) {
        self.visible = codes.iter().copied().collect();
    }

    pub fn render_count(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, MockCall::Render { .. })).count()
    }

    pub fn read_count(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, MockCall::ReadPixels { .. })).count()
    }
}

impl ProbeRenderer for MockProbeRenderer {
    fn create_group(&mut self, batch: &InstanceBatch) -> Result<Arc<dyn RenderableGroup>> {
        self.calls.push(MockCall::CreateGroup { group: batch.group(), instances: batch.len() });
        Ok(Arc::new(MockGroup { group: batch.group(), codes: batch.codes().to_vec() }))
    }

    fn active_camera(&self) -> Result<ProbeCamera> {
        Ok(self.camera)
    }

    fn render(&mut self, scene: &ProbeScene, _camera: &ProbeCamera, target: ProbeTarget) -> Result<()> {
        if self.fail_render {
            engine_bail!("galaxy3d::MockProbeRenderer", "Render failed");
        }

        let groups: Vec<RenderGroup> = scene.groups().map(|(_, g)| g.group()).collect();
        self.calls.push(MockCall::Render { target, groups });

        if let ProbeTarget::Offscreen { .. } = target {
            self.frame = scene
                .groups()
                .filter_map(|(_, g)| g.as_any().downcast_ref::<MockGroup>())
                .flat_map(|g| g.codes.iter().copied())
                .filter(|code| self.visible.contains(code))
                .collect();
        }
        Ok(())
    }

    fn read_pixels(&mut self, width: u32, height: u32, pixels: &mut [u8]) -> Result<()> {
        self.calls.push(MockCall::ReadPixels { width, height });
        if self.fail_read {
            engine_bail!("galaxy3d::MockProbeRenderer", "Readback failed");
        }

        pixels.fill(0);
        for (pixel, code) in pixels.chunks_exact_mut(4).zip(&self.frame) {
            pixel.copy_from_slice(&[code.r, code.g, code.b, 255]);
        }
        Ok(())
    }
}
