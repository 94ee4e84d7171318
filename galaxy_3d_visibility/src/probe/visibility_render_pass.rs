/// Visibility render pass
///
/// The two-pass probe render of one cycle.
///
/// 1. Opaque pass: render the probe scene (opaque group only) into the
///    fixed-size off-screen target, read it back, submit to the decoder.
/// 2. Transparent pass: add the transparent group, render again so
///    transparent boxes are depth-tested against the opaque ones, read
///    back, submit, then take the transparent group out again.
///
/// The target resolution is independent of the window: a box smaller
/// than one probe texel may be missed.

use std::sync::Arc;
use crate::decode::{DecodeRequest, DecodeTicket, PassKind, PixelDecoder};
use crate::engine_debug;
use crate::error::{Error, Result};
use super::probe_camera::ProbeCamera;
use super::probe_renderer::{ProbeRenderer, ProbeTarget, RenderableGroup};
use super::probe_scene::ProbeScene;

const SOURCE: &str = "galaxy3d::VisibilityRenderPass";

/// Buffers kept around for reuse: one per pass of a cycle.
const SPARE_BUFFERS: usize = 2;

/// Progress of the render pass within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStage {
    /// No cycle submitted
    Idle,
    /// Opaque buffer submitted, transparent not yet rendered
    AwaitingOpaqueDecode,
    /// Both buffers submitted
    AwaitingTransparentDecode,
}

pub struct VisibilityRenderPass {
    width: u32,
    height: u32,
    render_debug_frame: bool,
    stage: PassStage,
    spare_buffers: Vec<Vec<u8>>,
}

impl VisibilityRenderPass {
    /// # Errors
    ///
    /// `InvalidResource` if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidResource(format!(
                "Probe target must not be empty ({}x{})", width, height
            )));
        }
        Ok(Self {
            width,
            height,
            render_debug_frame: false,
            stage: PassStage::Idle,
            spare_buffers: Vec::with_capacity(SPARE_BUFFERS),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of one read-back buffer in bytes
    pub fn buffer_size(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    pub fn target(&self) -> ProbeTarget {
        ProbeTarget::Offscreen { width: self.width, height: self.height }
    }

    pub fn stage(&self) -> PassStage {
        self.stage
    }

    pub fn set_render_debug_frame(&mut self, enabled: bool) {
        self.render_debug_frame = enabled;
    }

    pub fn render_debug_frame(&self) -> bool {
        self.render_debug_frame
    }

    /// Render, read back and submit both passes of one cycle.
    ///
    /// `transparent` is added to `scene` for the second pass and always
    /// removed before returning, error or not.
    pub fn run_cycle(
        &mut self,
        renderer: &mut dyn ProbeRenderer,
        scene: &mut ProbeScene,
        transparent: Option<&Arc<dyn RenderableGroup>>,
        decoder: &mut PixelDecoder,
        generation: u64,
        cycle: u64,
    ) -> Result<()> {
        let camera = renderer.active_camera()?;

        self.run_pass(renderer, scene, &camera, decoder, DecodeTicket {
            generation,
            cycle,
            pass: PassKind::Opaque,
        })?;
        self.stage = PassStage::AwaitingOpaqueDecode;

        let transparent_key = transparent.map(|group| scene.add(Arc::clone(group)));
        let result = self
            .run_pass(renderer, scene, &camera, decoder, DecodeTicket {
                generation,
                cycle,
                pass: PassKind::Transparent,
            })
            .and_then(|()| {
                if self.render_debug_frame {
                    renderer.render(scene, &camera, ProbeTarget::Screen)?;
                }
                Ok(())
            });
        if let Some(key) = transparent_key {
            scene.remove(key);
        }
        result?;

        self.stage = PassStage::AwaitingTransparentDecode;
        engine_debug!(SOURCE, "Cycle {} submitted ({}x{} probe)", cycle, self.width, self.height);
        Ok(())
    }

    fn run_pass(
        &mut self,
        renderer: &mut dyn ProbeRenderer,
        scene: &ProbeScene,
        camera: &ProbeCamera,
        decoder: &mut PixelDecoder,
        ticket: DecodeTicket,
    ) -> Result<()> {
        renderer.render(scene, camera, self.target())?;

        let mut pixels = self.take_buffer();
        if let Err(e) = renderer.read_pixels(self.width, self.height, &mut pixels) {
            self.recycle(pixels);
            return Err(e);
        }

        decoder.submit(DecodeRequest { ticket, pixels })
    }

    fn take_buffer(&mut self) -> Vec<u8> {
        self.spare_buffers
            .pop()
            .unwrap_or_else(|| vec![0u8; self.buffer_size()])
    }

    /// Hand a buffer back after its decode result has been consumed.
    ///
    /// Buffers of the wrong size (e.g. from before a resize) are dropped.
    pub fn recycle(&mut self, pixels: Vec<u8>) {
        if pixels.len() == self.buffer_size() && self.spare_buffers.len() < SPARE_BUFFERS {
            self.spare_buffers.push(pixels);
        }
    }

    /// Number of buffers waiting for reuse
    pub fn spare_buffer_count(&self) -> usize {
        self.spare_buffers.len()
    }

    /// Mark the submitted cycle as fully consumed (or abandoned).
    pub fn finish_cycle(&mut self) {
        self.stage = PassStage::Idle;
    }
}

#[cfg(test)]
#[path = "visibility_render_pass_tests.rs"]
mod tests;
