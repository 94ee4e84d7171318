//! Probe rendering module
//!
//! Color-coded bounding-box geometry, the off-screen probe scene, the
//! rendering-engine seams and the two-pass visibility render.

mod probe_camera;
mod instance_batch;
mod probe_renderer;
mod probe_scene;
mod visibility_render_pass;

pub use probe_camera::ProbeCamera;
pub use instance_batch::{InstanceBatch, ProbeInstance, RenderGroup};
pub use probe_renderer::{ProbeRenderer, ProbeTarget, RenderableGroup};
pub use probe_scene::{GroupKey, ProbeScene};
pub use visibility_render_pass::{PassStage, VisibilityRenderPass};

// Mock renderer for tests (no GPU required)
#[cfg(test)]
pub(crate) mod mock_probe_renderer;
