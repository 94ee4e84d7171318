/// ProbeCamera
///
/// Passive camera snapshot used for one visibility cycle.
///
/// Computes nothing beyond the combined matrix. The rendering engine
/// hands out its active camera through `ProbeRenderer::active_camera()`
/// and receives the same snapshot back for both passes of the cycle, so
/// a camera move between passes cannot split a cycle across two views.

use glam::Mat4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeCamera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl ProbeCamera {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
        }
    }

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }
}

impl Default for ProbeCamera {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}
