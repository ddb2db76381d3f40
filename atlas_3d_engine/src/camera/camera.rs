/// Camera: position plus view and projection matrices.
///
/// The engine does not store or drive cameras. Techniques read the camera's
/// position (for distance keys) and its combined matrix (for the frustum).

use glam::{Mat4, Vec3};
use super::frustum::Frustum;

#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl Camera {
    /// Create a camera from explicit matrices
    pub fn new(position: Vec3, view: Mat4, projection: Mat4) -> Self {
        Self {
            position,
            view_matrix: view,
            projection_matrix: projection,
        }
    }

    /// Right-handed perspective camera at `position` looking at `target`
    pub fn perspective(
        position: Vec3,
        target: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self::new(
            position,
            Mat4::look_at_rh(position, target, Vec3::Y),
            Mat4::perspective_rh(fov_y, aspect, near, far),
        )
    }

    // ===== GETTERS =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined matrix (projection * view)
    pub fn matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Frustum of the combined matrix
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.matrix())
    }

    /// Vector from the camera to `point`
    pub fn distance(&self, point: Vec3) -> Vec3 {
        point - self.position
    }

    // ===== SETTERS =====

    /// Move the camera, keeping its orientation
    pub fn set_position(&mut self, position: Vec3) {
        let delta = position - self.position;
        self.position = position;
        self.view_matrix *= Mat4::from_translation(-delta);
    }

    /// Re-aim the camera at `target` from its current position
    pub fn look_at(&mut self, target: Vec3) {
        self.view_matrix = Mat4::look_at_rh(self.position, target, Vec3::Y);
    }

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
