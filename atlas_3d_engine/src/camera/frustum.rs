/// Frustum: six clipping planes used for visibility culling.
///
/// Each plane is a Vec4 (A, B, C, D) where (A, B, C) is the inward-pointing
/// unit normal. A point P is inside when dot(plane, P_homogeneous) >= 0 for
/// all planes.

use glam::{Mat4, Vec3, Vec4};
use super::aabb::AABB;

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the planes of a combined projection * view matrix.
    ///
    /// Gribb & Hartmann method, valid for perspective and orthographic
    /// projections. Planes are normalized.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [
            row3 + row0, // left
            row3 - row0, // right
            row3 + row1, // bottom
            row3 - row1, // top
            row3 + row2, // near
            row3 - row2, // far
        ];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Signed distance from `point` to plane `index` (positive inside)
    pub fn distance_to_plane(&self, index: usize, point: Vec3) -> f32 {
        let plane = self.planes[index];
        plane.truncate().dot(point) + plane.w
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..6).all(|i| self.distance_to_plane(i, point) >= 0.0)
    }

    /// Test if an AABB is inside or intersecting this frustum.
    ///
    /// "Positive vertex" test: for each plane, the corner furthest along the
    /// normal is checked; if it is outside, the whole box is outside.
    /// Conservative: may report boxes near frustum corners as intersecting.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let p_vertex = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(p_vertex) + plane.w >= 0.0
        })
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
