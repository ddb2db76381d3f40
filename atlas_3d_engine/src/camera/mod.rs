//! Camera module: camera, frustum and axis-aligned bounding boxes.
//!
//! Cameras are passive values owned by the caller. Techniques only read the
//! camera's position and combined matrix.

mod aabb;
mod camera;
mod frustum;

pub use aabb::AABB;
pub use camera::Camera;
pub use frustum::{
    Frustum,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
