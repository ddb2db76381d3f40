use glam::{Mat4, Vec3};
use super::*;
use crate::camera::AABB;

fn default_camera() -> Camera {
    Camera::perspective(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        std::f32::consts::FRAC_PI_4,
        1.0,
        0.1,
        100.0,
    )
}

#[test]
fn test_matrix_is_projection_times_view() {
    let camera = default_camera();
    let expected = *camera.projection_matrix() * *camera.view_matrix();
    assert_eq!(camera.matrix(), expected);
}

#[test]
fn test_distance_vector() {
    let camera = default_camera();
    let d = camera.distance(Vec3::new(0.0, 0.0, -5.0));
    assert_eq!(d, Vec3::new(0.0, 0.0, -10.0));
    assert!((d.length() - 10.0).abs() < 1e-6);
}

#[test]
fn test_frustum_sees_target() {
    let camera = default_camera();
    let frustum = camera.frustum();
    assert!(frustum.intersects_aabb(&AABB::from_center(Vec3::ZERO, Vec3::splat(0.5))));
    assert!(!frustum.intersects_aabb(&AABB::from_center(Vec3::new(0.0, 0.0, 20.0), Vec3::splat(0.5))));
}

#[test]
fn test_set_position_keeps_orientation() {
    let mut camera = default_camera();
    camera.set_position(Vec3::new(0.0, 0.0, 10.0));
    assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 10.0));

    let expected = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 5.0), Vec3::Y);
    assert!(camera.view_matrix().abs_diff_eq(expected, 1e-5));
}

#[test]
fn test_look_at_changes_view() {
    let mut camera = default_camera();
    let before = *camera.view_matrix();
    camera.look_at(Vec3::new(5.0, 0.0, 0.0));
    assert_ne!(before, *camera.view_matrix());
}
