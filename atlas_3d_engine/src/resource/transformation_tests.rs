//! Unit tests for transformation.rs

use glam::{Mat4, Quat, Vec3};
use crate::cache::CachedRenderable;
use crate::renderer::mock_renderable::{create_renderer, labels};
use crate::renderer::Renderable;
use super::Transformation;

fn approx_eq(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-5
}

#[test]
fn test_new_is_identity() {
    let transformation = Transformation::new();
    assert_eq!(transformation.matrix(), Mat4::IDENTITY);
    assert_eq!(transformation.position(), Vec3::ZERO);
}

#[test]
fn test_position_and_translate() {
    let transformation = Transformation::new();
    transformation.set_position(Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(transformation.position(), Vec3::new(1.0, 2.0, 3.0));

    transformation.translate(Vec3::new(1.0, 0.0, -1.0));
    assert_eq!(transformation.position(), Vec3::new(2.0, 2.0, 2.0));
}

#[test]
fn test_scale_keeps_position() {
    let transformation = Transformation::new();
    transformation.set_position(Vec3::X);
    transformation.scale(Vec3::splat(2.0));

    assert_eq!(transformation.position(), Vec3::X);
    let point = transformation.matrix().transform_point3(Vec3::Y);
    assert!(approx_eq(point, Vec3::new(1.0, 2.0, 0.0)));
}

#[test]
fn test_rotate() {
    let transformation = Transformation::new();
    transformation.rotate(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));

    let forward = transformation.matrix().transform_vector3(Vec3::NEG_Z);
    assert!(approx_eq(forward, Vec3::NEG_X));
}

#[test]
fn test_look_at() {
    let transformation = Transformation::new();
    transformation.set_position(Vec3::new(0.0, 0.0, 5.0));
    transformation.look_at(Vec3::new(5.0, 0.0, 5.0), Vec3::Y);

    let forward = transformation.matrix().transform_vector3(Vec3::NEG_Z);
    assert!(approx_eq(forward, Vec3::X));
    assert!(approx_eq(transformation.position(), Vec3::new(0.0, 0.0, 5.0)));
}

#[test]
fn test_mutation_touches_caches() {
    let renderer = create_renderer();
    let transformation = Transformation::new();
    transformation.build(&renderer).unwrap();

    transformation.translate(Vec3::X);
    assert!(transformation.is_any_cache_touched());
}

#[test]
fn test_render_emits_model_matrix() {
    let renderer = create_renderer();
    let transformation = Transformation::new();
    let command = renderer.new_command().unwrap();

    transformation.render(command.as_ref()).unwrap();

    assert_eq!(
        labels(command.as_ref()),
        vec!["ShaderVariable(transformation.model)"]
    );
    assert_eq!(transformation.size(&renderer), 0);
}
