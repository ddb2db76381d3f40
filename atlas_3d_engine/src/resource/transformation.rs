/// Model matrix holder.
///
/// Every mutation marks the caches of all renderers stale; a
/// [`TransformationCache`] emits the matrix as the `transformation.model`
/// shader variable.

use std::sync::{Arc, Mutex, RwLock, Weak};
use glam::{Mat4, Quat, Vec3};
use crate::cache::{CachedRenderable, PerConsumerCache, RenderCache};
use crate::error::Result;
use crate::renderer::{RenderCommand, Renderable, Renderer, RendererId, ShaderVariableCommand};
use crate::utils::{lock, read, write};
use crate::engine_err;

/// Shader variable receiving the model matrix
pub const MODEL_MATRIX_VARIABLE: &str = "transformation.model";

pub struct Transformation {
    matrix: RwLock<Mat4>,
    caches: PerConsumerCache,
    self_ref: Weak<Transformation>,
}

impl Transformation {
    /// Identity transformation
    pub fn new() -> Arc<Self> {
        Self::from_matrix(Mat4::IDENTITY)
    }

    pub fn from_matrix(matrix: Mat4) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            matrix: RwLock::new(matrix),
            caches: PerConsumerCache::new(),
            self_ref: self_ref.clone(),
        })
    }

    pub fn matrix(&self) -> Mat4 {
        *read(&self.matrix)
    }

    pub fn set_matrix(&self, matrix: Mat4) {
        self.modify(|m| *m = matrix);
    }

    /// Translation part of the matrix
    pub fn position(&self) -> Vec3 {
        read(&self.matrix).w_axis.truncate()
    }

    pub fn set_position(&self, position: Vec3) {
        self.modify(|m| m.w_axis = position.extend(1.0));
    }

    /// Move by `offset`, in world space
    pub fn translate(&self, offset: Vec3) {
        self.modify(|m| *m = Mat4::from_translation(offset) * *m);
    }

    /// Scale along the local axes
    pub fn scale(&self, factors: Vec3) {
        self.modify(|m| *m = *m * Mat4::from_scale(factors));
    }

    /// Rotate around the local origin
    pub fn rotate(&self, rotation: Quat) {
        self.modify(|m| *m = *m * Mat4::from_quat(rotation));
    }

    /// Orient the local -Z axis toward `target`, keeping the position
    pub fn look_at(&self, target: Vec3, up: Vec3) {
        self.modify(|m| {
            let position = m.w_axis.truncate();
            if position != target {
                *m = Mat4::look_at_rh(position, target, up).inverse();
            }
        });
    }

    fn modify(&self, f: impl FnOnce(&mut Mat4)) {
        f(&mut write(&self.matrix));
        self.touch_caches();
    }
}

impl CachedRenderable for Transformation {
    const CACHE_KIND: &'static str = "Transformation";

    fn caches(&self) -> &PerConsumerCache {
        &self.caches
    }

    fn make_new_cache(&self, renderer: &Renderer) -> Result<Arc<dyn RenderCache>> {
        let this = self.self_ref.upgrade().ok_or_else(|| {
            engine_err!("atlas3d::Transformation", NullReference, "Transformation is being dropped")
        })?;
        renderer.new_cache(&this)
    }
}

impl Renderable for Transformation {
    fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        self.render_cached(command)
    }

    fn build(&self, renderer: &Renderer) -> Result<()> {
        self.build_cache(renderer).map(|_| ())
    }

    fn size(&self, renderer: &Renderer) -> usize {
        self.cached_size(renderer.id())
    }
}

impl std::fmt::Debug for Transformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformation")
            .field("matrix", &self.matrix())
            .finish()
    }
}

// ===== TRANSFORMATION CACHE =====

pub struct TransformationCache {
    renderer: RendererId,
    transformation: Weak<Transformation>,
    command: Mutex<Option<Arc<ShaderVariableCommand>>>,
}

impl TransformationCache {
    pub fn new(transformation: &Arc<Transformation>, renderer: RendererId) -> Self {
        Self {
            renderer,
            transformation: Arc::downgrade(transformation),
            command: Mutex::new(None),
        }
    }
}

impl RenderCache for TransformationCache {
    fn renderer(&self) -> RendererId {
        self.renderer
    }

    fn build(&self, _renderer: &Renderer) -> Result<()> {
        let transformation = self.transformation.upgrade().ok_or_else(|| {
            engine_err!("atlas3d::TransformationCache", NullReference, "Transformation was dropped")
        })?;
        let matrix = transformation.matrix();
        *lock(&self.command) = Some(Arc::new(ShaderVariableCommand::new(
            MODEL_MATRIX_VARIABLE,
            bytemuck::bytes_of(&matrix).to_vec(),
        )));
        Ok(())
    }

    fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        let variable = lock(&self.command).clone().ok_or_else(|| {
            engine_err!("atlas3d::TransformationCache", NullReference,
                "Transformation cache of renderer {} was never built", self.renderer)
        })?;
        command.add_sub_command(variable);
        Ok(())
    }
}

#[cfg(test)]
#[path = "transformation_tests.rs"]
mod tests;
