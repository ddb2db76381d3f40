/// Surface description: four colors and a shininess factor.
///
/// Every setter marks the caches of all renderers stale. A [`MaterialCache`]
/// snapshots the values at build time and emits one shader variable per
/// element when rendered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use glam::Vec4;
use crate::cache::{CachedRenderable, PerConsumerCache, RenderCache};
use crate::error::Result;
use crate::renderer::{RenderCommand, Renderable, Renderer, RendererId, ShaderVariableCommand};
use crate::utils::{lock, read, write};
use crate::engine_err;

// ===== ELEMENTS =====

/// Material element, bound to a named shader variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialElement {
    Ambient,
    Diffuse,
    Specular,
    Emissive,
    Shininess,
}

impl MaterialElement {
    pub const ALL: [MaterialElement; 5] = [
        MaterialElement::Ambient,
        MaterialElement::Diffuse,
        MaterialElement::Specular,
        MaterialElement::Emissive,
        MaterialElement::Shininess,
    ];

    /// Name of the shader variable the element is bound to
    pub fn variable_name(&self) -> &'static str {
        match self {
            MaterialElement::Ambient => "material.ambient",
            MaterialElement::Diffuse => "material.diffuse",
            MaterialElement::Specular => "material.specular",
            MaterialElement::Emissive => "material.emissive",
            MaterialElement::Shininess => "material.shininess",
        }
    }
}

/// Snapshot of a material's values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialValues {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub emissive: Vec4,
    pub shininess: f32,
}

impl Default for MaterialValues {
    fn default() -> Self {
        Self {
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            emissive: Vec4::new(0.0, 0.0, 0.0, 1.0),
            shininess: 0.0,
        }
    }
}

impl MaterialValues {
    /// Raw bytes of one element
    pub fn bytes_of(&self, element: MaterialElement) -> Vec<u8> {
        match element {
            MaterialElement::Ambient => bytemuck::bytes_of(&self.ambient).to_vec(),
            MaterialElement::Diffuse => bytemuck::bytes_of(&self.diffuse).to_vec(),
            MaterialElement::Specular => bytemuck::bytes_of(&self.specular).to_vec(),
            MaterialElement::Emissive => bytemuck::bytes_of(&self.emissive).to_vec(),
            MaterialElement::Shininess => bytemuck::bytes_of(&self.shininess).to_vec(),
        }
    }

    /// True if any color has an alpha below 1
    pub fn has_transparent_color(&self) -> bool {
        [self.ambient, self.diffuse, self.specular, self.emissive]
            .iter()
            .any(|color| color.w < 1.0)
    }
}

// ===== MATERIAL =====

pub struct Material {
    name: String,
    values: RwLock<MaterialValues>,
    forced_transparent: AtomicBool,
    caches: PerConsumerCache,
    self_ref: Weak<Material>,
}

impl Material {
    /// Create a material with default (opaque grey) values
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_values(name, MaterialValues::default())
    }

    pub fn with_values(name: impl Into<String>, values: MaterialValues) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|self_ref| Self {
            name,
            values: RwLock::new(values),
            forced_transparent: AtomicBool::new(false),
            caches: PerConsumerCache::new(),
            self_ref: self_ref.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> MaterialValues {
        *read(&self.values)
    }

    pub fn ambient(&self) -> Vec4 {
        read(&self.values).ambient
    }

    pub fn diffuse(&self) -> Vec4 {
        read(&self.values).diffuse
    }

    pub fn specular(&self) -> Vec4 {
        read(&self.values).specular
    }

    pub fn emissive(&self) -> Vec4 {
        read(&self.values).emissive
    }

    pub fn shininess(&self) -> f32 {
        read(&self.values).shininess
    }

    pub fn set_ambient(&self, color: Vec4) {
        self.modify(|values| values.ambient = color);
    }

    pub fn set_diffuse(&self, color: Vec4) {
        self.modify(|values| values.diffuse = color);
    }

    pub fn set_specular(&self, color: Vec4) {
        self.modify(|values| values.specular = color);
    }

    pub fn set_emissive(&self, color: Vec4) {
        self.modify(|values| values.emissive = color);
    }

    pub fn set_shininess(&self, shininess: f32) {
        self.modify(|values| values.shininess = shininess);
    }

    /// Replace every value at once
    pub fn set_values(&self, values: MaterialValues) {
        self.modify(|current| *current = values);
    }

    /// Transparent if forced, or if any color has an alpha below 1
    pub fn is_transparent(&self) -> bool {
        self.forced_transparent.load(Ordering::Acquire) || read(&self.values).has_transparent_color()
    }

    /// Force transparency regardless of the colors' alpha
    pub fn set_transparent(&self, transparent: bool) {
        self.forced_transparent.store(transparent, Ordering::Release);
    }

    fn modify(&self, f: impl FnOnce(&mut MaterialValues)) {
        f(&mut write(&self.values));
        self.touch_caches();
    }
}

impl CachedRenderable for Material {
    const CACHE_KIND: &'static str = "Material";

    fn caches(&self) -> &PerConsumerCache {
        &self.caches
    }

    fn make_new_cache(&self, renderer: &Renderer) -> Result<Arc<dyn RenderCache>> {
        let this = self.self_ref.upgrade().ok_or_else(|| {
            engine_err!("atlas3d::Material", NullReference,
                "Material '{}' is being dropped", self.name)
        })?;
        renderer.new_cache(&this)
    }
}

impl Renderable for Material {
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

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("values", &self.values())
            .field("transparent", &self.is_transparent())
            .finish()
    }
}

// ===== MATERIAL CACHE =====

/// Shader variables of one material for one renderer
pub struct MaterialCache {
    renderer: RendererId,
    material: Weak<Material>,
    commands: Mutex<Vec<Arc<ShaderVariableCommand>>>,
}

impl MaterialCache {
    pub fn new(material: &Arc<Material>, renderer: RendererId) -> Self {
        Self {
            renderer,
            material: Arc::downgrade(material),
            commands: Mutex::new(Vec::new()),
        }
    }
}

impl RenderCache for MaterialCache {
    fn renderer(&self) -> RendererId {
        self.renderer
    }

    fn build(&self, _renderer: &Renderer) -> Result<()> {
        let material = self.material.upgrade().ok_or_else(|| {
            engine_err!("atlas3d::MaterialCache", NullReference, "Material was dropped")
        })?;
        let values = material.values();

        *lock(&self.commands) = MaterialElement::ALL
            .iter()
            .map(|element| {
                Arc::new(ShaderVariableCommand::new(
                    element.variable_name(),
                    values.bytes_of(*element),
                ))
            })
            .collect();
        Ok(())
    }

    fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        let commands = lock(&self.commands).clone();
        for variable in commands {
            command.add_sub_command(variable);
        }
        Ok(())
    }

    fn size(&self) -> usize {
        lock(&self.commands).iter().map(|c| c.bytes.len()).sum()
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
