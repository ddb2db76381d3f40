/// Drawables attached to render nodes.
///
/// [`Drawable`] tags each attached renderable with its kind, so a node can
/// be asked for "its material" without runtime type identification. Custom
/// renderables go through [`Drawable::Custom`] and are never matched by an
/// aspect lookup.

use std::sync::{Arc, Weak};
use crate::renderer::Renderable;
use crate::resource::{Material, Mesh, Transformation};

#[derive(Clone)]
pub enum Drawable {
    Material(Arc<Material>),
    Transformation(Arc<Transformation>),
    Mesh(Arc<Mesh>),
    Custom(Arc<dyn Renderable>),
}

impl Drawable {
    /// Shared renderable handle
    pub fn renderable(&self) -> Arc<dyn Renderable> {
        match self {
            Drawable::Material(material) => material.clone(),
            Drawable::Transformation(transformation) => transformation.clone(),
            Drawable::Mesh(mesh) => mesh.clone(),
            Drawable::Custom(renderable) => renderable.clone(),
        }
    }

    pub fn as_renderable(&self) -> &dyn Renderable {
        match self {
            Drawable::Material(material) => material.as_ref(),
            Drawable::Transformation(transformation) => transformation.as_ref(),
            Drawable::Mesh(mesh) => mesh.as_ref(),
            Drawable::Custom(renderable) => renderable.as_ref(),
        }
    }

    pub fn downgrade(&self) -> Weak<dyn Renderable> {
        Arc::downgrade(&self.renderable())
    }

    /// True if both drawables hold the same object
    pub fn ptr_eq(&self, other: &Drawable) -> bool {
        std::ptr::addr_eq(
            self.as_renderable() as *const dyn Renderable,
            other.as_renderable() as *const dyn Renderable,
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Drawable::Material(_) => "Material",
            Drawable::Transformation(_) => "Transformation",
            Drawable::Mesh(_) => "Mesh",
            Drawable::Custom(_) => "Custom",
        }
    }
}

impl std::fmt::Debug for Drawable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Drawable::Material(material) => std::fmt::Debug::fmt(material, f),
            Drawable::Transformation(transformation) => std::fmt::Debug::fmt(transformation, f),
            Drawable::Mesh(mesh) => std::fmt::Debug::fmt(mesh, f),
            Drawable::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl From<Arc<Material>> for Drawable {
    fn from(material: Arc<Material>) -> Self {
        Drawable::Material(material)
    }
}

impl From<Arc<Transformation>> for Drawable {
    fn from(transformation: Arc<Transformation>) -> Self {
        Drawable::Transformation(transformation)
    }
}

impl From<Arc<Mesh>> for Drawable {
    fn from(mesh: Arc<Mesh>) -> Self {
        Drawable::Mesh(mesh)
    }
}

impl From<Arc<dyn Renderable>> for Drawable {
    fn from(renderable: Arc<dyn Renderable>) -> Self {
        Drawable::Custom(renderable)
    }
}

/// Kind of drawable a render node can be searched for
pub trait DrawableAspect: Sized {
    fn from_drawable(drawable: &Drawable) -> Option<Arc<Self>>;
}

impl DrawableAspect for Material {
    fn from_drawable(drawable: &Drawable) -> Option<Arc<Self>> {
        match drawable {
            Drawable::Material(material) => Some(material.clone()),
            _ => None,
        }
    }
}

impl DrawableAspect for Transformation {
    fn from_drawable(drawable: &Drawable) -> Option<Arc<Self>> {
        match drawable {
            Drawable::Transformation(transformation) => Some(transformation.clone()),
            _ => None,
        }
    }
}

impl DrawableAspect for Mesh {
    fn from_drawable(drawable: &Drawable) -> Option<Arc<Self>> {
        match drawable {
            Drawable::Mesh(mesh) => Some(mesh.clone()),
            _ => None,
        }
    }
}
