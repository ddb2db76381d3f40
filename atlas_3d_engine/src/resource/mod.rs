//! Renderable domain objects.
//!
//! Materials, transformations and meshes are renderer-agnostic. Each keeps one
//! cache per renderer (see [`crate::cache`]) holding the commands and GPU
//! buffers derived from its current state.

mod material;
mod mesh;
mod transformation;

pub use material::{Material, MaterialCache, MaterialElement, MaterialValues};
pub use mesh::{Mesh, MeshCache};
pub use transformation::{Transformation, TransformationCache, MODEL_MATRIX_VARIABLE};
