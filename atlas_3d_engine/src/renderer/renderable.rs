/// Anything that can be rendered into a [`RenderCommand`] on behalf of a
/// [`Renderer`].

use crate::error::Result;
use super::command::RenderCommand;
use super::renderer::Renderer;

pub trait Renderable: Send + Sync {
    /// Record this object into `command`
    fn render(&self, command: &dyn RenderCommand) -> Result<()>;

    /// Prepare the per-renderer state this object needs (caches, GPU buffers).
    /// Rendering builds lazily, so calling this is optional.
    fn build(&self, _renderer: &Renderer) -> Result<()> {
        Ok(())
    }

    /// Bytes of renderer-side state held for `renderer`
    fn size(&self, _renderer: &Renderer) -> usize {
        0
    }
}
