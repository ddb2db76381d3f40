//! Renderer module: the consumer identity, its render commands and the
//! `Renderable` trait implemented by everything a render node can draw.

pub mod command;
pub mod renderable;
pub mod renderer;

#[cfg(test)]
pub(crate) mod mock_renderable;

pub use command::{DrawCommand, RenderCommand, ShaderVariableCommand, StandardCommand, SubCommand};
pub use renderable::Renderable;
pub use renderer::{CommandFactory, Renderer, RendererDesc, RendererId, STANDARD_COMMAND};
