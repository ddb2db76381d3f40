/// Render commands.
///
/// A [`RenderCommand`] belongs to one renderer and records an ordered list of
/// [`SubCommand`]s. Caches append sub-commands (shader variables, draws) while
/// rendering; the renderer runs them on [`Renderer::submit`]. A render command
/// is itself a sub-command, so a render node's private command can be nested
/// in the command it was rendered for.

use std::sync::{Arc, Mutex, Weak};
use crate::buffer::{HardwareBuffer, RenderHdwBuffer};
use crate::error::Result;
use crate::utils::lock;
use crate::{engine_bail, engine_err};
use super::renderer::{Renderer, RendererId};

/// One recorded step of a render command
pub trait SubCommand: Send + Sync {
    /// Short description, used in logs and for inspection
    fn label(&self) -> String;

    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    fn execute(&self) -> Result<()>;

    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

pub trait RenderCommand: SubCommand {
    /// Identity of the renderer this command was created by
    fn renderer_id(&self) -> RendererId;

    /// The renderer itself
    ///
    /// # Errors
    ///
    /// `NullReference` if the renderer has been dropped.
    fn renderer(&self) -> Result<Arc<Renderer>>;

    fn add_sub_command(&self, command: Arc<dyn SubCommand>);

    /// Snapshot of the recorded sub-commands
    fn sub_commands(&self) -> Vec<Arc<dyn SubCommand>>;

    fn sub_commands_count(&self) -> usize {
        self.sub_commands().len()
    }

    /// Forget every recorded sub-command
    fn clear(&self);

    fn into_sub_command(self: Arc<Self>) -> Arc<dyn SubCommand>;
}

// ===== STANDARD COMMAND =====

/// Default command: records sub-commands and runs them in order
pub struct StandardCommand {
    renderer_id: RendererId,
    renderer: Weak<Renderer>,
    sub_commands: Mutex<Vec<Arc<dyn SubCommand>>>,
}

impl StandardCommand {
    pub fn new(renderer_id: RendererId, renderer: Weak<Renderer>) -> Self {
        Self {
            renderer_id,
            renderer,
            sub_commands: Mutex::new(Vec::new()),
        }
    }
}

impl SubCommand for StandardCommand {
    fn label(&self) -> String {
        format!("RenderCommand[{}]", self.sub_commands_count())
    }

    /// Run prepare / execute / finish over every sub-command, in order
    fn execute(&self) -> Result<()> {
        let sub_commands = self.sub_commands();
        for command in &sub_commands {
            command.prepare()?;
        }
        for command in &sub_commands {
            command.execute()?;
        }
        for command in &sub_commands {
            command.finish()?;
        }
        Ok(())
    }
}

impl RenderCommand for StandardCommand {
    fn renderer_id(&self) -> RendererId {
        self.renderer_id
    }

    fn renderer(&self) -> Result<Arc<Renderer>> {
        self.renderer.upgrade().ok_or_else(|| {
            engine_err!("atlas3d::RenderCommand", NullReference,
                "Renderer {} was dropped", self.renderer_id)
        })
    }

    fn add_sub_command(&self, command: Arc<dyn SubCommand>) {
        lock(&self.sub_commands).push(command);
    }

    fn sub_commands(&self) -> Vec<Arc<dyn SubCommand>> {
        lock(&self.sub_commands).clone()
    }

    fn sub_commands_count(&self) -> usize {
        lock(&self.sub_commands).len()
    }

    fn clear(&self) {
        lock(&self.sub_commands).clear();
    }

    fn into_sub_command(self: Arc<Self>) -> Arc<dyn SubCommand> {
        self
    }
}

// ===== SHADER VARIABLE =====

/// Named uniform value, as raw bytes
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderVariableCommand {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ShaderVariableCommand {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

impl SubCommand for ShaderVariableCommand {
    fn label(&self) -> String {
        format!("ShaderVariable({})", self.name)
    }

    fn execute(&self) -> Result<()> {
        Ok(())
    }
}

// ===== DRAW =====

/// Draw of a vertex buffer, optionally indexed
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub vertex_buffer: Arc<RenderHdwBuffer>,
    pub index_buffer: Option<Arc<RenderHdwBuffer>>,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl SubCommand for DrawCommand {
    fn label(&self) -> String {
        match &self.index_buffer {
            Some(_) => format!("DrawIndexed({} indices)", self.index_count),
            None => format!("Draw({} vertices)", self.vertex_count),
        }
    }

    fn execute(&self) -> Result<()> {
        if self.vertex_buffer.is_empty() {
            engine_bail!("atlas3d::DrawCommand", NullReference,
                "Vertex buffer #{} is empty", self.vertex_buffer.index());
        }
        if let Some(index_buffer) = &self.index_buffer {
            if index_buffer.is_empty() && self.index_count > 0 {
                engine_bail!("atlas3d::DrawCommand", NullReference,
                    "Index buffer #{} is empty", index_buffer.index());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
