//! Debug panels
//!
//! Collects panel output from [`DebugPanel`](crate::entity::DebugPanel)
//! entities and executes text, scissor, window and raw GPU commands. Being the
//! last built-in layer, it is also where window requests from other layers
//! end up.

use void_core::FrameTime;
use void_render::{execute_command, CommandList, CommandType, CommandTypeSet};

use crate::entity::Capabilities;
use crate::env::RenderEnv;
use crate::layer::{Layer, LayerBase, LayerError};

#[derive(Debug)]
pub struct DebugPanelLayer {
    base: LayerBase,
}

impl DebugPanelLayer {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            base: LayerBase::new(name, priority),
        }
    }
}

impl Default for DebugPanelLayer {
    fn default() -> Self {
        Self::new("debug_panels", super::priority::DEBUG_PANEL)
    }
}

impl Layer for DebugPanelLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn supported_commands(&self) -> CommandTypeSet {
        CommandTypeSet::of(&[
            CommandType::DrawText,
            CommandType::Scissor,
            CommandType::Window,
            CommandType::GpuCommand,
        ])
    }

    fn accepts(&self, capabilities: Capabilities) -> bool {
        capabilities.contains(Capabilities::DEBUG_PANEL)
    }

    fn collect_render_commands(
        &mut self,
        _frame: &FrameTime,
        out: &mut CommandList,
    ) -> Result<(), LayerError> {
        let (mut processed, mut skipped) = (0, 0);
        for entity in self.base.entities() {
            let mut entity = entity.write();
            if !entity.is_enabled() {
                skipped += 1;
                continue;
            }
            match entity.as_debug_panel_mut() {
                Some(panel) => {
                    panel.build_panel(out);
                    processed += 1;
                }
                None => skipped += 1,
            }
        }
        self.base.processed(processed);
        self.base.skipped(skipped);
        Ok(())
    }

    fn process_render_commands(
        &mut self,
        commands: &CommandList,
        env: &mut RenderEnv<'_>,
    ) -> Result<(), LayerError> {
        for command in commands {
            execute_command(env.gfx, command);
        }
        // panels must not leak a scissor rect into the next frame
        if commands.count_of(CommandType::Scissor) > 0 {
            env.gfx.set_scissor(None);
        }
        Ok(())
    }
}
