//! Screen-space sprites
//!
//! Collects commands from [`Renderable2D`](crate::entity::Renderable2D)
//! entities and executes the textured-quad subset in collection order with
//! depth testing off and an orthographic pixel projection.

use glam::Mat4;
use void_core::FrameTime;
use void_render::{
    execute_command, CommandList, CommandType, CommandTypeSet, CompareFunction,
    DepthStatePayload, UniformValue,
};

use crate::entity::Capabilities;
use crate::env::RenderEnv;
use crate::layer::{Layer, LayerBase, LayerError};

/// Program used for sprite quads
pub const SPRITE_SHADER: &str = "sprite";

#[derive(Debug)]
pub struct SpriteLayer {
    base: LayerBase,
}

impl SpriteLayer {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            base: LayerBase::new(name, priority),
        }
    }
}

impl Default for SpriteLayer {
    fn default() -> Self {
        Self::new("sprites", super::priority::SPRITE)
    }
}

impl Layer for SpriteLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn supported_commands(&self) -> CommandTypeSet {
        CommandTypeSet::of(&[
            CommandType::DrawTexture,
            CommandType::UseShader,
            CommandType::SetUniforms,
        ])
    }

    fn accepts(&self, capabilities: Capabilities) -> bool {
        capabilities.contains(Capabilities::RENDERABLE_2D)
    }

    fn collect_render_commands(
        &mut self,
        _frame: &FrameTime,
        out: &mut CommandList,
    ) -> Result<(), LayerError> {
        let (mut processed, mut skipped) = (0, 0);
        for entity in self.base.entities() {
            let entity = entity.read();
            match entity.as_renderable_2d() {
                Some(sprite) if entity.is_enabled() => {
                    sprite.collect_render_commands(out);
                    processed += 1;
                }
                _ => skipped += 1,
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
        if commands.is_empty() {
            return Ok(());
        }

        let viewport = env.gfx.viewport();
        env.gfx.set_depth_state(&DepthStatePayload {
            test: false,
            write: false,
            compare: CompareFunction::Always,
        });
        match env.assets.shader_program(SPRITE_SHADER) {
            Some(program) => {
                env.gfx.use_program(program);
                let projection = Mat4::orthographic_rh(
                    0.0,
                    viewport.width as f32,
                    viewport.height as f32,
                    0.0,
                    -1.0,
                    1.0,
                );
                env.gfx
                    .set_uniform("u_projection", UniformValue::Mat4(projection));
            }
            None => log::debug!("{}: no '{}' program, using bound program", self.base.name(), SPRITE_SHADER),
        }

        for command in commands {
            execute_command(env.gfx, command);
        }

        env.gfx.set_depth_state(&DepthStatePayload::default());
        Ok(())
    }
}
