//! Runs [`Updatable`](crate::entity::Updatable) entities

use void_core::FrameTime;
use void_render::CommandTypeSet;

use crate::entity::Capabilities;
use crate::input::InputState;
use crate::layer::{Layer, LayerBase, LayerError};

#[derive(Debug)]
pub struct UpdateLayer {
    base: LayerBase,
}

impl UpdateLayer {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            base: LayerBase::new(name, priority),
        }
    }
}

impl Default for UpdateLayer {
    fn default() -> Self {
        Self::new("update", super::priority::UPDATE)
    }
}

impl Layer for UpdateLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn supported_commands(&self) -> CommandTypeSet {
        CommandTypeSet::EMPTY
    }

    fn accepts(&self, capabilities: Capabilities) -> bool {
        capabilities.contains(Capabilities::UPDATABLE)
    }

    fn update(&mut self, frame: &FrameTime, _input: &InputState) -> Result<(), LayerError> {
        let (mut processed, mut skipped) = (0, 0);
        for entity in self.base.entities() {
            let mut entity = entity.write();
            if !entity.is_enabled() {
                skipped += 1;
                continue;
            }
            match entity.as_updatable_mut() {
                Some(updatable) => {
                    updatable.update(frame);
                    processed += 1;
                }
                None => skipped += 1,
            }
        }
        self.base.processed(processed);
        self.base.skipped(skipped);
        Ok(())
    }
}
