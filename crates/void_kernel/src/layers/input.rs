//! Delivers the input snapshot to [`InputReceiver`](crate::entity::InputReceiver) entities

use void_core::FrameTime;
use void_render::CommandTypeSet;

use crate::entity::Capabilities;
use crate::input::InputState;
use crate::layer::{Layer, LayerBase, LayerError};

#[derive(Debug)]
pub struct InputLayer {
    base: LayerBase,
}

impl InputLayer {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            base: LayerBase::new(name, priority),
        }
    }
}

impl Default for InputLayer {
    fn default() -> Self {
        Self::new("input", super::priority::INPUT)
    }
}

impl Layer for InputLayer {
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
        capabilities.contains(Capabilities::INPUT_RECEIVER)
    }

    fn update(&mut self, _frame: &FrameTime, input: &InputState) -> Result<(), LayerError> {
        let (mut processed, mut skipped) = (0, 0);
        for entity in self.base.entities() {
            let mut entity = entity.write();
            if !entity.is_enabled() {
                skipped += 1;
                continue;
            }
            if let Some(receiver) = entity.as_input_receiver_mut() {
                receiver.handle_input(input);
                processed += 1;
            } else {
                skipped += 1;
            }
        }
        self.base.processed(processed);
        self.base.skipped(skipped);
        Ok(())
    }
}
