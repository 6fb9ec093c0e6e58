//! Engine façade
//!
//! Owns the pipeline, the main-thread dispatcher, the camera, lights, frame
//! clock and input snapshot. The host calls [`Engine::update`] then
//! [`Engine::render`] once per frame on the thread that created the engine.

use void_core::{FrameClock, FrameTime, Result};
use void_render::{AssetProvider, Camera, ClearPayload, GraphicsContext, LightManager};

use crate::config::EngineConfig;
use crate::diagnostics::{DiagnosticsSnapshot, DispatcherSnapshot};
use crate::dispatcher::{DispatcherHandle, MainThreadDispatcher};
use crate::entity::{EntityId, SharedEntity};
use crate::env::RenderEnv;
use crate::input::InputState;
use crate::layer::Layer;
use crate::layers::{DebugPanelLayer, InputLayer, SpriteLayer, UpdateLayer, WorldLayer};
use crate::pipeline::Pipeline;

pub struct Engine {
    config: EngineConfig,
    pipeline: Pipeline,
    dispatcher: MainThreadDispatcher,
    camera: Option<Camera>,
    lights: LightManager,
    clock: FrameClock,
    input: InputState,
}

impl Engine {
    /// Empty pipeline, dispatcher bound to the calling thread
    pub fn new(config: EngineConfig) -> Self {
        let mut config = config;
        config.validate();

        let mut pipeline = Pipeline::new();
        pipeline.resize(config.window.width, config.window.height);

        Self {
            dispatcher: MainThreadDispatcher::new(config.dispatcher.clone()),
            pipeline,
            camera: None,
            lights: LightManager::new(),
            clock: FrameClock::new(),
            input: InputState::new(),
            config,
        }
    }

    /// Engine with the built-in input, update, world, sprite and debug panel layers
    pub fn with_default_layers(config: EngineConfig) -> Result<Self> {
        let mut engine = Self::new(config);
        let settings = engine.config.world_settings();

        engine.add_layer(InputLayer::default())?;
        engine.add_layer(UpdateLayer::default())?;
        engine.add_layer(WorldLayer::new(
            "world",
            crate::layers::priority::WORLD,
            settings,
        ))?;
        engine.add_layer(SpriteLayer::default())?;
        engine.add_layer(DebugPanelLayer::default())?;
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn add_layer<L: Layer + 'static>(&mut self, layer: L) -> Result<()> {
        self.pipeline.add_layer(layer)
    }

    pub fn add_entity(&mut self, entity: SharedEntity) -> Result<usize> {
        self.pipeline.add_entity(entity)
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Result<SharedEntity> {
        self.pipeline.remove_entity(id)
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    pub fn dispatcher(&self) -> &MainThreadDispatcher {
        &self.dispatcher
    }

    /// Producer handle for worker threads
    pub fn dispatcher_handle(&self) -> DispatcherHandle {
        self.dispatcher.handle()
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    /// Install the camera, matching its aspect to the window
    pub fn set_camera(&mut self, mut camera: Camera) {
        camera.set_viewport_size(self.config.window.width, self.config.window.height);
        self.camera = Some(camera);
    }

    pub fn clear_camera(&mut self) -> Option<Camera> {
        self.camera.take()
    }

    pub fn lights(&self) -> &LightManager {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut LightManager {
        &mut self.lights
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Timing of the last ticked frame
    pub fn frame(&self) -> FrameTime {
        self.clock.current()
    }

    pub fn average_fps(&self) -> f32 {
        self.clock.average_fps()
    }

    /// Advance one frame: drain dispatched actions, then update every layer
    pub fn update(&mut self, delta: f32) -> FrameTime {
        let frame = self.clock.tick(delta);
        self.dispatcher.update(&frame);
        self.pipeline.update(&frame, &self.input);
        self.input.end_frame();
        frame
    }

    /// Clear the frame and run every layer's render pass
    pub fn render(&mut self, gfx: &mut dyn GraphicsContext, assets: &dyn AssetProvider) {
        let frame = self.clock.current();
        gfx.clear(&ClearPayload::color(self.config.render.clear_color));

        let mut env = RenderEnv::new(gfx, self.camera.as_ref(), &self.lights, assets);
        self.pipeline.render(&frame, &mut env);
    }

    /// Window resized
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.window.width = width.max(1);
        self.config.window.height = height.max(1);
        if let Some(camera) = &mut self.camera {
            camera.set_viewport_size(width, height);
        }
        self.pipeline.resize(width, height);
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        let mut snapshot = self.pipeline.snapshot();
        snapshot.dispatcher = Some(DispatcherSnapshot::new(
            self.dispatcher.pending(),
            &self.dispatcher.stats(),
        ));
        snapshot
    }

    pub fn reset_diagnostics(&mut self) {
        self.pipeline.reset_diagnostics();
        self.dispatcher.reset_stats();
    }

    /// Release GPU resources. Safe to call more than once
    pub fn dispose(&mut self, gfx: &mut dyn GraphicsContext) {
        self.pipeline.dispose(gfx);
        log::info!("engine disposed after {} frame(s)", self.clock.current().frame);
    }
}
