//! Scheduling, routing, fault containment and diagnostics

mod common;

use std::sync::Arc;

use common::*;
use parking_lot::Mutex;
use void_core::{Error, FrameTime, HierarchyError, Id};
use void_kernel::prelude::*;
use void_kernel::{LayerHealth, LayerPhase};
use void_render::{
    AssetTable, CommandList, CommandTypeSet, GpuCall, LightManager, RecordingContext,
    WindowCommand,
};

/// Layer that records its name and can be told to fail
struct Probe {
    base: LayerBase,
    trace: Arc<Mutex<Vec<String>>>,
    fail_on: Option<u64>,
}

impl Probe {
    fn new(name: &str, priority: i32, trace: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            base: LayerBase::new(name, priority),
            trace: trace.clone(),
            fail_on: None,
        }
    }
}

impl Layer for Probe {
    fn base(&self) -> &LayerBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }
    fn supported_commands(&self) -> CommandTypeSet {
        CommandTypeSet::EMPTY
    }
    fn accepts(&self, _capabilities: Capabilities) -> bool {
        false
    }
    fn update(&mut self, frame: &FrameTime, _input: &InputState) -> Result<(), LayerError> {
        self.trace.lock().push(format!("update:{}", self.base.name()));
        if self.fail_on == Some(frame.frame) {
            return Err(LayerError::from("scripted failure"));
        }
        Ok(())
    }
    fn collect_render_commands(
        &mut self,
        frame: &FrameTime,
        _out: &mut CommandList,
    ) -> Result<(), LayerError> {
        if self.fail_on == Some(frame.frame) {
            panic!("collect blew up");
        }
        self.trace.lock().push(format!("render:{}", self.base.name()));
        Ok(())
    }
}

fn trace() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn render(pipeline: &mut Pipeline, gfx: &mut RecordingContext, n: u64) {
    let (lights, assets) = (LightManager::new(), AssetTable::with_builtin_shaders());
    let mut env = RenderEnv::new(gfx, None, &lights, &assets);
    pipeline.render(&frame(n), &mut env);
}

#[test]
fn test_layers_run_by_priority_not_registration() {
    let trace = trace();
    let mut pipeline = Pipeline::new();
    pipeline.add_layer(Probe::new("ui", 500, &trace)).unwrap();
    pipeline.add_layer(Probe::new("physics", -10, &trace)).unwrap();
    pipeline.add_layer(Probe::new("world", 100, &trace)).unwrap();

    let mut gfx = RecordingContext::default();
    pipeline.update(&frame(1), &InputState::new());
    render(&mut pipeline, &mut gfx, 1);

    assert_eq!(
        *trace.lock(),
        vec![
            "update:physics",
            "update:world",
            "update:ui",
            "render:physics",
            "render:world",
            "render:ui"
        ]
    );
}

#[test]
fn test_layer_added_mid_frame_waits_for_next_frame() {
    let trace = trace();
    let mut pipeline = Pipeline::new();
    pipeline.add_layer(Probe::new("a", 0, &trace)).unwrap();
    let mut gfx = RecordingContext::default();

    pipeline.update(&frame(1), &InputState::new());
    pipeline.add_layer(Probe::new("late", -5, &trace)).unwrap();
    render(&mut pipeline, &mut gfx, 1);
    assert!(!trace.lock().iter().any(|t| t.ends_with("late")));

    trace.lock().clear();
    pipeline.update(&frame(2), &InputState::new());
    assert_eq!(*trace.lock(), vec!["update:late", "update:a"]);
}

#[test]
fn test_duplicate_layer_rejected() {
    let trace = trace();
    let mut pipeline = Pipeline::new();
    pipeline.add_layer(Probe::new("world", 0, &trace)).unwrap();
    let err = pipeline.add_layer(Probe::new("world", 1, &trace)).unwrap_err();
    assert_eq!(err, Error::DuplicateLayer("world".into()));
    assert_eq!(pipeline.layer_count(), 1);

    let removed = pipeline.remove_layer("world").unwrap();
    assert_eq!(removed.name(), "world");
    assert_eq!(pipeline.layer_count(), 0);
}

#[test]
fn test_window_command_routes_from_sprite_to_debug_panel() {
    let mut pipeline = Pipeline::new();
    pipeline.add_layer(SpriteLayer::default()).unwrap();
    pipeline.add_layer(DebugPanelLayer::default()).unwrap();
    pipeline
        .add_entity(share(Badge {
            id: Id::new(1, 0),
            title: Some("Level 2".into()),
        }))
        .unwrap();

    let mut gfx = RecordingContext::default();
    render(&mut pipeline, &mut gfx, 1);

    assert!(gfx
        .calls()
        .contains(&GpuCall::Window(WindowCommand::SetTitle("Level 2".into()))));
    let diag = pipeline.diagnostics();
    assert_eq!(
        diag.per_layer,
        vec![("sprites".to_string(), 1), ("debug_panels".to_string(), 1)]
    );
    assert_eq!(diag.unclaimed_last_frame, 0);
    assert_eq!(diag.commands_current, 2);
}

#[test]
fn test_unclaimed_commands_are_counted() {
    let mut pipeline = Pipeline::new();
    pipeline.add_layer(SpriteLayer::default()).unwrap();
    pipeline
        .add_entity(share(Badge {
            id: Id::new(1, 0),
            title: Some("lost".into()),
        }))
        .unwrap();

    let mut gfx = RecordingContext::default();
    render(&mut pipeline, &mut gfx, 1);
    render(&mut pipeline, &mut gfx, 2);

    assert_eq!(pipeline.diagnostics().unclaimed_last_frame, 1);
    assert_eq!(pipeline.diagnostics().unclaimed_total, 2);
    assert!(!gfx.calls().iter().any(|c| matches!(c, GpuCall::Window(_))));
}

#[test]
fn test_failing_layer_does_not_stop_the_frame() {
    let trace = trace();
    let mut pipeline = Pipeline::new();
    let mut flaky = Probe::new("flaky", 0, &trace);
    flaky.fail_on = Some(1);
    pipeline.add_layer(flaky).unwrap();
    pipeline.add_layer(Probe::new("steady", 10, &trace)).unwrap();
    let mut gfx = RecordingContext::default();

    pipeline.update(&frame(1), &InputState::new());
    render(&mut pipeline, &mut gfx, 1);

    let log = trace.lock().clone();
    assert!(log.contains(&"update:steady".to_string()));
    assert!(log.contains(&"render:steady".to_string()));
    assert!(!log.contains(&"render:flaky".to_string()));

    // update error plus collect panic
    assert_eq!(pipeline.layer_stats("flaky").unwrap().failures, 2);
    match pipeline.layer_health("flaky").unwrap() {
        LayerHealth::Failed { phase, error, frame } => {
            assert_eq!(*phase, LayerPhase::Collect);
            assert!(error.contains("collect blew up"));
            assert_eq!(*frame, 1);
        }
        LayerHealth::Healthy => panic!("expected failure"),
    }
    assert!(pipeline.layer_health("steady").unwrap().is_healthy());

    // a clean frame restores health, the counter stays
    pipeline.update(&frame(2), &InputState::new());
    render(&mut pipeline, &mut gfx, 2);
    assert!(pipeline.layer_health("flaky").unwrap().is_healthy());
    assert_eq!(pipeline.layer_stats("flaky").unwrap().failures, 2);
}

#[test]
fn test_entities_route_by_capability() {
    let log = draw_log();
    let ticks = Arc::new(Mutex::new(0));
    let mut engine = Engine::with_default_layers(EngineConfig::default()).unwrap();

    let joined = engine
        .add_entity(share(Prop::new(1, glam::Vec3::ZERO, &log)))
        .unwrap();
    assert_eq!(joined, 1);
    engine
        .add_entity(share(Ticker {
            id: Id::new(2, 0),
            ticks: ticks.clone(),
        }))
        .unwrap();
    assert_eq!(
        engine.add_entity(share(Prop::new(1, glam::Vec3::ONE, &log))),
        Err(Error::DuplicateEntity(Id::new(1, 0)))
    );

    engine.update(0.016);
    engine.update(0.016);
    assert_eq!(*ticks.lock(), 2);

    engine.remove_entity(Id::new(2, 0)).unwrap();
    engine.update(0.016);
    assert_eq!(*ticks.lock(), 2);
    assert!(matches!(
        engine.remove_entity(Id::new(2, 0)),
        Err(Error::EntityNotFound(_))
    ));
}

#[test]
fn test_hierarchy_rejects_cycles() {
    let log = draw_log();
    let mut pipeline = Pipeline::new();
    for n in 1..=3 {
        pipeline
            .add_entity(share(Prop::new(n, glam::Vec3::ZERO, &log)))
            .unwrap();
    }
    let (a, b, c) = (Id::new(1, 0), Id::new(2, 0), Id::new(3, 0));
    pipeline.set_parent(b, a).unwrap();
    pipeline.set_parent(c, b).unwrap();

    assert_eq!(
        pipeline.set_parent(a, c),
        Err(Error::Hierarchy(HierarchyError::Cycle { child: a, parent: c }))
    );
    assert_eq!(pipeline.hierarchy().children(a), &[b]);
    assert_eq!(pipeline.clear_parent(c), Ok(Some(b)));

    pipeline.remove_entity(b).unwrap();
    assert!(pipeline.hierarchy().children(a).is_empty());
}

#[test]
fn test_diagnostics_count_frames_and_reset() {
    let trace = trace();
    let mut pipeline = Pipeline::new();
    pipeline.add_layer(Probe::new("a", 0, &trace)).unwrap();
    let mut gfx = RecordingContext::default();

    for n in 1..=4 {
        pipeline.update(&frame(n), &InputState::new());
        render(&mut pipeline, &mut gfx, n);
    }
    assert_eq!(pipeline.diagnostics().total_frames, 4);

    pipeline.reset_diagnostics();
    assert_eq!(pipeline.diagnostics().total_frames, 0);
    assert_eq!(pipeline.layer_stats("a").unwrap().commands_total, 0);

    pipeline.update(&frame(5), &InputState::new());
    render(&mut pipeline, &mut gfx, 5);
    assert_eq!(pipeline.diagnostics().total_frames, 1);

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.total_frames, 1);
    assert_eq!(snapshot.layers[0].name, "a");
    assert!(serde_json::to_string(&snapshot).is_ok());
}
