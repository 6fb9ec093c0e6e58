//! Full frames through the engine façade

mod common;

use common::*;
use glam::Vec3;
use void_kernel::prelude::*;
use void_render::{AssetTable, DirectionalLight, GpuCall, PolygonMode, RecordingContext};

const CONFIG: &str = r#"
[window]
width = 640
height = 480

[render]
wireframe = true
debug_bounds = true
clear_color = [0.0, 0.0, 0.0, 2.0]

[shadow]
resolution = 512

[dispatcher]
budget = 2
"#;

#[test]
fn test_config_drives_world_layer() {
    let config = EngineConfig::from_toml_str(CONFIG).unwrap();
    assert_eq!(config.render.clear_color, [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(config.dispatcher.budget, 2);

    let mut engine = Engine::with_default_layers(config).unwrap();
    engine.set_camera(camera());
    engine
        .lights_mut()
        .add(DirectionalLight::new(Vec3::NEG_Y).with_shadows(true));

    let log = draw_log();
    engine
        .add_entity(share(Prop::new(1, Vec3::ZERO, &log).casting_shadows()))
        .unwrap();

    let mut gfx = RecordingContext::new(640, 480);
    let assets = AssetTable::with_builtin_shaders();
    engine.update(0.016);
    engine.render(&mut gfx, &assets);

    assert_eq!(ids(&log, "shadow"), vec![1]);
    assert_eq!(ids(&log, "opaque"), vec![1]);
    assert!(gfx
        .calls()
        .iter()
        .any(|c| matches!(c, GpuCall::CreateDepthTarget(_, 512, 512))));
    assert!(gfx.calls().contains(&GpuCall::SetPolygonMode(PolygonMode::Line)));
    assert!(gfx.calls().contains(&GpuCall::DrawLines(24)));

    engine.dispose(&mut gfx);
    assert_eq!(gfx.live_targets(), 0);
}

#[test]
fn test_resize_updates_camera_aspect() {
    let mut engine = Engine::with_default_layers(EngineConfig::default()).unwrap();
    engine.set_camera(camera());
    engine.resize(1000, 500);

    let camera = engine.camera().unwrap();
    assert!((camera.aspect() - 2.0).abs() < 1e-6);
    assert_eq!(engine.config().window.width, 1000);
}

#[test]
fn test_snapshot_reports_every_layer() {
    let mut engine = Engine::with_default_layers(EngineConfig::default()).unwrap();
    let mut gfx = RecordingContext::default();
    let assets = AssetTable::with_builtin_shaders();
    for _ in 0..3 {
        engine.update(0.016);
        engine.render(&mut gfx, &assets);
    }

    let snapshot = engine.diagnostics();
    assert_eq!(snapshot.frame, 3);
    assert_eq!(snapshot.total_frames, 3);
    assert_eq!(snapshot.layers.len(), 5);
    assert!(snapshot.layers.iter().all(|l| l.healthy));

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["layers"][2]["name"], "world");

    engine.reset_diagnostics();
    assert_eq!(engine.diagnostics().total_frames, 0);
}
