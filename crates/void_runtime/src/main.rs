//! Void Engine headless runtime
//!
//! Boots an [`Engine`] with the built-in layers against the recording
//! backend, runs a fixed number of frames while a worker thread feeds the
//! main-thread dispatcher, then prints the diagnostics snapshot as JSON.
//!
//! Run with: cargo run -p void_runtime -- [config.toml] [frames]
//!
//! `RUST_LOG` controls verbosity (default `info`).

mod scene;

use std::thread;
use std::time::Duration;

use glam::Vec3;
use void_kernel::{Engine, EngineConfig, GameObject, SPRITE_SHADER};
use void_render::{AssetTable, Camera, DirectionalLight, RecordingContext, ShaderHandle};

const DEFAULT_FRAMES: u64 = 120;
const FRAME_DELTA: f32 = 1.0 / 60.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("runtime failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load(&path)?,
        None => EngineConfig::default(),
    };
    let frames = match args.next() {
        Some(n) => n.parse::<u64>()?,
        None => DEFAULT_FRAMES,
    };

    let (width, height) = (config.window.width, config.window.height);
    let mut engine = Engine::with_default_layers(config)?;
    let mut gfx = RecordingContext::new(width, height);
    let assets = AssetTable::with_builtin_shaders().with_shader(SPRITE_SHADER, ShaderHandle(4));

    let mut camera = Camera::perspective(60.0, width as f32 / height as f32, 0.1, 200.0);
    camera.set_position(Vec3::new(0.0, 6.0, 14.0));
    camera.look_at(Vec3::ZERO);
    engine.set_camera(camera);
    engine
        .lights_mut()
        .add(DirectionalLight::new(Vec3::new(-0.4, -1.0, -0.3)).with_shadows(true));

    let scene = scene::build(8);
    for entity in &scene.all {
        engine.add_entity(entity.clone())?;
    }
    log::info!(
        "scene ready: {} entities across {:?}",
        engine.pipeline().entity_count(),
        engine.pipeline().layer_names()
    );

    // Worker: "loads" new spin speeds and hands them to the main thread
    let handle = engine.dispatcher_handle();
    let targets = scene.crates.clone();
    let worker = thread::spawn(move || {
        for (i, target) in targets.into_iter().enumerate() {
            thread::sleep(Duration::from_millis(2));
            let speed = 2.0 + i as f32 * 0.25;
            handle.enqueue_action(format!("retune crate {}", i), move || {
                let mut entity = target.write();
                log::debug!(
                    "crate {}: {:.2} -> {:.2} rad/s",
                    entity.id(),
                    entity.speed(),
                    speed
                );
                entity.set_speed(speed);
            });
        }
        handle.enqueue_fallible("flaky job", || Err::<(), _>("simulated I/O error"));
    });

    // The call log is drained every frame so long runs stay bounded
    let mut recorded = 0;
    for _ in 0..frames {
        engine.update(FRAME_DELTA);
        engine.render(&mut gfx, &assets);
        recorded += gfx.take_calls().len();
    }
    if worker.join().is_err() {
        log::warn!("worker thread panicked");
    }
    // Drain whatever the worker queued after the last frame
    while engine.dispatcher().pending() > 0 {
        engine.update(FRAME_DELTA);
    }

    log::info!(
        "{} frames, {} GPU calls recorded",
        engine.frame().frame,
        recorded
    );
    println!("{}", serde_json::to_string_pretty(&engine.diagnostics())?);

    engine.dispose(&mut gfx);
    Ok(())
}
