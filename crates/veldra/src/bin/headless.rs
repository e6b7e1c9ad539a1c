//! # Veldra Headless Runner
//!
//! Drives the frame pipeline at the configured tick rate with a synthetic
//! scene: one camera orbiting the origin plus a field of drifting entities,
//! some carrying emitters and scripts. Useful for profiling the executor
//! and eyeballing culling behavior from the logs.
//!
//! ```bash
//! # Optional config file, all fields have defaults:
//! #   veldra.toml
//! RUST_LOG=veldra=debug cargo run --bin veldra_headless
//! ```

use std::time::Instant;

use veldra::{ChannelSink, EmitterState, EngineConfig, EntityState, FrameCoordinator, Vec2};

const CONFIG_PATH: &str = "veldra.toml";
const RUN_FRAMES: u64 = 600;
const FIELD_ENTITIES: u32 = 2000;

fn load_config() -> EngineConfig {
    match std::fs::read_to_string(CONFIG_PATH) {
        Ok(source) => match EngineConfig::from_toml(&source) {
            Ok(config) => {
                tracing::info!(path = CONFIG_PATH, "loaded config");
                config
            }
            Err(error) => {
                tracing::error!(path = CONFIG_PATH, %error, "invalid config");
                std::process::exit(1);
            }
        },
        Err(_) => {
            tracing::info!("no config file, using defaults");
            EngineConfig::default()
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = load_config();
    let target_frame_time = config.target_frame_time();
    let mut coordinator = FrameCoordinator::new(&config);

    // Snapshot consumer standing in for a render thread.
    let (sink, snapshots) = ChannelSink::bounded(4);
    coordinator.add_sink(Box::new(sink));
    let consumer = std::thread::spawn(move || {
        let mut received = 0u64;
        while snapshots.recv().is_ok() {
            received += 1;
        }
        received
    });

    // Scene: camera at the origin, entities spiralling outward so that some
    // drift across the update-distance boundary during the run.
    let Some(camera) = coordinator.spawn(EntityState::at(Vec2::ZERO)) else {
        tracing::error!("entity capacity too small for the demo scene");
        std::process::exit(1);
    };
    coordinator.set_camera_entity(Some(camera));

    let mut spawned = 0u32;
    for i in 0..FIELD_ENTITIES {
        let angle = f32::from(i as u16) * 0.37;
        let radius = 10.0 + (i as f32) * 1.5;
        let position = Vec2::new(radius * angle.cos(), radius * angle.sin());
        let velocity = Vec2::new(-angle.sin(), angle.cos()) * 20.0;

        let mut state = EntityState::moving(position, velocity);
        if i % 50 == 0 {
            state.emitter = Some(EmitterState {
                rate: 60.0,
                ..EmitterState::default()
            });
        }
        if coordinator.spawn(state).is_some() {
            spawned += 1;
        }
    }
    tracing::info!(spawned, "scene populated");

    let run_start = Instant::now();
    let mut last_frame = run_start;
    for _ in 0..RUN_FRAMES {
        let now = Instant::now();
        let delta_time = (now - last_frame).as_secs_f32().min(0.1);
        last_frame = now;

        if let Err(error) = coordinator.run_frame(now, delta_time) {
            tracing::error!(%error, "frame aborted");
            std::process::exit(1);
        }

        let elapsed = last_frame.elapsed();
        if elapsed < target_frame_time {
            std::thread::sleep(target_frame_time - elapsed);
        }
    }

    coordinator.stats().log_summary();
    drop(coordinator); // closes the snapshot channel
    match consumer.join() {
        Ok(received) => tracing::info!(received, "snapshot consumer done"),
        Err(_) => tracing::warn!("snapshot consumer panicked"),
    }
    tracing::info!(
        total_s = run_start.elapsed().as_secs_f64(),
        "headless run complete"
    );
}
