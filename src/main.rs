//! Shape Smash headless demo
//!
//! Usage: `shape-smash [config.json] [sprites.json]`
//!
//! Runs the physics driver for a few seconds, pressing a key now and then and
//! pushing the shapes around, and logs what a renderer would draw.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use shape_smash::sim::{MonotonicClock, Sandbox, World};
use shape_smash::{SandboxConfig, ShapeCatalogue, StaticCatalogue};

/// Render frames to run (~5 seconds)
const DEMO_FRAMES: u32 = 300;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Frames between two key presses
const KEY_PERIOD: u32 = 20;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Shape Smash starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => SandboxConfig::load_or_create(Path::new(&path))?,
        None => SandboxConfig::default(),
    };
    let catalogue = match args.next() {
        Some(path) => StaticCatalogue::load(Path::new(&path))?,
        None => {
            log::info!("No sprite file given, using built-in block letters");
            StaticCatalogue::block_letters()
        }
    };

    let keys: Vec<char> = "abcdefghijklmnopqrstuvwxyz0123456789"
        .chars()
        .filter(|key| catalogue.supports(*key))
        .collect();
    if keys.is_empty() {
        return Err("catalogue has no alphanumeric shapes".into());
    }

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(42);
    let world = World::new(
        config,
        Arc::new(catalogue),
        Arc::new(MonotonicClock::default()),
        seed,
    )?;

    let sandbox = Sandbox::start(world);
    let mut pressed: Option<char> = None;
    let mut skipped_frames = 0u32;

    for frame in 0..DEMO_FRAMES {
        if frame % KEY_PERIOD == 0 {
            if let Some(key) = pressed.take() {
                sandbox.input().set_key(key, false);
            }
            let key = keys[(frame / KEY_PERIOD) as usize % keys.len()];
            sandbox.input().set_key(key, true);
            pressed = Some(key);
        }

        // Shove everything right for a second, then up
        let push_right = (120..180).contains(&frame);
        let push_up = (180..200).contains(&frame);
        sandbox
            .input()
            .set_direction(push_up, false, false, push_right);

        let rendered = sandbox.world().with_render_lock(|mut view| {
            for cue in view.take_audio_cues() {
                log::info!("Audio cue: {:?}", cue);
            }
            if frame % 60 == 0 {
                let sprites = view.sprites();
                let explosions = view.explosions();
                log::info!(
                    "Frame {}: {} sprites, {} explosions",
                    frame,
                    sprites.len(),
                    explosions.len()
                );
            }
        });
        if rendered.is_none() {
            skipped_frames += 1;
        }

        thread::sleep(FRAME_INTERVAL);
    }

    let world = sandbox
        .shutdown()
        .ok_or("world still shared after shutdown")?;
    log::info!(
        "Stopped after {} ticks: {} bodies, {} explosions, {} frames skipped",
        world.ticks(),
        world.dynamic_count(),
        world.explosions().len(),
        skipped_frames
    );
    Ok(())
}
