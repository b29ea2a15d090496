//! Shared world access for the physics driver and the render path
//!
//! A single mutex guards the whole world. A physics tick and a render read each
//! hold it for their full duration. Neither side blocks: both poll with
//! `try_lock` and skip the cycle if the other side holds the lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use super::bounds::Rect;
use super::input::InputSnapshot;
use super::world::{AudioCue, ExplosionView, Sprite, World};

/// Handle to the world shared between threads
#[derive(Clone)]
pub struct SharedWorld {
    inner: Arc<Mutex<World>>,
}

impl SharedWorld {
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    /// Run `f` with exclusive access for a physics tick.
    ///
    /// Returns None without running `f` if the lock is held elsewhere.
    pub fn with_physics_lock<R>(&self, f: impl FnOnce(&mut World) -> R) -> Option<R> {
        let mut guard = self.inner.try_lock()?;
        Some(f(&mut guard))
    }

    /// Run `f` against a render view valid only for the call.
    ///
    /// Returns None without running `f` if the lock is held elsewhere.
    pub fn with_render_lock<R>(&self, f: impl FnOnce(RenderView<'_>) -> R) -> Option<R> {
        let mut guard = self.inner.try_lock()?;
        Some(f(RenderView { world: &mut guard }))
    }

    /// Take the world back once no other handle is alive
    pub fn into_inner(self) -> Option<World> {
        Arc::try_unwrap(self.inner).ok().map(Mutex::into_inner)
    }
}

/// Read access for the renderer plus the audio cue drain
pub struct RenderView<'a> {
    world: &'a mut World,
}

impl RenderView<'_> {
    pub fn bounds(&self) -> Rect {
        self.world.bounds()
    }

    pub fn sprites(&self) -> Vec<Sprite> {
        self.world.sprites()
    }

    pub fn explosions(&self) -> Vec<ExplosionView> {
        self.world.explosion_views()
    }

    pub fn take_audio_cues(&mut self) -> Vec<AudioCue> {
        self.world.take_audio_cues()
    }
}

/// Latest input written by the input collaborator
#[derive(Clone, Default)]
pub struct SharedInput {
    inner: Arc<Mutex<InputSnapshot>>,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_direction(&self, up: bool, down: bool, left: bool, right: bool) {
        let mut input = self.inner.lock();
        input.up = up;
        input.down = down;
        input.left = left;
        input.right = right;
    }

    pub fn set_key(&self, key: char, pressed: bool) {
        self.inner.lock().set_key(key, pressed);
    }

    pub fn snapshot(&self) -> InputSnapshot {
        self.inner.lock().clone()
    }
}

/// Fixed-interval ticker thread driving [`World::update`]
pub struct PhysicsDriver {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl PhysicsDriver {
    /// Spawn the ticker. Each tick is handed the nominal interval as elapsed time.
    pub fn start(world: SharedWorld, input: SharedInput, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let worker_flag = Arc::clone(&running);
        let elapsed_ms = interval.as_secs_f32() * 1000.0;

        let worker = thread::spawn(move || {
            let mut skipped = 0u64;
            while worker_flag.load(Ordering::Relaxed) {
                let snapshot = input.snapshot();
                if world
                    .with_physics_lock(|w| w.update(elapsed_ms, &snapshot))
                    .is_none()
                {
                    skipped += 1;
                    log::trace!("World busy, skipping physics tick");
                }
                thread::sleep(interval);
            }
            log::debug!("Physics driver stopped ({} ticks skipped)", skipped);
        });

        log::info!("Physics driver started ({:?} interval)", interval);
        Self {
            running,
            worker: Some(worker),
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Stop the ticker and wait for the in-flight tick to finish
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Physics driver panicked");
            }
        }
    }
}

impl Drop for PhysicsDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A running sandbox: world, input and the driver ticking it
pub struct Sandbox {
    // Dropped first so the ticker is gone before the world is released
    driver: PhysicsDriver,
    world: SharedWorld,
    input: SharedInput,
}

impl Sandbox {
    /// Start ticking `world` at its configured interval
    pub fn start(world: World) -> Self {
        let interval = Duration::from_millis(world.config().tuning.tick_interval_ms);
        let world = SharedWorld::new(world);
        let input = SharedInput::new();
        let driver = PhysicsDriver::start(world.clone(), input.clone(), interval);
        Self {
            driver,
            world,
            input,
        }
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub fn input(&self) -> &SharedInput {
        &self.input
    }

    /// Stop the driver, then hand back the world
    pub fn shutdown(self) -> Option<World> {
        let Sandbox {
            mut driver, world, ..
        } = self;
        driver.stop();
        drop(driver);
        world.into_inner()
    }
}
