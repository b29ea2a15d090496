//! The sandbox world
//!
//! Owns the body registry (four static walls plus every spawned shape), the
//! live explosions and the rapier state, and runs one tick per [`World::update`]:
//!
//! 1. age explosions and retire the expired ones
//! 2. sweep dynamic bodies: explode any at the collision threshold, push the rest
//! 3. spawn a shape for every key pressed since the last tick
//! 4. step the physics and feed contact-begin events to the collision tracker
//!
//! Models are addressed by [`ModelId`]; the rapier body only stores the id.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;
use rapier2d::prelude::RigidBodyHandle;

use super::bounds::Rect;
use super::explosion::{Explosion, ExplosionState, Particle};
use super::input::InputSnapshot;
use super::model::{Clock, Model, ModelId};
use super::physics::{FixtureMaterial, PhysicsWorld};
use super::placement::{PlacementFailure, try_place};
use crate::catalogue::{ShapeAsset, ShapeCatalogue, ShapeKind, Size};
use crate::config::SandboxConfig;
use crate::consts::WALL_HALF_THICKNESS;
use crate::error::{ConfigError, SpawnError};
use crate::normalize_angle;

/// Slack for float error when checking a new body against its window
const PLACEMENT_TOLERANCE: f32 = 1e-3;

/// A live shape as seen by the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub model: ModelId,
    pub kind: ShapeKind,
    pub asset: Arc<ShapeAsset>,
    /// Scaled size in simulation units
    pub size: Size,
    /// Body origin
    pub position: Vec2,
    /// Rotation in (-π, π]
    pub angle: f32,
    /// World-space centre of mass
    pub center: Vec2,
}

/// A live explosion as seen by the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct ExplosionView {
    pub asset: Arc<ShapeAsset>,
    pub percent_elapsed: f32,
    /// Current world-space outline of each particle
    pub particles: Vec<Vec<Vec2>>,
}

/// One-shot audio signals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCue {
    /// A spawned shape was seen by the render path for the first time
    Created { name: String },
    /// A shape blew up
    Destroyed { name: String },
}

#[derive(Debug)]
struct Entry {
    handle: RigidBodyHandle,
    model: Model,
}

/// Uniform sample in [-max, max), zero for an empty range
fn symmetric<R: Rng + ?Sized>(rng: &mut R, max: f32) -> f32 {
    if max > 0.0 {
        rng.random_range(-max..max)
    } else {
        0.0
    }
}

/// Uniform sample in [0, max), zero for an empty range
fn up_to<R: Rng + ?Sized>(rng: &mut R, max: f32) -> f32 {
    if max > 0.0 { rng.random_range(0.0..max) } else { 0.0 }
}

pub struct World {
    config: SandboxConfig,
    catalogue: Arc<dyn ShapeCatalogue>,
    clock: Arc<dyn Clock>,
    rng: Pcg32,
    bounds: Rect,
    physics: PhysicsWorld,
    /// Ordered by id so sweeps and snapshots are deterministic
    models: BTreeMap<ModelId, Entry>,
    explosions: Vec<Explosion>,
    last_keys: BTreeSet<char>,
    next_id: u32,
    ticks: u64,
}

impl World {
    /// Build a world with its four boundary walls
    pub fn new(
        config: SandboxConfig,
        catalogue: Arc<dyn ShapeCatalogue>,
        clock: Arc<dyn Clock>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.world_size();
        let mut world = Self {
            physics: PhysicsWorld::new(config.world.gravity),
            bounds: Rect::new(Vec2::ZERO, size),
            config,
            catalogue,
            clock,
            rng: Pcg32::seed_from_u64(seed),
            models: BTreeMap::new(),
            explosions: Vec::new(),
            last_keys: BTreeSet::new(),
            next_id: 0,
            ticks: 0,
        };
        world.build_walls();

        log::info!(
            "World {}x{} ready (gravity {}, seed {})",
            size.x,
            size.y,
            world.config.world.gravity,
            seed
        );
        Ok(world)
    }

    fn build_walls(&mut self) {
        let Vec2 { x: w, y: h } = self.bounds.size();
        // (centre, full size) for bottom, left, right, top
        let walls = [
            (Vec2::new(w / 2.0, 0.0), Vec2::new(w, 0.0)),
            (Vec2::new(0.0, h / 2.0), Vec2::new(0.0, h)),
            (Vec2::new(w, h / 2.0), Vec2::new(0.0, h)),
            (Vec2::new(w / 2.0, h), Vec2::new(w, 0.0)),
        ];

        for (center, size) in walls {
            let id = self.allocate_id();
            let half_extents = (size / 2.0).max(Vec2::splat(WALL_HALF_THICKNESS));
            let handle = self.physics.insert_fixed_box(center, half_extents, id);
            let model = Model::ground(Size::new(size.x, size.y));
            self.models.insert(id, Entry { handle, model });
        }
    }

    fn allocate_id(&mut self) -> ModelId {
        let id = ModelId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// World bounds in simulation units
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Number of completed ticks
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(&id).map(|entry| &entry.model)
    }

    /// All live models, walls included, in id order
    pub fn models(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.models.iter().map(|(id, entry)| (*id, &entry.model))
    }

    pub fn ground_ids(&self) -> Vec<ModelId> {
        self.models()
            .filter(|(_, model)| model.kind().is_ground())
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of live spawned bodies
    pub fn dynamic_count(&self) -> usize {
        self.models
            .values()
            .filter(|entry| !entry.model.kind().is_ground())
            .count()
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    /// Current bounding box of a model's body
    pub fn body_aabb(&self, id: ModelId) -> Option<Rect> {
        let entry = self.models.get(&id)?;
        self.physics.body_aabb(entry.handle)
    }

    pub fn fixture_count(&self, id: ModelId) -> usize {
        self.models
            .get(&id)
            .map_or(0, |entry| self.physics.fixture_count(entry.handle))
    }

    fn dynamic_aabbs(&self) -> Vec<Rect> {
        self.models
            .values()
            .filter(|entry| !entry.model.kind().is_ground())
            .filter_map(|entry| self.physics.body_aabb(entry.handle))
            .collect()
    }

    /// Place and create a body for `kind`.
    ///
    /// No state changes on failure apart from the RNG draws.
    pub fn try_spawn(&mut self, kind: ShapeKind) -> Result<ModelId, SpawnError> {
        let Some(key) = kind.character_key() else {
            return Err(SpawnError::GroundNotSpawnable);
        };
        let asset = self
            .catalogue
            .variants(key)
            .choose(&mut self.rng)
            .cloned()
            .ok_or(SpawnError::UnknownShape(key))?;

        let size = asset.size.scaled(self.config.tuning.character_scale);
        let occupied = self.dynamic_aabbs();
        let window = match try_place(&self.bounds, size.as_vec2(), &occupied, &mut self.rng) {
            Ok(window) => window,
            Err(PlacementFailure::Full) => {
                return Err(SpawnError::NoFreeSpace {
                    width: size.width,
                    height: size.height,
                });
            }
            Err(PlacementFailure::DoesNotFit) if size.width > 0.0 && size.height > 0.0 => {
                return Err(SpawnError::ShapeLargerThanWorld {
                    width: size.width,
                    height: size.height,
                    world_width: self.bounds.width(),
                    world_height: self.bounds.height(),
                });
            }
            Err(PlacementFailure::DoesNotFit) => {
                return Err(SpawnError::DegenerateShape(asset.name.clone()));
            }
        };

        let scale = size.width.max(size.height);
        let polygons: Vec<Vec<Vec2>> = asset
            .polygons
            .iter()
            .map(|polygon| polygon.iter().map(|v| *v * scale).collect())
            .collect();

        let tuning = &self.config.tuning;
        let material = FixtureMaterial {
            density: tuning.density,
            friction: tuning.friction,
            restitution: tuning.restitution,
        };
        let id = ModelId(self.next_id);
        let handle = self
            .physics
            .insert_dynamic(window.min, &polygons, material, id)
            .ok_or_else(|| SpawnError::DegenerateShape(asset.name.clone()))?;

        let Some(aabb) = self.physics.body_aabb(handle).filter(Rect::has_area) else {
            self.physics.remove(handle);
            return Err(SpawnError::DegenerateShape(asset.name.clone()));
        };
        // Polygons outside the normalised box make the body larger than its window
        let inner = aabb.shrunk(PLACEMENT_TOLERANCE);
        if !self.bounds.contains(&inner) || occupied.iter().any(|other| other.overlaps(&inner)) {
            self.physics.remove(handle);
            log::debug!("'{}' body {:?} overruns window {:?}", asset.name, aabb, window);
            return Err(SpawnError::ExceedsWindow(asset.name.clone()));
        }

        let (force_x, force_y, torque) =
            (tuning.spawn_force_x, tuning.spawn_force_y, tuning.spawn_torque);
        let debounce = Duration::from_millis(tuning.debounce_ms);
        let force = Vec2::new(
            symmetric(&mut self.rng, force_x),
            up_to(&mut self.rng, force_y),
        );
        self.physics.add_force(handle, force);
        self.physics.add_torque(handle, symmetric(&mut self.rng, torque));

        self.next_id += 1;
        log::debug!(
            "Spawned {} '{}' at ({:.2}, {:.2}) size {:.2}x{:.2}",
            id,
            asset.name,
            window.min.x,
            window.min.y,
            size.width,
            size.height
        );
        let model = Model::new(kind, size, Some(asset), debounce);
        self.models.insert(id, Entry { handle, model });
        Ok(id)
    }

    /// Count a contact-begin for a model (debounced, dynamic bodies only).
    ///
    /// Returns the model's collision count after the call.
    pub fn register_contact(&mut self, id: ModelId) -> Option<u32> {
        let entry = self.models.get_mut(&id)?;
        if entry.model.kind().is_ground() {
            return None;
        }
        let count = entry.model.record_collision(self.clock.now());
        log::trace!("{} collisions: {}", id, count);
        Some(count)
    }

    fn handle_contact(&mut self, a: RigidBodyHandle, b: RigidBodyHandle) {
        for handle in [a, b] {
            if !self.physics.is_dynamic(handle) {
                continue;
            }
            if let Some(id) = self.physics.model_of(handle) {
                self.register_contact(id);
            }
        }
    }

    /// Advance the world by one tick of `elapsed_ms` milliseconds
    pub fn update(&mut self, elapsed_ms: f32, input: &InputSnapshot) {
        let dt = elapsed_ms / 1000.0;

        self.age_explosions(dt);
        let awake = self.sweep(input.direction());

        let pressed: Vec<char> = input.newly_pressed(&self.last_keys).collect();
        if !pressed.is_empty() {
            if awake >= self.config.tuning.max_bodies {
                log::debug!("{} bodies awake, ignoring {:?}", awake, pressed);
            } else {
                for key in pressed {
                    match self.try_spawn(ShapeKind::Character(key)) {
                        Ok(_) => {}
                        Err(err) if err.is_precondition() => {
                            log::error!("Cannot spawn {:?}: {}", key, err)
                        }
                        Err(err) => log::debug!("Cannot place {:?}: {}", key, err),
                    }
                }
            }
        }

        if dt > 0.0 {
            let tuning = &self.config.tuning;
            let begins = self.physics.step(
                dt,
                tuning.velocity_iterations,
                tuning.position_iterations,
            );
            for (a, b) in begins {
                self.handle_contact(a, b);
            }
        }

        self.last_keys.clone_from(&input.held_keys);
        self.ticks += 1;
    }

    fn age_explosions(&mut self, dt: f32) {
        self.explosions
            .retain_mut(|explosion| explosion.advance(dt) == ExplosionState::Exploding);
    }

    /// Explode bodies at the threshold and apply this tick's force to the rest.
    ///
    /// Returns the number of surviving dynamic bodies that are awake.
    fn sweep(&mut self, direction: Vec2) -> usize {
        let threshold = self.config.tuning.destroy_threshold;
        let doomed: Vec<ModelId> = self
            .models
            .iter()
            .filter(|(_, entry)| {
                !entry.model.kind().is_ground() && entry.model.collisions() >= threshold
            })
            .map(|(id, _)| *id)
            .collect();
        for id in doomed {
            self.explode(id);
        }

        let force = direction * self.config.tuning.direction_force;
        let mut awake = 0;
        for entry in self.models.values() {
            if entry.model.kind().is_ground() {
                continue;
            }
            self.physics.reset_forces(entry.handle);
            if force != Vec2::ZERO {
                self.physics.add_force(entry.handle, force);
            }
            if !self.physics.is_sleeping(entry.handle) {
                awake += 1;
            }
        }
        awake
    }

    /// Replace a body with one particle per fixture
    fn explode(&mut self, id: ModelId) {
        let Some(entry) = self.models.remove(&id) else {
            return;
        };
        let transform = self.physics.transform(entry.handle);
        let outlines = self.physics.fixture_outlines(entry.handle);
        self.physics.remove(entry.handle);

        let (Some(transform), Some(asset)) = (transform, entry.model.asset().cloned()) else {
            return;
        };

        let max_velocity = self.config.tuning.max_particle_velocity;
        let max_spin = self.config.tuning.max_particle_spin;
        let rng = &mut self.rng;
        let particles: Vec<Particle> = outlines
            .into_iter()
            .map(|vertices| Particle {
                vertices,
                position: transform.position,
                angle: transform.angle,
                velocity: Vec2::new(symmetric(rng, max_velocity), symmetric(rng, max_velocity)),
                angular_velocity: up_to(rng, max_spin),
            })
            .collect();

        log::info!(
            "{} '{}' destroyed after {} collisions ({} particles)",
            id,
            asset.name,
            entry.model.collisions(),
            particles.len()
        );
        self.explosions.push(Explosion::new(
            asset,
            particles,
            self.config.tuning.explosion_frames,
        ));
    }

    /// Spawned shapes in id order (walls are not drawn)
    pub fn sprites(&self) -> Vec<Sprite> {
        self.models
            .iter()
            .filter_map(|(id, entry)| {
                let asset = entry.model.asset()?.clone();
                let transform = self.physics.transform(entry.handle)?;
                Some(Sprite {
                    model: *id,
                    kind: entry.model.kind(),
                    asset,
                    size: entry.model.size(),
                    position: transform.position,
                    angle: normalize_angle(transform.angle),
                    center: transform.center,
                })
            })
            .collect()
    }

    pub fn explosion_views(&self) -> Vec<ExplosionView> {
        self.explosions
            .iter()
            .map(|explosion| ExplosionView {
                asset: explosion.asset().clone(),
                percent_elapsed: explosion.percent_elapsed(),
                particles: explosion
                    .particles()
                    .iter()
                    .map(Particle::world_vertices)
                    .collect(),
            })
            .collect()
    }

    /// Drain audio cues not yet handed out. Each cue is returned once.
    pub fn take_audio_cues(&mut self) -> Vec<AudioCue> {
        let mut cues = Vec::new();
        for entry in self.models.values_mut() {
            let Some(name) = entry.model.asset().map(|asset| asset.name.clone()) else {
                continue;
            };
            if entry.model.take_spawn_cue() {
                cues.push(AudioCue::Created { name });
            }
        }
        for explosion in &mut self.explosions {
            if explosion.take_destroyed_cue() {
                cues.push(AudioCue::Destroyed {
                    name: explosion.asset().name.clone(),
                });
            }
        }
        cues
    }
}
