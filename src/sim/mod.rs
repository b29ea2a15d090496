//! Simulation module
//!
//! Everything that runs inside a physics tick lives here:
//! - Seeded RNG only, so a world built from the same seed replays the same way
//! - Stable iteration order (models are kept ordered by id)
//! - No rendering or audio dependencies; those pull snapshots through [`shared`]

pub mod bounds;
pub mod explosion;
pub mod input;
pub mod model;
pub mod physics;
pub mod placement;
pub mod shared;
pub mod world;

pub use bounds::Rect;
pub use explosion::{Explosion, ExplosionState, Particle};
pub use input::InputSnapshot;
pub use model::{Clock, Debounce, ManualClock, Model, ModelId, MonotonicClock};
pub use physics::{BodyTransform, FixtureMaterial, PhysicsWorld};
pub use placement::{PlacementFailure, scan_from, try_place};
pub use shared::{PhysicsDriver, RenderView, Sandbox, SharedInput, SharedWorld};
pub use world::{AudioCue, ExplosionView, Sprite, World};
