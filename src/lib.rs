//! Shape Smash - a 2D rigid-body keyboard sandbox
//!
//! Core modules:
//! - `sim`: Simulation core (placement, registry, collisions, explosions, tick driver)
//! - `catalogue`: Shape definitions looked up by character key
//! - `config`: Data-driven world, render and tuning settings
//! - `error`: Error types shared across the crate

pub mod catalogue;
pub mod config;
pub mod error;
pub mod sim;

pub use catalogue::{Colour, ShapeAsset, ShapeCatalogue, ShapeKind, Size, StaticCatalogue};
pub use config::SandboxConfig;
pub use error::{CatalogueError, ConfigError, SpawnError};

/// Default tuning constants (overridable through [`config::TuningConfig`])
pub mod consts {
    /// Physics timer interval (~60 Hz)
    pub const TICK_INTERVAL_MS: u64 = 17;

    /// Scale applied to a shape's reference size (pixels -> world units)
    pub const CHARACTER_SCALE: f32 = 1.0 / 75.0;
    /// Magnitude of each directional input contribution
    pub const DIRECTION_FORCE: f32 = 200.0;

    /// Collisions needed before a body explodes
    pub const DESTROY_THRESHOLD: u32 = 5;
    /// Minimum time between two counted collisions of one model
    pub const COLLISION_DEBOUNCE_MS: u64 = 100;
    /// Explosion lifetime in ticks (1.5 seconds at 60 Hz)
    pub const EXPLOSION_FRAMES: u32 = 90;
    /// Spawning pauses while this many dynamic bodies are awake
    pub const MAX_BODIES: usize = 100;

    /// Particle speed range is [-MAX, MAX) on each axis
    pub const MAX_PARTICLE_VELOCITY: f32 = 6.0;
    /// Particle spin range is [0, MAX) radians per second
    pub const MAX_PARTICLE_SPIN: f32 = 1.5;

    /// Spawn force ranges: x in [-X, X), y in [0, Y), torque in [-T, T)
    pub const SPAWN_FORCE_X: f32 = 1500.0;
    pub const SPAWN_FORCE_Y: f32 = 3000.0;
    pub const SPAWN_TORQUE: f32 = 500.0;

    /// Fixture material
    pub const BODY_DENSITY: f32 = 1.0;
    pub const BODY_FRICTION: f32 = 0.30;
    pub const BODY_RESTITUTION: f32 = 0.5;

    /// Solver iterations per step
    pub const VELOCITY_ITERATIONS: usize = 6;
    pub const POSITION_ITERATIONS: usize = 2;

    /// Half thickness of the boundary walls
    pub const WALL_HALF_THICKNESS: f32 = 0.1;
}

/// Normalized angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 0.0001);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 0.0001);
        assert!((normalize_angle(-PI) - PI).abs() < 0.0001);
        assert!((normalize_angle(0.25) - 0.25).abs() < 0.0001);
    }
}
