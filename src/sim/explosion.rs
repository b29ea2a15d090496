//! Particle explosions left behind by destroyed bodies
//!
//! An explosion is aged once per tick and retired when its frame counter
//! reaches the configured lifetime. There is no other way to remove one.

use std::sync::Arc;

use glam::Vec2;

use crate::catalogue::ShapeAsset;

/// One fragment of a destroyed body (one per fixture)
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Local-space outline copied from the fixture
    pub vertices: Vec<Vec2>,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    /// Radians per second
    pub angular_velocity: f32,
}

impl Particle {
    /// Integrate the transform forward by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.angle += self.angular_velocity * dt;
    }

    /// Outline in world space
    pub fn world_vertices(&self) -> Vec<Vec2> {
        let rotation = Vec2::from_angle(self.angle);
        self.vertices
            .iter()
            .map(|v| self.position + rotation.rotate(*v))
            .collect()
    }
}

/// Result of aging an explosion by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplosionState {
    Exploding,
    Retired,
}

/// A live explosion
#[derive(Debug, Clone)]
pub struct Explosion {
    asset: Arc<ShapeAsset>,
    particles: Vec<Particle>,
    frames: u32,
    lifetime: u32,
    /// Destruction cue handed to the audio collaborator
    destroyed_cue_played: bool,
}

impl Explosion {
    pub fn new(asset: Arc<ShapeAsset>, particles: Vec<Particle>, lifetime: u32) -> Self {
        Self {
            asset,
            particles,
            frames: 0,
            lifetime: lifetime.max(1),
            destroyed_cue_played: false,
        }
    }

    pub fn asset(&self) -> &Arc<ShapeAsset> {
        &self.asset
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Fraction of the lifetime elapsed, 0.0 at creation and 1.0 at retirement
    pub fn percent_elapsed(&self) -> f32 {
        (self.frames as f32 / self.lifetime as f32).min(1.0)
    }

    /// Age by one tick of `dt` seconds
    pub fn advance(&mut self, dt: f32) -> ExplosionState {
        self.frames += 1;
        if self.frames >= self.lifetime {
            return ExplosionState::Retired;
        }
        for particle in &mut self.particles {
            particle.advance(dt);
        }
        ExplosionState::Exploding
    }

    pub fn destroyed_cue_played(&self) -> bool {
        self.destroyed_cue_played
    }

    /// Marks the destruction cue as played; true only on the first call
    pub(crate) fn take_destroyed_cue(&mut self) -> bool {
        !std::mem::replace(&mut self.destroyed_cue_played, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{Colour, Size};

    fn asset() -> Arc<ShapeAsset> {
        Arc::new(ShapeAsset {
            name: "box".into(),
            polygons: vec![vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y]],
            size: Size::new(75.0, 75.0),
            colour: Colour { r: 1, g: 2, b: 3 },
        })
    }

    fn particle() -> Particle {
        Particle {
            vertices: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            position: Vec2::new(10.0, 10.0),
            angle: 0.0,
            velocity: Vec2::new(6.0, -3.0),
            angular_velocity: 1.0,
        }
    }

    #[test]
    fn test_particle_integrates_by_dt() {
        let mut p = particle();
        p.advance(0.5);
        assert_eq!(p.position, Vec2::new(13.0, 8.5));
        assert!((p.angle - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_world_vertices_apply_transform() {
        let mut p = particle();
        p.angle = std::f32::consts::FRAC_PI_2;
        let verts = p.world_vertices();
        // (1, 0) rotated a quarter turn lands on (0, 1)
        assert!((verts[1] - Vec2::new(10.0, 11.0)).length() < 1e-5);
        assert_eq!(verts[0], Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_retires_at_lifetime() {
        let mut explosion = Explosion::new(asset(), vec![particle()], 90);
        assert_eq!(explosion.frames(), 0);
        assert_eq!(explosion.percent_elapsed(), 0.0);

        let mut last_percent = 0.0;
        for _ in 0..89 {
            assert_eq!(explosion.advance(1.0 / 60.0), ExplosionState::Exploding);
            assert!(explosion.percent_elapsed() >= last_percent);
            last_percent = explosion.percent_elapsed();
        }
        assert_eq!(explosion.frames(), 89);
        assert_eq!(explosion.advance(1.0 / 60.0), ExplosionState::Retired);
        assert_eq!(explosion.frames(), 90);
        assert_eq!(explosion.percent_elapsed(), 1.0);
    }

    #[test]
    fn test_destroyed_cue_once() {
        let mut explosion = Explosion::new(asset(), Vec::new(), 90);
        assert!(explosion.take_destroyed_cue());
        assert!(!explosion.take_destroyed_cue());
        assert!(explosion.destroyed_cue_played());
    }
}
