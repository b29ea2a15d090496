//! Sandbox configuration
//!
//! Persisted as JSON. Missing sections and fields fall back to defaults so an
//! older file keeps loading after new tuning knobs are added.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Physics world settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Vertical gravity (negative pulls toward the bottom wall)
    pub gravity: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { gravity: -1.0 }
    }
}

/// Internal render resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Render settings that determine the world bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pixels per world unit
    pub pixels_per_unit: f32,
    /// Internal render resolution
    pub resolution: Resolution,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixels_per_unit: 20.0,
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
        }
    }
}

/// Gameplay tuning. None of these are validated against each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub character_scale: f32,
    pub direction_force: f32,
    pub destroy_threshold: u32,
    pub debounce_ms: u64,
    pub explosion_frames: u32,
    pub max_bodies: usize,
    pub max_particle_velocity: f32,
    /// Radians per second
    pub max_particle_spin: f32,
    pub spawn_force_x: f32,
    pub spawn_force_y: f32,
    pub spawn_torque: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    pub tick_interval_ms: u64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            character_scale: CHARACTER_SCALE,
            direction_force: DIRECTION_FORCE,
            destroy_threshold: DESTROY_THRESHOLD,
            debounce_ms: COLLISION_DEBOUNCE_MS,
            explosion_frames: EXPLOSION_FRAMES,
            max_bodies: MAX_BODIES,
            max_particle_velocity: MAX_PARTICLE_VELOCITY,
            max_particle_spin: MAX_PARTICLE_SPIN,
            spawn_force_x: SPAWN_FORCE_X,
            spawn_force_y: SPAWN_FORCE_Y,
            spawn_torque: SPAWN_TORQUE,
            density: BODY_DENSITY,
            friction: BODY_FRICTION,
            restitution: BODY_RESTITUTION,
            velocity_iterations: VELOCITY_ITERATIONS,
            position_iterations: POSITION_ITERATIONS,
            tick_interval_ms: TICK_INTERVAL_MS,
        }
    }
}

/// Complete sandbox configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub world: WorldConfig,
    pub render: RenderConfig,
    pub tuning: TuningConfig,
}

/// Range check in the style of `field(value) must be between min and max`
fn between<T: Into<f64> + Copy>(
    field: &'static str,
    value: T,
    min: T,
    max: T,
) -> Result<(), ConfigError> {
    let (value, min, max) = (value.into(), min.into(), max.into());
    if value < min || value > max || value.is_nan() {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl SandboxConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load a config file, writing the defaults first if none exists yet
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        log::info!("Writing default configuration to {}", path.display());
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// Reject values the simulation cannot run with.
    ///
    /// The resolution and scale limits double as the minimum world size: the
    /// smallest accepted world is 12.8 x 9.6 units.
    pub fn validate(&self) -> Result<(), ConfigError> {
        between("world.gravity", self.world.gravity, -20.0, 20.0)?;

        between("render.pixels_per_unit", self.render.pixels_per_unit, 1.0, 50.0)?;
        between(
            "render.resolution.width",
            self.render.resolution.width,
            640,
            3840,
        )?;
        between(
            "render.resolution.height",
            self.render.resolution.height,
            480,
            2160,
        )?;

        let t = &self.tuning;
        between("tuning.character_scale", t.character_scale, 0.001, 1.0)?;
        between("tuning.direction_force", t.direction_force, 0.0, 10_000.0)?;
        between("tuning.destroy_threshold", t.destroy_threshold, 1, 1000)?;
        between("tuning.explosion_frames", t.explosion_frames, 1, 6000)?;
        between("tuning.max_particle_velocity", t.max_particle_velocity, 0.0, 1000.0)?;
        between("tuning.max_particle_spin", t.max_particle_spin, 0.0, 100.0)?;
        between("tuning.density", t.density, 0.001, 1000.0)?;
        between("tuning.friction", t.friction, 0.0, 10.0)?;
        between("tuning.restitution", t.restitution, 0.0, 1.0)?;
        between("tuning.velocity_iterations", t.velocity_iterations as u32, 1, 100)?;
        between("tuning.position_iterations", t.position_iterations as u32, 0, 100)?;
        between("tuning.tick_interval_ms", t.tick_interval_ms as u32, 1, 1000)?;
        Ok(())
    }

    /// World bounds in simulation units
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.render.resolution.width as f32 / self.render.pixels_per_unit,
            self.render.resolution.height as f32 / self.render.pixels_per_unit,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SandboxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world_size(), Vec2::new(96.0, 54.0));
        assert_eq!(config.tuning.destroy_threshold, 5);
        assert_eq!(config.tuning.explosion_frames, 90);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SandboxConfig::from_json_str(r#"{ "world": { "gravity": -9.8 } }"#)
            .expect("partial config should load");
        assert_eq!(config.world.gravity, -9.8);
        assert_eq!(config.render, RenderConfig::default());
        assert_eq!(config.tuning, TuningConfig::default());
    }

    #[test]
    fn test_out_of_range_reports_field() {
        let json = r#"{ "render": { "pixels_per_unit": 80.0 } }"#;
        match SandboxConfig::from_json_str(json) {
            Err(ConfigError::OutOfRange { field, .. }) => {
                assert_eq!(field, "render.pixels_per_unit")
            }
            other => panic!("expected range error, got {:?}", other),
        }
    }

    #[test]
    fn test_too_small_world_rejected() {
        let mut config = SandboxConfig::default();
        config.render.resolution.width = 100;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "render.resolution.width",
                ..
            })
        ));
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = std::env::temp_dir().join(format!("shape-smash-config-{}", std::process::id()));
        let path = dir.join("config.json");
        let _ = std::fs::remove_file(&path);

        let created = SandboxConfig::load_or_create(&path).expect("create defaults");
        assert_eq!(created, SandboxConfig::default());
        assert!(path.exists());

        let loaded = SandboxConfig::load(&path).expect("reload");
        assert_eq!(loaded, created);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
