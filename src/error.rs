//! Error types
//!
//! Precondition violations and recoverable failures are kept apart so callers
//! can decide what to log loudly and what to drop.

use std::path::PathBuf;

/// Errors raised while loading or validating [`crate::SandboxConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read or written
    #[error("config io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the config schema
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A numeric field is outside its accepted range
    #[error("{field}({value}) must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Errors raised while loading a shape catalogue
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("catalogue io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalogue: {0}")]
    Parse(#[from] serde_json::Error),

    /// Catalogue keys must be exactly one character
    #[error("catalogue key \"{0}\" is not a single character")]
    BadKey(String),

    /// A polygon needs an even number of coordinates and at least three vertices
    #[error("shape '{key}' polygon {index} is malformed ({coords} coordinates)")]
    MalformedPolygon { key: char, index: usize, coords: usize },
}

/// Reasons a spawn request produced no body
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpawnError {
    /// Ground bodies are created once at construction, never on demand
    #[error("cannot dynamically add a ground body")]
    GroundNotSpawnable,

    /// The catalogue has no shape for this key
    #[error("no shape for key {0:?}")]
    UnknownShape(char),

    /// Every candidate window overlaps an existing body
    #[error("no free space for a {width}x{height} shape")]
    NoFreeSpace { width: f32, height: f32 },

    /// The scaled shape can never fit inside the world bounds
    #[error("shape {width}x{height} does not fit in a {world_width}x{world_height} world")]
    ShapeLargerThanWorld {
        width: f32,
        height: f32,
        world_width: f32,
        world_height: f32,
    },

    /// The shape produced no usable fixture or has an empty bounding box
    #[error("shape '{0}' has no usable polygon")]
    DegenerateShape(String),

    /// The body's fixtures reach past the world or into an existing body
    #[error("shape '{0}' does not stay inside its placement window")]
    ExceedsWindow(String),
}

impl SpawnError {
    /// True for failures that indicate a caller bug rather than a full world
    pub fn is_precondition(&self) -> bool {
        !matches!(self, SpawnError::NoFreeSpace { .. } | SpawnError::UnknownShape(_))
    }
}
