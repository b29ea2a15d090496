//! Shape catalogue
//!
//! Maps a character key to one or more immutable shape definitions. The
//! simulation only reads from it; loading and sprite lookup live outside the
//! core, so the catalogue is a trait with one in-memory implementation.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::CatalogueError;

/// Display colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Width and height
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn scaled(&self, scale: f32) -> Self {
        Self::new(self.width * scale, self.height * scale)
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// An immutable shape definition
///
/// Polygons are in local coordinates normalised so that the larger side of
/// the shape spans 0..1; the world multiplies them by the larger scaled side.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeAsset {
    pub name: String,
    pub polygons: Vec<Vec<Vec2>>,
    /// Reference size (pixels)
    pub size: Size,
    pub colour: Colour,
}

/// What a model represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Static boundary wall
    Ground,
    /// Spawned shape for a key press
    Character(char),
}

impl ShapeKind {
    /// The catalogue key to resolve, if this kind has an asset at all
    pub fn character_key(&self) -> Option<char> {
        match self {
            ShapeKind::Ground => None,
            ShapeKind::Character(key) => Some(*key),
        }
    }

    pub fn is_ground(&self) -> bool {
        matches!(self, ShapeKind::Ground)
    }
}

/// True if `polygon` has at least three distinct, finite vertices
pub fn is_usable_polygon(polygon: &[Vec2]) -> bool {
    if !polygon.iter().all(|v| v.is_finite()) {
        return false;
    }
    let mut distinct: Vec<Vec2> = Vec::with_capacity(3);
    for v in polygon {
        if !distinct.contains(v) {
            distinct.push(*v);
            if distinct.len() == 3 {
                return true;
            }
        }
    }
    false
}

/// Read-only shape lookup
pub trait ShapeCatalogue: Send + Sync {
    /// All variants registered for `key` (empty if the key is unsupported)
    fn variants(&self, key: char) -> &[Arc<ShapeAsset>];

    fn supports(&self, key: char) -> bool {
        !self.variants(key).is_empty()
    }
}

/// On-disk variant layout (flat `[x0, y0, x1, y1, ...]` polygons)
#[derive(Debug, Deserialize)]
struct SpriteRecord {
    #[serde(default)]
    name: Option<String>,
    polygons: Vec<Vec<f32>>,
    size: Size,
    colour: Colour,
}

/// In-memory catalogue
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogue {
    sprites: HashMap<char, Vec<Arc<ShapeAsset>>>,
}

impl StaticCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register another variant for `key`
    pub fn insert(&mut self, key: char, asset: ShapeAsset) {
        self.sprites.entry(key).or_default().push(Arc::new(asset));
    }

    /// Number of supported keys
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Parse the sprite JSON: `{ "A": [ { polygons, size, colour, name? } ] }`
    pub fn from_json_str(json: &str) -> Result<Self, CatalogueError> {
        let records: BTreeMap<String, Vec<SpriteRecord>> = serde_json::from_str(json)?;
        let mut catalogue = Self::new();

        for (key_str, variants) in records {
            let mut chars = key_str.chars();
            let key = match (chars.next(), chars.next()) {
                (Some(key), None) => key,
                _ => return Err(CatalogueError::BadKey(key_str)),
            };

            for record in variants {
                let mut polygons = Vec::with_capacity(record.polygons.len());
                for (index, coords) in record.polygons.iter().enumerate() {
                    if coords.len() % 2 != 0 || coords.len() < 6 {
                        return Err(CatalogueError::MalformedPolygon {
                            key,
                            index,
                            coords: coords.len(),
                        });
                    }
                    let polygon: Vec<Vec2> = coords
                        .chunks_exact(2)
                        .map(|xy| Vec2::new(xy[0], xy[1]))
                        .collect();
                    if !is_usable_polygon(&polygon) {
                        return Err(CatalogueError::MalformedPolygon {
                            key,
                            index,
                            coords: coords.len(),
                        });
                    }
                    polygons.push(polygon);
                }

                catalogue.insert(
                    key,
                    ShapeAsset {
                        name: record.name.unwrap_or_else(|| key_str.clone()),
                        polygons,
                        size: record.size,
                        colour: record.colour,
                    },
                );
            }
        }

        Ok(catalogue)
    }

    /// Load the sprite JSON from disk
    pub fn load(path: &Path) -> Result<Self, CatalogueError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalogue = Self::from_json_str(&json)?;
        log::info!(
            "Loaded {} shapes from {}",
            catalogue.len(),
            path.display()
        );
        Ok(catalogue)
    }

    /// A few block letters built from rectangles, for running without sprite data
    pub fn block_letters() -> Self {
        fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Vec2> {
            vec![
                Vec2::new(x0, y0),
                Vec2::new(x1, y0),
                Vec2::new(x1, y1),
                Vec2::new(x0, y1),
            ]
        }

        let letters: [(char, Vec<Vec<Vec2>>, Colour); 5] = [
            (
                'i',
                vec![rect(0.35, 0.0, 0.65, 1.0)],
                Colour { r: 231, g: 76, b: 60 },
            ),
            (
                'l',
                vec![rect(0.0, 0.0, 0.3, 1.0), rect(0.3, 0.0, 0.8, 0.3)],
                Colour { r: 46, g: 204, b: 113 },
            ),
            (
                't',
                vec![rect(0.35, 0.0, 0.65, 0.7), rect(0.0, 0.7, 1.0, 1.0)],
                Colour { r: 52, g: 152, b: 219 },
            ),
            (
                'u',
                vec![
                    rect(0.0, 0.0, 0.3, 1.0),
                    rect(0.3, 0.0, 0.7, 0.3),
                    rect(0.7, 0.0, 1.0, 1.0),
                ],
                Colour { r: 241, g: 196, b: 15 },
            ),
            (
                'o',
                vec![
                    rect(0.0, 0.0, 0.3, 1.0),
                    rect(0.3, 0.0, 0.7, 0.3),
                    rect(0.7, 0.0, 1.0, 1.0),
                    rect(0.3, 0.7, 0.7, 1.0),
                ],
                Colour { r: 155, g: 89, b: 182 },
            ),
        ];

        let mut catalogue = Self::new();
        for (key, polygons, colour) in letters {
            catalogue.insert(
                key,
                ShapeAsset {
                    name: key.to_string(),
                    polygons,
                    size: Size::new(150.0, 150.0),
                    colour,
                },
            );
        }
        catalogue
    }
}

impl ShapeCatalogue for StaticCatalogue {
    fn variants(&self, key: char) -> &[Arc<ShapeAsset>] {
        self.sprites.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}
