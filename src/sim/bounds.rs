//! Axis-aligned rectangles used for world bounds and placement windows

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle (`min` inclusive corner, `max` opposite corner)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle with its lower corner at `origin`
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self::new(origin, origin + size)
    }

    /// An empty rectangle that any `union` will replace
    pub fn empty() -> Self {
        Self::new(Vec2::splat(f32::MAX), Vec2::splat(f32::MIN))
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// True when both extents are strictly positive
    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Interiors intersect (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// `other` lies entirely inside `self`
    pub fn contains(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Moved in by `margin` on every side (out for a negative margin)
    pub fn shrunk(&self, margin: f32) -> Rect {
        Rect::new(self.min + Vec2::splat(margin), self.max - Vec2::splat(margin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shrunk() {
        let r = Rect::from_origin_size(Vec2::ZERO, Vec2::splat(2.0));
        assert_eq!(r.shrunk(0.5), Rect::new(Vec2::splat(0.5), Vec2::splat(1.5)));
        assert_eq!(r.shrunk(-1.0), Rect::new(Vec2::splat(-1.0), Vec2::splat(3.0)));
    }

    #[test]
    fn test_overlap_excludes_touching() {
        let a = Rect::from_origin_size(Vec2::ZERO, Vec2::splat(2.0));
        let b = Rect::from_origin_size(Vec2::new(2.0, 0.0), Vec2::splat(2.0));
        let c = Rect::from_origin_size(Vec2::new(1.0, 1.0), Vec2::splat(2.0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_union_from_empty() {
        let a = Rect::from_origin_size(Vec2::new(1.0, 1.0), Vec2::splat(1.0));
        let u = Rect::empty().union(&a);
        assert_eq!(u, a);
        assert!(!Rect::empty().has_area());
    }
}
