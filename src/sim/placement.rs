//! Placement solver
//!
//! Finds a free axis-aligned window for a new shape. The scan starts at a
//! random window and walks the world in window-sized steps: right along the
//! row, wrapping to the next row, and back to the first row after the last.
//! It gives up once it comes back around to the row it started on.

use glam::Vec2;
use rand::Rng;

use super::bounds::Rect;

/// Why no window was returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementFailure {
    /// Every scanned window overlapped an existing body
    Full,
    /// The window is empty or larger than the bounds (caller precondition)
    DoesNotFit,
}

/// Find a free window of `size` inside `bounds` that overlaps none of `occupied`.
///
/// Pure apart from the RNG draw for the starting window.
pub fn try_place<R: Rng + ?Sized>(
    bounds: &Rect,
    size: Vec2,
    occupied: &[Rect],
    rng: &mut R,
) -> Result<Rect, PlacementFailure> {
    if !fits(bounds, size) {
        return Err(PlacementFailure::DoesNotFit);
    }

    let slack = bounds.size() - size;
    let origin = bounds.min
        + Vec2::new(
            rng.random_range(0.0..=slack.x),
            rng.random_range(0.0..=slack.y),
        );
    let start = Rect::from_origin_size(origin, size);

    scan_from(bounds, start, occupied).ok_or(PlacementFailure::Full)
}

/// Deterministic part of [`try_place`]: scan from a given starting window
pub fn scan_from(bounds: &Rect, start: Rect, occupied: &[Rect]) -> Option<Rect> {
    let size = start.size();
    if !fits(bounds, size) {
        return None;
    }

    let mut window = start;
    let mut wrapped = false;

    loop {
        if !occupied.iter().any(|aabb| aabb.overlaps(&window)) {
            return Some(window);
        }

        // Move the window on
        window.min.x += size.x;
        if window.min.x + size.x > bounds.max.x {
            // Back to the start of the next row
            window.min.x = bounds.min.x;
            window.min.y += size.y;

            if window.min.y + size.y > bounds.max.y {
                if wrapped {
                    return None;
                }
                // Back to the first row
                wrapped = true;
                window.min.y = bounds.min.y;
            }

            if wrapped && window.min.y >= start.min.y {
                // Looped through every row without finding free space
                return None;
            }
        }
        window.max = window.min + size;
    }
}

fn fits(bounds: &Rect, size: Vec2) -> bool {
    size.x > 0.0
        && size.y > 0.0
        && size.is_finite()
        && size.x <= bounds.width()
        && size.y <= bounds.height()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn world() -> Rect {
        Rect::new(Vec2::ZERO, Vec2::new(96.0, 54.0))
    }

    #[test]
    fn test_empty_world_places_first_attempt() {
        let mut rng = Pcg32::seed_from_u64(7);
        let size = Vec2::splat(4.0 / 75.0);
        let window = try_place(&world(), size, &[], &mut rng).expect("empty world has room");
        assert!(window.min.x >= 0.0 && window.max.x <= 96.0 + 1e-3);
        assert!(window.min.y >= 0.0 && window.max.y <= 54.0 + 1e-3);
        assert!((window.size() - size).length() < 1e-4);
    }

    #[test]
    fn test_skips_occupied_window() {
        let bounds = Rect::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let start = Rect::from_origin_size(Vec2::ZERO, Vec2::splat(2.0));
        let occupied = [Rect::from_origin_size(Vec2::ZERO, Vec2::splat(3.0))];

        let window = scan_from(&bounds, start, &occupied).expect("room to the right");
        assert_eq!(window.min, Vec2::new(4.0, 0.0));
        assert!(!window.overlaps(&occupied[0]));
    }

    #[test]
    fn test_wraps_to_next_row() {
        let bounds = Rect::new(Vec2::ZERO, Vec2::new(4.0, 4.0));
        let start = Rect::from_origin_size(Vec2::ZERO, Vec2::splat(2.0));
        // Whole bottom row blocked
        let occupied = [Rect::new(Vec2::ZERO, Vec2::new(4.0, 2.0))];

        let window = scan_from(&bounds, start, &occupied).expect("top row free");
        assert_eq!(window.min, Vec2::new(0.0, 2.0));
    }

    #[test]
    fn test_wraps_to_first_row() {
        let bounds = Rect::new(Vec2::ZERO, Vec2::new(4.0, 4.0));
        let start = Rect::from_origin_size(Vec2::new(0.0, 2.0), Vec2::splat(2.0));
        // Top row blocked, bottom row free
        let occupied = [Rect::new(Vec2::new(0.0, 2.0), Vec2::new(4.0, 4.0))];

        let window = scan_from(&bounds, start, &occupied).expect("bottom row free");
        assert_eq!(window.min, Vec2::ZERO);
    }

    #[test]
    fn test_full_world_fails() {
        let mut rng = Pcg32::seed_from_u64(1);
        let occupied = [world()];
        assert_eq!(
            try_place(&world(), Vec2::splat(2.0), &occupied, &mut rng),
            Err(PlacementFailure::Full)
        );
    }

    #[test]
    fn test_oversized_shape_rejected() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(
            try_place(&world(), Vec2::new(100.0, 1.0), &[], &mut rng),
            Err(PlacementFailure::DoesNotFit)
        );
        assert_eq!(
            try_place(&world(), Vec2::new(0.0, 1.0), &[], &mut rng),
            Err(PlacementFailure::DoesNotFit)
        );
    }

    fn occupied_strategy() -> impl Strategy<Value = Vec<Rect>> {
        let boxes = (0.0f32..90.0, 0.0f32..50.0, 0.5f32..6.0, 0.5f32..4.0);
        prop::collection::vec(boxes, 0..40).prop_map(|boxes| {
            boxes
                .into_iter()
                .map(|(x, y, w, h)| Rect::from_origin_size(Vec2::new(x, y), Vec2::new(w, h)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn placed_window_is_free_and_in_bounds(
            occupied in occupied_strategy(),
            w in 0.5f32..8.0,
            h in 0.5f32..8.0,
            seed in any::<u64>(),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            if let Ok(window) = try_place(&world(), Vec2::new(w, h), &occupied, &mut rng) {
                prop_assert!(window.min.x >= 0.0 && window.min.y >= 0.0);
                prop_assert!(window.max.x <= 96.0 + 1e-3 && window.max.y <= 54.0 + 1e-3);
                for aabb in &occupied {
                    prop_assert!(!window.overlaps(aabb));
                }
            }
        }
    }
}
