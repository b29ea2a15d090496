//! Simulation models and collision bookkeeping
//!
//! Every physics body owns exactly one [`Model`]. Models live in the world's
//! registry keyed by [`ModelId`]; bodies only carry the id in their user data.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::catalogue::{ShapeAsset, ShapeKind, Size};

/// Stable handle of a model in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(pub u32);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic time source for debouncing
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed epoch
    fn now(&self) -> Duration;
}

/// Wall clock measured from its creation
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Hand-driven clock for deterministic runs and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, at: Duration) {
        self.millis.store(at.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Accepts a call only if `interval` has passed since the last accepted one
#[derive(Debug, Clone)]
pub struct Debounce {
    interval: Duration,
    last_accepted: Option<Duration>,
}

impl Debounce {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: None,
        }
    }

    /// Returns true (and records `now`) if the call is let through
    pub fn should_call(&mut self, now: Duration) -> bool {
        let ready = match self.last_accepted {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.interval,
        };
        if ready {
            self.last_accepted = Some(now);
        }
        ready
    }
}

/// Per-body simulation state
#[derive(Debug, Clone)]
pub struct Model {
    kind: ShapeKind,
    /// Size in simulation units
    size: Size,
    /// None for ground bodies
    asset: Option<Arc<ShapeAsset>>,
    collisions: u32,
    debounce: Debounce,
    /// Set the first time the render path sees this model
    spawn_cue_played: bool,
}

impl Model {
    pub fn new(
        kind: ShapeKind,
        size: Size,
        asset: Option<Arc<ShapeAsset>>,
        debounce: Duration,
    ) -> Self {
        Self {
            kind,
            size,
            asset,
            collisions: 0,
            debounce: Debounce::new(debounce),
            spawn_cue_played: false,
        }
    }

    /// Ground model for a boundary wall
    pub fn ground(size: Size) -> Self {
        Self::new(ShapeKind::Ground, size, None, Duration::ZERO)
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn asset(&self) -> Option<&Arc<ShapeAsset>> {
        self.asset.as_ref()
    }

    pub fn collisions(&self) -> u32 {
        self.collisions
    }

    /// Count a contact unless one was counted less than the debounce interval ago
    pub fn record_collision(&mut self, now: Duration) -> u32 {
        if self.debounce.should_call(now) {
            self.collisions += 1;
        }
        self.collisions
    }

    pub fn spawn_cue_played(&self) -> bool {
        self.spawn_cue_played
    }

    /// Marks the creation cue as played; true only on the first call
    pub(crate) fn take_spawn_cue(&mut self) -> bool {
        !std::mem::replace(&mut self.spawn_cue_played, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DEBOUNCE: Duration = Duration::from_millis(100);

    fn model() -> Model {
        Model::new(ShapeKind::Character('a'), Size::new(1.0, 1.0), None, DEBOUNCE)
    }

    #[test]
    fn test_record_collision_debounced() {
        let mut m = model();
        assert_eq!(m.record_collision(Duration::from_millis(0)), 1);
        // Same contact seen again within the window
        assert_eq!(m.record_collision(Duration::from_millis(16)), 1);
        assert_eq!(m.record_collision(Duration::from_millis(99)), 1);
        assert_eq!(m.record_collision(Duration::from_millis(100)), 2);
    }

    #[test]
    fn test_five_spaced_contacts_reach_threshold() {
        let mut m = model();
        for i in 0..5 {
            m.record_collision(Duration::from_millis(150 * i));
        }
        assert_eq!(m.collisions(), 5);
    }

    #[test]
    fn test_spawn_cue_fires_once() {
        let mut m = model();
        assert!(!m.spawn_cue_played());
        assert!(m.take_spawn_cue());
        assert!(!m.take_spawn_cue());
        assert!(m.spawn_cue_played());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(120));
        assert_eq!(clock.now(), Duration::from_millis(120));
        clock.set(Duration::from_secs(2));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    proptest! {
        #[test]
        fn accepted_calls_are_spaced(steps in prop::collection::vec(0u64..60, 1..200)) {
            let mut debounce = Debounce::new(DEBOUNCE);
            let mut now = Duration::ZERO;
            let mut accepted: Vec<Duration> = Vec::new();
            for step in steps {
                now += Duration::from_millis(step);
                if debounce.should_call(now) {
                    accepted.push(now);
                }
            }
            for pair in accepted.windows(2) {
                prop_assert!(pair[1] - pair[0] >= DEBOUNCE);
            }
        }
    }
}
