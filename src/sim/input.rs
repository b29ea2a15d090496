//! Per-tick input snapshot

use std::collections::BTreeSet;

use glam::Vec2;

/// Input state sampled for a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Character keys currently held down
    pub held_keys: BTreeSet<char>,
}

impl InputSnapshot {
    /// Snapshot with only the given keys held
    pub fn with_keys<I: IntoIterator<Item = char>>(keys: I) -> Self {
        Self {
            held_keys: keys.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn set_key(&mut self, key: char, pressed: bool) {
        if pressed {
            self.held_keys.insert(key);
        } else {
            self.held_keys.remove(&key);
        }
    }

    /// Sum of the active directional unit vectors (y points up)
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.right {
            dir.x += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.up {
            dir.y += 1.0;
        }
        if self.down {
            dir.y -= 1.0;
        }
        dir
    }

    /// Keys held now that were not held in `last`, in key order
    pub fn newly_pressed<'a>(
        &'a self,
        last: &'a BTreeSet<char>,
    ) -> impl Iterator<Item = char> + 'a {
        self.held_keys.difference(last).copied()
    }
}
