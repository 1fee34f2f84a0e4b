//! New-contact collision counting.

use std::collections::BTreeSet;

use bench_types::{ContactKind, ContactPair};

/// Counts newly-appearing contact pairs, split into environment and self
/// collisions.
///
/// A pair increments its counter only on the first step of each continuous
/// presence: while it persists it contributes nothing further, and a pair
/// that disappears and later reappears counts again. Only the previous
/// step's pair set is retained for the diff.
#[derive(Debug, Clone, Default)]
pub struct CollisionTracker {
    previous: BTreeSet<ContactPair>,
    env_count: u32,
    self_count: u32,
}

impl CollisionTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one step's full contact set.
    pub fn update(&mut self, contacts: &[ContactPair]) {
        let current: BTreeSet<ContactPair> = contacts.iter().cloned().collect();

        for pair in current.difference(&self.previous) {
            match pair.kind() {
                ContactKind::Environment => self.env_count += 1,
                ContactKind::SelfCollision => self.self_count += 1,
            }
        }

        self.previous = current;
    }

    /// Environment collisions observed so far.
    #[must_use]
    pub const fn env_count(&self) -> u32 {
        self.env_count
    }

    /// Self collisions observed so far.
    #[must_use]
    pub const fn self_count(&self) -> u32 {
        self.self_count
    }
}
