use rand::Rng;
use std::collections::{HashMap, HashSet};

use crate::models::{ActivityLevel, Entity};

/// Oldest prior match generated, in seconds before `now`
const MAX_HISTORY_AGE_SECS: i64 = 1200;
/// Generated participant ids are drawn from `user0..user{USER_ID_SPACE - 1}`
const USER_ID_SPACE: u32 = 1000;

/// Synthesizes rooms for demos and benchmarks
///
/// Attribute ranges: mic 1-15, audience 10-209, wait 10-309s, history 0-19.
/// 30% of rooms carry 1-3 prior matches from the last 20 minutes and 20% block
/// 1-2 participants.
pub struct PoolGenerator<R: Rng> {
    rng: R,
    now: i64,
}

impl<R: Rng> PoolGenerator<R> {
    pub fn new(rng: R, now: i64) -> Self {
        Self { rng, now }
    }

    pub fn generate_entity(&mut self, id: impl Into<String>) -> Entity {
        let mut last_matched = HashMap::new();
        if self.rng.gen_bool(0.3) {
            for _ in 0..self.rng.gen_range(1..=3) {
                let age = self.rng.gen_range(0..=MAX_HISTORY_AGE_SECS);
                last_matched.insert(self.random_user_id(), self.now - age);
            }
        }

        let mut blacklist = HashSet::new();
        if self.rng.gen_bool(0.2) {
            for _ in 0..self.rng.gen_range(1..=2) {
                blacklist.insert(self.random_user_id());
            }
        }

        Entity {
            id: id.into(),
            last_matched,
            blacklist,
            mic_count: self.rng.gen_range(1..=15),
            audience_count: self.rng.gen_range(10..210),
            wait_seconds: self.rng.gen_range(10..310),
            match_history: self.rng.gen_range(0..20),
            activity_level: ActivityLevel::ALL[self.rng.gen_range(0..ActivityLevel::ALL.len())],
        }
    }

    /// Rooms named `entity_001`, `entity_002`, ...
    pub fn generate_pool(&mut self, count: usize) -> Vec<Entity> {
        (1..=count)
            .map(|i| self.generate_entity(format!("entity_{:03}", i)))
            .collect()
    }

    fn random_user_id(&mut self) -> String {
        format!("user{}", self.rng.gen_range(0..USER_ID_SPACE))
    }
}
