use std::collections::HashMap;

use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::matcher::Matcher;
use crate::models::Entity;

/// Errors that can occur when batch matching
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("Length mismatch: {seekers} seekers but {identifiers} identifiers")]
    LengthMismatch { seekers: usize, identifiers: usize },
}

/// Seeker room id -> selected candidate
pub type BatchMatches<'a> = HashMap<String, &'a Entity>;

/// Matches many seekers against one shared, read-only pool
///
/// Every seeker is matched independently, so a candidate can be chosen by more
/// than one seeker. The whole batch is evaluated against a single timestamp.
#[derive(Debug, Clone)]
pub struct BatchMatcher {
    matcher: Matcher,
    parallel: bool,
}

impl BatchMatcher {
    pub fn new(matcher: Matcher, parallel: bool) -> Self {
        Self { matcher, parallel }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Match every present seeker at position `i` with `seeker_ids[i]`
    ///
    /// Absent seekers and seekers without an eligible candidate get no entry.
    pub fn batch_match<'a, S>(
        &self,
        seekers: &[Option<&Entity>],
        pool: &'a [Entity],
        seeker_ids: &[S],
    ) -> Result<BatchMatches<'a>, BatchError>
    where
        S: AsRef<str> + Sync,
    {
        let now = Utc::now().timestamp();
        self.run(seekers, pool, seeker_ids, now, |_| rand::thread_rng())
    }

    /// Reproducible batch: seeker `i` draws from a generator seeded with `seed + i`
    pub fn batch_match_seeded<'a, S>(
        &self,
        seekers: &[Option<&Entity>],
        pool: &'a [Entity],
        seeker_ids: &[S],
        now: i64,
        seed: u64,
    ) -> Result<BatchMatches<'a>, BatchError>
    where
        S: AsRef<str> + Sync,
    {
        self.run(seekers, pool, seeker_ids, now, |index| {
            StdRng::seed_from_u64(seed.wrapping_add(index as u64))
        })
    }

    /// Sequential batch sharing one caller-supplied generator
    pub fn batch_match_at_with<'a, S, R>(
        &self,
        seekers: &[Option<&Entity>],
        pool: &'a [Entity],
        seeker_ids: &[S],
        now: i64,
        rng: &mut R,
    ) -> Result<BatchMatches<'a>, BatchError>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        check_lengths(seekers.len(), seeker_ids.len())?;

        let mut matches = HashMap::with_capacity(seekers.len());
        for (seeker, seeker_id) in seekers.iter().zip(seeker_ids) {
            let Some(seeker) = seeker else { continue };
            if let Some(candidate) = self.matcher.find_match_with(seeker, pool, seeker_id.as_ref(), now, &mut *rng) {
                matches.insert(seeker.id.clone(), candidate);
            }
        }

        info!(seekers = seekers.len(), matched = matches.len(), "Batch match complete");
        Ok(matches)
    }

    fn run<'a, S, G, R>(
        &self,
        seekers: &[Option<&Entity>],
        pool: &'a [Entity],
        seeker_ids: &[S],
        now: i64,
        make_rng: G,
    ) -> Result<BatchMatches<'a>, BatchError>
    where
        S: AsRef<str> + Sync,
        G: Fn(usize) -> R + Sync,
        R: Rng,
    {
        check_lengths(seekers.len(), seeker_ids.len())?;

        let match_one = |index: usize, seeker: &Option<&Entity>, seeker_id: &S| -> Option<(String, &'a Entity)> {
            let seeker = (*seeker)?;
            let mut rng = make_rng(index);
            self.matcher
                .find_match_with(seeker, pool, seeker_id.as_ref(), now, &mut rng)
                .map(|candidate| (seeker.id.clone(), candidate))
        };

        // Collected in seeker order so duplicate ids resolve the same way in both modes
        let pairs: Vec<Option<(String, &'a Entity)>> = if self.parallel {
            seekers
                .par_iter()
                .zip(seeker_ids.par_iter())
                .enumerate()
                .map(|(index, (seeker, seeker_id))| match_one(index, seeker, seeker_id))
                .collect()
        } else {
            seekers
                .iter()
                .zip(seeker_ids)
                .enumerate()
                .map(|(index, (seeker, seeker_id))| match_one(index, seeker, seeker_id))
                .collect()
        };

        let matches: BatchMatches<'a> = pairs.into_iter().flatten().collect();

        info!(
            seekers = seekers.len(),
            matched = matches.len(),
            parallel = self.parallel,
            "Batch match complete"
        );
        Ok(matches)
    }
}

impl Default for BatchMatcher {
    fn default() -> Self {
        Self::new(Matcher::default(), true)
    }
}

fn check_lengths(seekers: usize, identifiers: usize) -> Result<(), BatchError> {
    if seekers != identifiers {
        warn!(seekers, identifiers, "Rejecting batch with mismatched seeker identifiers");
        return Err(BatchError::LengthMismatch { seekers, identifiers });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn create_room(id: &str, mic_count: u16, wait_seconds: u16) -> Entity {
        Entity {
            mic_count,
            audience_count: 50,
            wait_seconds,
            ..Entity::new(id)
        }
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let batch = BatchMatcher::default();
        let seekers = [create_room("a", 3, 80), create_room("b", 3, 80), create_room("c", 3, 80)];
        let refs: Vec<Option<&Entity>> = seekers.iter().map(Some).collect();
        let pool = vec![create_room("p", 3, 80)];

        let result = batch.batch_match(&refs, &pool, &["user1", "user2"]);

        assert_eq!(
            result.unwrap_err(),
            BatchError::LengthMismatch { seekers: 3, identifiers: 2 }
        );
    }

    #[test]
    fn test_absent_and_unmatched_seekers_skipped() {
        let batch = BatchMatcher::new(Matcher::default(), false);
        let matched = create_room("room_a", 3, 80);
        let unmatched = create_room("room_b", 3, 80);
        let seekers = [Some(&matched), None, Some(&unmatched)];

        let mut candidate = create_room("candidate", 3, 80);
        candidate.blacklist.insert("user_b".to_string());
        let pool = vec![candidate];

        let result = batch
            .batch_match_seeded(&seekers, &pool, &["user_a", "user_x", "user_b"], NOW, 7)
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result["room_a"].id, "candidate");
    }

    #[test]
    fn test_same_candidate_shared_across_seekers() {
        let seekers: Vec<Entity> = (0..4).map(|i| create_room(&format!("room_{}", i), 3, 80)).collect();
        let refs: Vec<Option<&Entity>> = seekers.iter().map(Some).collect();
        let ids: Vec<String> = (0..4).map(|i| format!("user_{}", i)).collect();
        let pool = vec![create_room("only", 3, 80)];

        let result = BatchMatcher::default().batch_match(&refs, &pool, &ids).unwrap();

        assert_eq!(result.len(), 4);
        assert!(result.values().all(|candidate| candidate.id == "only"));
    }

    #[test]
    fn test_seeded_batch_same_in_both_modes() {
        let seekers: Vec<Entity> = (0..16).map(|i| create_room(&format!("room_{}", i), 3, 80)).collect();
        let refs: Vec<Option<&Entity>> = seekers.iter().map(Some).collect();
        let ids: Vec<String> = (0..16).map(|i| format!("user_{}", i)).collect();
        let pool: Vec<Entity> = (0..5).map(|i| create_room(&format!("pool_{}", i), 3, 80)).collect();

        let sequential = BatchMatcher::new(Matcher::default(), false)
            .batch_match_seeded(&refs, &pool, &ids, NOW, 99)
            .unwrap();
        let parallel = BatchMatcher::new(Matcher::default(), true)
            .batch_match_seeded(&refs, &pool, &ids, NOW, 99)
            .unwrap();

        assert_eq!(sequential.len(), 16);
        for (seeker_id, candidate) in &sequential {
            assert_eq!(parallel[seeker_id].id, candidate.id);
        }
    }
}
