use chrono::Utc;
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, trace};

use crate::core::{
    filters::check_eligibility,
    scoring::calculate_match_score,
    segment::segment_for,
};
use crate::models::{Entity, MatchConfig, MatchDetail, Verdict};

/// Result of matching one seeker against a pool
#[derive(Debug)]
pub struct MatchResult<'a> {
    pub selected: Option<&'a Entity>,
    /// One record per pool member, in pool order
    pub details: Vec<MatchDetail<'a>>,
}

impl<'a> MatchResult<'a> {
    pub fn eligible_count(&self) -> usize {
        self.details.iter().filter(|d| !d.is_rejected()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.details.iter().filter(|d| d.is_rejected()).count()
    }

    /// Detail record of the selected candidate
    pub fn selected_detail(&self) -> Option<&MatchDetail<'a>> {
        let selected = self.selected?;
        self.details
            .iter()
            .find(|d| std::ptr::eq(d.candidate, selected))
    }
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Eligibility filter (blacklist, cooldown, segment gap)
/// 2. Component scoring
/// 3. Running best-score tracking
/// 4. Uniform random tie-break among the best
#[derive(Debug, Clone)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self {
            config: MatchConfig::default(),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Evaluate a single candidate against the seeker
    pub fn evaluate<'a>(
        &self,
        seeker: &Entity,
        candidate: &'a Entity,
        seeker_id: &str,
        seeker_segment: u8,
        now: i64,
    ) -> MatchDetail<'a> {
        let candidate_segment = segment_for(candidate.mic_count);

        let verdict = check_eligibility(
            candidate,
            seeker_id,
            seeker_segment,
            candidate_segment,
            &self.config,
            now,
        )
        .and_then(|()| {
            calculate_match_score(seeker, candidate, seeker_segment, candidate_segment, &self.config)
        })
        .map_or_else(|reason| Verdict::Rejected { reason }, Verdict::eligible);

        MatchDetail {
            candidate,
            seeker_segment,
            candidate_segment,
            verdict,
        }
    }

    /// Match a seeker against the pool, keeping a detail record per candidate
    ///
    /// Uses the current wall clock and the thread-local generator.
    pub fn match_detailed<'a>(&self, seeker: &Entity, pool: &'a [Entity], seeker_id: &str) -> MatchResult<'a> {
        self.match_detailed_with(
            seeker,
            pool,
            seeker_id,
            Utc::now().timestamp(),
            &mut rand::thread_rng(),
        )
    }

    /// Same as [`Matcher::match_detailed`] with an explicit clock and random source
    pub fn match_detailed_with<'a, R: Rng + ?Sized>(
        &self,
        seeker: &Entity,
        pool: &'a [Entity],
        seeker_id: &str,
        now: i64,
        rng: &mut R,
    ) -> MatchResult<'a> {
        if pool.is_empty() {
            return MatchResult {
                selected: None,
                details: Vec::new(),
            };
        }

        let mut details = Vec::with_capacity(pool.len());
        let selected = self.scan(seeker, pool, seeker_id, now, rng, |detail| details.push(detail));

        MatchResult { selected, details }
    }

    /// Match a seeker against the pool without collecting diagnostics
    pub fn find_match<'a>(&self, seeker: &Entity, pool: &'a [Entity], seeker_id: &str) -> Option<&'a Entity> {
        self.find_match_with(
            seeker,
            pool,
            seeker_id,
            Utc::now().timestamp(),
            &mut rand::thread_rng(),
        )
    }

    pub fn find_match_with<'a, R: Rng + ?Sized>(
        &self,
        seeker: &Entity,
        pool: &'a [Entity],
        seeker_id: &str,
        now: i64,
        rng: &mut R,
    ) -> Option<&'a Entity> {
        if pool.is_empty() {
            return None;
        }
        self.scan(seeker, pool, seeker_id, now, rng, |_| {})
    }

    /// Single pass over the pool. The best list is restarted whenever a strictly
    /// higher total shows up, so it always holds exactly the tied leaders.
    fn scan<'a, R, F>(
        &self,
        seeker: &Entity,
        pool: &'a [Entity],
        seeker_id: &str,
        now: i64,
        rng: &mut R,
        mut on_detail: F,
    ) -> Option<&'a Entity>
    where
        R: Rng + ?Sized,
        F: FnMut(MatchDetail<'a>),
    {
        let seeker_segment = segment_for(seeker.mic_count);
        let mut best_score: Option<i32> = None;
        let mut best: Vec<&'a Entity> = Vec::new();
        let mut rejected = 0usize;

        for candidate in pool {
            let detail = self.evaluate(seeker, candidate, seeker_id, seeker_segment, now);

            match &detail.verdict {
                Verdict::Eligible { total, .. } => match best_score {
                    Some(score) if *total < score => {}
                    Some(score) if *total == score => best.push(candidate),
                    _ => {
                        best_score = Some(*total);
                        best.clear();
                        best.push(candidate);
                    }
                },
                Verdict::Rejected { reason } => {
                    rejected += 1;
                    trace!(candidate = %candidate.id, %reason, "Candidate rejected");
                }
            }

            on_detail(detail);
        }

        let selected = best.choose(rng).copied();

        debug!(
            seeker = %seeker.id,
            pool_size = pool.len(),
            rejected,
            best_score = ?best_score,
            ties = best.len(),
            selected = ?selected.map(|e| e.id.as_str()),
            "Match scan complete"
        );

        selected
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, RejectReason};
    use rand::{rngs::StdRng, SeedableRng};

    const NOW: i64 = 1_700_000_000;

    fn create_candidate(id: &str, mic_count: u16, audience_count: u16, wait_seconds: u16) -> Entity {
        Entity {
            mic_count,
            audience_count,
            wait_seconds,
            ..Entity::new(id)
        }
    }

    fn create_seeker() -> Entity {
        create_candidate("current", 3, 50, 80)
    }

    #[test]
    fn test_empty_pool() {
        let matcher = Matcher::with_default_config();
        let mut rng = StdRng::seed_from_u64(1);

        let result = matcher.match_detailed_with(&create_seeker(), &[], "user123", NOW, &mut rng);

        assert!(result.selected.is_none());
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_highest_score_wins() {
        let matcher = Matcher::with_default_config();
        let mut rng = StdRng::seed_from_u64(1);

        let mut strong = create_candidate("strong", 2, 50, 80);
        strong.activity_level = ActivityLevel::High;
        let pool = vec![
            create_candidate("weak", 2, 40, 80),
            strong,
            create_candidate("middle", 2, 49, 80),
        ];

        let result = matcher.match_detailed_with(&create_seeker(), &pool, "user123", NOW, &mut rng);

        assert_eq!(result.selected.map(|e| e.id.as_str()), Some("strong"));
        assert_eq!(result.details.len(), 3);
        assert_eq!(result.selected_detail().and_then(|d| d.total()), Some(8 + 10 + 5 + 3));
    }

    #[test]
    fn test_all_rejected_returns_details() {
        let matcher = Matcher::with_default_config();
        let mut rng = StdRng::seed_from_u64(1);

        let mut blocked = create_candidate("blocked", 3, 50, 80);
        blocked.blacklist.insert("user123".to_string());
        let pool = vec![blocked, create_candidate("far", 15, 50, 10)];

        let result = matcher.match_detailed_with(&create_seeker(), &pool, "user123", NOW, &mut rng);

        assert!(result.selected.is_none());
        assert_eq!(result.details.len(), 2);
        assert_eq!(result.rejected_count(), 2);
        assert_eq!(result.details[0].reject_reason(), Some(&RejectReason::BlockedByCandidate));
    }

    #[test]
    fn test_rejected_detail_keeps_segments() {
        let matcher = Matcher::with_default_config();
        let seeker = create_seeker();
        let candidate = create_candidate("neighbour", 4, 50, 30);

        let detail = matcher.evaluate(&seeker, &candidate, "user123", segment_for(seeker.mic_count), NOW);

        assert_eq!(detail.seeker_segment, 1);
        assert_eq!(detail.candidate_segment, 2);
        assert!(detail.total().is_none());
        assert_eq!(
            detail.reject_reason(),
            Some(&RejectReason::SegmentMismatch { seeker_tier: 1, candidate_tier: 2 })
        );
    }

    #[test]
    fn test_single_eligible_always_selected() {
        let matcher = Matcher::with_default_config();
        let pool = vec![
            create_candidate("only", 1, 0, 0),
            create_candidate("far", 15, 50, 10),
        ];

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selected = matcher.find_match_with(&create_seeker(), &pool, "user123", NOW, &mut rng);
            assert_eq!(selected.map(|e| e.id.as_str()), Some("only"));
        }
    }

    #[test]
    fn test_find_match_agrees_with_detailed() {
        let matcher = Matcher::with_default_config();
        let pool: Vec<Entity> = (0..6)
            .map(|i| create_candidate(&format!("room_{}", i), 3, 50, 80))
            .collect();

        let detailed = matcher.match_detailed_with(&create_seeker(), &pool, "user123", NOW, &mut StdRng::seed_from_u64(9));
        let plain = matcher.find_match_with(&create_seeker(), &pool, "user123", NOW, &mut StdRng::seed_from_u64(9));

        assert_eq!(detailed.selected.map(|e| &e.id), plain.map(|e| &e.id));
    }

    #[test]
    fn test_tie_break_uses_injected_rng() {
        let matcher = Matcher::with_default_config();
        let pool: Vec<Entity> = ["a", "b", "c"]
            .iter()
            .map(|id| create_candidate(id, 3, 50, 80))
            .collect();

        let mut rng = StdRng::seed_from_u64(42);
        let selected = matcher.find_match_with(&create_seeker(), &pool, "user123", NOW, &mut rng);

        let mut expected_rng = StdRng::seed_from_u64(42);
        let expected = ["a", "b", "c"].choose(&mut expected_rng).copied();

        assert_eq!(selected.map(|e| e.id.as_str()), expected);
    }
}
