use crate::core::{scoring::LONG_WAIT_SECS, segment::segment_gap};
use crate::models::{Entity, MatchConfig, RejectReason};

/// Hard constraints checked before any scoring
///
/// Checks run in order and the first failure wins:
/// 1. Candidate has blocked the seeker
/// 2. The pair matched less than `cooldown_secs` ago
/// 3. Candidate waited under a minute and the tier gap is above one
#[inline]
pub fn check_eligibility(
    candidate: &Entity,
    seeker_id: &str,
    seeker_segment: u8,
    candidate_segment: u8,
    config: &MatchConfig,
    now: i64,
) -> Result<(), RejectReason> {
    if candidate.has_blocked(seeker_id) {
        return Err(RejectReason::BlockedByCandidate);
    }

    if let Some(last_matched) = candidate.last_matched_with(seeker_id) {
        let elapsed_secs = now - last_matched;
        if elapsed_secs < config.cooldown_secs {
            return Err(RejectReason::CooldownActive { elapsed_secs });
        }
    }

    if candidate.wait_seconds < LONG_WAIT_SECS && segment_gap(seeker_segment, candidate_segment) > 1 {
        return Err(RejectReason::SegmentGap {
            seeker_tier: seeker_segment,
            candidate_tier: candidate_segment,
        });
    }

    Ok(())
}
