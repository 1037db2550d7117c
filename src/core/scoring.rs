use crate::core::segment::segment_gap;
use crate::models::{ActivityLevel, Entity, MatchConfig, RejectReason, ScoreBreakdown};

/// Wait time past which a candidate tolerates tier differences and earns the steeper wait slope
pub const LONG_WAIT_SECS: u16 = 60;

const AUDIENCE_DIFF_SCORES: [i32; 6] = [5, 4, 3, 2, 1, 0];

/// Score every component for a pair that already passed the eligibility filter
///
/// Scoring formula:
/// total = wait + segment + audience + history + activity
///
/// The segment component can still reject the pair (any tier difference under a
/// short wait), in which case no breakdown is produced.
pub fn calculate_match_score(
    seeker: &Entity,
    candidate: &Entity,
    seeker_segment: u8,
    candidate_segment: u8,
    config: &MatchConfig,
) -> Result<ScoreBreakdown, RejectReason> {
    let wait = score_wait_time(candidate.wait_seconds, config);
    let segment = score_segment(seeker_segment, candidate_segment, candidate.wait_seconds)?;

    Ok(ScoreBreakdown {
        wait,
        segment,
        audience: score_audience_diff(seeker.audience_count, candidate.audience_count),
        history: score_match_history(candidate.match_history),
        activity: score_activity(candidate.activity_level),
    })
}

/// Wait score: nothing up to `min_wait_secs`, one point per 10s up to a minute,
/// then two points per 10s on top of a base of 4.
#[inline]
pub fn score_wait_time(wait_seconds: u16, config: &MatchConfig) -> i32 {
    if wait_seconds <= config.min_wait_secs {
        return 0;
    }
    if wait_seconds <= LONG_WAIT_SECS {
        return i32::from(wait_seconds - config.min_wait_secs) / 10;
    }
    4 + i32::from(wait_seconds - LONG_WAIT_SECS) / 10 * 2
}

/// Segment consistency score
///
/// Same tier scores 10. A candidate that waited at least a minute scores 3 for a
/// neighbouring tier and 0 beyond that; under a minute any difference is a mismatch.
#[inline]
pub fn score_segment(
    seeker_segment: u8,
    candidate_segment: u8,
    candidate_wait_seconds: u16,
) -> Result<i32, RejectReason> {
    let gap = segment_gap(seeker_segment, candidate_segment);
    if gap == 0 {
        return Ok(10);
    }
    if candidate_wait_seconds >= LONG_WAIT_SECS {
        return Ok(if gap == 1 { 3 } else { 0 });
    }
    Err(RejectReason::SegmentMismatch {
        seeker_tier: seeker_segment,
        candidate_tier: candidate_segment,
    })
}

#[inline]
pub fn score_audience_diff(seeker_audience: u16, candidate_audience: u16) -> i32 {
    let diff = seeker_audience.abs_diff(candidate_audience) as usize;
    AUDIENCE_DIFF_SCORES.get(diff).copied().unwrap_or(0)
}

#[inline]
pub fn score_match_history(history: u16) -> i32 {
    match history {
        10.. => 4,
        5..=9 => 2,
        _ => 0,
    }
}

#[inline]
pub fn score_activity(level: ActivityLevel) -> i32 {
    match level {
        ActivityLevel::Low => 0,
        ActivityLevel::Medium => 2,
        ActivityLevel::High => 3,
    }
}
