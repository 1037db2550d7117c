use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Activity tier of a room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 3] = [ActivityLevel::Low, ActivityLevel::Medium, ActivityLevel::High];

    /// Parse a level name. Unknown names fall back to `Low`.
    pub fn parse(level: &str) -> Self {
        match level {
            "high" => ActivityLevel::High,
            "medium" => ActivityLevel::Medium,
            _ => ActivityLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "low",
            ActivityLevel::Medium => "medium",
            ActivityLevel::High => "high",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live room taking part in matching, either as seeker or as pool member
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    /// Participant id -> unix timestamp (seconds) of the last match with them
    #[serde(rename = "lastMatchedUsers", default)]
    pub last_matched: HashMap<String, i64>,
    #[serde(default)]
    pub blacklist: HashSet<String>,
    #[serde(rename = "micCount")]
    pub mic_count: u16,
    #[serde(rename = "audienceCount")]
    pub audience_count: u16,
    #[serde(rename = "waitSeconds")]
    pub wait_seconds: u16,
    #[serde(rename = "matchHistory", default)]
    pub match_history: u16,
    #[serde(rename = "activityLevel", default)]
    pub activity_level: ActivityLevel,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Whether this room has blocked the given participant
    pub fn has_blocked(&self, participant_id: &str) -> bool {
        self.blacklist.contains(participant_id)
    }

    /// Timestamp of the last match with the given participant, if any
    pub fn last_matched_with(&self, participant_id: &str) -> Option<i64> {
        self.last_matched.get(participant_id).copied()
    }
}

/// Matching parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// A previous pairing younger than this (seconds) blocks a rematch
    pub cooldown_secs: i64,
    /// Wait time at or below this earns no wait score
    pub min_wait_secs: u16,
    /// Not consulted by any scoring rule yet
    pub max_wait_secs: u16,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 600,
            max_wait_secs: 300,
            min_wait_secs: 20,
        }
    }
}

/// Per-component scores of an eligible pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub wait: i32,
    pub segment: i32,
    pub audience: i32,
    pub history: i32,
    pub activity: i32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i32 {
        self.wait + self.segment + self.audience + self.history + self.activity
    }
}

/// Why a candidate was excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    BlockedByCandidate,
    CooldownActive { elapsed_secs: i64 },
    /// Short wait and a tier gap above one
    SegmentGap { seeker_tier: u8, candidate_tier: u8 },
    /// Short wait and any tier difference
    SegmentMismatch { seeker_tier: u8, candidate_tier: u8 },
}

impl RejectReason {
    /// Stable label used to group reasons in reports
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::BlockedByCandidate => "blocked by candidate",
            RejectReason::CooldownActive { .. } => "cooldown not elapsed",
            RejectReason::SegmentGap { .. } => "segment gap too large for short wait",
            RejectReason::SegmentMismatch { .. } => "segment mismatch",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::BlockedByCandidate => f.write_str("blocked by candidate"),
            RejectReason::CooldownActive { elapsed_secs } => {
                write!(f, "cooldown not elapsed (matched {}s ago)", elapsed_secs)
            }
            RejectReason::SegmentGap { seeker_tier, candidate_tier } => write!(
                f,
                "insufficient wait and segment gap too large (seeker tier {}, candidate tier {})",
                seeker_tier, candidate_tier
            ),
            RejectReason::SegmentMismatch { seeker_tier, candidate_tier } => write!(
                f,
                "segment mismatch (seeker tier {}, candidate tier {})",
                seeker_tier, candidate_tier
            ),
        }
    }
}

/// Outcome of evaluating one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Eligible { breakdown: ScoreBreakdown, total: i32 },
    Rejected { reason: RejectReason },
}

impl Verdict {
    pub fn eligible(breakdown: ScoreBreakdown) -> Self {
        Verdict::Eligible {
            total: breakdown.total(),
            breakdown,
        }
    }
}

/// Evaluation record for one (seeker, candidate) pair
#[derive(Debug, Clone, Serialize)]
pub struct MatchDetail<'a> {
    pub candidate: &'a Entity,
    #[serde(rename = "seekerSegment")]
    pub seeker_segment: u8,
    #[serde(rename = "candidateSegment")]
    pub candidate_segment: u8,
    pub verdict: Verdict,
}

impl<'a> MatchDetail<'a> {
    pub fn is_rejected(&self) -> bool {
        matches!(self.verdict, Verdict::Rejected { .. })
    }

    pub fn total(&self) -> Option<i32> {
        match self.verdict {
            Verdict::Eligible { total, .. } => Some(total),
            Verdict::Rejected { .. } => None,
        }
    }

    pub fn breakdown(&self) -> Option<&ScoreBreakdown> {
        match &self.verdict {
            Verdict::Eligible { breakdown, .. } => Some(breakdown),
            Verdict::Rejected { .. } => None,
        }
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match &self.verdict {
            Verdict::Rejected { reason } => Some(reason),
            Verdict::Eligible { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_level_parse() {
        assert_eq!(ActivityLevel::parse("high"), ActivityLevel::High);
        assert_eq!(ActivityLevel::parse("medium"), ActivityLevel::Medium);
        assert_eq!(ActivityLevel::parse("low"), ActivityLevel::Low);
        assert_eq!(ActivityLevel::parse("bogus"), ActivityLevel::Low);
        assert_eq!(ActivityLevel::High.to_string(), "high");
    }

    #[test]
    fn test_breakdown_total() {
        let breakdown = ScoreBreakdown {
            wait: 8,
            segment: 10,
            audience: 5,
            history: 4,
            activity: 3,
        };
        assert_eq!(breakdown.total(), 30);
        assert_eq!(Verdict::eligible(breakdown), Verdict::Eligible { breakdown, total: 30 });
    }

    #[test]
    fn test_reject_reason_messages() {
        let cooldown = RejectReason::CooldownActive { elapsed_secs: 42 };
        assert!(cooldown.to_string().contains("42s"));

        let gap = RejectReason::SegmentGap { seeker_tier: 0, candidate_tier: 3 };
        let message = gap.to_string();
        assert!(message.contains("tier 0") && message.contains("tier 3"));
        assert_eq!(RejectReason::BlockedByCandidate.to_string(), "blocked by candidate");
    }

    #[test]
    fn test_entity_deserializes_camel_case() {
        let json = r#"{
            "id": "room_1",
            "micCount": 4,
            "audienceCount": 50,
            "waitSeconds": 80,
            "matchHistory": 12,
            "activityLevel": "high",
            "blacklist": ["user9"],
            "lastMatchedUsers": {"user1": 1700000000}
        }"#;
        let entity: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.mic_count, 4);
        assert_eq!(entity.activity_level, ActivityLevel::High);
        assert!(entity.has_blocked("user9"));
        assert_eq!(entity.last_matched_with("user1"), Some(1_700_000_000));
        assert_eq!(entity.last_matched_with("user2"), None);
    }
}
