use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

use crate::core::{segment_for, MatchResult};
use crate::models::{ActivityLevel, Entity, ScoreBreakdown};

/// Seeker attributes echoed in the report
#[derive(Debug, Clone, Serialize)]
pub struct SeekerSummary {
    pub id: String,
    pub mic_count: u16,
    pub audience_count: u16,
    pub wait_seconds: u16,
    pub segment: u8,
}

/// Score breakdown of the selected candidate alongside the raw inputs
#[derive(Debug, Clone, Serialize)]
pub struct SelectedCandidate {
    pub id: String,
    pub breakdown: ScoreBreakdown,
    pub total: i32,
    pub wait_seconds: u16,
    pub seeker_segment: u8,
    pub candidate_segment: u8,
    /// Seeker audience minus candidate audience
    pub audience_diff: i32,
    pub match_history: u16,
    pub activity_level: ActivityLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub id: String,
    pub total: i32,
    pub mic_count: u16,
    pub audience_count: u16,
    pub wait_seconds: u16,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MatchStats {
    pub total: usize,
    pub eligible: usize,
    pub rejected: usize,
    pub eligible_pct: f64,
    pub rejected_pct: f64,
}

impl MatchStats {
    fn new(total: usize, eligible: usize) -> Self {
        let pct = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 * 100.0 };
        let rejected = total - eligible;
        Self {
            total,
            eligible,
            rejected,
            eligible_pct: pct(eligible),
            rejected_pct: pct(rejected),
        }
    }
}

/// Human and machine readable summary of one match run
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub seeker: SeekerSummary,
    pub selected: Option<SelectedCandidate>,
    /// Best eligible candidates, highest total first
    pub top_candidates: Vec<RankedCandidate>,
    /// Rejection reason label -> count
    pub rejections: BTreeMap<&'static str, usize>,
    pub stats: MatchStats,
}

impl MatchReport {
    pub fn build(seeker: &Entity, result: &MatchResult<'_>, top_n: usize) -> Self {
        let selected_id = result.selected.map(|e| e.id.as_str());

        let selected = result.selected_detail().and_then(|detail| {
            let breakdown = *detail.breakdown()?;
            let candidate = detail.candidate;
            Some(SelectedCandidate {
                id: candidate.id.clone(),
                total: breakdown.total(),
                breakdown,
                wait_seconds: candidate.wait_seconds,
                seeker_segment: detail.seeker_segment,
                candidate_segment: detail.candidate_segment,
                audience_diff: i32::from(seeker.audience_count) - i32::from(candidate.audience_count),
                match_history: candidate.match_history,
                activity_level: candidate.activity_level,
            })
        });

        let mut eligible: Vec<(i32, &Entity)> = result
            .details
            .iter()
            .filter_map(|d| d.total().map(|total| (total, d.candidate)))
            .collect();
        eligible.sort_by_key(|(total, _)| Reverse(*total));

        let top_candidates = eligible
            .iter()
            .take(top_n)
            .map(|(total, candidate)| RankedCandidate {
                id: candidate.id.clone(),
                total: *total,
                mic_count: candidate.mic_count,
                audience_count: candidate.audience_count,
                wait_seconds: candidate.wait_seconds,
                selected: selected_id == Some(candidate.id.as_str()),
            })
            .collect();

        let mut rejections = BTreeMap::new();
        for reason in result.details.iter().filter_map(|d| d.reject_reason()) {
            *rejections.entry(reason.label()).or_insert(0) += 1;
        }

        Self {
            seeker: SeekerSummary {
                id: seeker.id.clone(),
                mic_count: seeker.mic_count,
                audience_count: seeker.audience_count,
                wait_seconds: seeker.wait_seconds,
                segment: segment_for(seeker.mic_count),
            },
            selected,
            top_candidates,
            rejections,
            stats: MatchStats::new(result.details.len(), eligible.len()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seeker = &self.seeker;
        writeln!(f, "=== Match details ===")?;
        writeln!(
            f,
            "Seeker: {} (mics: {}, audience: {}, waiting: {}s, segment: {})",
            seeker.id, seeker.mic_count, seeker.audience_count, seeker.wait_seconds, seeker.segment
        )?;

        match &self.selected {
            Some(selected) => {
                let b = &selected.breakdown;
                writeln!(f, "Matched: {}", selected.id)?;
                writeln!(f, "Score breakdown:")?;
                writeln!(f, "  - wait: {} (waited {}s)", b.wait, selected.wait_seconds)?;
                writeln!(
                    f,
                    "  - segment: {} (seeker segment {}, candidate segment {})",
                    b.segment, selected.seeker_segment, selected.candidate_segment
                )?;
                writeln!(f, "  - audience: {} (difference {})", b.audience, selected.audience_diff)?;
                writeln!(f, "  - history: {} ({} past matches)", b.history, selected.match_history)?;
                writeln!(f, "  - activity: {} ({})", b.activity, selected.activity_level)?;
                writeln!(f, "  - total: {}", selected.total)?;

                writeln!(f)?;
                writeln!(f, "Top {} candidates:", self.top_candidates.len())?;
                for (rank, candidate) in self.top_candidates.iter().enumerate() {
                    writeln!(
                        f,
                        "  {}. {} (score: {}, mics: {}, audience: {}, waiting: {}s){}",
                        rank + 1,
                        candidate.id,
                        candidate.total,
                        candidate.mic_count,
                        candidate.audience_count,
                        candidate.wait_seconds,
                        if candidate.selected { " *" } else { "" }
                    )?;
                }
            }
            None => {
                writeln!(f, "No match found")?;
                writeln!(f, "Rejection reasons:")?;
                for (reason, count) in &self.rejections {
                    writeln!(f, "  - {}: {}", reason, count)?;
                }
            }
        }

        let stats = &self.stats;
        writeln!(f)?;
        writeln!(f, "=== Statistics ===")?;
        writeln!(f, "Candidates: {}", stats.total)?;
        writeln!(f, "Eligible: {} ({:.1}%)", stats.eligible, stats.eligible_pct)?;
        write!(f, "Rejected: {} ({:.1}%)", stats.rejected, stats.rejected_pct)
    }
}
