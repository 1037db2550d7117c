// Model exports
pub mod domain;

pub use domain::{ActivityLevel, Entity, MatchConfig, MatchDetail, RejectReason, ScoreBreakdown, Verdict};
