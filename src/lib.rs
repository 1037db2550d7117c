//! Cohost Algo - co-broadcast partner matching for live rooms
//!
//! This library scores a pool of candidate rooms against a seeking room and
//! picks one of the best uniformly at random. Batch mode matches many seekers
//! against one shared pool.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{segment_for, BatchError, BatchMatcher, MatchResult, Matcher};
pub use crate::models::{ActivityLevel, Entity, MatchConfig, MatchDetail, RejectReason, ScoreBreakdown, Verdict};
