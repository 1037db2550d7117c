// Core algorithm exports
pub mod batch;
pub mod filters;
pub mod matcher;
pub mod scoring;
pub mod segment;

pub use batch::{BatchError, BatchMatcher, BatchMatches};
pub use filters::check_eligibility;
pub use matcher::{MatchResult, Matcher};
pub use scoring::calculate_match_score;
pub use segment::segment_for;
