// Service exports
pub mod pool;
pub mod report;

pub use pool::PoolGenerator;
pub use report::{MatchReport, MatchStats, RankedCandidate, SeekerSummary, SelectedCandidate};
