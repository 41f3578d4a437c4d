// Core algorithm exports
pub mod filters;
pub mod ranker;
pub mod scoring;

pub use filters::{is_long_term, is_urgent_deadline, partition_quick_wins, select_urgent};
pub use ranker::{rank, RankResult, Ranker};
pub use scoring::{calculate_opportunity_score, ScoreBreakdown, ScoringContext};
