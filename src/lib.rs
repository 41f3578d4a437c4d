//! Opportunity Digest - ranks EB-1A evidence-building opportunities
//!
//! Opportunities are scored against a candidate profile (keyword tags,
//! prestige, evidence value, weak-criteria boost, quick-win effort) and the
//! top entries are delivered as a scheduled email digest.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use self::core::{calculate_opportunity_score, rank, Ranker};
pub use models::{Category, Opportunity, OpportunityDraft, ScoredOpportunity, UserProfile, WeakCriteriaPolicy};
