use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ConfigReport;
use crate::models::domain::{ScoredOpportunity, UserProfile};
use crate::services::cache::CacheStats;
use crate::services::scheduler::{JobView, SchedulerStatus};

/// Response for the ranked opportunity list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitiesResponse {
    pub opportunities: Vec<ScoredOpportunity>,
    pub count: usize,
    pub limit: usize,
    pub generated_at: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Profile after an update, with the rebuilt schedule
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub next_runs: Vec<JobView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatusResponse {
    pub version: String,
    pub config: ConfigReport,
    pub scheduler: SchedulerStatus,
    pub uptime: String,
    pub cache: CacheStats,
    pub mail_transport: String,
    pub timestamp: DateTime<Utc>,
}
