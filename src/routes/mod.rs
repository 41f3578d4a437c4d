// Route exports
pub mod opportunities;
pub mod system;

use std::sync::Arc;

use actix_web::{http::StatusCode, web, HttpResponse};

use crate::config::{ConfigReport, DigestSettings};
use crate::models::ErrorResponse;
use crate::services::{DigestPipeline, SchedulerHandle};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DigestPipeline>,
    pub scheduler: SchedulerHandle,
    pub digest: DigestSettings,
    pub config_report: ConfigReport,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(opportunities::configure)
            .configure(system::configure),
    );
}

/// JSON error body with a matching status code
pub(crate) fn error_response(status: StatusCode, error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

/// The scheduler task is gone; nothing else can answer
pub(crate) fn scheduler_unavailable(err: impl ToString) -> HttpResponse {
    tracing::error!("Scheduler unavailable: {}", err.to_string());
    error_response(StatusCode::SERVICE_UNAVAILABLE, "Scheduler unavailable", err)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::Ranker;
    use crate::models::UserProfile;
    use crate::services::{DigestScheduler, MemoryMailer, RankingCache, ScheduleSettings, StaticCatalog};

    /// State over the built-in catalog and an in-memory mailer
    pub fn app_state(mailer: Arc<MemoryMailer>, stats_dir: &std::path::Path) -> AppState {
        let pipeline = Arc::new(DigestPipeline::new(
            Arc::new(StaticCatalog::new()),
            mailer,
            Ranker::default(),
            RankingCache::new(100, 60),
            "digest@example.com",
            stats_dir.join("stats.json"),
        ));
        let scheduler = DigestScheduler::spawn(
            Arc::clone(&pipeline),
            UserProfile::default(),
            ScheduleSettings::default(),
        );

        AppState {
            pipeline,
            scheduler,
            digest: DigestSettings::default(),
            config_report: ConfigReport::default(),
        }
    }
}
