use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use opportunity_digest::config::{LoggingSettings, Settings};
use opportunity_digest::core::Ranker;
use opportunity_digest::routes::{self, AppState};
use opportunity_digest::services::{DigestPipeline, DigestScheduler, RankingCache};
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// LOG_LEVEL / LOG_FORMAT win over the config file; RUST_LOG wins over both
fn init_logging(logging: &LoggingSettings) {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);

    info!("Starting opportunity digest service...");

    let config_report = settings.validate();
    if config_report.is_ok() {
        info!("Configuration loaded successfully");
    } else {
        for problem in &config_report.errors {
            warn!("Configuration issue: {}", problem);
        }
    }

    let schedule = settings.scheduler.schedule().map_err(|e| {
        error!("Invalid scheduler settings: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let source = settings.build_source();
    let mailer = settings.build_mailer();
    info!(
        "Opportunity source: {}, mail transport: {}",
        source.name(),
        mailer.transport()
    );

    let cache = RankingCache::new(settings.cache.capacity, settings.cache.ttl_secs);
    info!(
        "Ranking cache initialized ({} entries, TTL: {}s)",
        settings.cache.capacity, settings.cache.ttl_secs
    );

    let ranker = Ranker::new(settings.scoring.weak_criteria_policy);
    info!("Ranker initialized with weak-criteria policy: {:?}", ranker.policy());

    let pipeline = Arc::new(DigestPipeline::new(
        source,
        mailer,
        ranker,
        cache,
        settings.from_address(),
        settings.scheduler.stats_path.clone(),
    ));

    info!(
        "Profile: {} ({}), weak criteria: {:?}",
        settings.profile.name, settings.profile.email, settings.profile.weak_criteria
    );

    let scheduler = DigestScheduler::spawn(Arc::clone(&pipeline), settings.profile.clone(), schedule);
    if settings.scheduler.autostart {
        if let Err(e) = scheduler.start().await {
            error!("Failed to start scheduler: {}", e);
        }
    }

    let app_state = AppState {
        pipeline,
        scheduler,
        digest: settings.digest.clone(),
        config_report,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
