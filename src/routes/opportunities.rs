use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use chrono::{Local, Utc};
use validator::Validate;

use crate::models::{
    EmailFormat, HealthResponse, ListOpportunitiesQuery, OpportunitiesResponse, PreviewQuery, ProfileResponse,
    UpdateProfileRequest,
};
use crate::routes::{error_response, scheduler_unavailable, AppState};
use crate::services::digest;

/// Configure opportunity and profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/opportunities", web::get().to(list_opportunities))
        .route("/profile", web::get().to(get_profile))
        .route("/profile", web::put().to(update_profile))
        .route("/digest/preview", web::get().to(preview_digest));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Ranked opportunities for the current profile
///
/// GET /api/v1/opportunities?limit=10
async fn list_opportunities(
    state: web::Data<AppState>,
    query: web::Query<ListOpportunitiesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let profile = match state.scheduler.profile().await {
        Ok(profile) => profile,
        Err(e) => return scheduler_unavailable(e),
    };

    let limit = state.digest.clamp(query.limit.map(usize::from));
    let today = Local::now().date_naive();

    match state.pipeline.ranked(&profile, limit, today).await {
        Ok(ranked) => {
            tracing::info!("Returning {} opportunities (limit {})", ranked.len(), limit);
            HttpResponse::Ok().json(OpportunitiesResponse {
                count: ranked.len(),
                opportunities: ranked.to_vec(),
                limit,
                generated_at: Utc::now(),
            })
        }
        Err(e) => {
            tracing::error!("Failed to fetch opportunities: {}", e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to fetch opportunities", e)
        }
    }
}

async fn get_profile(state: web::Data<AppState>) -> impl Responder {
    match state.scheduler.profile().await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => scheduler_unavailable(e),
    }
}

/// Partial profile update
///
/// PUT /api/v1/profile
///
/// Request body (every field optional):
/// ```json
/// {
///   "keywords": ["AI", "Rust"],
///   "weakCriteria": ["judging"],
///   "notificationFrequency": "weekly"
/// }
/// ```
async fn update_profile(
    state: web::Data<AppState>,
    req: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for profile update: {:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let current = match state.scheduler.profile().await {
        Ok(profile) => profile,
        Err(e) => return scheduler_unavailable(e),
    };

    let updated = req.into_inner().apply(current);
    if let Err(errors) = updated.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    match state.scheduler.update_profile(updated.clone()).await {
        Ok(next_runs) => HttpResponse::Ok().json(ProfileResponse {
            profile: updated,
            next_runs,
        }),
        Err(e) => scheduler_unavailable(e),
    }
}

/// Today's digest, rendered but not sent
///
/// GET /api/v1/digest/preview?format=html|plain
async fn preview_digest(
    state: web::Data<AppState>,
    query: web::Query<PreviewQuery>,
) -> impl Responder {
    let mut profile = match state.scheduler.profile().await {
        Ok(profile) => profile,
        Err(e) => return scheduler_unavailable(e),
    };
    // Render both bodies so either can be previewed
    profile.email_format = EmailFormat::Both;

    let rendered = match state.pipeline.preview_daily(&profile, Local::now().date_naive()).await {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::error!("Failed to render digest preview: {}", e);
            return error_response(StatusCode::BAD_GATEWAY, "Failed to render preview", e);
        }
    };

    let format = EmailFormat::from(query.format);
    let content_type = if format.wants_html() {
        "text/html; charset=utf-8"
    } else {
        "text/plain; charset=utf-8"
    };

    match digest::preview_body(&rendered, format) {
        Some(body) => HttpResponse::Ok()
            .content_type(content_type)
            .insert_header(("X-Digest-Subject", rendered.subject.clone()))
            .body(body.to_string()),
        None => error_response(StatusCode::NOT_FOUND, "No preview", "Requested format was not rendered"),
    }
}
