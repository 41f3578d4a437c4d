use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;

use crate::models::{SendDigestRequest, SystemStatusResponse, TestEmailRequest};
use crate::routes::{error_response, scheduler_unavailable, AppState};
use crate::services::digest::format_uptime;

/// Configure digest delivery and scheduler control routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/digest/send", web::post().to(send_digest))
        .route("/email/test", web::post().to(send_test_email))
        .route("/scheduler/start", web::post().to(start_scheduler))
        .route("/scheduler/stop", web::post().to(stop_scheduler))
        .route("/system/status", web::get().to(system_status));
}

/// Run a digest task now
///
/// POST /api/v1/digest/send
///
/// Request body:
/// ```json
/// { "task": "daily|weekly|urgent|maintenance" }
/// ```
async fn send_digest(
    state: web::Data<AppState>,
    req: web::Json<SendDigestRequest>,
) -> impl Responder {
    tracing::info!("Manual {} run requested", req.task);

    match state.scheduler.run_now(req.task).await {
        Ok(report) if report.succeeded() => HttpResponse::Ok().json(report),
        Ok(report) => HttpResponse::BadGateway().json(report),
        Err(e) => scheduler_unavailable(e),
    }
}

/// Send a test message to the given address or the profile's
async fn send_test_email(
    state: web::Data<AppState>,
    req: Option<web::Json<TestEmailRequest>>,
) -> impl Responder {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let to = match req.email {
        Some(email) => email,
        None => match state.scheduler.profile().await {
            Ok(profile) => profile.email,
            Err(e) => return scheduler_unavailable(e),
        },
    };

    match state.pipeline.send_test(&to).await {
        Ok(receipt) => {
            tracing::info!("Test email sent to {}", to);
            HttpResponse::Ok().json(receipt)
        }
        Err(e) => {
            tracing::error!("Failed to send test email to {}: {}", to, e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to send test email", e)
        }
    }
}

async fn start_scheduler(state: web::Data<AppState>) -> impl Responder {
    if let Err(e) = state.scheduler.start().await {
        return scheduler_unavailable(e);
    }
    match state.scheduler.status().await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => scheduler_unavailable(e),
    }
}

async fn stop_scheduler(state: web::Data<AppState>) -> impl Responder {
    if let Err(e) = state.scheduler.stop().await {
        return scheduler_unavailable(e);
    }
    match state.scheduler.status().await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => scheduler_unavailable(e),
    }
}

/// Configuration check, scheduler statistics and next run times
async fn system_status(state: web::Data<AppState>) -> impl Responder {
    let scheduler = match state.scheduler.status().await {
        Ok(status) => status,
        Err(e) => return scheduler_unavailable(e),
    };

    let now = Utc::now();
    HttpResponse::Ok().json(SystemStatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        config: state.config_report.clone(),
        uptime: format_uptime(scheduler.stats.uptime_secs(now)),
        scheduler,
        cache: state.pipeline.cache().stats(),
        mail_transport: state.pipeline.mail_transport().to_string(),
        timestamp: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::app_state;
    use crate::services::MemoryMailer;
    use actix_web::{test, App};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_send_daily_digest() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = Arc::new(MemoryMailer::new());
        let state = app_state(Arc::clone(&mailer), dir.path());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/digest/send")
            .set_json(serde_json::json!({"task": "daily"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["task"], "daily");
        assert_eq!(body["emailsSent"], 1);
        assert_eq!(mailer.sent().await.len(), 1);
    }

    #[actix_web::test]
    async fn test_email_to_given_address() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = Arc::new(MemoryMailer::new());
        let state = app_state(Arc::clone(&mailer), dir.path());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/email/test")
            .set_json(serde_json::json!({"email": "someone@example.com"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "someone@example.com");
    }

    #[actix_web::test]
    async fn test_scheduler_start_stop_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(Arc::new(MemoryMailer::new()), dir.path());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/v1/scheduler/start").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["running"], true);

        let req = test::TestRequest::get().uri("/api/v1/system/status").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["scheduler"]["running"], true);
        assert_eq!(body["mailTransport"], "memory");
        assert_eq!(body["scheduler"]["nextRuns"].as_array().unwrap().len(), 3);

        let req = test::TestRequest::post().uri("/api/v1/scheduler/stop").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["running"], false);
    }
}
