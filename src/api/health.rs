use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use tracing::error;

use crate::db::store::JobStore;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Probe the store and report `ok_status` or `failed_status`
async fn probe(store: &dyn JobStore, ok_status: &'static str, failed_status: &'static str) -> HttpResponse {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: ok_status,
            database: "connected",
            error: None,
        }),
        Err(e) => {
            error!("{} check failed: {:?}", failed_status, e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: failed_status,
                database: "disconnected",
                error: Some(format!("Database unavailable: {}", e)),
            })
        }
    }
}

/// General health check including database connectivity.
#[get("/health")]
async fn health_check(store: web::Data<dyn JobStore>) -> impl Responder {
    probe(store.get_ref(), "healthy", "unhealthy").await
}

/// Readiness probe: 503 while the database is unreachable, recovers with it.
#[get("/ready")]
async fn readiness_check(store: web::Data<dyn JobStore>) -> impl Responder {
    probe(store.get_ref(), "ready", "not_ready").await
}

/// Liveness probe. Does not check dependencies.
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive",
        database: "not_checked",
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check);
}
