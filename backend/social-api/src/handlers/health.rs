/// Root, liveness and readiness endpoints
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::AppState;

/// `GET /`
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json("Hello world")
}

/// Liveness
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is running"))
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "social-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness of the table stores and the blob store
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "All dependencies reachable"),
        (status = 503, description = "A dependency is unreachable")
    )
)]
pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    let (posts, users, media) = futures::join!(
        state.posts.health_check(),
        state.auth.health_check(),
        state.posts.media().health_check(),
    );

    let mut ready = true;
    let mut check = |name: &str, result: crate::error::Result<()>| match result {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::warn!(dependency = name, error = %e, "readiness check failed");
            ready = false;
            "unavailable".to_string()
        }
    };

    let checks = json!({
        "posts_table": check("posts_table", posts),
        "users_table": check("users_table", users),
        "blob_store": check("blob_store", media),
    });

    let body = json!({ "ready": ready, "checks": checks });
    if ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
