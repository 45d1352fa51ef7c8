/// Route table
use actix_web::{error::InternalError, web, ResponseError};

use crate::error::AppError;
use crate::handlers::{health, posts, users};
use crate::metrics::serve_metrics;
use crate::openapi::openapi_json;

/// Largest accepted JSON body; inline attachments travel as base64
pub const JSON_BODY_LIMIT: usize = 30 * 1024 * 1024;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            let message = format!("Invalid JSON body: {}", err);
            InternalError::from_response(err, AppError::BadRequest(message).error_response()).into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid query string: {}", err);
        InternalError::from_response(err, AppError::BadRequest(message).error_response()).into()
    })
}

/// Register every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/", web::get().to(health::root))
        .route("/health", web::get().to(health::health))
        .route("/health/ready", web::get().to(health::readiness))
        .route("/metrics", web::get().to(serve_metrics))
        .route("/openapi.json", web::get().to(openapi_json))
        .service(
            web::scope("/posts")
                .service(
                    web::resource("")
                        .route(web::get().to(posts::get_posts))
                        .route(web::post().to(posts::create_post)),
                )
                // Literal segments before `/{id}`
                .route("/search", web::get().to(posts::get_posts_by_search))
                .route("/creator", web::get().to(posts::get_posts_by_creator))
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(posts::get_post))
                        .route(web::patch().to(posts::update_post))
                        .route(web::delete().to(posts::delete_post)),
                )
                .route("/{id}/likePost", web::patch().to(posts::like_post))
                .route("/{id}/commentPost", web::post().to(posts::comment_post)),
        )
        .service(
            web::scope("/user")
                .route("/signin", web::post().to(users::signin))
                .route("/signup", web::post().to(users::signup)),
        );
}
