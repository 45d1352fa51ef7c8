#![allow(dead_code)]

use std::sync::{Arc, Once};

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use serde_json::{json, Value};
use social_api::middleware::{JwtAuthMiddleware, MetricsMiddleware};
use social_api::services::BlobStore;
use social_api::{routes, AppState};

/// Response type of the app once wrapped by the auth middleware
pub type AppResponse = ServiceResponse<EitherBody<BoxBody>>;

pub const TEST_JWT_SECRET: &str = "social-api-integration-test-secret-0123";

static INIT: Once = Once::new();

pub fn init_jwt() {
    INIT.call_once(|| {
        crypto_core::jwt::initialize_jwt_secret(TEST_JWT_SECRET).expect("jwt init");
    });
}

pub fn memory_state() -> AppState {
    init_jwt();
    AppState::in_memory(None, 1024 * 1024)
}

pub fn memory_state_with_blobs(blobs: Arc<dyn BlobStore>) -> AppState {
    init_jwt();
    AppState::in_memory(Some(blobs), 1024 * 1024)
}

pub async fn init_app(
    state: AppState,
) -> impl Service<actix_http::Request, Response = AppResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(JwtAuthMiddleware)
            .wrap(MetricsMiddleware)
            .configure(routes::configure),
    )
    .await
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Sign up a user and return `(user_id, token)`
pub async fn signup<S>(app: &S, email: &str, first: &str, last: &str) -> (String, String)
where
    S: Service<actix_http::Request, Response = AppResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/user/signup")
        .set_json(json!({
            "email": email,
            "password": "engine42",
            "confirmPassword": "engine42",
            "firstName": first,
            "lastName": last,
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "signup {}", email);

    let body: Value = test::read_body_json(resp).await;
    (
        body["result"]["id"].as_str().expect("id").to_string(),
        body["token"].as_str().expect("token").to_string(),
    )
}

pub fn post_body(title: &str, name: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "message": format!("{} message", title),
        "name": name,
        "tags": tags,
    })
}

/// Create a post and return its JSON
pub async fn create_post<S>(app: &S, token: &str, body: Value) -> Value
where
    S: Service<actix_http::Request, Response = AppResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/posts")
        .insert_header(bearer(token))
        .set_json(body)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    test::read_body_json(resp).await
}
