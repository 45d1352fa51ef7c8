use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::error::AppError;

/// User id (email) taken from a valid session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Session token middleware
///
/// Requests without an `Authorization` header pass through anonymously. A header that is
/// present but malformed, expired or forged is answered with a 401 response.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            match authenticate(&req) {
                Ok(Some(user_id)) => {
                    req.extensions_mut().insert(user_id);
                }
                Ok(None) => {}
                // A response rather than an Err, so outer CORS headers are still added
                Err(e) => return Ok(req.error_response(e).map_into_right_body()),
            }

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

/// Resolve the caller from the `Authorization` header, `None` when it is absent
fn authenticate(req: &ServiceRequest) -> Result<Option<UserId>, AppError> {
    let Some(value) = req.headers().get("Authorization") else {
        return Ok(None);
    };

    let auth_header = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid Authorization header format".to_string())
    })?;

    let token_data = crypto_core::jwt::validate_token(token.trim()).map_err(|e| {
        tracing::warn!("JWT validation failed: {}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    let user_id = token_data.claims.id;
    if user_id.is_empty() {
        return Err(AppError::Unauthorized("Invalid token: missing id".to_string()));
    }

    Ok(Some(UserId(user_id)))
}

/// FromRequest implementation for UserId
impl actix_web::FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<UserId>() {
            Some(user_id) => ready(Ok(user_id.clone())),
            None => ready(Err(
                AppError::Unauthorized("Unauthenticated".to_string()).into()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{init_test_jwt, jwt};
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    async fn whoami(user: Option<UserId>) -> HttpResponse {
        match user {
            Some(user) => HttpResponse::Ok().body(user.0),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    async fn protected(user: UserId) -> HttpResponse {
        HttpResponse::Ok().body(user.0)
    }

    #[actix_web::test]
    async fn anonymous_and_authenticated_requests() {
        init_test_jwt();
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware)
                .route("/whoami", web::get().to(whoami))
                .route("/protected", web::get().to(protected)),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous");

        let req = test::TestRequest::get().uri("/protected").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let token = jwt::generate_session_token("ada@example.com", "ada@example.com").unwrap();
        let req = test::TestRequest::get()
            .uri("/protected")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "ada@example.com");
    }

    #[actix_web::test]
    async fn invalid_tokens_are_rejected() {
        init_test_jwt();
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware)
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        for header in ["Bearer not-a-jwt", "Basic abc", "Bearer "] {
            let req = test::TestRequest::get()
                .uri("/whoami")
                .insert_header(("Authorization", header))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", header);
        }
    }
}
