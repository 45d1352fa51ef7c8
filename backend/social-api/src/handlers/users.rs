/// Authentication handlers
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::Result;
use crate::metrics::record_auth_attempt;
use crate::services::NewAccount;
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SigninRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(custom(function = "not_blank", message = "first name is required"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank", message = "last name is required"))]
    pub last_name: String,
    pub confirm_password: Option<String>,
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/user/signin",
    tag = "users",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in", body = crate::services::AuthResponse),
        (status = 400, description = "Invalid credentials", body = crate::handlers::ErrorResponse),
        (status = 404, description = "Unknown user", body = crate::handlers::ErrorResponse)
    )
)]
pub async fn signin(
    state: web::Data<AppState>,
    payload: web::Json<SigninRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let result = state.auth.signin(&payload.email, &payload.password).await;
    record_auth_attempt("signin", &result);

    Ok(HttpResponse::Ok().json(result?))
}

/// Create an account and sign in
#[utoipa::path(
    post,
    path = "/user/signup",
    tag = "users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = crate::services::AuthResponse),
        (status = 400, description = "Invalid input or existing user", body = crate::handlers::ErrorResponse)
    )
)]
pub async fn signup(
    state: web::Data<AppState>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let result = state
        .auth
        .signup(NewAccount {
            email: &payload.email,
            password: &payload.password,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            confirm_password: payload.confirm_password.as_deref(),
        })
        .await;
    record_auth_attempt("signup", &result);

    Ok(HttpResponse::Created().json(result?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_validation() {
        let valid: SignupRequest = serde_json::from_value(serde_json::json!({
            "email": "ada@example.com",
            "password": "engine42",
            "firstName": "Ada",
            "lastName": "Lovelace"
        }))
        .unwrap();
        assert!(valid.validate().is_ok());

        let invalid: SignupRequest = serde_json::from_value(serde_json::json!({
            "email": "not-an-email",
            "password": "123",
            "firstName": "",
            "lastName": "Lovelace",
            "confirmPassword": "123"
        }))
        .unwrap();
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("first_name"));
    }

    #[test]
    fn signup_names_must_have_content() {
        let blank: SignupRequest = serde_json::from_value(serde_json::json!({
            "email": "ada@example.com",
            "password": "engine42",
            "firstName": "   ",
            "lastName": "\t"
        }))
        .unwrap();
        let errors = blank.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("last_name"));
    }
}
