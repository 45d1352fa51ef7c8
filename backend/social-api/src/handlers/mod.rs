/// HTTP handlers
use serde::Serialize;
use utoipa::ToSchema;

pub mod health;
pub mod posts;
pub mod users;

/// Error body produced by `AppError`
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
}
