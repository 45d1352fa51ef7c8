/// OpenAPI documentation for the social API
use actix_web::HttpResponse;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers::posts::{CommentRequest, MessageResponse, PostInput, PostList};
use crate::handlers::users::{SigninRequest, SignupRequest};
use crate::handlers::ErrorResponse;
use crate::models::{Post, UserProfile};
use crate::services::{AuthResponse, PostPage};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Social API",
        description = "Posts with likes, comments, search and pagination, plus email/password accounts.",
        license(name = "MIT")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::readiness,
        crate::handlers::posts::get_posts,
        crate::handlers::posts::get_posts_by_search,
        crate::handlers::posts::get_posts_by_creator,
        crate::handlers::posts::get_post,
        crate::handlers::posts::create_post,
        crate::handlers::posts::update_post,
        crate::handlers::posts::delete_post,
        crate::handlers::posts::like_post,
        crate::handlers::posts::comment_post,
        crate::handlers::users::signin,
        crate::handlers::users::signup
    ),
    components(schemas(
        Post,
        PostPage,
        PostList,
        PostInput,
        CommentRequest,
        MessageResponse,
        SigninRequest,
        SignupRequest,
        AuthResponse,
        UserProfile,
        ErrorResponse
    )),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "posts", description = "Post listing, search, editing, likes and comments"),
        (name = "users", description = "Signup and signin"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token from /user/signin or /user/signup"))
                        .build(),
                ),
            )
        }
    }
}

/// `GET /openapi.json`
pub async fn openapi_json() -> actix_web::Result<HttpResponse> {
    let body = ApiDoc::openapi().to_json().map_err(|e| {
        tracing::error!("OpenAPI serialization failed: {}", e);
        actix_web::error::ErrorInternalServerError("OpenAPI serialization error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/posts",
            "/posts/search",
            "/posts/creator",
            "/posts/{id}",
            "/posts/{id}/likePost",
            "/posts/{id}/commentPost",
            "/user/signin",
            "/user/signup",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
