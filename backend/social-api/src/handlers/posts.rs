/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::metrics::record_post_op;
use crate::middleware::UserId;
use crate::models::{Post, PostSearch, PostUpdate};
use crate::AppState;

/// Body of create and update
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub message: String,
    /// Display name shown on the post
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Base64 data URL or hosted image URL
    #[serde(default)]
    pub selected_file: Option<String>,
}

impl PostInput {
    fn into_update(self) -> PostUpdate {
        let tags = self
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();

        PostUpdate {
            title: self.title.trim().to_string(),
            message: self.message,
            name: self.name.trim().to_string(),
            tags,
            selected_file: self.selected_file,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentRequest {
    /// Comment text, conventionally `"{name}: {comment}"`
    #[validate(length(min = 1, message = "comment must not be empty"))]
    pub value: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Title substring; `none` means no title filter
    pub search_query: Option<String>,
    /// Comma-separated tags
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CreatorQuery {
    /// Display name of the author
    pub name: Option<String>,
}

/// Posts without pagination metadata
#[derive(Debug, Serialize, ToSchema)]
pub struct PostList {
    pub data: Vec<Post>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// List posts, newest first
#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of posts", body = crate::services::PostPage),
        (status = 400, description = "Invalid page", body = crate::handlers::ErrorResponse)
    )
)]
pub async fn get_posts(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = query.page.unwrap_or(1);
    let result = state.posts.list_posts(page).await;
    record_post_op("list", &result);

    Ok(HttpResponse::Ok().json(result?))
}

/// Search posts by title or tags
#[utoipa::path(
    get,
    path = "/posts/search",
    tag = "posts",
    params(SearchQuery),
    responses((status = 200, description = "Matching posts", body = PostList))
)]
pub async fn get_posts_by_search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let search = PostSearch::from_query(query.search_query.as_deref(), query.tags.as_deref());
    let result = state.posts.search_posts(&search).await;
    record_post_op("search", &result);

    Ok(HttpResponse::Ok().json(PostList { data: result? }))
}

/// Posts published under a display name
#[utoipa::path(
    get,
    path = "/posts/creator",
    tag = "posts",
    params(CreatorQuery),
    responses(
        (status = 200, description = "Posts by the creator", body = PostList),
        (status = 400, description = "Missing name", body = crate::handlers::ErrorResponse)
    )
)]
pub async fn get_posts_by_creator(
    state: web::Data<AppState>,
    query: web::Query<CreatorQuery>,
) -> Result<HttpResponse> {
    let name = query
        .name
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("name is required".to_string()))?;
    let result = state.posts.posts_by_creator(name).await;
    record_post_op("creator", &result);

    Ok(HttpResponse::Ok().json(PostList { data: result? }))
}

/// Get a post by ID
#[utoipa::path(
    get,
    path = "/posts/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = Post),
        (status = 404, description = "No such post", body = crate::handlers::ErrorResponse)
    )
)]
pub async fn get_post(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse> {
    let result = state.posts.get_post(&id).await;
    record_post_op("get", &result);

    Ok(HttpResponse::Ok().json(result?))
}

/// Create a new post
#[utoipa::path(
    post,
    path = "/posts",
    tag = "posts",
    request_body = PostInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Invalid body or attachment", body = crate::handlers::ErrorResponse),
        (status = 401, description = "Unauthenticated", body = crate::handlers::ErrorResponse)
    )
)]
pub async fn create_post(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<PostInput>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let result = state
        .posts
        .create_post(user_id.as_str(), payload.into_inner().into_update())
        .await;
    record_post_op("create", &result);

    Ok(HttpResponse::Created().json(result?))
}

/// Replace the editable fields of a post
#[utoipa::path(
    patch,
    path = "/posts/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    request_body = PostInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Post updated", body = Post),
        (status = 403, description = "Not the creator", body = crate::handlers::ErrorResponse),
        (status = 404, description = "No such post", body = crate::handlers::ErrorResponse)
    )
)]
pub async fn update_post(
    state: web::Data<AppState>,
    user_id: UserId,
    id: web::Path<String>,
    payload: web::Json<PostInput>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let result = state
        .posts
        .update_post(&id, user_id.as_str(), payload.into_inner().into_update())
        .await;
    record_post_op("update", &result);

    Ok(HttpResponse::Ok().json(result?))
}

/// Delete a post
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 403, description = "Not the creator", body = crate::handlers::ErrorResponse),
        (status = 404, description = "No such post", body = crate::handlers::ErrorResponse)
    )
)]
pub async fn delete_post(
    state: web::Data<AppState>,
    user_id: UserId,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let result = state.posts.delete_post(&id, user_id.as_str()).await;
    record_post_op("delete", &result);
    result?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Post deleted successfully.".to_string(),
    }))
}

/// Like a post as the signed-in user
#[utoipa::path(
    patch,
    path = "/posts/{id}/likePost",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Post with the like recorded", body = Post),
        (status = 401, description = "Unauthenticated", body = crate::handlers::ErrorResponse),
        (status = 404, description = "No such post", body = crate::handlers::ErrorResponse)
    )
)]
pub async fn like_post(
    state: web::Data<AppState>,
    user_id: UserId,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let result = state.posts.like_post(&id, user_id.as_str()).await;
    record_post_op("like", &result);

    Ok(HttpResponse::Ok().json(result?))
}

/// Append a comment to a post
#[utoipa::path(
    post,
    path = "/posts/{id}/commentPost",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    request_body = CommentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Post with the comment appended", body = Post),
        (status = 404, description = "No such post", body = crate::handlers::ErrorResponse)
    )
)]
pub async fn comment_post(
    state: web::Data<AppState>,
    _user_id: UserId,
    id: web::Path<String>,
    payload: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let result = state.posts.comment_post(&id, &payload.value).await;
    record_post_op("comment", &result);

    Ok(HttpResponse::Ok().json(result?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_input_normalizes_tags_and_ignores_client_fields() {
        let input: PostInput = serde_json::from_value(serde_json::json!({
            "title": " Trip ",
            "message": "Lovely",
            "name": "Ada Lovelace",
            "tags": ["sea", " ", " sun "],
            "selectedFile": "",
            "creator": "someone-else"
        }))
        .unwrap();

        let update = input.into_update();
        assert_eq!(update.title, "Trip");
        assert_eq!(update.tags, vec!["sea".to_string(), "sun".to_string()]);
        assert_eq!(update.selected_file.as_deref(), Some(""));
    }

    #[test]
    fn empty_title_fails_validation() {
        let input: PostInput = serde_json::from_value(serde_json::json!({ "title": "" })).unwrap();
        assert!(input.validate().is_err());
    }
}
