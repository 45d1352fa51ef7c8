/// Post service - handles listing, search, CRUD, likes and comments
use std::cmp::Ordering;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::{PostStore, StoreError};
use crate::error::{AppError, Result};
use crate::models::{Post, PostSearch, PostUpdate};
use crate::services::media::MediaService;

/// Posts per page of `GET /posts`
pub const PAGE_SIZE: usize = 8;

/// Attempts at claiming a fresh timestamp id before giving up
const MAX_ID_ATTEMPTS: u32 = 3;

/// One page of the timeline
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub data: Vec<Post>,
    pub current_page: usize,
    pub number_of_pages: usize,
}

/// Offset of the first post on `page` (1-based)
pub fn page_offset(page: usize) -> usize {
    page.saturating_sub(1).saturating_mul(PAGE_SIZE)
}

/// Number of pages needed for `total` posts
pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE)
}

/// Newest first; ids break ties so equal timestamps keep a stable order
fn newest_first(a: &Post, b: &Post) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("No post with id: {}", id))
}

pub struct PostService {
    store: Arc<dyn PostStore>,
    media: MediaService,
    /// Last id handed out by this process
    last_id: AtomicI64,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>, media: MediaService) -> Self {
        Self {
            store,
            media,
            last_id: AtomicI64::new(0),
        }
    }

    /// Millisecond timestamp id, strictly increasing within this process
    fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_id
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    pub fn media(&self) -> &MediaService {
        &self.media
    }

    /// Get one page of posts, newest first
    pub async fn list_posts(&self, page: usize) -> Result<PostPage> {
        if page == 0 {
            return Err(AppError::BadRequest("page must be at least 1".to_string()));
        }

        let total = self.store.count_posts().await?;
        let mut posts = self.store.scan_posts().await?;
        posts.sort_by(newest_first);

        let data: Vec<Post> = posts
            .into_iter()
            .skip(page_offset(page))
            .take(PAGE_SIZE)
            .collect();

        tracing::debug!(page, total, returned = data.len(), "listed posts");

        Ok(PostPage {
            data,
            current_page: page,
            number_of_pages: page_count(total),
        })
    }

    /// Posts matching a title substring or any of the tags
    pub async fn search_posts(&self, search: &PostSearch) -> Result<Vec<Post>> {
        if search.is_empty() {
            return Ok(Vec::new());
        }

        let mut posts = self.store.search_posts(search).await?;
        posts.sort_by(newest_first);
        Ok(posts)
    }

    /// Posts published under a display name
    pub async fn posts_by_creator(&self, name: &str) -> Result<Vec<Post>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".to_string()));
        }

        let mut posts = self.store.posts_by_creator_name(name).await?;
        posts.sort_by(newest_first);
        Ok(posts)
    }

    pub async fn get_post(&self, id: &str) -> Result<Post> {
        self.store.get_post(id).await?.ok_or_else(|| not_found(id))
    }

    /// Create a post owned by `creator`
    pub async fn create_post(&self, creator: &str, draft: PostUpdate) -> Result<Post> {
        let id = self.next_id();
        let selected_file = self
            .media
            .store_attachment(&id.to_string(), draft.selected_file)
            .await?;

        let mut post = Post {
            id: id.to_string(),
            title: draft.title,
            message: draft.message,
            name: draft.name,
            creator: creator.to_string(),
            tags: draft.tags,
            selected_file,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        };

        let mut attempt = 1;
        loop {
            match self.store.put_post(&post).await {
                Ok(()) => break,
                Err(StoreError::ConditionFailed) if attempt < MAX_ID_ATTEMPTS => {
                    tracing::debug!(post_id = %post.id, attempt, "post id taken, retrying");
                    post.id = self.next_id().to_string();
                    attempt += 1;
                }
                Err(e) => {
                    self.media
                        .remove_attachment(&post.id, post.selected_file.as_deref())
                        .await;
                    return Err(e.into());
                }
            }
        }

        tracing::info!(post_id = %post.id, user_id = %creator, "post created");
        Ok(post)
    }

    /// Replace the editable fields of a post owned by `user_id`
    pub async fn update_post(&self, id: &str, user_id: &str, update: PostUpdate) -> Result<Post> {
        let existing = self.get_post(id).await?;
        if !existing.is_owned_by(user_id) {
            tracing::warn!(post_id = %id, %user_id, "update rejected for non-owner");
            return Err(AppError::Forbidden("You can only edit your own posts".to_string()));
        }

        let selected_file = self.media.store_attachment(id, update.selected_file).await?;
        let update = PostUpdate {
            selected_file,
            ..update
        };

        let updated = match self.store.update_post(id, &update).await {
            Ok(post) => post,
            Err(e) => {
                if update.selected_file != existing.selected_file {
                    self.media
                        .remove_attachment(id, update.selected_file.as_deref())
                        .await;
                }
                return Err(match e {
                    StoreError::NotFound => not_found(id),
                    other => other.into(),
                });
            }
        };

        if existing.selected_file != updated.selected_file {
            self.media
                .remove_attachment(id, existing.selected_file.as_deref())
                .await;
        }

        tracing::info!(post_id = %id, %user_id, "post updated");
        Ok(updated)
    }

    /// Delete a post owned by `user_id` along with its attachment
    pub async fn delete_post(&self, id: &str, user_id: &str) -> Result<()> {
        let existing = self.get_post(id).await?;
        if !existing.is_owned_by(user_id) {
            tracing::warn!(post_id = %id, %user_id, "delete rejected for non-owner");
            return Err(AppError::Forbidden("You can only delete your own posts".to_string()));
        }

        match self.store.delete_post(id, user_id).await {
            Ok(()) => {}
            Err(StoreError::ConditionFailed) => return Err(not_found(id)),
            Err(e) => return Err(e.into()),
        }

        self.media
            .remove_attachment(id, existing.selected_file.as_deref())
            .await;

        tracing::info!(post_id = %id, %user_id, "post deleted");
        Ok(())
    }

    /// Record a like from `user_id`; liking twice is a no-op
    pub async fn like_post(&self, id: &str, user_id: &str) -> Result<Post> {
        match self.store.add_like(id, user_id).await {
            Ok(post) => {
                tracing::debug!(post_id = %id, %user_id, likes = post.likes.len(), "post liked");
                Ok(post)
            }
            Err(StoreError::NotFound) => Err(not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn comment_post(&self, id: &str, comment: &str) -> Result<Post> {
        if comment.trim().is_empty() {
            return Err(AppError::BadRequest("Comment must not be empty".to_string()));
        }

        match self.store.append_comment(id, comment).await {
            Ok(post) => Ok(post),
            Err(StoreError::NotFound) => Err(not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await?;
        Ok(())
    }
}
