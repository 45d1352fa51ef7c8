/// Storage seam for posts and users
///
/// `dynamo` holds the DynamoDB implementations used in deployment; `memory` holds
/// the in-process implementations used by tests and `STORAGE_BACKEND=memory`.
use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Post, PostSearch, PostUpdate, User};

pub mod dynamo;
pub mod memory;
pub mod post_repo;
pub mod user_repo;

pub use dynamo::create_client;
pub use memory::{MemoryPostStore, MemoryUserStore};
pub use post_repo::DynamoPostStore;
pub use user_repo::DynamoUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found")]
    NotFound,

    #[error("conditional check failed")]
    ConditionFailed,

    #[error("request throttled: {0}")]
    Throttled(String),

    #[error("item (de)serialization failed: {0}")]
    Serialization(String),

    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Number of items in the table
    async fn count_posts(&self) -> StoreResult<usize>;

    /// Every post, in store order
    async fn scan_posts(&self) -> StoreResult<Vec<Post>>;

    /// Posts whose title contains the query or whose tags contain any listed tag
    async fn search_posts(&self, search: &PostSearch) -> StoreResult<Vec<Post>>;

    /// Posts whose `name` equals the given display name
    async fn posts_by_creator_name(&self, name: &str) -> StoreResult<Vec<Post>>;

    async fn get_post(&self, id: &str) -> StoreResult<Option<Post>>;

    /// Insert a new post; `ConditionFailed` when the id is taken
    async fn put_post(&self, post: &Post) -> StoreResult<()>;

    /// Overwrite the editable fields, keeping likes and comments; `NotFound` when absent
    async fn update_post(&self, id: &str, update: &PostUpdate) -> StoreResult<Post>;

    /// Delete a post owned by `creator`; `ConditionFailed` when absent or owned by someone else
    async fn delete_post(&self, id: &str, creator: &str) -> StoreResult<()>;

    /// Add `user_id` to the likes set; `NotFound` when absent
    async fn add_like(&self, id: &str, user_id: &str) -> StoreResult<Post>;

    /// Append to the comments list; `NotFound` when absent
    async fn append_comment(&self, id: &str, comment: &str) -> StoreResult<Post>;

    async fn health_check(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, email: &str) -> StoreResult<Option<User>>;

    /// Insert a new user; `ConditionFailed` when the email is taken
    async fn create_user(&self, user: &User) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
}
