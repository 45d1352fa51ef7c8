//! Social API
//!
//! REST backend for a small social feed: posts with likes, comments, search and
//! pagination, plus email/password accounts with session tokens. Posts and users live
//! in DynamoDB tables; image attachments optionally live in S3.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod security;
pub mod services;

pub use error::{AppError, Result};

use std::sync::Arc;

use config::{Config, StorageBackend};
use db::{DynamoPostStore, DynamoUserStore, MemoryPostStore, MemoryUserStore, PostStore, UserStore};
use s3_utils::S3Client;
use services::{AuthService, BlobStore, MediaService, PostService, S3BlobStore};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        post_store: Arc<dyn PostStore>,
        user_store: Arc<dyn UserStore>,
        media: MediaService,
    ) -> Self {
        Self {
            posts: Arc::new(PostService::new(post_store, media)),
            auth: Arc::new(AuthService::new(user_store)),
        }
    }

    /// State backed by in-process stores
    pub fn in_memory(blobs: Option<Arc<dyn BlobStore>>, max_attachment_bytes: usize) -> Self {
        Self::new(
            Arc::new(MemoryPostStore::new()),
            Arc::new(MemoryUserStore::new()),
            MediaService::new(blobs, max_attachment_bytes),
        )
    }

    /// Build stores and clients for the configured backends
    pub async fn from_config(config: &Config) -> Self {
        let blobs: Option<Arc<dyn BlobStore>> = match &config.media.s3 {
            Some(s3) => {
                tracing::info!(bucket = %s3.bucket, "post attachments stored in S3");
                let client = S3Client::with_config(s3.clone()).await;
                Some(Arc::new(S3BlobStore::new(client)) as Arc<dyn BlobStore>)
            }
            None => {
                tracing::info!("S3_BUCKET not set, post attachments stored inline");
                None
            }
        };

        match config.storage.backend {
            StorageBackend::Memory => {
                tracing::warn!("using in-memory storage; data is lost on restart");
                Self::in_memory(blobs, config.media.max_bytes)
            }
            StorageBackend::DynamoDb => {
                let client = db::create_client(&config.storage).await;
                Self::new(
                    Arc::new(DynamoPostStore::new(
                        client.clone(),
                        config.storage.posts_table.clone(),
                    )),
                    Arc::new(DynamoUserStore::new(client, config.storage.users_table.clone())),
                    MediaService::new(blobs, config.media.max_bytes),
                )
            }
        }
    }
}
