/// Business logic layer
pub mod auth;
pub mod media;
pub mod posts;

pub use auth::{AuthResponse, AuthService, NewAccount};
pub use media::{BlobStore, MediaService, MemoryBlobStore, S3BlobStore};
pub use posts::{PostPage, PostService, PAGE_SIZE};
