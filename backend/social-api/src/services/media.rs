/// Post attachments
///
/// The browser client sends `selectedFile` as a base64 data URL. With a bucket configured
/// the bytes are moved to the blob store and the post keeps only the public URL; without
/// one the data URL is stored inline.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use s3_utils::{S3Client, S3Error, S3Operations};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Blob storage seam
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an object and return its public URL
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Object key for a URL this store handed out, `None` for foreign URLs
    fn key_for_url(&self, url: &str) -> Option<String>;

    async fn health_check(&self) -> Result<()>;
}

/// S3-backed blob store
pub struct S3BlobStore {
    client: S3Client,
    operations: S3Operations,
}

impl S3BlobStore {
    pub fn new(client: S3Client) -> Self {
        let operations = client.operations();
        Self { client, operations }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String> {
        Ok(self.operations.upload_file(key, body, content_type).await?)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        Ok(self.operations.delete_file(key).await?)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        self.operations.config().key_from_url(url)
    }

    async fn health_check(&self) -> Result<()> {
        self.client
            .health_check()
            .await
            .map_err(|e: S3Error| AppError::Unavailable(e.to_string()))
    }
}

/// In-process blob store for tests
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

const MEMORY_BLOB_PREFIX: &str = "memory://blobs/";

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type and bytes stored under `key`
    pub async fn get(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), (content_type.to_string(), body));
        Ok(format!("{}{}", MEMORY_BLOB_PREFIX, key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(MEMORY_BLOB_PREFIX)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// A decoded `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub content_type: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Whether the value looks like a data URL rather than a hosted URL
pub fn is_data_url(value: &str) -> bool {
    value.starts_with("data:")
}

/// Decode `data:<mime>;base64,<payload>`, accepting only images up to `max_bytes`
pub fn parse_data_url(value: &str, max_bytes: usize) -> Result<DataUrl> {
    let rest = value
        .strip_prefix("data:")
        .ok_or_else(|| AppError::BadRequest("selectedFile is not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::BadRequest("Malformed data URL".to_string()))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| AppError::BadRequest("Data URL must be base64 encoded".to_string()))?;

    let mime: mime::Mime = media_type
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid media type '{}'", media_type)))?;
    if mime.type_() != mime::IMAGE {
        return Err(AppError::BadRequest(format!(
            "Unsupported attachment type '{}'",
            mime.essence_str()
        )));
    }

    // Decoded length is at most 3/4 of the encoded length
    if payload.len() / 4 * 3 > max_bytes + 2 {
        return Err(AppError::BadRequest(format!(
            "Attachment exceeds {} bytes",
            max_bytes
        )));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::BadRequest("Invalid base64 payload".to_string()))?;
    if bytes.len() > max_bytes {
        return Err(AppError::BadRequest(format!(
            "Attachment exceeds {} bytes",
            max_bytes
        )));
    }

    let extension = match mime.subtype().as_str() {
        "jpeg" => "jpg".to_string(),
        "svg+xml" => "svg".to_string(),
        other => other.to_string(),
    };

    Ok(DataUrl {
        content_type: mime.essence_str().to_string(),
        extension,
        bytes,
    })
}

/// Object key for a post attachment
pub fn attachment_key(post_id: &str, extension: &str) -> String {
    format!("posts/{}/{}.{}", post_id, Uuid::new_v4(), extension)
}

/// Moves attachments between post items and the blob store
#[derive(Clone)]
pub struct MediaService {
    blobs: Option<Arc<dyn BlobStore>>,
    max_bytes: usize,
}

impl MediaService {
    pub fn new(blobs: Option<Arc<dyn BlobStore>>, max_bytes: usize) -> Self {
        Self { blobs, max_bytes }
    }

    /// Resolve the `selectedFile` value to persist for a post
    ///
    /// Data URLs are validated in both modes and uploaded when a blob store is present.
    /// Empty values clear the attachment; anything else is kept as given.
    pub async fn store_attachment(
        &self,
        post_id: &str,
        selected_file: Option<String>,
    ) -> Result<Option<String>> {
        let value = match selected_file.filter(|v| !v.trim().is_empty()) {
            Some(value) => value,
            None => return Ok(None),
        };

        if !is_data_url(&value) {
            return Ok(Some(value));
        }

        let data = parse_data_url(&value, self.max_bytes)?;
        let blobs = match &self.blobs {
            Some(blobs) => blobs,
            None => return Ok(Some(value)),
        };

        let key = attachment_key(post_id, &data.extension);
        let size = data.bytes.len();
        let url = blobs.upload(&key, data.bytes, &data.content_type).await?;
        tracing::info!(post_id, %key, size, "stored post attachment");

        Ok(Some(url))
    }

    /// Delete the blob behind `selected_file` if this service owns it
    ///
    /// Failures are logged and swallowed; the post change has already happened.
    pub async fn remove_attachment(&self, post_id: &str, selected_file: Option<&str>) {
        let (blobs, url) = match (&self.blobs, selected_file) {
            (Some(blobs), Some(url)) => (blobs, url),
            _ => return,
        };
        let key = match blobs.key_for_url(url) {
            Some(key) => key,
            None => return,
        };

        match blobs.delete(&key).await {
            Ok(()) => tracing::info!(post_id, %key, "removed post attachment"),
            Err(e) => tracing::warn!(post_id, %key, error = %e, "failed to remove post attachment"),
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        match &self.blobs {
            Some(blobs) => blobs.health_check().await,
            None => Ok(()),
        }
    }
}
