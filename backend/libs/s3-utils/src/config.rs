/// S3 configuration for post attachments
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL for public access (CDN domain); derived from bucket and region when unset
    pub base_url: Option<String>,
    /// Whether to use path-style URLs (false = virtual-hosted-style)
    pub path_style: bool,
    /// Custom endpoint (MinIO, LocalStack)
    pub endpoint_url: Option<String>,
}

impl S3Config {
    /// Load S3 configuration from environment variables
    ///
    /// Returns `None` when `S3_BUCKET` is unset, which disables blob uploads.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = lookup("S3_BUCKET").filter(|b| !b.trim().is_empty())?;

        Some(Self {
            bucket: bucket.trim().to_string(),
            region: lookup("AWS_REGION").unwrap_or_else(|| "ap-south-1".to_string()),
            base_url: lookup("S3_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            path_style: lookup("S3_PATH_STYLE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            endpoint_url: lookup("S3_ENDPOINT").filter(|e| !e.is_empty()),
        })
    }

    /// Public URL prefix every object of this bucket shares
    pub fn url_prefix(&self) -> String {
        match &self.base_url {
            Some(base) => format!("{}/", base),
            None if self.path_style => {
                format!("https://s3.{}.amazonaws.com/{}/", self.region, self.bucket)
            }
            None => format!("https://{}.s3.{}.amazonaws.com/", self.bucket, self.region),
        }
    }

    /// Build the public object URL
    pub fn object_url(&self, key: &str) -> String {
        format!("{}{}", self.url_prefix(), key)
    }

    /// Recover the object key from a URL produced by `object_url`
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.url_prefix())
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}
