/// Configuration management for the social API
///
/// Values come from environment variables (a `.env` file is loaded first by `main`).
use s3_utils::S3Config;
use serde::{Deserialize, Serialize};

const DEV_JWT_SECRET: &str = "development-only-secret-do-not-deploy";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Table store configuration
    pub storage: StorageConfig,
    /// Session token configuration
    pub auth: AuthConfig,
    /// Attachment configuration
    pub media: MediaConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins, or `*`
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    DynamoDb,
    Memory,
}

/// Table store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// AWS region
    pub region: String,
    /// Custom DynamoDB endpoint (DynamoDB Local)
    pub endpoint_url: Option<String>,
    pub posts_table: String,
    pub users_table: String,
}

/// Session token configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

/// Attachment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Bucket settings; `None` keeps attachments inline in the post item
    pub s3: Option<S3Config>,
    /// Largest decoded attachment accepted
    pub max_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| format!("Failed to parse PORT='{}': {}", raw, e))?,
            None => 5000,
        };

        let app = AppConfig {
            env: app_env,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            json_logs: lookup("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        let cors = {
            let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
                Some(value) => value,
                None if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                None => "*".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let backend = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "dynamodb".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "dynamodb" => StorageBackend::DynamoDb,
            "memory" if production => {
                return Err("STORAGE_BACKEND=memory is not allowed in production".to_string())
            }
            "memory" => StorageBackend::Memory,
            other => return Err(format!("Unknown STORAGE_BACKEND '{}'", other)),
        };

        let storage = StorageConfig {
            backend,
            region: lookup("AWS_REGION").unwrap_or_else(|| "ap-south-1".to_string()),
            endpoint_url: lookup("DYNAMODB_ENDPOINT").filter(|v| !v.is_empty()),
            posts_table: lookup("POSTS_TABLE").unwrap_or_else(|| "posts".to_string()),
            users_table: lookup("USERS_TABLE").unwrap_or_else(|| "users".to_string()),
        };

        let auth = {
            let jwt_secret = match lookup("JWT_SECRET_KEY").filter(|s| !s.is_empty()) {
                Some(secret) => secret,
                None if production => {
                    return Err("JWT_SECRET_KEY must be set in production".to_string())
                }
                None => DEV_JWT_SECRET.to_string(),
            };

            if production && jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(format!(
                    "JWT_SECRET_KEY must be at least {} bytes in production",
                    MIN_PRODUCTION_SECRET_LEN
                ));
            }

            AuthConfig { jwt_secret }
        };

        let media = MediaConfig {
            s3: S3Config::from_lookup(&lookup),
            max_bytes: match lookup("MEDIA_MAX_BYTES") {
                Some(raw) => raw
                    .parse()
                    .map_err(|e| format!("Failed to parse MEDIA_MAX_BYTES='{}': {}", raw, e))?,
                None => 10 * 1024 * 1024,
            },
        };

        Ok(Config {
            app,
            cors,
            storage,
            auth,
            media,
        })
    }

    /// Whether the development fallback secret is in use
    pub fn uses_dev_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_for_development() {
        let cfg = Config::from_lookup(lookup_from(&[])).expect("config");

        assert_eq!(cfg.app.port, 5000);
        assert_eq!(cfg.app.host, "0.0.0.0");
        assert!(!cfg.app.json_logs);
        assert_eq!(cfg.cors.allowed_origins, "*");
        assert_eq!(cfg.storage.backend, StorageBackend::DynamoDb);
        assert_eq!(cfg.storage.region, "ap-south-1");
        assert_eq!(cfg.storage.posts_table, "posts");
        assert_eq!(cfg.storage.users_table, "users");
        assert!(cfg.media.s3.is_none());
        assert_eq!(cfg.media.max_bytes, 10 * 1024 * 1024);
        assert!(cfg.uses_dev_secret());
    }

    #[test]
    fn memory_backend_and_bucket() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("STORAGE_BACKEND", "Memory"),
            ("S3_BUCKET", "memories-media"),
            ("PORT", "8080"),
            ("LOG_FORMAT", "json"),
        ]))
        .expect("config");

        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.app.port, 8080);
        assert!(cfg.app.json_logs);
        assert_eq!(
            cfg.media.s3.map(|s3| s3.bucket),
            Some("memories-media".to_string())
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup_from(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("STORAGE_BACKEND", "postgres")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("MEDIA_MAX_BYTES", "-1")])).is_err());
    }

    #[test]
    fn production_requires_secrets_and_origins() {
        let missing_secret = Config::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://memories.example.com"),
        ]));
        assert!(missing_secret.is_err());

        let short_secret = Config::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://memories.example.com"),
            ("JWT_SECRET_KEY", "short"),
        ]));
        assert!(short_secret.is_err());

        let wildcard = Config::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "*"),
            ("JWT_SECRET_KEY", "0123456789abcdef0123456789abcdef"),
        ]));
        assert!(wildcard.is_err());

        let ok = Config::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://memories.example.com"),
            ("JWT_SECRET_KEY", "0123456789abcdef0123456789abcdef"),
        ]))
        .expect("config");
        assert!(ok.app.is_production());
        assert!(!ok.uses_dev_secret());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = Config::from_lookup(lookup_from(&[("JWT_SECRET_KEY", "hunter2hunter2")]))
            .expect("config");
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("hunter2hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        std::env::set_var("POSTS_TABLE", "posts-staging");
        std::env::set_var("USERS_TABLE", "users-staging");

        let cfg = Config::from_env().expect("config");
        assert_eq!(cfg.storage.posts_table, "posts-staging");
        assert_eq!(cfg.storage.users_table, "users-staging");

        std::env::remove_var("POSTS_TABLE");
        std::env::remove_var("USERS_TABLE");
    }
}
