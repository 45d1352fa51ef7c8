/// Session token module for the social API
///
/// Tokens are HS256 JWTs signed with a shared secret (`JWT_SECRET_KEY`). The claims carry
/// the user's email twice, once as `email` and once as `id`, because the user table is
/// keyed by email and the browser client reads `id` as the user identifier.
///
/// ## Usage
///
/// Call `initialize_jwt_secret()` once during startup before any token operation:
///
/// ```rust
/// use crypto_core::jwt;
///
/// let secret = std::env::var("JWT_SECRET_KEY").unwrap_or_else(|_| "dev-secret".into());
/// jwt::initialize_jwt_secret(&secret).expect("Failed to initialize JWT secret");
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Session lifetime handed out by signin/signup.
pub const SESSION_TOKEN_EXPIRY_SECS: i64 = 3600;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// Session token claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User email address
    pub email: String,
    /// User identifier (the email for password accounts)
    pub id: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

// ============================================================================
// Key Storage
// ============================================================================

/// Keys are set once at startup and never modified.
static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the signing and verification keys from the shared secret
///
/// Can only be called once; a second call returns an error.
///
/// ## Errors
///
/// Returns error if:
/// - The secret is empty
/// - Keys are already initialized
pub fn initialize_jwt_secret(secret: &str) -> Result<()> {
    if secret.is_empty() {
        return Err(anyhow!("JWT secret must not be empty"));
    }

    JWT_ENCODING_KEY
        .set(EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|_| anyhow!("JWT encoding key already initialized"))?;

    JWT_DECODING_KEY
        .set(DecodingKey::from_secret(secret.as_bytes()))
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    Ok(())
}

/// Whether `initialize_jwt_secret()` has already run in this process
pub fn is_initialized() -> bool {
    JWT_ENCODING_KEY.get().is_some() && JWT_DECODING_KEY.get().is_some()
}

fn get_encoding_key() -> Result<&'static EncodingKey> {
    JWT_ENCODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT secret not initialized. Call initialize_jwt_secret() during startup.")
    })
}

fn get_decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT secret not initialized. Call initialize_jwt_secret() during startup.")
    })
}

// ============================================================================
// Token Generation
// ============================================================================

/// Generate a session token valid for `SESSION_TOKEN_EXPIRY_SECS`
pub fn generate_session_token(user_id: &str, email: &str) -> Result<String> {
    generate_session_token_with_ttl(user_id, email, Duration::seconds(SESSION_TOKEN_EXPIRY_SECS))
}

/// Generate a session token with an explicit lifetime
pub fn generate_session_token_with_ttl(user_id: &str, email: &str, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let expiry = now + ttl;

    let claims = Claims {
        email: email.to_string(),
        id: user_id.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
    };

    let encoding_key = get_encoding_key()?;
    encode(&Header::new(JWT_ALGORITHM), &claims, encoding_key)
        .map_err(|e| anyhow!("Failed to generate session token: {e}"))
}

// ============================================================================
// Token Validation
// ============================================================================

/// Validate and decode a session token
///
/// Checks the HS256 signature and the expiry. Tokens signed with any other
/// algorithm are rejected.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let decoding_key = get_decoding_key()?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp"]);

    decode::<Claims>(token, decoding_key, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}

/// Extract the user id from a validated token
pub fn get_user_id_from_token(token: &str) -> Result<String> {
    let token_data = validate_token(token)?;
    Ok(token_data.claims.id)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "unit-test-secret-that-is-long-enough-0123";

    fn init_test_keys() {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            initialize_jwt_secret(TEST_SECRET).expect("Failed to initialize test secret");
        });
    }

    #[test]
    fn test_generate_session_token() {
        init_test_keys();

        let token = generate_session_token("ada@example.com", "ada@example.com")
            .expect("token");
        assert_eq!(token.matches('.').count(), 2);
    }

    #[test]
    fn test_validate_valid_token() {
        init_test_keys();

        let token = generate_session_token("ada@example.com", "ada@example.com")
            .expect("token");
        let data = validate_token(&token).expect("valid token");

        assert_eq!(data.claims.email, "ada@example.com");
        assert_eq!(data.claims.id, "ada@example.com");
        assert_eq!(data.claims.exp - data.claims.iat, SESSION_TOKEN_EXPIRY_SECS);
    }

    #[test]
    fn test_expired_token_rejected() {
        init_test_keys();

        let token = generate_session_token_with_ttl(
            "ada@example.com",
            "ada@example.com",
            Duration::hours(-2),
        )
        .expect("token");

        assert!(validate_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        init_test_keys();

        let token = generate_session_token("ada@example.com", "ada@example.com")
            .expect("token");
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[2] = "invalidsignature";
        let tampered = parts.join(".");

        assert!(validate_token(&tampered).is_err());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        init_test_keys();

        let claims = Claims {
            email: "mallory@example.com".into(),
            id: "mallory@example.com".into(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .expect("encode");

        assert!(validate_token(&forged).is_err());
    }

    #[test]
    fn test_get_user_id_from_token() {
        init_test_keys();

        let token = generate_session_token("grace@example.com", "grace@example.com")
            .expect("token");
        assert_eq!(
            get_user_id_from_token(&token).expect("user id"),
            "grace@example.com"
        );
    }

    #[test]
    fn test_double_initialization_fails() {
        init_test_keys();
        assert!(is_initialized());
        assert!(initialize_jwt_secret(TEST_SECRET).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        init_test_keys();
        assert!(validate_token("not-a-jwt").is_err());
    }
}
