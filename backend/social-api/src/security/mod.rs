/// Security module for authentication
/// Provides password hashing; session tokens come from crypto-core
pub use crypto_core::jwt;

pub mod password;

pub use password::{hash_password, verify_password};

#[cfg(test)]
pub(crate) fn init_test_jwt() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        jwt::initialize_jwt_secret("social-api-unit-test-secret-0123456789")
            .expect("jwt init");
    });
}
