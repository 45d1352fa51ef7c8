//! Shared cryptographic helpers for the social API.
//!
//! Currently this is the session token module; password hashing lives next to the
//! user store in the service because it is tied to the stored hash format.

pub mod jwt;
