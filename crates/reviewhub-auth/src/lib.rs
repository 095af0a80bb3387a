//! Authentication primitives for the review backend
//!
//! Password hashing (Argon2id) and bearer session tokens (HS256 JWT). The
//! rest of the system treats the token as an opaque credential.

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password, PasswordError};
pub use session::{SessionClaims, SessionError, SessionKey};
