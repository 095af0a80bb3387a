//! Bearer session tokens (HS256 JWT)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Claim value distinguishing session tokens from any future token kinds
const TOKEN_TYPE_SESSION: &str = "session";

/// JWT errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("JWT encoding error: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token subject is not a valid user id")]
    Subject,
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Token kind; must be "session" for API access
    pub token_type: String,
}

impl SessionClaims {
    pub fn new(user_id: Uuid, validity: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
            token_type: TOKEN_TYPE_SESSION.to_string(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid, SessionError> {
        Uuid::parse_str(&self.sub).map_err(|_| SessionError::Subject)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Symmetric key that signs and verifies session tokens
#[derive(Clone)]
pub struct SessionKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionKey {
    /// Create a key using HMAC-SHA256 over the given secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Issue a session token for a user, valid for `validity`.
    ///
    /// Returns the encoded token together with its expiry timestamp.
    pub fn issue(
        &self,
        user_id: Uuid,
        validity: Duration,
    ) -> Result<(String, DateTime<Utc>), SessionError> {
        let claims = SessionClaims::new(user_id, validity);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((token, claims.expires_at()))
    }

    /// Verify a token's signature, expiry and kind, returning its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid,
            },
        )?;

        if data.claims.token_type != TOKEN_TYPE_SESSION {
            return Err(SessionError::Invalid);
        }

        Ok(data.claims)
    }
}
