//! Request-scoped extractors
//!
//! Caller identity and client address enter handlers as explicit arguments,
//! never as ambient state. Authentication lives in an extractor (rather
//! than a router-wide middleware layer) so that method routing resolves
//! first: an unsupported verb is 405 even for unauthenticated callers.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts},
};
use sea_orm::EntityTrait;

use reviewhub_db::entities::user;

use crate::error::ApiError;
use crate::AppState;

/// The authenticated caller, resolved from the bearer session token.
///
/// Rejects with 401 when the Authorization header is missing or malformed,
/// the token fails verification, or the subject no longer exists.
pub struct AuthUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized {
                message: "Missing authentication token (Authorization header)".to_string(),
                code: "MISSING_AUTH",
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized {
                message: "Invalid Authorization header format. Expected 'Bearer <token>'"
                    .to_string(),
                code: "INVALID_AUTH_FORMAT",
            })?;

        let claims = state
            .session_key
            .verify(token)
            .map_err(|e| ApiError::Unauthorized {
                message: format!("Invalid or expired token: {}", e),
                code: "INVALID_TOKEN",
            })?;

        let user_id = claims.user_id().map_err(|e| ApiError::Unauthorized {
            message: format!("Invalid or expired token: {}", e),
            code: "INVALID_TOKEN",
        })?;

        let user = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::Unauthorized {
                message: "Token refers to an unknown user".to_string(),
                code: "UNKNOWN_USER",
            })?;

        Ok(AuthUser(user))
    }
}

/// Client IP derived from the request's forwarding chain.
///
/// The first comma-separated entry of `X-Forwarded-For` wins when it parses
/// as an IP literal; otherwise the direct connection's remote address is
/// used.
pub struct ClientIp(pub IpAddr);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(forwarded) = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
        {
            if let Some(first) = forwarded.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return Ok(ClientIp(ip));
                }
            }
        }

        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(ClientIp(addr.ip()));
        }

        Err(ApiError::BadRequest {
            message: "Unable to determine client address".to_string(),
            code: "UNKNOWN_CLIENT_ADDR",
        })
    }
}
