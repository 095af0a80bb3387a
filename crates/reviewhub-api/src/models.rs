//! Request and response models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use reviewhub_db::entities::{company, review, user};

/// Error payload for authentication and infrastructure failures.
///
/// Validation failures use a field-keyed error map instead (see
/// [`crate::validation::ValidationErrors`]).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Sign-up request
///
/// The exact allow-list of accepted fields; anything else (including
/// privilege flags) fails validation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignUpRequest {
    /// Email address (must be unique)
    pub email: String,
    pub first_name: String,
    /// Optional; defaults to an empty string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Minimum 8 characters, not entirely numeric
    pub password: String,
    /// Must equal `password`
    pub confirm_password: String,
}

/// Created-user representation; password material is never serialized
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response carrying the opaque bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Nested company payload of a review
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyPayload {
    /// Company name (max 64 characters); overwritten on upsert
    pub name: String,
    /// External company identifier the upsert is keyed by
    pub company_id: i64,
    /// Optional website URL; empty string is treated as absent
    pub website: Option<String>,
}

impl From<company::Model> for CompanyPayload {
    fn from(company: company::Model) -> Self {
        Self {
            name: company.name,
            company_id: company.company_id,
            website: company.website,
        }
    }
}

/// Review creation request
///
/// `reviewer`, `ip_address` and `submission_date` are server-derived and
/// rejected if submitted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    /// Rating between 1 and 5 inclusive
    pub rating: i32,
    /// Max 64 characters
    pub title: String,
    /// Max 10000 characters
    pub summary: String,
    pub company: CompanyPayload,
}

/// Review representation returned by create and list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    pub rating: i32,
    pub title: String,
    pub summary: String,
    /// Client IP recorded at creation (read-only)
    pub ip_address: String,
    /// UTC date the review was created (read-only)
    pub submission_date: NaiveDate,
    pub company: CompanyPayload,
    /// Display string of the authenticated creator (read-only)
    pub reviewer: String,
}

impl ReviewResponse {
    pub fn from_parts(review: review::Model, company: company::Model, reviewer: &user::Model) -> Self {
        Self {
            rating: review.rating,
            title: review.title,
            summary: review.summary,
            ip_address: review.ip_address,
            submission_date: review.submission_date,
            company: company.into(),
            reviewer: reviewer.display_name(),
        }
    }
}
