//! HTTP handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use reviewhub_auth::{hash_password, verify_password};
use reviewhub_db::entities::{company, review, user};

use crate::error::ApiError;
use crate::extract::{AuthUser, ClientIp};
use crate::models::*;
use crate::validation::{self, ValidationErrors, NON_FIELD_ERRORS};
use crate::AppState;

const EMAIL_TAKEN: &str = "A user with this email already exists.";
const BAD_CREDENTIALS: &str = "Unable to log in with provided credentials.";

fn is_unique_violation(e: &sea_orm::DbErr) -> bool {
    matches!(
        e.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed; body maps field names to message lists"),
        (status = 405, description = "Method not allowed")
    ),
    tag = "auth"
)]
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    debug!("Processing sign-up request");

    let new_user = validation::validate_sign_up(&payload)?;

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&new_user.email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ValidationErrors::single("email", EMAIL_TAKEN).into());
    }

    let password_hash =
        hash_password(&new_user.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let inserted = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(new_user.email),
        password_hash: Set(password_hash),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        // Privilege flags are not part of the sign-up contract
        is_staff: Set(false),
        is_superuser: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await;

    let created = match inserted {
        Ok(model) => model,
        // Concurrent sign-up with the same email: the unique index is the
        // final arbiter, the loser gets the same response as a duplicate
        Err(e) if is_unique_violation(&e) => {
            return Err(ValidationErrors::single("email", EMAIL_TAKEN).into());
        }
        Err(e) => return Err(ApiError::Database(e)),
    };

    info!("User account created: {}", created.email);

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

/// Verify credentials and issue a bearer session token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 400, description = "Missing fields or bad credentials"),
        (status = 405, description = "Method not allowed")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<LoginResponse>, ApiError> {
    let creds = validation::validate_login(&payload)?;

    debug!("Login attempt for {}", creds.email);

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&creds.email))
        .one(&state.db)
        .await?;

    let verified = match &user {
        Some(user) => verify_password(&creds.password, &user.password_hash)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        None => false,
    };

    let user = match (user, verified) {
        (Some(user), true) => user,
        // Same response for unknown email and wrong password
        _ => return Err(ValidationErrors::single(NON_FIELD_ERRORS, BAD_CREDENTIALS).into()),
    };

    let (token, expires_at) = state
        .session_key
        .issue(user.id, state.session_ttl)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!("Issued session token for {}", user.email);

    Ok(Json(LoginResponse { token, expires_at }))
}

/// Create a review for the authenticated caller
#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Validation failed; company sub-errors are nested"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 405, description = "Method not allowed")
    ),
    tag = "reviews"
)]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    AuthUser(reviewer): AuthUser,
    ClientIp(client_ip): ClientIp,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    debug!("Processing review creation for {}", reviewer.email);

    let data = validation::validate_review(&payload)?;
    let now = Utc::now();

    // Company upsert and review insert commit or roll back together
    let txn = state.db.begin().await?;

    // The unique index on company_id arbitrates concurrent creates: the
    // loser of the insert race degrades to the update
    let company = company::Entity::insert(company::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(data.company.company_id),
        name: Set(data.company.name),
        website: Set(data.company.website),
        created_at: Set(now),
        updated_at: Set(now),
    })
    .on_conflict(
        OnConflict::column(company::Column::CompanyId)
            .update_columns([
                company::Column::Name,
                company::Column::Website,
                company::Column::UpdatedAt,
            ])
            .to_owned(),
    )
    .exec_with_returning(&txn)
    .await?;

    let review = review::ActiveModel {
        id: Set(Uuid::new_v4()),
        rating: Set(data.rating),
        title: Set(data.title),
        summary: Set(data.summary),
        ip_address: Set(client_ip.to_string()),
        submission_date: Set(now.date_naive()),
        company_id: Set(company.id),
        reviewer_id: Set(reviewer.id),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        "Review {} created for company {}",
        review.id, company.company_id
    );

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse::from_parts(review, company, &reviewer)),
    ))
}

/// List the authenticated caller's reviews
#[utoipa::path(
    get,
    path = "/api/reviews",
    responses(
        (status = 200, description = "The caller's reviews", body = [ReviewResponse]),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 405, description = "Method not allowed")
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    AuthUser(reviewer): AuthUser,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    debug!("Listing reviews for {}", reviewer.email);

    let rows = review::Entity::find()
        .filter(review::Column::ReviewerId.eq(reviewer.id))
        .order_by_asc(review::Column::CreatedAt)
        .find_also_related(company::Entity)
        .all(&state.db)
        .await?;

    let mut reviews = Vec::with_capacity(rows.len());
    for (review, company) in rows {
        let company = company.ok_or_else(|| {
            ApiError::Internal(format!("Review {} has no company row", review.id))
        })?;
        reviews.push(ReviewResponse::from_parts(review, company, &reviewer));
    }

    Ok(Json(reviews))
}
