//! REST API for the review backend
//!
//! Sign-up, login, and the authenticated review resource (create + list),
//! served by axum with an OpenAPI document and Swagger UI.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod validation;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use reviewhub_auth::SessionKey;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub session_key: SessionKey,
    pub session_ttl: chrono::Duration,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Review API",
        version = "0.1.0",
        description = "REST API for per-user company reviews",
        contact(
            name = "Reviewhub Team",
            email = "team@reviewhub.dev"
        )
    ),
    paths(
        handlers::health_check,
        handlers::sign_up,
        handlers::login,
        handlers::list_reviews,
        handlers::create_review,
    ),
    components(
        schemas(
            models::ErrorResponse,
            models::HealthResponse,
            models::SignUpRequest,
            models::UserResponse,
            models::LoginRequest,
            models::LoginResponse,
            models::CompanyPayload,
            models::CreateReviewRequest,
            models::ReviewResponse,
        )
    ),
    tags(
        (name = "auth", description = "Sign-up and login endpoints"),
        (name = "reviews", description = "Review creation and listing"),
        (name = "system", description = "System health endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
    /// Secret signing session tokens
    pub jwt_secret: String,
    /// Session token lifetime in hours
    pub session_ttl_hours: i64,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
            jwt_secret: "change-me-in-production".to_string(),
            session_ttl_hours: 24,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, db: DatabaseConnection) -> Self {
        let state = Arc::new(AppState {
            db,
            session_key: SessionKey::new(config.jwt_secret.as_bytes()),
            session_ttl: chrono::Duration::hours(config.session_ttl_hours),
        });

        Self { config, state }
    }

    /// Build the router with all routes
    ///
    /// Authentication is enforced per-handler through the `AuthUser`
    /// extractor, so unsupported verbs answer 405 before any credential
    /// check happens.
    pub fn build_router(&self) -> Router {
        let api_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/auth/sign-up", post(handlers::sign_up))
            .route("/api/auth/login", post(handlers::login))
            .route(
                "/api/reviews",
                get(handlers::list_reviews).post(handlers::create_review),
            )
            .with_state(self.state.clone());

        // SwaggerUi automatically creates a route for /api/openapi.json
        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
            .merge(api_router);

        let mut router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_origin(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}
