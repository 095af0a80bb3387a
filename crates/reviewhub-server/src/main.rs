//! Review backend server
//!
//! Connects to the database, applies migrations and serves the review API.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reviewhub_api::{ApiServer, ApiServerConfig};

/// Review API server
#[derive(Parser, Debug)]
#[command(name = "reviewhub-server")]
#[command(about = "Run the review API server", long_about = None)]
#[command(version)]
struct Cli {
    /// API server bind address
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind_addr: SocketAddr,

    /// Database URL (e.g. sqlite://reviewhub.db?mode=rwc or postgres://...)
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://reviewhub.db?mode=rwc"
    )]
    database_url: String,

    /// Secret used to sign session tokens
    #[arg(long, env = "REVIEWHUB_JWT_SECRET")]
    jwt_secret: String,

    /// Session token lifetime in hours
    #[arg(long, default_value = "24")]
    session_ttl_hours: i64,

    /// Disable the permissive development CORS layer
    #[arg(long)]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Connecting to {}", cli.database_url);
    let db = reviewhub_db::connect(&cli.database_url).await?;
    reviewhub_db::migrate(&db).await?;

    let config = ApiServerConfig {
        bind_addr: cli.bind_addr,
        enable_cors: !cli.no_cors,
        jwt_secret: cli.jwt_secret,
        session_ttl_hours: cli.session_ttl_hours,
    };

    ApiServer::new(config, db).start().await
}
