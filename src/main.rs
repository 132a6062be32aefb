//! Library Catalog - GraphQL backend for books and authors
//!
//! This is the main entry point for the catalog API.
//! All operations are exposed via GraphQL at /graphql.

mod api;
mod app;
mod cli;
mod config;
mod db;
mod graphql;
mod services;

use std::net::SocketAddr;

use anyhow::Context;

use crate::app::{AppState, build_app};
use crate::cli::CliOptions;
use crate::config::Config;
use crate::db::Database;
use crate::services::{AuthService, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let options = CliOptions::from_args();
    let mut config = Config::from_env()?;
    if let Some(port) = options.port_override {
        config.port = port;
    }

    tracing::info!("Starting Library Catalog");

    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    tracing::info!(database = %config.mongodb_database, "Database connected");

    if options.seed {
        let result = db::seed::seed_sample_catalog(&db)
            .await
            .context("Failed to seed sample catalog")?;
        for error in &result.errors {
            tracing::warn!(%error, "Seed entry skipped");
        }
    }

    let auth = AuthService::new(config.auth_config());
    let schema = graphql::build_schema(db.clone(), auth.clone());
    tracing::info!("GraphQL schema built");

    let state = AppState {
        db,
        auth,
        schema,
    };
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid HOST/PORT")?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphQL playground: http://localhost:{}/graphql", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
