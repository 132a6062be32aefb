//! Tracing subscriber setup.
//!
//! Events are written to stdout as JSON. The filter comes from `RUST_LOG`,
//! falling back to debug output for this crate and the HTTP layer.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "library_catalog=debug,tower_http=debug,async_graphql=info";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
