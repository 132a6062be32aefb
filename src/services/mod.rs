//! Application services shared by the HTTP and GraphQL layers

pub mod auth;
pub mod logging;

pub use auth::{AuthConfig, AuthError, AuthService};
pub use logging::init_tracing;
