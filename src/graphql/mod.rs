//! GraphQL API
//!
//! This module provides the catalog's GraphQL API using async-graphql. It is
//! the single API surface apart from the health endpoints.

pub mod auth;
pub mod error;
mod helpers;
pub mod mutations;
pub mod queries;
mod schema;
pub mod types;

#[cfg(test)]
mod tests;

pub use auth::{CurrentUser, current_user_from_headers};
pub use schema::{CatalogSchema, build_schema};
