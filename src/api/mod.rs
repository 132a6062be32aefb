//! REST endpoints outside the GraphQL schema

pub mod health;
