//! GraphQL schema definition with queries and mutations
//!
//! Queries are public. `addBook`, `editAuthor` and `deleteBook` require a
//! bearer token.

use async_graphql::extensions::Tracing;
use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::db::Database;
use crate::services::AuthService;

use super::mutations::{AuthorMutations, BookMutations, UserMutations};
use super::queries::{AuthorQueries, BookQueries, UserQueries};

/// The GraphQL schema type
pub type CatalogSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(BookQueries, AuthorQueries, UserQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(BookMutations, AuthorMutations, UserMutations);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(db: Database, auth: AuthService) -> CatalogSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(db)
        .data(auth)
        .extension(Tracing)
        .finish()
}
