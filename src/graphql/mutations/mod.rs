pub mod authors;
pub mod books;
pub mod user;

pub use authors::AuthorMutations;
pub use books::BookMutations;
pub use user::UserMutations;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, ErrorExtensions, Object, Result};

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::{AuthExt, AuthGuard};
    pub(crate) use crate::graphql::error::{ApiError, DbResultExt};
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::types::*;
}
