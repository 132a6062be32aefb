//! GraphQL authentication
//!
//! The HTTP handler resolves the bearer token to a stored user and attaches
//! it to the request as [CurrentUser]. Resolvers read it through [AuthExt].
//!
//! ## Guards
//!
//! Use `AuthGuard` to require authentication on any GraphQL operation:
//!
//! ```ignore
//! #[graphql(guard = "AuthGuard")]
//! async fn protected_mutation(&self, ctx: &Context<'_>) -> Result<String> { ... }
//! ```

use async_graphql::{Context, ErrorExtensions, Result};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::db::{Database, UserRecord};
use crate::graphql::error::ApiError;
use crate::services::AuthService;

/// User resolved from the request's bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

/// Extract bearer token from Authorization header
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Build the per-request user from the request headers
pub async fn current_user_from_headers(
    headers: &HeaderMap,
    auth: &AuthService,
    db: &Database,
) -> Option<CurrentUser> {
    let token = extract_token(headers)?;
    auth.authenticate(db, token).await.map(CurrentUser)
}

/// Extension trait to get the authenticated user from GraphQL context
pub trait AuthExt {
    /// Get the authenticated user, or return an error if not authenticated
    fn current_user(&self) -> Result<&UserRecord>;

    /// Get the authenticated user if present
    fn try_current_user(&self) -> Option<&UserRecord>;
}

impl<'a> AuthExt for Context<'a> {
    fn current_user(&self) -> Result<&UserRecord> {
        self.try_current_user()
            .ok_or_else(|| ApiError::AuthenticationRequired.extend())
    }

    fn try_current_user(&self) -> Option<&UserRecord> {
        self.data_opt::<CurrentUser>().map(|user| &user.0)
    }
}

/// Guard that requires authentication for GraphQL operations.
///
/// Runs before the resolver, so a rejected mutation never touches the store.
pub struct AuthGuard;

impl async_graphql::Guard for AuthGuard {
    fn check(&self, ctx: &Context<'_>) -> impl std::future::Future<Output = Result<()>> + Send {
        let result = ctx.current_user().map(|_| ());
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_token(&headers("Bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn test_ignores_other_schemes() {
        assert_eq!(extract_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_token(&headers("Bearer ")), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
