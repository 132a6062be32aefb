//! Errors surfaced to GraphQL clients
//!
//! Every failure reaches the client as a GraphQL error whose
//! `extensions.code` names its kind. Input errors also carry the offending
//! argument as `invalidArgs` and, where a constraint was violated, the
//! underlying cause as `error`.

use async_graphql::ErrorExtensions;
use thiserror::Error;

use crate::db::DbError;
use crate::services::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not authenticated")]
    AuthenticationRequired,

    #[error("wrong credentials")]
    InvalidCredentials,

    #[error("{message}")]
    ValidationFailed {
        message: String,
        invalid_args: String,
        cause: String,
    },

    #[error("{what} not found")]
    NotFound {
        what: &'static str,
        invalid_args: String,
    },

    /// Details are logged, never sent to the client
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// Value of `extensions.code`
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::AuthenticationRequired => "UNAUTHENTICATED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::ValidationFailed { .. } => "BAD_USER_INPUT",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Internal => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Constraint violations become input errors; anything else is internal
    pub fn from_db(err: DbError, message: &str, invalid_args: &str) -> Self {
        if err.is_constraint_violation() {
            ApiError::ValidationFailed {
                message: message.to_string(),
                invalid_args: invalid_args.to_string(),
                cause: err.to_string(),
            }
        } else {
            tracing::error!(error = %err, "{}", message);
            ApiError::Internal
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        tracing::error!(error = %err, "Database operation failed");
        ApiError::Internal
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::InvalidToken(_) => ApiError::AuthenticationRequired,
            AuthError::Database(e) => e.into(),
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.code());
            match self {
                ApiError::ValidationFailed {
                    invalid_args,
                    cause,
                    ..
                } => {
                    e.set("invalidArgs", invalid_args.clone());
                    e.set("error", cause.clone());
                }
                ApiError::NotFound { invalid_args, .. } => {
                    e.set("invalidArgs", invalid_args.clone());
                }
                _ => {}
            }
        })
    }
}

/// Conversions from store results into GraphQL results
pub trait DbResultExt<T> {
    /// Constraint violations become `BAD_USER_INPUT` for `invalid_args`
    fn bad_input(self, message: &str, invalid_args: &str) -> async_graphql::Result<T>;

    /// Any failure is an internal error
    fn internal(self) -> async_graphql::Result<T>;
}

impl<T> DbResultExt<T> for Result<T, DbError> {
    fn bad_input(self, message: &str, invalid_args: &str) -> async_graphql::Result<T> {
        self.map_err(|e| ApiError::from_db(e, message, invalid_args).extend())
    }

    fn internal(self) -> async_graphql::Result<T> {
        self.map_err(|e| ApiError::from(e).extend())
    }
}
