//! User registration and login
//!
//! Neither mutation requires authentication.

use super::prelude::*;
use crate::services::AuthService;

#[derive(Default)]
pub struct UserMutations;

#[Object]
impl UserMutations {
    /// Register a new user
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        username: String,
        favorite_genre: String,
    ) -> Result<User> {
        let db = ctx.data_unchecked::<Database>();

        let user = db
            .users()
            .create(CreateUser {
                username: username.clone(),
                favorite_genre,
            })
            .await
            .bad_input("Creating new user failed", &username)?;

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user.into())
    }

    /// Log in and receive a bearer token
    async fn login(&self, ctx: &Context<'_>, username: String, password: String) -> Result<Token> {
        let db = ctx.data_unchecked::<Database>();
        let auth = ctx.data_unchecked::<AuthService>();

        match auth.login(db, &username, &password).await {
            Ok(value) => {
                tracing::info!(%username, "User logged in");
                Ok(Token { value })
            }
            Err(e) => {
                tracing::warn!(%username, error = %e, "Login failed");
                Err(ApiError::from(e).extend())
            }
        }
    }
}
