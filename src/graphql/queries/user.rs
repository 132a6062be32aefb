use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// The user the request's token belongs to, if any
    async fn me(&self, ctx: &Context<'_>) -> Option<User> {
        ctx.try_current_user().cloned().map(User::from)
    }
}
