use async_graphql::{Context, ErrorExtensions, FieldResult, Object};
use school_core::graphql::{GraphQLContext, UserObject};
use school_core::parse_id;

/// Root query object for GraphQL
pub struct Query;

#[Object]
impl Query {
    /// All users ordered by email
    async fn get_all_users(&self, ctx: &Context<'_>) -> FieldResult<Vec<UserObject>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_all_users().await {
            Ok(users) => Ok(users.into_iter().map(UserObject::from).collect()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn get_user_by_email(
        &self,
        ctx: &Context<'_>,
        email: String,
    ) -> FieldResult<Option<UserObject>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_user_by_email(email.trim()).await {
            Ok(user) => Ok(user.map(UserObject::from)),
            Err(e) => Err(e.extend()),
        }
    }

    async fn get_user_by_id(&self, ctx: &Context<'_>, id: String) -> FieldResult<Option<UserObject>> {
        let context = ctx.data::<GraphQLContext>()?;
        let user_id = parse_id(&id).map_err(|e| e.extend())?;

        match context.storage.get_user_by_id(user_id).await {
            Ok(user) => Ok(user.map(UserObject::from)),
            Err(e) => Err(e.extend()),
        }
    }
}
