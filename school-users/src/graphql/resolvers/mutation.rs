use crate::accounts::{self, ProfileChanges, Registration};
use async_graphql::{Context, ErrorExtensions, FieldResult, Object, SimpleObject};
use school_core::auth::{JwtKeys, PasswordHasher};
use school_core::graphql::{require_viewer, GraphQLContext, UserObject};
use school_core::parse_id;

/// Token issued by a successful login, with the account it belongs to
#[derive(SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserObject,
}

/// Root mutation object for GraphQL
pub struct Mutation;

#[Object]
impl Mutation {
    /// Create an account. Only the exact role `ROLE_ADMIN` grants admin rights.
    async fn register(
        &self,
        ctx: &Context<'_>,
        email: String,
        pseudo: String,
        password: String,
        role: Option<String>,
    ) -> FieldResult<UserObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let hasher = ctx.data::<PasswordHasher>()?;

        let input = Registration {
            email,
            pseudo,
            password,
            role,
        };
        match accounts::register(context.storage.as_ref(), hasher, input).await {
            Ok(user) => Ok(user.into()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> FieldResult<AuthPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let hasher = ctx.data::<PasswordHasher>()?;
        let keys = ctx.data::<JwtKeys>()?;

        match accounts::login(context.storage.as_ref(), hasher, keys, &email, &password).await {
            Ok((token, user)) => Ok(AuthPayload {
                token,
                user: user.into(),
            }),
            Err(e) => {
                tracing::info!("Failed login for {}", email);
                Err(e.extend())
            }
        }
    }

    /// Update a profile. Users may edit themselves; admins anyone.
    async fn update_user(
        &self,
        ctx: &Context<'_>,
        id: String,
        email: Option<String>,
        pseudo: Option<String>,
        password: Option<String>,
        role: Option<String>,
    ) -> FieldResult<UserObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let hasher = ctx.data::<PasswordHasher>()?;
        let user_id = parse_id(&id).map_err(|e| e.extend())?;

        let changes = ProfileChanges {
            email,
            pseudo,
            password,
            role,
        };
        match accounts::update_user(context.storage.as_ref(), hasher, Some(viewer), user_id, changes)
            .await
        {
            Ok(user) => Ok(user.into()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn delete_user(&self, ctx: &Context<'_>, id: String) -> FieldResult<UserObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let user_id = parse_id(&id).map_err(|e| e.extend())?;

        match accounts::delete_user(context.storage.as_ref(), Some(viewer), user_id).await {
            Ok(user) => Ok(user.into()),
            Err(e) => Err(e.extend()),
        }
    }
}
