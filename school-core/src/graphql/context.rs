use super::loaders::{CourseLoader, UserLoader};
use crate::common::error::SchoolError;
use crate::domain::Viewer;
use crate::storage::Storage;
use async_graphql::dataloader::DataLoader;
use async_graphql::{Context, ErrorExtensions};
use std::sync::Arc;

/// GraphQL context containing shared application state
pub struct GraphQLContext {
    pub storage: Arc<dyn Storage>,
    pub user_loader: DataLoader<UserLoader>,
    pub course_loader: DataLoader<CourseLoader>,
}

impl GraphQLContext {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            user_loader: UserLoader::new(storage.clone()),
            course_loader: CourseLoader::new(storage.clone()),
            storage,
        }
    }
}

/// The caller of the current request, if it carried a valid token.
pub fn viewer<'c>(ctx: &'c Context<'_>) -> Option<&'c Viewer> {
    ctx.data_opt::<Viewer>()
}

/// The caller, or `Unauthorized` for an anonymous request.
pub fn require_viewer<'c>(ctx: &'c Context<'_>) -> async_graphql::Result<&'c Viewer> {
    viewer(ctx).ok_or_else(|| SchoolError::Unauthorized.extend())
}
