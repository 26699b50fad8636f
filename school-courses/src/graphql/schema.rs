use crate::graphql::resolvers::{Mutation, Query};
use async_graphql::{EmptySubscription, Schema};
use school_core::graphql::GraphQLContext;
use school_core::storage::Storage;
use std::sync::Arc;

/// The complete GraphQL schema
pub type CoursesSchema = Schema<Query, Mutation, EmptySubscription>;

/// Create a new GraphQL schema with the given storage
pub fn create_schema(storage: Arc<dyn Storage>) -> CoursesSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(GraphQLContext::new(storage))
        .finish()
}
