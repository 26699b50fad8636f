pub mod resolvers;
pub mod schema;

pub use schema::{create_schema, UsersSchema};
