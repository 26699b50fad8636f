use crate::graphql::resolvers::{Mutation, Query};
use async_graphql::{EmptySubscription, Schema};
use school_core::auth::{JwtKeys, PasswordHasher};
use school_core::graphql::GraphQLContext;
use school_core::storage::Storage;
use std::sync::Arc;

/// The complete GraphQL schema
pub type UsersSchema = Schema<Query, Mutation, EmptySubscription>;

/// Create a new GraphQL schema with the given storage
pub fn create_schema(
    storage: Arc<dyn Storage>,
    hasher: PasswordHasher,
    keys: JwtKeys,
) -> UsersSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(GraphQLContext::new(storage))
        .data(hasher)
        .data(keys)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Request;
    use school_core::storage::InMemoryStorage;
    use school_core::{Role, User, Viewer};

    fn schema() -> (UsersSchema, Arc<InMemoryStorage>) {
        let storage = Arc::new(InMemoryStorage::new());
        let schema = create_schema(
            storage.clone(),
            PasswordHasher::new(4),
            JwtKeys::new("test-secret", 3600),
        );
        (schema, storage)
    }

    fn error_code(response: &async_graphql::Response) -> Option<async_graphql::Value> {
        response.errors[0]
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned()
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (schema, _) = schema();

        let response = schema
            .execute(
                r#"mutation { register(email: "prof@school.test", pseudo: "prof", password: "pw", role: "ROLE_ADMIN") { email role } }"#,
            )
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["register"]["role"], "ROLE_ADMIN");

        let response = schema
            .execute(
                r#"mutation { login(email: "prof@school.test", password: "pw") { token user { email taughtCourses { id } } } }"#,
            )
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert!(data["login"]["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(data["login"]["user"]["email"], "prof@school.test");

        let response = schema
            .execute(r#"mutation { login(email: "prof@school.test", password: "bad") { token } }"#)
            .await;
        assert_eq!(response.errors[0].message, "Invalid email or password");
        assert_eq!(error_code(&response), Some("UNAUTHORIZED".into()));
    }

    #[tokio::test]
    async fn test_queries_list_and_find_users() {
        let (schema, storage) = schema();
        let user = User::new("b@school.test", "b", "hash".to_string(), Role::User);
        storage.create_user(&user).await.unwrap();
        storage
            .create_user(&User::new("a@school.test", "a", "hash".to_string(), Role::User))
            .await
            .unwrap();

        let data = schema
            .execute("{ getAllUsers { email } }")
            .await
            .data
            .into_json()
            .unwrap();
        assert_eq!(data["getAllUsers"][0]["email"], "a@school.test");
        assert_eq!(data["getAllUsers"][1]["email"], "b@school.test");

        let query = format!(r#"{{ getUserById(id: "{}") {{ pseudo }} }}"#, user.id);
        let data = schema.execute(query).await.data.into_json().unwrap();
        assert_eq!(data["getUserById"]["pseudo"], "b");

        let data = schema
            .execute(r#"{ getUserByEmail(email: "nobody@school.test") { id } }"#)
            .await
            .data
            .into_json()
            .unwrap();
        assert!(data["getUserByEmail"].is_null());
    }

    #[tokio::test]
    async fn test_update_user_needs_a_caller() {
        let (schema, storage) = schema();
        let user = User::new("c@school.test", "c", "hash".to_string(), Role::User);
        storage.create_user(&user).await.unwrap();

        let query = format!(r#"mutation {{ updateUser(id: "{}", pseudo: "renamed") {{ pseudo }} }}"#, user.id);

        let response = schema.execute(query.as_str()).await;
        assert_eq!(response.errors[0].message, "Unauthorized");
        assert_eq!(error_code(&response), Some("UNAUTHORIZED".into()));

        let response = schema
            .execute(Request::new(query).data(Viewer::from(&user)))
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["updateUser"]["pseudo"], "renamed");
    }

    #[tokio::test]
    async fn test_delete_user_returns_deleted_record() {
        let (schema, storage) = schema();
        let user = User::new("d@school.test", "d", "hash".to_string(), Role::User);
        storage.create_user(&user).await.unwrap();

        let query = format!(r#"mutation {{ deleteUser(id: "{}") {{ email }} }}"#, user.id);
        let response = schema
            .execute(Request::new(query).data(Viewer::from(&user)))
            .await;
        let data = response.data.into_json().unwrap();
        assert_eq!(data["deleteUser"]["email"], "d@school.test");
        assert!(storage.get_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_caller_is_rejected_before_id_parsing() {
        let (schema, _) = schema();

        for query in [
            r#"mutation { updateUser(id: "42", pseudo: "x") { id } }"#,
            r#"mutation { deleteUser(id: "42") { id } }"#,
        ] {
            let response = schema.execute(query).await;
            assert_eq!(response.errors[0].message, "Unauthorized", "{query}");
            assert_eq!(error_code(&response), Some("UNAUTHORIZED".into()));
        }

        let user = User::new("e@school.test", "e", "hash".to_string(), Role::User);
        let response = schema
            .execute(Request::new(r#"mutation { deleteUser(id: "42") { id } }"#).data(Viewer::from(&user)))
            .await;
        assert_eq!(response.errors[0].message, "Invalid id: 42");
    }
}
