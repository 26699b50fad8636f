use crate::graphql::resolvers::{Mutation, Query};
use async_graphql::{EmptySubscription, Schema};
use school_core::graphql::GraphQLContext;
use school_core::storage::Storage;
use std::sync::Arc;

/// The complete GraphQL schema
pub type GradesSchema = Schema<Query, Mutation, EmptySubscription>;

/// Create a new GraphQL schema with the given storage
pub fn create_schema(storage: Arc<dyn Storage>) -> GradesSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(GraphQLContext::new(storage))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Request;
    use chrono::{Duration, Utc};
    use school_core::storage::InMemoryStorage;
    use school_core::{Course, Role, User, Viewer};

    struct Setup {
        schema: GradesSchema,
        prof: User,
        pupil: User,
        course: Course,
    }

    async fn setup() -> Setup {
        let storage = Arc::new(InMemoryStorage::new());
        let prof = User::new("prof@school.test", "prof", "hash".to_string(), Role::Admin);
        let pupil = User::new("pupil@school.test", "pupil", "hash".to_string(), Role::User);
        storage.create_user(&prof).await.unwrap();
        storage.create_user(&pupil).await.unwrap();

        let today = Utc::now().date_naive();
        let course = Course::new("Anglais", prof.id, None, today, today + Duration::days(30), 10);
        storage.create_course(&course).await.unwrap();
        storage.enroll_student(course.id, pupil.id).await.unwrap();

        Setup {
            schema: create_schema(storage),
            prof,
            pupil,
            course,
        }
    }

    #[tokio::test]
    async fn test_grade_lifecycle_through_schema() {
        let s = setup().await;
        let as_prof = Viewer::from(&s.prof);

        let query = format!(
            r#"mutation {{ createGrade(userId: "{}", courseId: "{}", note: 17.5, comment: "Très bon travail") {{ id note course {{ name }} student {{ email }} }} }}"#,
            s.pupil.id, s.course.id
        );
        let response = s.schema.execute(Request::new(query).data(as_prof.clone())).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["createGrade"]["course"]["name"], "Anglais");
        assert_eq!(data["createGrade"]["student"]["email"], "pupil@school.test");
        let grade_id = data["createGrade"]["id"].as_str().unwrap().to_string();

        let query = format!(r#"mutation {{ updateGrade(gradeId: "{grade_id}", note: 19) {{ note comment }} }}"#);
        let response = s.schema.execute(Request::new(query).data(as_prof.clone())).await;
        let data = response.data.into_json().unwrap();
        assert_eq!(data["updateGrade"]["note"], 19.0);
        assert_eq!(data["updateGrade"]["comment"], "Très bon travail");

        let query = format!(r#"{{ getGradesForStudent(userId: "{}") {{ note }} }}"#, s.pupil.id);
        let response = s
            .schema
            .execute(Request::new(query.clone()).data(Viewer::from(&s.pupil)))
            .await;
        let data = response.data.into_json().unwrap();
        assert_eq!(data["getGradesForStudent"].as_array().unwrap().len(), 1);

        let delete = format!(r#"mutation {{ deleteGrade(gradeId: "{grade_id}") {{ id }} }}"#);
        let response = s.schema.execute(Request::new(delete).data(as_prof)).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let response = s
            .schema
            .execute(Request::new(query).data(Viewer::from(&s.pupil)))
            .await;
        let data = response.data.into_json().unwrap();
        assert!(data["getGradesForStudent"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_professor_query_requires_admin() {
        let s = setup().await;

        let response = s
            .schema
            .execute(Request::new("{ getGradesForProfessor { id } }").data(Viewer::from(&s.pupil)))
            .await;
        assert_eq!(response.errors[0].message, "Only professors can access grades.");
        let code = response.errors[0]
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some("FORBIDDEN".into()));

        let query = format!(r#"{{ getGradesForProfessor(courseIds: ["{}"]) {{ id }} }}"#, s.course.id);
        let response = s
            .schema
            .execute(Request::new(query).data(Viewer::from(&s.prof)))
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let response = s
            .schema
            .execute(Request::new("{ getGradesForProfessor(courseIds: []) { id } }").data(Viewer::from(&s.prof)))
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
    }

    #[tokio::test]
    async fn test_anonymous_caller_is_rejected_before_id_parsing() {
        let s = setup().await;

        for query in [
            r#"{ getGradesForStudent(userId: "42") { id } }"#,
            r#"{ getGradesForProfessor(courseIds: ["42"]) { id } }"#,
            r#"mutation { createGrade(userId: "42", courseId: "43", note: 10) { id } }"#,
            r#"mutation { updateGrade(gradeId: "42", note: 10) { id } }"#,
            r#"mutation { deleteGrade(gradeId: "42") { id } }"#,
        ] {
            let response = s.schema.execute(query).await;
            assert_eq!(response.errors[0].message, "Unauthorized", "{query}");
        }

        let response = s
            .schema
            .execute(Request::new(r#"mutation { deleteGrade(gradeId: "42") { id } }"#).data(Viewer::from(&s.prof)))
            .await;
        assert_eq!(response.errors[0].message, "Invalid id: 42");
    }

    #[tokio::test]
    async fn test_out_of_range_note() {
        let s = setup().await;
        let query = format!(
            r#"mutation {{ createGrade(userId: "{}", courseId: "{}", note: -1) {{ id }} }}"#,
            s.pupil.id, s.course.id
        );
        let response = s
            .schema
            .execute(Request::new(query).data(Viewer::from(&s.prof)))
            .await;
        assert_eq!(response.errors[0].message, "Note must be between 0 and 20");
    }
}
