use super::user::UserObject;
use crate::domain::Course;
use crate::graphql::context::GraphQLContext;
use async_graphql::{Context, ErrorExtensions, FieldResult, Object, ID};

/// GraphQL representation of a Course
#[derive(Clone)]
pub struct CourseObject {
    pub inner: Course,
}

impl From<Course> for CourseObject {
    fn from(course: Course) -> Self {
        Self { inner: course }
    }
}

#[Object(name = "Course")]
impl CourseObject {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    /// First day of the course
    async fn start_date(&self) -> chrono::NaiveDate {
        self.inner.start_date
    }

    /// Last day of the course
    async fn end_date(&self) -> chrono::NaiveDate {
        self.inner.end_date
    }

    async fn hours(&self) -> i32 {
        self.inner.hours
    }

    async fn professor_id(&self) -> ID {
        ID(self.inner.professor_id.to_string())
    }

    /// The admin teaching this course
    async fn professor(&self, ctx: &Context<'_>) -> FieldResult<Option<UserObject>> {
        let context = ctx.data::<GraphQLContext>()?;
        let professor = context.user_loader.load_one(self.inner.professor_id).await?;
        Ok(professor.map(UserObject::from))
    }

    /// Students enrolled in this course
    async fn students(&self, ctx: &Context<'_>) -> FieldResult<Vec<UserObject>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_students_of_course(self.inner.id).await {
            Ok(students) => Ok(students.into_iter().map(UserObject::from).collect()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.created_at
    }
}
