use super::{course::CourseObject, user::UserObject};
use crate::domain::Grade;
use crate::graphql::context::GraphQLContext;
use async_graphql::{Context, FieldResult, Object, ID};

/// GraphQL representation of a Grade
#[derive(Clone)]
pub struct GradeObject {
    pub inner: Grade,
}

impl From<Grade> for GradeObject {
    fn from(grade: Grade) -> Self {
        Self { inner: grade }
    }
}

#[Object(name = "Grade")]
impl GradeObject {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    /// Mark out of 20
    async fn note(&self) -> f64 {
        self.inner.note
    }

    async fn comment(&self) -> Option<&str> {
        self.inner.comment.as_deref()
    }

    async fn course_id(&self) -> ID {
        ID(self.inner.course_id.to_string())
    }

    async fn user_id(&self) -> ID {
        ID(self.inner.user_id.to_string())
    }

    async fn course(&self, ctx: &Context<'_>) -> FieldResult<Option<CourseObject>> {
        let context = ctx.data::<GraphQLContext>()?;
        let course = context.course_loader.load_one(self.inner.course_id).await?;
        Ok(course.map(CourseObject::from))
    }

    /// The student who received the grade
    async fn student(&self, ctx: &Context<'_>) -> FieldResult<Option<UserObject>> {
        let context = ctx.data::<GraphQLContext>()?;
        let student = context.user_loader.load_one(self.inner.user_id).await?;
        Ok(student.map(UserObject::from))
    }

    async fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.updated_at
    }
}
