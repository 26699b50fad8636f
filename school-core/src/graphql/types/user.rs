use super::course::CourseObject;
use crate::domain::User;
use crate::graphql::context::GraphQLContext;
use async_graphql::{Context, ErrorExtensions, FieldResult, Object, ID};

/// GraphQL representation of a User. The password hash is never exposed.
#[derive(Clone)]
pub struct UserObject {
    pub inner: User,
}

impl From<User> for UserObject {
    fn from(user: User) -> Self {
        Self { inner: user }
    }
}

#[Object(name = "User")]
impl UserObject {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn email(&self) -> &str {
        &self.inner.email
    }

    async fn pseudo(&self) -> &str {
        &self.inner.pseudo
    }

    /// `ROLE_USER` or `ROLE_ADMIN`
    async fn role(&self) -> &'static str {
        self.inner.role.as_str()
    }

    async fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.updated_at
    }

    /// Courses this user is enrolled in as a student
    async fn enrolled_courses(&self, ctx: &Context<'_>) -> FieldResult<Vec<CourseObject>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_enrolled_courses(self.inner.id).await {
            Ok(courses) => Ok(courses.into_iter().map(CourseObject::from).collect()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Courses this user teaches
    async fn taught_courses(&self, ctx: &Context<'_>) -> FieldResult<Vec<CourseObject>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_courses_by_professor(self.inner.id).await {
            Ok(courses) => Ok(courses.into_iter().map(CourseObject::from).collect()),
            Err(e) => Err(e.extend()),
        }
    }
}
