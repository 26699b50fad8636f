use async_graphql::{Context, ErrorExtensions, FieldResult, Object};
use school_core::graphql::{CourseObject, GraphQLContext};
use school_core::parse_id;

/// Root query object for GraphQL
pub struct Query;

#[Object]
impl Query {
    /// All courses ordered by name
    async fn get_all_courses(&self, ctx: &Context<'_>) -> FieldResult<Vec<CourseObject>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_all_courses().await {
            Ok(courses) => Ok(courses.into_iter().map(CourseObject::from).collect()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn get_course_by_id(&self, ctx: &Context<'_>, id: String) -> FieldResult<Option<CourseObject>> {
        let context = ctx.data::<GraphQLContext>()?;
        let course_id = parse_id(&id).map_err(|e| e.extend())?;

        match context.storage.get_course_by_id(course_id).await {
            Ok(course) => Ok(course.map(CourseObject::from)),
            Err(e) => Err(e.extend()),
        }
    }

    /// Courses whose name contains `name`, ignoring case
    async fn get_courses_by_name_like(
        &self,
        ctx: &Context<'_>,
        name: String,
    ) -> FieldResult<Vec<CourseObject>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.search_courses_by_name(name.trim()).await {
            Ok(courses) => Ok(courses.into_iter().map(CourseObject::from).collect()),
            Err(e) => Err(e.extend()),
        }
    }
}
