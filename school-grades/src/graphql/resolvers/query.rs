use crate::gradebook;
use async_graphql::{Context, ErrorExtensions, FieldResult, Object};
use school_core::graphql::{require_viewer, GradeObject, GraphQLContext};
use school_core::{parse_id, Result};
use uuid::Uuid;

/// Root query object for GraphQL
pub struct Query;

#[Object]
impl Query {
    /// Grades of one student. Students may only ask for their own.
    async fn get_grades_for_student(
        &self,
        ctx: &Context<'_>,
        user_id: String,
    ) -> FieldResult<Vec<GradeObject>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let student_id = parse_id(&user_id).map_err(|e| e.extend())?;

        match gradebook::grades_for_student(context.storage.as_ref(), Some(viewer), student_id).await {
            Ok(grades) => Ok(grades.into_iter().map(GradeObject::from).collect()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Grades of the courses taught by the caller
    async fn get_grades_for_professor(
        &self,
        ctx: &Context<'_>,
        course_ids: Option<Vec<String>>,
    ) -> FieldResult<Vec<GradeObject>> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let course_ids = course_ids
            .map(|ids| ids.iter().map(|id| parse_id(id)).collect::<Result<Vec<Uuid>>>())
            .transpose()
            .map_err(|e| e.extend())?;

        match gradebook::grades_for_professor(context.storage.as_ref(), Some(viewer), course_ids).await {
            Ok(grades) => Ok(grades.into_iter().map(GradeObject::from).collect()),
            Err(e) => Err(e.extend()),
        }
    }
}
