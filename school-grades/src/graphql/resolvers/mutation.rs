use crate::gradebook::{self, GradeChanges};
use async_graphql::{Context, ErrorExtensions, FieldResult, Object};
use school_core::graphql::{require_viewer, GradeObject, GraphQLContext};
use school_core::parse_id;

/// Root mutation object for GraphQL
pub struct Mutation;

#[Object]
impl Mutation {
    /// Grade an enrolled student in a course the caller teaches
    async fn create_grade(
        &self,
        ctx: &Context<'_>,
        user_id: String,
        course_id: String,
        note: f64,
        comment: Option<String>,
    ) -> FieldResult<GradeObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let student_id = parse_id(&user_id).map_err(|e| e.extend())?;
        let course_id = parse_id(&course_id).map_err(|e| e.extend())?;

        match gradebook::create_grade(
            context.storage.as_ref(),
            Some(viewer),
            student_id,
            course_id,
            note,
            comment,
        )
        .await
        {
            Ok(grade) => Ok(grade.into()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn update_grade(
        &self,
        ctx: &Context<'_>,
        grade_id: String,
        note: Option<f64>,
        comment: Option<String>,
    ) -> FieldResult<GradeObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let grade_id = parse_id(&grade_id).map_err(|e| e.extend())?;

        let changes = GradeChanges { note, comment };
        match gradebook::update_grade(context.storage.as_ref(), Some(viewer), grade_id, changes).await {
            Ok(grade) => Ok(grade.into()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn delete_grade(&self, ctx: &Context<'_>, grade_id: String) -> FieldResult<GradeObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let grade_id = parse_id(&grade_id).map_err(|e| e.extend())?;

        match gradebook::delete_grade(context.storage.as_ref(), Some(viewer), grade_id).await {
            Ok(grade) => Ok(grade.into()),
            Err(e) => Err(e.extend()),
        }
    }
}
