use crate::catalog::{self, CourseChanges, EnrollmentAction, NewCourse};
use async_graphql::{Context, ErrorExtensions, FieldResult, Object};
use school_core::common::dates::{parse_date_arg, parse_optional_date_arg};
use school_core::graphql::{require_viewer, CourseObject, GraphQLContext};
use school_core::parse_id;

/// Root mutation object for GraphQL. Every field requires an admin.
pub struct Mutation;

#[Object]
impl Mutation {
    /// Dates accept `YYYY-MM-DD`, RFC 3339 or Unix seconds
    async fn create_course(
        &self,
        ctx: &Context<'_>,
        name: String,
        professor_id: String,
        description: Option<String>,
        start_date: Option<String>,
        end_date: String,
        hours: Option<i32>,
    ) -> FieldResult<CourseObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;

        let input = NewCourse {
            name,
            professor_id: parse_id(&professor_id).map_err(|e| e.extend())?,
            description,
            start_date: parse_optional_date_arg(start_date.as_deref()).map_err(|e| e.extend())?,
            end_date: parse_date_arg(&end_date).map_err(|e| e.extend())?,
            hours,
        };
        match catalog::create_course(context.storage.as_ref(), Some(viewer), input, catalog::today())
            .await
        {
            Ok(course) => Ok(course.into()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Change only the supplied fields of a course
    async fn update_course(
        &self,
        ctx: &Context<'_>,
        course_id: String,
        name: Option<String>,
        description: Option<String>,
        start_date: Option<String>,
        end_date: Option<String>,
        hours: Option<i32>,
        professor_id: Option<String>,
    ) -> FieldResult<CourseObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let course_id = parse_id(&course_id).map_err(|e| e.extend())?;

        let changes = CourseChanges {
            name,
            description,
            start_date: parse_optional_date_arg(start_date.as_deref()).map_err(|e| e.extend())?,
            end_date: parse_optional_date_arg(end_date.as_deref()).map_err(|e| e.extend())?,
            hours,
            professor_id: professor_id
                .as_deref()
                .map(parse_id)
                .transpose()
                .map_err(|e| e.extend())?,
        };
        match catalog::update_course(
            context.storage.as_ref(),
            Some(viewer),
            course_id,
            changes,
            catalog::today(),
        )
        .await
        {
            Ok(course) => Ok(course.into()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Enroll (`ADD`) or unenroll (`REMOVE`) a student
    async fn update_course_students(
        &self,
        ctx: &Context<'_>,
        course_id: String,
        student_id: String,
        action: EnrollmentAction,
    ) -> FieldResult<CourseObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let course_id = parse_id(&course_id).map_err(|e| e.extend())?;
        let student_id = parse_id(&student_id).map_err(|e| e.extend())?;

        match catalog::update_course_students(
            context.storage.as_ref(),
            Some(viewer),
            course_id,
            student_id,
            action,
        )
        .await
        {
            Ok(course) => Ok(course.into()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Delete a course with its enrollments and grades
    async fn delete_course(&self, ctx: &Context<'_>, id: String) -> FieldResult<CourseObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let viewer = require_viewer(ctx)?;
        let course_id = parse_id(&id).map_err(|e| e.extend())?;

        match catalog::delete_course(context.storage.as_ref(), Some(viewer), course_id).await {
            Ok(course) => Ok(course.into()),
            Err(e) => Err(e.extend()),
        }
    }
}
