//! Who may read and write grades.
//!
//! Students read their own grades. Admins act as professors: they read and
//! write the grades of the courses they teach.

use chrono::Utc;
use school_core::storage::Storage;
use school_core::{validate_note, Grade, Result, SchoolError, Viewer};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// Optional fields of a grade update; `None` keeps the current value.
#[derive(Debug, Default, Clone)]
pub struct GradeChanges {
    pub note: Option<f64>,
    pub comment: Option<String>,
}

fn require_professor<'v>(viewer: Option<&'v Viewer>, action: &str) -> Result<&'v Viewer> {
    let viewer = viewer.ok_or(SchoolError::Unauthorized)?;
    if !viewer.is_admin() {
        return Err(SchoolError::Forbidden(format!(
            "Only professors can {action} grades."
        )));
    }
    Ok(viewer)
}

async fn require_teaches(storage: &dyn Storage, viewer: &Viewer, course_id: Uuid) -> Result<()> {
    let teaches = storage
        .get_course_by_id(course_id)
        .await?
        .is_some_and(|course| course.professor_id == viewer.id);
    if !teaches {
        return Err(SchoolError::Forbidden(
            "You are not the professor for this course.".to_string(),
        ));
    }
    Ok(())
}

async fn load_grade(storage: &dyn Storage, grade_id: Uuid) -> Result<Grade> {
    storage
        .get_grade_by_id(grade_id)
        .await?
        .ok_or_else(|| SchoolError::not_found("Grade"))
}

fn comment(value: Option<String>) -> Option<String> {
    value
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

pub async fn grades_for_student(
    storage: &dyn Storage,
    viewer: Option<&Viewer>,
    student_id: Uuid,
) -> Result<Vec<Grade>> {
    let viewer = viewer.ok_or(SchoolError::Unauthorized)?;
    if !viewer.is_admin() && viewer.id != student_id {
        return Err(SchoolError::Forbidden(
            "Unauthorized access to another user's grades.".to_string(),
        ));
    }
    storage.get_grades_by_student(student_id).await
}

/// Grades of the courses the caller teaches, optionally narrowed to
/// `course_ids`. An empty list means every taught course. Ids of courses
/// taught by someone else are ignored.
pub async fn grades_for_professor(
    storage: &dyn Storage,
    viewer: Option<&Viewer>,
    course_ids: Option<Vec<Uuid>>,
) -> Result<Vec<Grade>> {
    let viewer = viewer.ok_or(SchoolError::Unauthorized)?;
    if !viewer.is_admin() {
        return Err(SchoolError::Forbidden(
            "Only professors can access grades.".to_string(),
        ));
    }

    let taught: Vec<Uuid> = storage
        .get_courses_by_professor(viewer.id)
        .await?
        .into_iter()
        .map(|course| course.id)
        .collect();

    let selected = match course_ids.filter(|ids| !ids.is_empty()) {
        Some(requested) => {
            let requested: HashSet<Uuid> = requested.into_iter().collect();
            taught.into_iter().filter(|id| requested.contains(id)).collect()
        }
        None => taught,
    };
    storage.get_grades_by_courses(selected).await
}

pub async fn create_grade(
    storage: &dyn Storage,
    viewer: Option<&Viewer>,
    student_id: Uuid,
    course_id: Uuid,
    note: f64,
    comment_text: Option<String>,
) -> Result<Grade> {
    let viewer = require_professor(viewer, "create")?;
    require_teaches(storage, viewer, course_id).await?;

    if !storage.is_student_enrolled(student_id, course_id).await? {
        return Err(SchoolError::Validation(
            "The student is not enrolled in this course.".to_string(),
        ));
    }
    validate_note(note)?;

    let grade = Grade::new(student_id, course_id, note, comment(comment_text));
    storage.create_grade(&grade).await?;

    info!("Graded {} with {} in course {}", student_id, note, course_id);
    Ok(grade)
}

pub async fn update_grade(
    storage: &dyn Storage,
    viewer: Option<&Viewer>,
    grade_id: Uuid,
    changes: GradeChanges,
) -> Result<Grade> {
    let viewer = require_professor(viewer, "update")?;
    let mut grade = load_grade(storage, grade_id).await?;
    require_teaches(storage, viewer, grade.course_id).await?;

    if let Some(note) = changes.note {
        validate_note(note)?;
        grade.note = note;
    }
    if changes.comment.is_some() {
        grade.comment = comment(changes.comment);
    }

    grade.updated_at = Utc::now();
    storage.update_grade(&grade).await?;
    Ok(grade)
}

/// Delete a grade and return it as it was.
pub async fn delete_grade(
    storage: &dyn Storage,
    viewer: Option<&Viewer>,
    grade_id: Uuid,
) -> Result<Grade> {
    let viewer = require_professor(viewer, "delete")?;
    let grade = load_grade(storage, grade_id).await?;
    require_teaches(storage, viewer, grade.course_id).await?;

    storage.delete_grade(grade_id).await?;
    info!("Deleted grade {}", grade_id);
    Ok(grade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use school_core::storage::InMemoryStorage;
    use school_core::{Course, Role, User};

    struct Fixture {
        storage: InMemoryStorage,
        prof: Viewer,
        other_prof: Viewer,
        pupil: Viewer,
        outsider: Viewer,
        course: Course,
        other_course: Course,
    }

    async fn fixture() -> Fixture {
        let storage = InMemoryStorage::new();
        let prof = User::new("prof@school.test", "prof", "hash".into(), Role::Admin);
        let other_prof = User::new("other@school.test", "other", "hash".into(), Role::Admin);
        let pupil = User::new("pupil@school.test", "pupil", "hash".into(), Role::User);
        let outsider = User::new("out@school.test", "out", "hash".into(), Role::User);
        for user in [&prof, &other_prof, &pupil, &outsider] {
            storage.create_user(user).await.unwrap();
        }

        let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let course = Course::new("Anglais", prof.id, None, start, start + Duration::days(90), 10);
        let other_course = Course::new("Histoire", other_prof.id, None, start, start + Duration::days(90), 10);
        storage.create_course(&course).await.unwrap();
        storage.create_course(&other_course).await.unwrap();
        storage.enroll_student(course.id, pupil.id).await.unwrap();
        storage.enroll_student(other_course.id, pupil.id).await.unwrap();

        Fixture {
            storage,
            prof: Viewer::from(&prof),
            other_prof: Viewer::from(&other_prof),
            pupil: Viewer::from(&pupil),
            outsider: Viewer::from(&outsider),
            course,
            other_course,
        }
    }

    #[tokio::test]
    async fn test_create_checks_in_order() {
        let f = fixture().await;
        let s = &f.storage;

        let err = create_grade(s, None, f.pupil.id, f.course.id, 12.0, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized");

        let err = create_grade(s, Some(&f.pupil), f.pupil.id, f.course.id, 12.0, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Only professors can create grades.");

        let err = create_grade(s, Some(&f.other_prof), f.pupil.id, f.course.id, 12.0, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You are not the professor for this course.");

        let err = create_grade(s, Some(&f.prof), f.outsider.id, f.course.id, 12.0, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "The student is not enrolled in this course.");

        let err = create_grade(s, Some(&f.prof), f.pupil.id, f.course.id, 21.0, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Note must be between 0 and 20");

        let grade = create_grade(s, Some(&f.prof), f.pupil.id, f.course.id, 12.5, Some("Bon effort".into()))
            .await
            .unwrap();
        assert_eq!(grade.comment.as_deref(), Some("Bon effort"));
    }

    #[tokio::test]
    async fn test_students_read_only_their_grades() {
        let f = fixture().await;
        let s = &f.storage;
        create_grade(s, Some(&f.prof), f.pupil.id, f.course.id, 15.0, None).await.unwrap();

        assert_eq!(grades_for_student(s, Some(&f.pupil), f.pupil.id).await.unwrap().len(), 1);
        assert_eq!(grades_for_student(s, Some(&f.prof), f.pupil.id).await.unwrap().len(), 1);

        let err = grades_for_student(s, Some(&f.outsider), f.pupil.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized access to another user's grades.");
    }

    #[tokio::test]
    async fn test_professor_sees_only_taught_courses() {
        let f = fixture().await;
        let s = &f.storage;
        create_grade(s, Some(&f.prof), f.pupil.id, f.course.id, 15.0, None).await.unwrap();
        create_grade(s, Some(&f.other_prof), f.pupil.id, f.other_course.id, 9.0, None)
            .await
            .unwrap();

        let all = grades_for_professor(s, Some(&f.prof), None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].course_id, f.course.id);

        let empty = grades_for_professor(s, Some(&f.prof), Some(Vec::new())).await.unwrap();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].course_id, f.course.id);

        let foreign = grades_for_professor(s, Some(&f.prof), Some(vec![f.other_course.id]))
            .await
            .unwrap();
        assert!(foreign.is_empty());

        let err = grades_for_professor(s, Some(&f.pupil), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Only professors can access grades.");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let f = fixture().await;
        let s = &f.storage;
        let grade = create_grade(s, Some(&f.prof), f.pupil.id, f.course.id, 8.0, None)
            .await
            .unwrap();

        let changes = GradeChanges {
            note: Some(16.25),
            comment: None,
        };
        let err = update_grade(s, Some(&f.other_prof), grade.id, changes.clone())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You are not the professor for this course.");

        let updated = update_grade(s, Some(&f.prof), grade.id, changes).await.unwrap();
        assert_eq!(updated.note, 16.25);

        let err = update_grade(s, Some(&f.pupil), grade.id, GradeChanges::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Only professors can update grades.");

        let deleted = delete_grade(s, Some(&f.prof), grade.id).await.unwrap();
        assert_eq!(deleted.note, 16.25);
        assert!(grades_for_student(s, Some(&f.pupil), f.pupil.id).await.unwrap().is_empty());

        let err = delete_grade(s, Some(&f.prof), grade.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Grade not found");
    }
}
