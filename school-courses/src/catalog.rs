//! Course management. Every change requires an admin caller.

use async_graphql::Enum;
use chrono::{NaiveDate, Utc};
use school_core::storage::Storage;
use school_core::{
    validate_schedule, Course, Result, SchoolError, User, Viewer, DEFAULT_COURSE_HOURS,
};
use tracing::info;
use uuid::Uuid;

/// What `updateCourseStudents` does with the student.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "ActionType")]
pub enum EnrollmentAction {
    Add,
    Remove,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub name: String,
    pub professor_id: Uuid,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub hours: Option<i32>,
}

/// Fields to change on a course; `None` keeps the current value.
#[derive(Debug, Default, Clone)]
pub struct CourseChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub hours: Option<i32>,
    pub professor_id: Option<Uuid>,
}

fn require_manager(viewer: Option<&Viewer>) -> Result<&Viewer> {
    let viewer = viewer.ok_or(SchoolError::Unauthorized)?;
    if !viewer.is_admin() {
        return Err(SchoolError::Forbidden(
            "Only administrators can manage courses".to_string(),
        ));
    }
    Ok(viewer)
}

fn course_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SchoolError::Validation("Name is required".to_string()));
    }
    Ok(name.to_string())
}

fn description(value: Option<String>) -> Option<String> {
    value
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

async fn load_course(storage: &dyn Storage, course_id: Uuid) -> Result<Course> {
    storage
        .get_course_by_id(course_id)
        .await?
        .ok_or_else(|| SchoolError::not_found("Course"))
}

async fn load_user(storage: &dyn Storage, user_id: Uuid) -> Result<User> {
    storage
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| SchoolError::not_found("User"))
}

async fn load_professor(storage: &dyn Storage, user_id: Uuid) -> Result<User> {
    let professor = load_user(storage, user_id).await?;
    if !professor.is_admin() {
        return Err(SchoolError::Validation(
            "This user is not a professor".to_string(),
        ));
    }
    Ok(professor)
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub async fn create_course(
    storage: &dyn Storage,
    viewer: Option<&Viewer>,
    input: NewCourse,
    today: NaiveDate,
) -> Result<Course> {
    require_manager(viewer)?;
    let name = course_name(&input.name)?;
    let professor = load_professor(storage, input.professor_id).await?;

    let start_date = input.start_date.unwrap_or(today);
    let hours = input.hours.unwrap_or(DEFAULT_COURSE_HOURS);
    validate_schedule(start_date, input.end_date, hours, today, true)?;

    let course = Course::new(
        &name,
        professor.id,
        description(input.description),
        start_date,
        input.end_date,
        hours,
    );
    storage.create_course(&course).await?;

    info!("Created course {} taught by {}", course.name, professor.email);
    Ok(course)
}

/// Apply `changes` and validate the merged course. A start date in the past
/// is only refused when a new one is supplied.
pub async fn update_course(
    storage: &dyn Storage,
    viewer: Option<&Viewer>,
    course_id: Uuid,
    changes: CourseChanges,
    today: NaiveDate,
) -> Result<Course> {
    require_manager(viewer)?;
    let mut course = load_course(storage, course_id).await?;

    if let Some(name) = changes.name {
        course.name = course_name(&name)?;
    }
    if changes.description.is_some() {
        course.description = description(changes.description);
    }
    if let Some(start_date) = changes.start_date {
        course.start_date = start_date;
    }
    if let Some(end_date) = changes.end_date {
        course.end_date = end_date;
    }
    if let Some(hours) = changes.hours {
        course.hours = hours;
    }
    if let Some(professor_id) = changes.professor_id {
        course.professor_id = load_professor(storage, professor_id).await?.id;
    }

    validate_schedule(
        course.start_date,
        course.end_date,
        course.hours,
        today,
        changes.start_date.is_some(),
    )?;

    course.updated_at = Utc::now();
    storage.update_course(&course).await?;
    Ok(course)
}

/// Add or remove a student. Adding twice and removing someone who is not
/// enrolled both succeed without change.
pub async fn update_course_students(
    storage: &dyn Storage,
    viewer: Option<&Viewer>,
    course_id: Uuid,
    student_id: Uuid,
    action: EnrollmentAction,
) -> Result<Course> {
    require_manager(viewer)?;
    let course = load_course(storage, course_id).await?;
    let student = load_user(storage, student_id).await?;

    match action {
        EnrollmentAction::Add => {
            if student.is_admin() {
                return Err(SchoolError::Validation(
                    "This user is not a student".to_string(),
                ));
            }
            storage.enroll_student(course.id, student.id).await?;
            info!("Enrolled {} in {}", student.email, course.name);
        }
        EnrollmentAction::Remove => {
            storage.unenroll_student(course.id, student.id).await?;
            info!("Removed {} from {}", student.email, course.name);
        }
    }
    Ok(course)
}

pub async fn delete_course(
    storage: &dyn Storage,
    viewer: Option<&Viewer>,
    course_id: Uuid,
) -> Result<Course> {
    require_manager(viewer)?;
    let course = load_course(storage, course_id).await?;
    storage.delete_course(course_id).await?;

    info!("Deleted course {}", course.name);
    Ok(course)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use school_core::storage::InMemoryStorage;
    use school_core::Role;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixed_today() -> NaiveDate {
        day(2025, 9, 1)
    }

    async fn setup() -> (InMemoryStorage, User, User) {
        let storage = InMemoryStorage::new();
        let prof = User::new("prof@school.test", "prof", "hash".to_string(), Role::Admin);
        let pupil = User::new("pupil@school.test", "pupil", "hash".to_string(), Role::User);
        storage.create_user(&prof).await.unwrap();
        storage.create_user(&pupil).await.unwrap();
        (storage, prof, pupil)
    }

    fn new_course(professor_id: Uuid) -> NewCourse {
        NewCourse {
            name: "Physique".to_string(),
            professor_id,
            description: Some("  ".to_string()),
            start_date: None,
            end_date: day(2025, 12, 20),
            hours: None,
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let (storage, prof, _) = setup().await;
        let viewer = Viewer::from(&prof);

        let course = create_course(&storage, Some(&viewer), new_course(prof.id), fixed_today())
            .await
            .unwrap();
        assert_eq!(course.start_date, fixed_today());
        assert_eq!(course.hours, DEFAULT_COURSE_HOURS);
        assert_eq!(course.description, None);
        assert!(storage.get_course_by_id(course.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_only_admins_manage_courses() {
        let (storage, prof, pupil) = setup().await;

        let err = create_course(&storage, None, new_course(prof.id), fixed_today())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized");

        let student = Viewer::from(&pupil);
        let err = create_course(&storage, Some(&student), new_course(prof.id), fixed_today())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Only administrators can manage courses");
    }

    #[tokio::test]
    async fn test_create_checks_professor_and_schedule() {
        let (storage, prof, pupil) = setup().await;
        let viewer = Viewer::from(&prof);

        let err = create_course(&storage, Some(&viewer), new_course(pupil.id), fixed_today())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "This user is not a professor");

        let err = create_course(&storage, Some(&viewer), new_course(Uuid::new_v4()), fixed_today())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User not found");

        let mut past = new_course(prof.id);
        past.start_date = Some(fixed_today() - Duration::days(1));
        let err = create_course(&storage, Some(&viewer), past, fixed_today())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Start date cannot be before current date");

        let mut no_hours = new_course(prof.id);
        no_hours.hours = Some(0);
        let err = create_course(&storage, Some(&viewer), no_hours, fixed_today())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Course cannot have 0 or negative hours");
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_fields() {
        let (storage, prof, pupil) = setup().await;
        let viewer = Viewer::from(&prof);
        let course = create_course(&storage, Some(&viewer), new_course(prof.id), fixed_today())
            .await
            .unwrap();

        // A course that already started can still be edited later on.
        let later = fixed_today() + Duration::days(30);
        let changes = CourseChanges {
            hours: Some(24),
            ..Default::default()
        };
        let updated = update_course(&storage, Some(&viewer), course.id, changes, later)
            .await
            .unwrap();
        assert_eq!(updated.hours, 24);
        assert_eq!(updated.name, "Physique");
        assert_eq!(updated.start_date, fixed_today());

        let changes = CourseChanges {
            end_date: Some(fixed_today() - Duration::days(1)),
            ..Default::default()
        };
        let err = update_course(&storage, Some(&viewer), course.id, changes, later)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "End date cannot be before start date");

        let changes = CourseChanges {
            professor_id: Some(pupil.id),
            ..Default::default()
        };
        let err = update_course(&storage, Some(&viewer), course.id, changes, later)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "This user is not a professor");
        let stored = storage.get_course_by_id(course.id).await.unwrap().unwrap();
        assert_eq!(stored.professor_id, prof.id);

        let err = update_course(&storage, Some(&viewer), Uuid::new_v4(), CourseChanges::default(), later)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Course not found");
    }

    #[tokio::test]
    async fn test_enrollment_actions() {
        let (storage, prof, pupil) = setup().await;
        let viewer = Viewer::from(&prof);
        let course = create_course(&storage, Some(&viewer), new_course(prof.id), fixed_today())
            .await
            .unwrap();

        for _ in 0..2 {
            update_course_students(&storage, Some(&viewer), course.id, pupil.id, EnrollmentAction::Add)
                .await
                .unwrap();
        }
        assert_eq!(storage.get_students_of_course(course.id).await.unwrap().len(), 1);

        let err = update_course_students(&storage, Some(&viewer), course.id, prof.id, EnrollmentAction::Add)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "This user is not a student");

        for _ in 0..2 {
            update_course_students(&storage, Some(&viewer), course.id, pupil.id, EnrollmentAction::Remove)
                .await
                .unwrap();
        }
        assert!(storage.get_students_of_course(course.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_course() {
        let (storage, prof, _) = setup().await;
        let viewer = Viewer::from(&prof);
        let course = create_course(&storage, Some(&viewer), new_course(prof.id), fixed_today())
            .await
            .unwrap();

        let deleted = delete_course(&storage, Some(&viewer), course.id).await.unwrap();
        assert_eq!(deleted.id, course.id);
        let err = delete_course(&storage, Some(&viewer), course.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Course not found");
    }
}
