use crate::common::error::Result;
use crate::domain::*;
use async_trait::async_trait;
use uuid::Uuid;

/// Storage trait for persisting users, courses, enrollments and grades.
///
/// Listings are ordered: users by email, courses by name, grades by
/// creation time.
#[async_trait]
pub trait Storage: Send + Sync {
    // User operations
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_all_users(&self) -> Result<Vec<User>>;
    async fn update_user(&self, user: &User) -> Result<()>;
    /// Removes the user with their enrollments and grades. Fails while the
    /// user still teaches a course.
    async fn delete_user(&self, user_id: Uuid) -> Result<()>;

    // Course operations
    async fn create_course(&self, course: &Course) -> Result<()>;
    async fn get_course_by_id(&self, course_id: Uuid) -> Result<Option<Course>>;
    async fn get_all_courses(&self) -> Result<Vec<Course>>;
    /// Case-insensitive "name contains" search.
    async fn search_courses_by_name(&self, fragment: &str) -> Result<Vec<Course>>;
    async fn get_courses_by_professor(&self, professor_id: Uuid) -> Result<Vec<Course>>;
    async fn update_course(&self, course: &Course) -> Result<()>;
    /// Removes the course with its enrollments and grades.
    async fn delete_course(&self, course_id: Uuid) -> Result<()>;

    // Enrollment operations
    async fn enroll_student(&self, course_id: Uuid, user_id: Uuid) -> Result<()>;
    async fn unenroll_student(&self, course_id: Uuid, user_id: Uuid) -> Result<()>;
    async fn get_students_of_course(&self, course_id: Uuid) -> Result<Vec<User>>;
    async fn get_enrolled_courses(&self, user_id: Uuid) -> Result<Vec<Course>>;
    async fn is_student_enrolled(&self, user_id: Uuid, course_id: Uuid) -> Result<bool>;

    // Grade operations
    async fn create_grade(&self, grade: &Grade) -> Result<()>;
    async fn get_grade_by_id(&self, grade_id: Uuid) -> Result<Option<Grade>>;
    async fn get_grades_by_student(&self, user_id: Uuid) -> Result<Vec<Grade>>;
    async fn get_grades_by_courses(&self, course_ids: Vec<Uuid>) -> Result<Vec<Grade>>;
    async fn update_grade(&self, grade: &Grade) -> Result<()>;
    async fn delete_grade(&self, grade_id: Uuid) -> Result<()>;

    // Batch loading methods for GraphQL DataLoader optimization
    async fn get_users_by_ids(&self, user_ids: Vec<Uuid>) -> Result<Vec<User>>;
    async fn get_courses_by_ids(&self, course_ids: Vec<Uuid>) -> Result<Vec<Course>>;
}
