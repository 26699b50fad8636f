use super::traits::Storage;
use crate::common::error::{Result, SchoolError};
use crate::domain::*;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    courses: HashMap<Uuid, Course>,
    /// (user_id, course_id) pairs of the user_courses join table
    enrollments: BTreeSet<(Uuid, Uuid)>,
    grades: HashMap<Uuid, Grade>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn require_user(&self, user_id: Uuid) -> Result<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(referenced_missing())
        }
    }

    fn require_course(&self, course_id: Uuid) -> Result<()> {
        if self.courses.contains_key(&course_id) {
            Ok(())
        } else {
            Err(referenced_missing())
        }
    }
}

fn referenced_missing() -> SchoolError {
    SchoolError::NotFound("Referenced record not found".to_string())
}

fn email_conflict() -> SchoolError {
    SchoolError::Conflict("Email is already used".to_string())
}

fn sorted_users(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| a.email.cmp(&b.email));
    users
}

fn sorted_courses(mut courses: Vec<Course>) -> Vec<Course> {
    courses.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    courses
}

fn sorted_grades(mut grades: Vec<Grade>) -> Vec<Grade> {
    grades.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    grades
}

/// In-memory storage implementation for development/testing
#[derive(Default)]
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| SchoolError::Internal("storage lock poisoned".to_string()))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables()?;
        if tables.email_taken(&user.email, None) {
            return Err(email_conflict());
        }
        tables.users.insert(user.id, user.clone());

        debug!("Created user: {} with id {}", user.email, user.id);
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.tables()?.users.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_all_users(&self) -> Result<Vec<User>> {
        let tables = self.tables()?;
        Ok(sorted_users(tables.users.values().cloned().collect()))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&user.id) {
            return Err(SchoolError::not_found("User"));
        }
        if tables.email_taken(&user.email, Some(user.id)) {
            return Err(email_conflict());
        }
        tables.users.insert(user.id, user.clone());

        debug!("Updated user: {} with id {}", user.email, user.id);
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&user_id) {
            return Err(SchoolError::not_found("User"));
        }
        if tables.courses.values().any(|c| c.professor_id == user_id) {
            return Err(SchoolError::Conflict(
                "This user still teaches courses".to_string(),
            ));
        }

        tables.enrollments.retain(|(uid, _)| *uid != user_id);
        tables.grades.retain(|_, g| g.user_id != user_id);
        tables.users.remove(&user_id);

        debug!("Deleted user with id {}", user_id);
        Ok(())
    }

    async fn create_course(&self, course: &Course) -> Result<()> {
        let mut tables = self.tables()?;
        tables.require_user(course.professor_id)?;
        tables.courses.insert(course.id, course.clone());

        debug!("Created course: {} with id {}", course.name, course.id);
        Ok(())
    }

    async fn get_course_by_id(&self, course_id: Uuid) -> Result<Option<Course>> {
        Ok(self.tables()?.courses.get(&course_id).cloned())
    }

    async fn get_all_courses(&self) -> Result<Vec<Course>> {
        let tables = self.tables()?;
        Ok(sorted_courses(tables.courses.values().cloned().collect()))
    }

    async fn search_courses_by_name(&self, fragment: &str) -> Result<Vec<Course>> {
        let needle = fragment.to_lowercase();
        let tables = self.tables()?;
        let found = tables
            .courses
            .values()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(sorted_courses(found))
    }

    async fn get_courses_by_professor(&self, professor_id: Uuid) -> Result<Vec<Course>> {
        let tables = self.tables()?;
        let found = tables
            .courses
            .values()
            .filter(|c| c.professor_id == professor_id)
            .cloned()
            .collect();
        Ok(sorted_courses(found))
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        let mut tables = self.tables()?;
        if !tables.courses.contains_key(&course.id) {
            return Err(SchoolError::not_found("Course"));
        }
        tables.require_user(course.professor_id)?;
        tables.courses.insert(course.id, course.clone());

        debug!("Updated course: {} with id {}", course.name, course.id);
        Ok(())
    }

    async fn delete_course(&self, course_id: Uuid) -> Result<()> {
        let mut tables = self.tables()?;
        if tables.courses.remove(&course_id).is_none() {
            return Err(SchoolError::not_found("Course"));
        }
        tables.enrollments.retain(|(_, cid)| *cid != course_id);
        tables.grades.retain(|_, g| g.course_id != course_id);

        debug!("Deleted course with id {}", course_id);
        Ok(())
    }

    async fn enroll_student(&self, course_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tables = self.tables()?;
        tables.require_course(course_id)?;
        tables.require_user(user_id)?;
        tables.enrollments.insert((user_id, course_id));
        Ok(())
    }

    async fn unenroll_student(&self, course_id: Uuid, user_id: Uuid) -> Result<()> {
        self.tables()?.enrollments.remove(&(user_id, course_id));
        Ok(())
    }

    async fn get_students_of_course(&self, course_id: Uuid) -> Result<Vec<User>> {
        let tables = self.tables()?;
        let students = tables
            .enrollments
            .iter()
            .filter(|(_, cid)| *cid == course_id)
            .filter_map(|(uid, _)| tables.users.get(uid).cloned())
            .collect();
        Ok(sorted_users(students))
    }

    async fn get_enrolled_courses(&self, user_id: Uuid) -> Result<Vec<Course>> {
        let tables = self.tables()?;
        let courses = tables
            .enrollments
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .filter_map(|(_, cid)| tables.courses.get(cid).cloned())
            .collect();
        Ok(sorted_courses(courses))
    }

    async fn is_student_enrolled(&self, user_id: Uuid, course_id: Uuid) -> Result<bool> {
        Ok(self.tables()?.enrollments.contains(&(user_id, course_id)))
    }

    async fn create_grade(&self, grade: &Grade) -> Result<()> {
        let mut tables = self.tables()?;
        tables.require_user(grade.user_id)?;
        tables.require_course(grade.course_id)?;
        tables.grades.insert(grade.id, grade.clone());

        debug!("Created grade {} for user {}", grade.id, grade.user_id);
        Ok(())
    }

    async fn get_grade_by_id(&self, grade_id: Uuid) -> Result<Option<Grade>> {
        Ok(self.tables()?.grades.get(&grade_id).cloned())
    }

    async fn get_grades_by_student(&self, user_id: Uuid) -> Result<Vec<Grade>> {
        let tables = self.tables()?;
        let grades = tables
            .grades
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_grades(grades))
    }

    async fn get_grades_by_courses(&self, course_ids: Vec<Uuid>) -> Result<Vec<Grade>> {
        let tables = self.tables()?;
        let grades = tables
            .grades
            .values()
            .filter(|g| course_ids.contains(&g.course_id))
            .cloned()
            .collect();
        Ok(sorted_grades(grades))
    }

    async fn update_grade(&self, grade: &Grade) -> Result<()> {
        let mut tables = self.tables()?;
        if !tables.grades.contains_key(&grade.id) {
            return Err(SchoolError::not_found("Grade"));
        }
        tables.grades.insert(grade.id, grade.clone());

        debug!("Updated grade {}", grade.id);
        Ok(())
    }

    async fn delete_grade(&self, grade_id: Uuid) -> Result<()> {
        if self.tables()?.grades.remove(&grade_id).is_none() {
            return Err(SchoolError::not_found("Grade"));
        }

        debug!("Deleted grade {}", grade_id);
        Ok(())
    }

    async fn get_users_by_ids(&self, user_ids: Vec<Uuid>) -> Result<Vec<User>> {
        let tables = self.tables()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn get_courses_by_ids(&self, course_ids: Vec<Uuid>) -> Result<Vec<Course>> {
        let tables = self.tables()?;
        Ok(course_ids
            .iter()
            .filter_map(|id| tables.courses.get(id).cloned())
            .collect())
    }
}
