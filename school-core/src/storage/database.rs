use super::traits::Storage;
use crate::common::error::{Result, SchoolError};
use crate::database::DatabaseManager;
use crate::domain::*;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use libsql::{Connection, Row, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, pseudo, password_hash, role, created_at, updated_at";
const COURSE_COLUMNS: &str =
    "id, name, description, start_date, end_date, hours, professor_id, created_at, updated_at";
const GRADE_COLUMNS: &str = "id, note, comment, user_id, course_id, created_at, updated_at";

/// Database storage implementation using libSQL with one table per entity
pub struct DatabaseStorage {
    db: Arc<DatabaseManager>,
}

fn db_error(context: &str, e: libsql::Error) -> SchoolError {
    let message = e.to_string();
    if message.contains("UNIQUE constraint failed: users.email") {
        return SchoolError::Conflict("Email is already used".to_string());
    }
    if message.contains("FOREIGN KEY constraint failed") {
        return SchoolError::NotFound("Referenced record not found".to_string());
    }
    SchoolError::Database {
        message: format!("{context}: {message}"),
    }
}

fn decode_error(column: i32, expected: &str, got: &Value) -> SchoolError {
    SchoolError::Database {
        message: format!("Expected {expected} in column {column}, got {got:?}"),
    }
}

fn text(row: &Row, idx: i32) -> Result<String> {
    match row.get_value(idx).map_err(|e| db_error("Failed to read column", e))? {
        Value::Text(s) => Ok(s),
        other => Err(decode_error(idx, "text", &other)),
    }
}

fn opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx).map_err(|e| db_error("Failed to read column", e))? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(decode_error(idx, "text or null", &other)),
    }
}

fn integer(row: &Row, idx: i32) -> Result<i64> {
    match row.get_value(idx).map_err(|e| db_error("Failed to read column", e))? {
        Value::Integer(i) => Ok(i),
        other => Err(decode_error(idx, "integer", &other)),
    }
}

fn real(row: &Row, idx: i32) -> Result<f64> {
    match row.get_value(idx).map_err(|e| db_error("Failed to read column", e))? {
        Value::Real(f) => Ok(f),
        Value::Integer(i) => Ok(i as f64),
        other => Err(decode_error(idx, "real", &other)),
    }
}

fn uuid_at(row: &Row, idx: i32) -> Result<Uuid> {
    let raw = text(row, idx)?;
    Uuid::parse_str(&raw).map_err(|e| SchoolError::Database {
        message: format!("Invalid UUID '{raw}': {e}"),
    })
}

fn date_at(row: &Row, idx: i32) -> Result<NaiveDate> {
    let raw = text(row, idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| SchoolError::Database {
        message: format!("Invalid date '{raw}': {e}"),
    })
}

fn timestamp_at(row: &Row, idx: i32) -> Result<DateTime<Utc>> {
    let raw = text(row, idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SchoolError::Database {
            message: format!("Invalid timestamp '{raw}': {e}"),
        })
}

fn uuid_value(id: Uuid) -> Value {
    Value::Text(id.to_string())
}

fn text_value(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn opt_text_value(s: Option<&str>) -> Value {
    s.map_or(Value::Null, text_value)
}

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

/// Fixed-width RFC 3339 so that lexical order matches time order.
fn timestamp_value(ts: DateTime<Utc>) -> Value {
    Value::Text(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        email: text(row, 1)?,
        pseudo: text(row, 2)?,
        password_hash: text(row, 3)?,
        role: text(row, 4)?.parse()?,
        created_at: timestamp_at(row, 5)?,
        updated_at: timestamp_at(row, 6)?,
    })
}

fn row_to_course(row: &Row) -> Result<Course> {
    let hours = integer(row, 5)?;
    Ok(Course {
        id: uuid_at(row, 0)?,
        name: text(row, 1)?,
        description: opt_text(row, 2)?,
        start_date: date_at(row, 3)?,
        end_date: date_at(row, 4)?,
        hours: i32::try_from(hours).map_err(|_| SchoolError::Database {
            message: format!("Course hours out of range: {hours}"),
        })?,
        professor_id: uuid_at(row, 6)?,
        created_at: timestamp_at(row, 7)?,
        updated_at: timestamp_at(row, 8)?,
    })
}

fn row_to_grade(row: &Row) -> Result<Grade> {
    Ok(Grade {
        id: uuid_at(row, 0)?,
        note: real(row, 1)?,
        comment: opt_text(row, 2)?,
        user_id: uuid_at(row, 3)?,
        course_id: uuid_at(row, 4)?,
        created_at: timestamp_at(row, 5)?,
        updated_at: timestamp_at(row, 6)?,
    })
}

impl DatabaseStorage {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Open the database at `path`, apply migrations and wrap it.
    pub async fn open(path: &str) -> Result<Self> {
        let db_manager = DatabaseManager::new(path).await?;
        db_manager.run_migrations().await?;
        info!("Database storage ready at {}", path);
        Ok(Self::new(db_manager))
    }

    fn conn(&self) -> &Connection {
        self.db.connection()
    }

    async fn query_rows<T>(
        &self,
        sql: &str,
        params: Vec<Value>,
        map: fn(&Row) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut rows = self
            .conn()
            .query(sql, params)
            .await
            .map_err(|e| db_error("Failed to run query", e))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| db_error("Failed to read row", e))?
        {
            results.push(map(&row)?);
        }
        Ok(results)
    }

    async fn query_one<T>(
        &self,
        sql: &str,
        params: Vec<Value>,
        map: fn(&Row) -> Result<T>,
    ) -> Result<Option<T>> {
        Ok(self.query_rows(sql, params, map).await?.into_iter().next())
    }

    async fn execute(&self, context: &str, sql: &str, params: Vec<Value>) -> Result<u64> {
        self.conn()
            .execute(sql, params)
            .await
            .map_err(|e| db_error(context, e))
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn create_user(&self, user: &User) -> Result<()> {
        self.execute(
            "Failed to insert user",
            &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"),
            vec![
                uuid_value(user.id),
                text_value(&user.email),
                text_value(&user.pseudo),
                text_value(&user.password_hash),
                text_value(user.role.as_str()),
                timestamp_value(user.created_at),
                timestamp_value(user.updated_at),
            ],
        )
        .await?;

        debug!("Inserted user: {} with id {}", user.email, user.id);
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        self.query_one(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            vec![uuid_value(user_id)],
            row_to_user,
        )
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.query_one(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"),
            vec![text_value(email)],
            row_to_user,
        )
        .await
    }

    async fn get_all_users(&self) -> Result<Vec<User>> {
        self.query_rows(
            &format!("SELECT {USER_COLUMNS} FROM users ORDER BY email"),
            vec![],
            row_to_user,
        )
        .await
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let changed = self
            .execute(
                "Failed to update user",
                "UPDATE users SET email = ?, pseudo = ?, password_hash = ?, role = ?, updated_at = ? WHERE id = ?",
                vec![
                    text_value(&user.email),
                    text_value(&user.pseudo),
                    text_value(&user.password_hash),
                    text_value(user.role.as_str()),
                    timestamp_value(user.updated_at),
                    uuid_value(user.id),
                ],
            )
            .await?;

        if changed == 0 {
            return Err(SchoolError::not_found("User"));
        }
        debug!("Updated user: {} with id {}", user.email, user.id);
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        let teaching = self
            .query_one(
                "SELECT COUNT(*) FROM courses WHERE professor_id = ?",
                vec![uuid_value(user_id)],
                |row| integer(row, 0),
            )
            .await?
            .unwrap_or(0);
        if teaching > 0 {
            return Err(SchoolError::Conflict(
                "This user still teaches courses".to_string(),
            ));
        }

        let deleted = self
            .execute(
                "Failed to delete user",
                "DELETE FROM users WHERE id = ?",
                vec![uuid_value(user_id)],
            )
            .await?;
        if deleted == 0 {
            return Err(SchoolError::not_found("User"));
        }

        debug!("Deleted user with id {}", user_id);
        Ok(())
    }

    async fn create_course(&self, course: &Course) -> Result<()> {
        self.execute(
            "Failed to insert course",
            &format!("INSERT INTO courses ({COURSE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            vec![
                uuid_value(course.id),
                text_value(&course.name),
                opt_text_value(course.description.as_deref()),
                date_value(course.start_date),
                date_value(course.end_date),
                Value::Integer(i64::from(course.hours)),
                uuid_value(course.professor_id),
                timestamp_value(course.created_at),
                timestamp_value(course.updated_at),
            ],
        )
        .await?;

        debug!("Inserted course: {} with id {}", course.name, course.id);
        Ok(())
    }

    async fn get_course_by_id(&self, course_id: Uuid) -> Result<Option<Course>> {
        self.query_one(
            &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"),
            vec![uuid_value(course_id)],
            row_to_course,
        )
        .await
    }

    async fn get_all_courses(&self) -> Result<Vec<Course>> {
        self.query_rows(
            &format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY name, id"),
            vec![],
            row_to_course,
        )
        .await
    }

    async fn search_courses_by_name(&self, fragment: &str) -> Result<Vec<Course>> {
        // SQLite LIKE only folds ASCII, so accented names are matched here.
        let needle = fragment.to_lowercase();
        let courses = self.get_all_courses().await?;
        Ok(courses
            .into_iter()
            .filter(|course| course.name.to_lowercase().contains(&needle))
            .collect())
    }

    async fn get_courses_by_professor(&self, professor_id: Uuid) -> Result<Vec<Course>> {
        self.query_rows(
            &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE professor_id = ? ORDER BY name, id"),
            vec![uuid_value(professor_id)],
            row_to_course,
        )
        .await
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        let changed = self
            .execute(
                "Failed to update course",
                "UPDATE courses SET name = ?, description = ?, start_date = ?, end_date = ?, hours = ?, professor_id = ?, updated_at = ? WHERE id = ?",
                vec![
                    text_value(&course.name),
                    opt_text_value(course.description.as_deref()),
                    date_value(course.start_date),
                    date_value(course.end_date),
                    Value::Integer(i64::from(course.hours)),
                    uuid_value(course.professor_id),
                    timestamp_value(course.updated_at),
                    uuid_value(course.id),
                ],
            )
            .await?;

        if changed == 0 {
            return Err(SchoolError::not_found("Course"));
        }
        debug!("Updated course: {} with id {}", course.name, course.id);
        Ok(())
    }

    async fn delete_course(&self, course_id: Uuid) -> Result<()> {
        // Enrollments and grades go with it through ON DELETE CASCADE
        let deleted = self
            .execute(
                "Failed to delete course",
                "DELETE FROM courses WHERE id = ?",
                vec![uuid_value(course_id)],
            )
            .await?;
        if deleted == 0 {
            return Err(SchoolError::not_found("Course"));
        }

        debug!("Deleted course with id {}", course_id);
        Ok(())
    }

    async fn enroll_student(&self, course_id: Uuid, user_id: Uuid) -> Result<()> {
        self.execute(
            "Failed to enroll student",
            "INSERT OR IGNORE INTO user_courses (user_id, course_id, created_at) VALUES (?, ?, ?)",
            vec![
                uuid_value(user_id),
                uuid_value(course_id),
                timestamp_value(Utc::now()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn unenroll_student(&self, course_id: Uuid, user_id: Uuid) -> Result<()> {
        self.execute(
            "Failed to unenroll student",
            "DELETE FROM user_courses WHERE user_id = ? AND course_id = ?",
            vec![uuid_value(user_id), uuid_value(course_id)],
        )
        .await?;
        Ok(())
    }

    async fn get_students_of_course(&self, course_id: Uuid) -> Result<Vec<User>> {
        self.query_rows(
            "SELECT u.id, u.email, u.pseudo, u.password_hash, u.role, u.created_at, u.updated_at
             FROM users u JOIN user_courses uc ON uc.user_id = u.id
             WHERE uc.course_id = ? ORDER BY u.email",
            vec![uuid_value(course_id)],
            row_to_user,
        )
        .await
    }

    async fn get_enrolled_courses(&self, user_id: Uuid) -> Result<Vec<Course>> {
        self.query_rows(
            "SELECT c.id, c.name, c.description, c.start_date, c.end_date, c.hours, c.professor_id, c.created_at, c.updated_at
             FROM courses c JOIN user_courses uc ON uc.course_id = c.id
             WHERE uc.user_id = ? ORDER BY c.name, c.id",
            vec![uuid_value(user_id)],
            row_to_course,
        )
        .await
    }

    async fn is_student_enrolled(&self, user_id: Uuid, course_id: Uuid) -> Result<bool> {
        let count = self
            .query_one(
                "SELECT COUNT(*) FROM user_courses WHERE user_id = ? AND course_id = ?",
                vec![uuid_value(user_id), uuid_value(course_id)],
                |row| integer(row, 0),
            )
            .await?
            .unwrap_or(0);
        Ok(count > 0)
    }

    async fn create_grade(&self, grade: &Grade) -> Result<()> {
        self.execute(
            "Failed to insert grade",
            &format!("INSERT INTO grades ({GRADE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"),
            vec![
                uuid_value(grade.id),
                Value::Real(grade.note),
                opt_text_value(grade.comment.as_deref()),
                uuid_value(grade.user_id),
                uuid_value(grade.course_id),
                timestamp_value(grade.created_at),
                timestamp_value(grade.updated_at),
            ],
        )
        .await?;

        debug!("Inserted grade {} for user {}", grade.id, grade.user_id);
        Ok(())
    }

    async fn get_grade_by_id(&self, grade_id: Uuid) -> Result<Option<Grade>> {
        self.query_one(
            &format!("SELECT {GRADE_COLUMNS} FROM grades WHERE id = ?"),
            vec![uuid_value(grade_id)],
            row_to_grade,
        )
        .await
    }

    async fn get_grades_by_student(&self, user_id: Uuid) -> Result<Vec<Grade>> {
        self.query_rows(
            &format!("SELECT {GRADE_COLUMNS} FROM grades WHERE user_id = ? ORDER BY created_at, id"),
            vec![uuid_value(user_id)],
            row_to_grade,
        )
        .await
    }

    async fn get_grades_by_courses(&self, course_ids: Vec<Uuid>) -> Result<Vec<Grade>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {GRADE_COLUMNS} FROM grades WHERE course_id IN ({}) ORDER BY created_at, id",
            placeholders(course_ids.len())
        );
        self.query_rows(&sql, course_ids.into_iter().map(uuid_value).collect(), row_to_grade)
            .await
    }

    async fn update_grade(&self, grade: &Grade) -> Result<()> {
        let changed = self
            .execute(
                "Failed to update grade",
                "UPDATE grades SET note = ?, comment = ?, updated_at = ? WHERE id = ?",
                vec![
                    Value::Real(grade.note),
                    opt_text_value(grade.comment.as_deref()),
                    timestamp_value(grade.updated_at),
                    uuid_value(grade.id),
                ],
            )
            .await?;

        if changed == 0 {
            return Err(SchoolError::not_found("Grade"));
        }
        debug!("Updated grade {}", grade.id);
        Ok(())
    }

    async fn delete_grade(&self, grade_id: Uuid) -> Result<()> {
        let deleted = self
            .execute(
                "Failed to delete grade",
                "DELETE FROM grades WHERE id = ?",
                vec![uuid_value(grade_id)],
            )
            .await?;
        if deleted == 0 {
            return Err(SchoolError::not_found("Grade"));
        }

        debug!("Deleted grade {}", grade_id);
        Ok(())
    }

    async fn get_users_by_ids(&self, user_ids: Vec<Uuid>) -> Result<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id IN ({})",
            placeholders(user_ids.len())
        );
        self.query_rows(&sql, user_ids.into_iter().map(uuid_value).collect(), row_to_user)
            .await
    }

    async fn get_courses_by_ids(&self, course_ids: Vec<Uuid>) -> Result<Vec<Course>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id IN ({})",
            placeholders(course_ids.len())
        );
        self.query_rows(&sql, course_ids.into_iter().map(uuid_value).collect(), row_to_course)
            .await
    }
}
