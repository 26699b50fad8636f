use crate::common::error::{Result, SchoolError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Hours assigned to a course when none are given.
pub const DEFAULT_COURSE_HOURS: i32 = 10;
pub const NOTE_MIN: f64 = 0.0;
pub const NOTE_MAX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    /// Role granted at registration: only an explicit `ROLE_ADMIN` request
    /// yields an admin, anything else is a plain user.
    pub fn from_requested(requested: Option<&str>) -> Self {
        match requested {
            Some("ROLE_ADMIN") => Role::Admin,
            _ => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ROLE_USER" => Ok(Role::User),
            "ROLE_ADMIN" => Ok(Role::Admin),
            other => Err(SchoolError::Validation(format!("Unknown role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub pseudo: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, pseudo: &str, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            pseudo: pseudo.to_string(),
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: i32,
    pub professor_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn new(
        name: &str,
        professor_id: Uuid,
        description: Option<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        hours: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description,
            start_date,
            end_date,
            hours,
            professor_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub id: Uuid,
    pub note: f64,
    pub comment: Option<String>,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Grade {
    pub fn new(user_id: Uuid, course_id: Uuid, note: f64, comment: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            note,
            comment,
            user_id,
            course_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The authenticated caller of a request, decoded from its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Viewer {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Parses an entity id received as a string argument.
pub fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| SchoolError::Validation(format!("Invalid id: {raw}")))
}

pub fn validate_note(note: f64) -> Result<()> {
    if note.is_nan() || !(NOTE_MIN..=NOTE_MAX).contains(&note) {
        return Err(SchoolError::Validation(
            "Note must be between 0 and 20".to_string(),
        ));
    }
    Ok(())
}

/// Checks the schedule of a course. The start date is only compared with
/// `today` when `check_start` is set, so an existing course that already
/// started can still be edited.
pub fn validate_schedule(
    start_date: NaiveDate,
    end_date: NaiveDate,
    hours: i32,
    today: NaiveDate,
    check_start: bool,
) -> Result<()> {
    if check_start && start_date < today {
        return Err(SchoolError::Validation(
            "Start date cannot be before current date".to_string(),
        ));
    }
    if end_date < start_date {
        return Err(SchoolError::Validation(
            "End date cannot be before start date".to_string(),
        ));
    }
    if hours <= 0 {
        return Err(SchoolError::Validation(
            "Course cannot have 0 or negative hours".to_string(),
        ));
    }
    Ok(())
}
