use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// Web-specific models for GraphQL responses

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebUser {
    pub id: String,
    pub email: String,
    pub pseudo: String,
    pub role: String,
}

impl WebUser {
    pub fn is_admin(&self) -> bool {
        self.role == "ROLE_ADMIN"
    }

    pub fn role_label(&self) -> &'static str {
        if self.is_admin() {
            "Professeur"
        } else {
            "Étudiant"
        }
    }
}

/// A user together with the courses they follow and teach.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebProfile {
    pub id: String,
    pub email: String,
    pub pseudo: String,
    pub role: String,
    #[serde(default)]
    pub enrolled_courses: Vec<WebCourse>,
    #[serde(default)]
    pub taught_courses: Vec<WebCourse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
    pub id: String,
    pub pseudo: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebCourse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: i32,
    #[serde(default)]
    pub professor: Option<PersonRef>,
    #[serde(default)]
    pub students: Vec<WebUser>,
}

impl WebCourse {
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn professor_name(&self) -> &str {
        self.professor.as_ref().map_or("", |p| p.pseudo.as_str())
    }

    pub fn is_taught_by(&self, user_id: &str) -> bool {
        self.professor.as_ref().is_some_and(|p| p.id == user_id)
    }

    pub fn has_student(&self, user_id: &str) -> bool {
        self.students.iter().any(|s| s.id == user_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebGrade {
    pub id: String,
    pub note: f64,
    pub comment: Option<String>,
    pub course: Option<CourseRef>,
    #[serde(default)]
    pub student: Option<PersonRef>,
    pub created_at: DateTime<Utc>,
}

impl WebGrade {
    pub fn note_display(&self) -> String {
        format!("{:.2}", self.note)
    }

    pub fn comment_text(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }

    pub fn course_name(&self) -> &str {
        self.course.as_ref().map_or("", |c| c.name.as_str())
    }

    pub fn student_name(&self) -> &str {
        self.student.as_ref().map_or("", |s| s.pseudo.as_str())
    }

    pub fn date_display(&self) -> String {
        self.created_at.format("%d/%m/%Y").to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,
    pub user: WebUser,
}

/// Average of a set of grades, or `None` when there are none.
pub fn average(grades: &[WebGrade]) -> Option<f64> {
    if grades.is_empty() {
        return None;
    }
    Some(grades.iter().map(|g| g.note).sum::<f64>() / grades.len() as f64)
}

#[derive(Serialize)]
pub struct GraphQLRequest<'a> {
    pub query: &'a str,
    pub variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

// Form payloads

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub pseudo: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CourseSearch {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CourseForm {
    pub name: String,
    pub professor_id: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: String,
    pub hours: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollmentForm {
    pub student_id: String,
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct GradeForm {
    pub user_id: String,
    pub course_id: String,
    pub note: f64,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GradeUpdateForm {
    pub note: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub email: String,
    pub pseudo: String,
    pub password: Option<String>,
}

/// Trim a form value, treating blank as absent.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(note: f64) -> WebGrade {
        WebGrade {
            id: "g".to_string(),
            note,
            comment: None,
            course: None,
            student: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[]), None);
        assert_eq!(average(&[grade(10.0), grade(15.0)]), Some(12.5));
    }

    #[test]
    fn test_course_deserializes_from_graphql_shape() {
        let json = serde_json::json!({
            "id": "c1",
            "name": "Anglais",
            "description": null,
            "startDate": "2025-09-01",
            "endDate": "2025-12-01",
            "hours": 10,
            "professor": { "id": "p1", "pseudo": "admin" }
        });
        let course: WebCourse = serde_json::from_value(json).unwrap();
        assert_eq!(course.professor_name(), "admin");
        assert!(course.is_taught_by("p1"));
        assert!(course.students.is_empty());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" 12 ")), Some("12".to_string()));
        assert_eq!(non_blank(None), None);
    }
}
