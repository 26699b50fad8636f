use askama::Template;

use crate::models::{WebCourse, WebGrade, WebProfile, WebUser};
use crate::session::Session;

/// What the navigation bar needs to know about the visitor.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub signed_in: bool,
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
}

impl Nav {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl From<&Session> for Nav {
    fn from(session: &Session) -> Self {
        Self {
            signed_in: true,
            user_id: session.user_id(),
            email: session.claims.email.clone(),
            is_admin: session.is_admin(),
        }
    }
}

/// Format an average note for display, e.g. `12.50 / 20`.
pub fn average_display(average: Option<f64>) -> String {
    match average {
        Some(value) => format!("{:.2} / 20", value),
        None => "-".to_string(),
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub nav: Nav,
    pub title: String,
    pub message: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub profile: WebProfile,
    pub recent_grades: Vec<WebGrade>,
    pub average: String,
}

#[derive(Template)]
#[template(path = "courses.html")]
pub struct CoursesTemplate {
    pub nav: Nav,
    pub courses: Vec<WebCourse>,
    pub search: String,
    pub professors: Vec<WebUser>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "course.html")]
pub struct CourseTemplate {
    pub nav: Nav,
    pub course: WebCourse,
    pub candidates: Vec<WebUser>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "grades.html")]
pub struct GradesTemplate {
    pub nav: Nav,
    pub grades: Vec<WebGrade>,
    pub average: String,
    pub courses: Vec<WebCourse>,
    pub students: Vec<WebUser>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "students.html")]
pub struct StudentsTemplate {
    pub nav: Nav,
    pub users: Vec<WebUser>,
}

#[derive(Template)]
#[template(path = "student.html")]
pub struct StudentTemplate {
    pub nav: Nav,
    pub student: WebProfile,
    pub grades: Vec<WebGrade>,
    pub average: String,
}

#[derive(Template)]
#[template(path = "schedule.html")]
pub struct ScheduleTemplate {
    pub nav: Nav,
    pub courses: Vec<WebCourse>,
}

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub nav: Nav,
    pub email: String,
    pub pseudo: String,
    pub saved: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_page_escapes_message() {
        let page = ErrorTemplate {
            nav: Nav::anonymous(),
            title: "Bad Request".to_string(),
            message: "<script>".to_string(),
        };
        let html = page.render().unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("/login"));
    }

    #[test]
    fn test_average_display() {
        assert_eq!(average_display(Some(12.5)), "12.50 / 20");
        assert_eq!(average_display(None), "-");
    }
}
