use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tracing::info;

use crate::error::WebError;
use crate::graphql;
use crate::models::{
    average, non_blank, CourseForm, CourseSearch, EnrollmentForm, GradeForm, GradeUpdateForm,
    LoginForm, RegisterForm, SettingsForm, WebUser,
};
use crate::session::{expired_cookie, session_cookie, Session};
use crate::state::AppState;
use crate::templates::{
    average_display, CourseTemplate, CoursesTemplate, GradesTemplate, IndexTemplate,
    LoginTemplate, Nav, RegisterTemplate, ScheduleTemplate, SettingsTemplate, StudentTemplate,
    StudentsTemplate,
};

type Page = Result<Html<String>, WebError>;

const RECENT_GRADES: usize = 5;

fn render<T: Template>(template: T) -> Page {
    Ok(Html(template.render()?))
}

fn require_admin(session: &Session) -> Result<(), WebError> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(WebError::Forbidden(
            "Only administrators can access this page".to_string(),
        ))
    }
}

/// A mutation the service refused is shown next to the form. Anything else
/// (expired session, unreachable service) goes to the error page.
fn form_error(err: WebError) -> Result<String, WebError> {
    match err {
        WebError::GraphQL(message) if message != "Unauthorized" => Ok(message),
        other => Err(other),
    }
}

fn students_only(users: Vec<WebUser>) -> Vec<WebUser> {
    users.into_iter().filter(|user| !user.is_admin()).collect()
}

// Authentication

pub async fn login_page(jar: CookieJar) -> Response {
    if Session::from_jar(&jar).is_some() {
        return Redirect::to("/").into_response();
    }
    render(LoginTemplate {
        nav: Nav::anonymous(),
        error: None,
    })
    .into_response()
}

async fn sign_in(
    state: &AppState,
    jar: CookieJar,
    email: &str,
    password: &str,
) -> Result<Response, WebError> {
    match graphql::login(state, email, password).await {
        Ok(payload) => {
            info!("{} signed in", payload.user.email);
            let cookie = session_cookie(&payload.token).map_err(WebError::Internal)?;
            Ok((jar.add(cookie), Redirect::to("/")).into_response())
        }
        Err(err) => {
            let message = form_error(err)?;
            Ok(render(LoginTemplate {
                nav: Nav::anonymous(),
                error: Some(message),
            })?
            .into_response())
        }
    }
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    sign_in(&state, jar, form.email.trim(), &form.password).await
}

pub async fn register_page() -> Page {
    render(RegisterTemplate {
        nav: Nav::anonymous(),
        error: None,
    })
}

/// Create the account, then sign in with it.
pub async fn register_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, WebError> {
    let registered = graphql::register(
        &state,
        form.email.trim(),
        form.pseudo.trim(),
        &form.password,
        form.role.as_deref(),
    )
    .await;

    match registered {
        Ok(user) => sign_in(&state, jar, &user.email, &form.password).await,
        Err(err) => {
            let message = form_error(err)?;
            Ok(render(RegisterTemplate {
                nav: Nav::anonymous(),
                error: Some(message),
            })?
            .into_response())
        }
    }
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.remove(expired_cookie()), Redirect::to("/login"))
}

// Dashboard

pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, WebError> {
    let Some(profile) = graphql::fetch_profile(&state, &session.token, &session.user_id()).await?
    else {
        // The account behind the token is gone.
        return Ok(Redirect::to("/logout").into_response());
    };

    let mut grades = if session.is_admin() {
        graphql::fetch_professor_grades(&state, &session.token).await?
    } else {
        graphql::fetch_student_grades(&state, &session.token, &session.user_id()).await?
    };
    let average = average_display(average(&grades));
    grades.reverse();
    grades.truncate(RECENT_GRADES);

    Ok(render(IndexTemplate {
        nav: Nav::from(&session),
        profile,
        recent_grades: grades,
        average,
    })?
    .into_response())
}

// Courses

async fn courses_page(
    state: &AppState,
    session: &Session,
    search: Option<String>,
    error: Option<String>,
) -> Page {
    let courses = graphql::fetch_courses(state, &session.token, search.as_deref()).await?;
    let professors = if session.is_admin() {
        graphql::fetch_users(state, &session.token)
            .await?
            .into_iter()
            .filter(WebUser::is_admin)
            .collect()
    } else {
        Vec::new()
    };

    render(CoursesTemplate {
        nav: Nav::from(session),
        courses,
        search: search.unwrap_or_default(),
        professors,
        error,
    })
}

pub async fn list_courses(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CourseSearch>,
) -> Page {
    let search = non_blank(params.search.as_deref());
    courses_page(&state, &session, search, None).await
}

pub async fn create_course(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CourseForm>,
) -> Result<Response, WebError> {
    require_admin(&session)?;

    let hours = non_blank(form.hours.as_deref())
        .map(|hours| hours.parse::<i32>())
        .transpose()
        .map_err(|_| WebError::BadRequest("Hours must be a whole number".to_string()))?;

    let variables = json!({
        "name": form.name,
        "professorId": non_blank(form.professor_id.as_deref()).unwrap_or_else(|| session.user_id()),
        "description": non_blank(form.description.as_deref()),
        "startDate": non_blank(form.start_date.as_deref()),
        "endDate": form.end_date,
        "hours": hours,
    });

    match graphql::create_course(&state, &session.token, variables).await {
        Ok(course) => {
            info!("{} created course {}", session.claims.email, course.name);
            Ok(Redirect::to(&format!("/courses/{}", course.id)).into_response())
        }
        Err(err) => {
            let message = form_error(err)?;
            Ok(courses_page(&state, &session, None, Some(message))
                .await?
                .into_response())
        }
    }
}

async fn course_page(
    state: &AppState,
    session: &Session,
    course_id: &str,
    error: Option<String>,
) -> Page {
    let course = graphql::fetch_course(state, &session.token, course_id)
        .await?
        .ok_or_else(|| WebError::NotFound("Course not found".to_string()))?;

    let candidates = if session.is_admin() {
        students_only(graphql::fetch_users(state, &session.token).await?)
            .into_iter()
            .filter(|user| !course.has_student(&user.id))
            .collect()
    } else {
        Vec::new()
    };

    render(CourseTemplate {
        nav: Nav::from(session),
        course,
        candidates,
        error,
    })
}

pub async fn show_course(
    State(state): State<AppState>,
    session: Session,
    Path(course_id): Path<String>,
) -> Page {
    course_page(&state, &session, &course_id, None).await
}

pub async fn update_enrollment(
    State(state): State<AppState>,
    session: Session,
    Path(course_id): Path<String>,
    Form(form): Form<EnrollmentForm>,
) -> Result<Response, WebError> {
    require_admin(&session)?;
    let action = match form.action.as_str() {
        "ADD" | "REMOVE" => form.action.as_str(),
        other => {
            return Err(WebError::BadRequest(format!(
                "Unknown enrollment action: {}",
                other
            )))
        }
    };

    let updated =
        graphql::update_course_students(&state, &session.token, &course_id, &form.student_id, action)
            .await;
    match updated {
        Ok(()) => Ok(Redirect::to(&format!("/courses/{}", course_id)).into_response()),
        Err(err) => {
            let message = form_error(err)?;
            Ok(course_page(&state, &session, &course_id, Some(message))
                .await?
                .into_response())
        }
    }
}

pub async fn delete_course(
    State(state): State<AppState>,
    session: Session,
    Path(course_id): Path<String>,
) -> Result<Redirect, WebError> {
    require_admin(&session)?;
    graphql::delete_course(&state, &session.token, &course_id).await?;
    Ok(Redirect::to("/courses"))
}

// Grades

async fn grades_page(state: &AppState, session: &Session, error: Option<String>) -> Page {
    let nav = Nav::from(session);

    if !session.is_admin() {
        let grades =
            graphql::fetch_student_grades(state, &session.token, &session.user_id()).await?;
        return render(GradesTemplate {
            nav,
            average: average_display(average(&grades)),
            grades,
            courses: Vec::new(),
            students: Vec::new(),
            error,
        });
    }

    let grades = graphql::fetch_professor_grades(state, &session.token).await?;
    let courses = graphql::fetch_profile(state, &session.token, &session.user_id())
        .await?
        .map(|profile| profile.taught_courses)
        .unwrap_or_default();
    let students = students_only(graphql::fetch_users(state, &session.token).await?);

    render(GradesTemplate {
        nav,
        average: average_display(average(&grades)),
        grades,
        courses,
        students,
        error,
    })
}

pub async fn list_grades(State(state): State<AppState>, session: Session) -> Page {
    grades_page(&state, &session, None).await
}

pub async fn create_grade(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<GradeForm>,
) -> Result<Response, WebError> {
    require_admin(&session)?;
    let comment = non_blank(form.comment.as_deref());

    let created = graphql::create_grade(
        &state,
        &session.token,
        &form.user_id,
        &form.course_id,
        form.note,
        comment.as_deref(),
    )
    .await;

    match created {
        Ok(()) => Ok(Redirect::to("/grades").into_response()),
        Err(err) => {
            let message = form_error(err)?;
            Ok(grades_page(&state, &session, Some(message))
                .await?
                .into_response())
        }
    }
}

pub async fn update_grade(
    State(state): State<AppState>,
    session: Session,
    Path(grade_id): Path<String>,
    Form(form): Form<GradeUpdateForm>,
) -> Result<Response, WebError> {
    require_admin(&session)?;
    let note = non_blank(form.note.as_deref())
        .map(|note| note.parse::<f64>())
        .transpose()
        .map_err(|_| WebError::BadRequest("Note must be a number".to_string()))?;

    let updated =
        graphql::update_grade(&state, &session.token, &grade_id, note, form.comment.as_deref())
            .await;
    match updated {
        Ok(()) => Ok(Redirect::to("/grades").into_response()),
        Err(err) => {
            let message = form_error(err)?;
            Ok(grades_page(&state, &session, Some(message))
                .await?
                .into_response())
        }
    }
}

pub async fn delete_grade(
    State(state): State<AppState>,
    session: Session,
    Path(grade_id): Path<String>,
) -> Result<Redirect, WebError> {
    require_admin(&session)?;
    graphql::delete_grade(&state, &session.token, &grade_id).await?;
    Ok(Redirect::to("/grades"))
}

// Students

pub async fn list_students(State(state): State<AppState>, session: Session) -> Page {
    require_admin(&session)?;
    let users = graphql::fetch_users(&state, &session.token).await?;
    render(StudentsTemplate {
        nav: Nav::from(&session),
        users,
    })
}

/// Admins see anyone; a student may open their own page.
pub async fn show_student(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<String>,
) -> Page {
    if !session.is_admin() && session.user_id() != user_id {
        return Err(WebError::Forbidden(
            "You can only view your own profile".to_string(),
        ));
    }

    let student = graphql::fetch_profile(&state, &session.token, &user_id)
        .await?
        .ok_or_else(|| WebError::NotFound("User not found".to_string()))?;
    let grades = graphql::fetch_student_grades(&state, &session.token, &user_id).await?;

    render(StudentTemplate {
        nav: Nav::from(&session),
        average: average_display(average(&grades)),
        student,
        grades,
    })
}

// Schedule

pub async fn schedule(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, WebError> {
    let Some(profile) = graphql::fetch_profile(&state, &session.token, &session.user_id()).await?
    else {
        return Ok(Redirect::to("/logout").into_response());
    };

    let mut courses = profile.enrolled_courses;
    courses.extend(profile.taught_courses);
    courses.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(render(ScheduleTemplate {
        nav: Nav::from(&session),
        courses,
    })?
    .into_response())
}

// Settings

pub async fn settings_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, WebError> {
    let Some(profile) = graphql::fetch_profile(&state, &session.token, &session.user_id()).await?
    else {
        return Ok(Redirect::to("/logout").into_response());
    };

    Ok(render(SettingsTemplate {
        nav: Nav::from(&session),
        email: profile.email,
        pseudo: profile.pseudo,
        saved: false,
        error: None,
    })?
    .into_response())
}

pub async fn update_settings(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SettingsForm>,
) -> Page {
    let password = non_blank(form.password.as_deref());
    let updated = graphql::update_user(
        &state,
        &session.token,
        &session.user_id(),
        form.email.trim(),
        form.pseudo.trim(),
        password.as_deref(),
    )
    .await;

    let page = match updated {
        Ok(user) => SettingsTemplate {
            nav: Nav::from(&session),
            email: user.email,
            pseudo: user.pseudo,
            saved: true,
            error: None,
        },
        Err(err) => SettingsTemplate {
            nav: Nav::from(&session),
            email: form.email,
            pseudo: form.pseudo,
            saved: false,
            error: Some(form_error(err)?),
        },
    };
    render(page)
}

pub async fn delete_account(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), WebError> {
    graphql::delete_user(&state, &session.token, &session.user_id()).await?;
    info!("{} deleted their account", session.claims.email);
    Ok((jar.remove(expired_cookie()), Redirect::to("/login")))
}
