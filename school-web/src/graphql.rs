use crate::error::WebError;
use crate::models::{
    AuthPayload, GraphQLError, GraphQLRequest, WebCourse, WebGrade, WebProfile, WebUser,
};
use crate::state::AppState;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Deserialize)]
struct GqlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Copy)]
pub enum Service {
    Users,
    Courses,
    Grades,
}

impl Service {
    fn url(self, state: &AppState) -> &str {
        match self {
            Service::Users => &state.endpoints.users,
            Service::Courses => &state.endpoints.courses,
            Service::Grades => &state.endpoints.grades,
        }
    }
}

const COURSE_FIELDS: &str = "id name description startDate endDate hours professor { id pseudo }";
const PROFILE_FIELDS: &str = "id email pseudo role \
    enrolledCourses { id name description startDate endDate hours professor { id pseudo } } \
    taughtCourses { id name description startDate endDate hours professor { id pseudo } }";
const GRADE_FIELDS: &str =
    "id note comment createdAt course { id name } student { id pseudo email }";

/// Send one GraphQL operation, forwarding the session token if any.
///
/// GraphQL errors come back as [`WebError::GraphQL`] carrying the service's
/// messages.
pub async fn execute<T: DeserializeOwned>(
    state: &AppState,
    service: Service,
    token: Option<&str>,
    query: &str,
    variables: Value,
) -> Result<T, WebError> {
    let request = GraphQLRequest { query, variables };

    let mut builder = state.graphql_client.post(service.url(state)).json(&request);
    if let Some(token) = token {
        builder = builder.bearer_auth(token);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| WebError::Upstream(format!("Request to {:?} failed: {}", service, e)))?;

    let response_text = response
        .text()
        .await
        .map_err(|e| WebError::Upstream(format!("Failed to get response text: {}", e)))?;
    debug!("{:?} service answered: {}", service, response_text);

    let parsed: GqlResponse<T> = serde_json::from_str(&response_text).map_err(|e| {
        WebError::Upstream(format!(
            "Failed to parse GraphQL response: {} - Response: {}",
            e, response_text
        ))
    })?;

    if let Some(errors) = parsed.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(WebError::GraphQL(messages.join("; ")));
    }

    parsed
        .data
        .ok_or_else(|| WebError::Upstream(format!("No data in response - Response: {}", response_text)))
}

/// Pull a single top-level field out of a response.
async fn field<T: DeserializeOwned>(
    state: &AppState,
    service: Service,
    token: Option<&str>,
    name: &str,
    query: &str,
    variables: Value,
) -> Result<T, WebError> {
    let mut data: serde_json::Map<String, Value> =
        execute(state, service, token, query, variables).await?;
    let value = data.remove(name).unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| WebError::Upstream(format!("Unexpected shape for {}: {}", name, e)))
}

// Users service

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<AuthPayload, WebError> {
    let query = "mutation($email: String!, $password: String!) { \
        login(email: $email, password: $password) { token user { id email pseudo role } } }";
    field(state, Service::Users, None, "login", query, json!({ "email": email, "password": password })).await
}

pub async fn register(
    state: &AppState,
    email: &str,
    pseudo: &str,
    password: &str,
    role: Option<&str>,
) -> Result<WebUser, WebError> {
    let query = "mutation($email: String!, $pseudo: String!, $password: String!, $role: String) { \
        register(email: $email, pseudo: $pseudo, password: $password, role: $role) { id email pseudo role } }";
    let variables = json!({ "email": email, "pseudo": pseudo, "password": password, "role": role });
    field(state, Service::Users, None, "register", query, variables).await
}

pub async fn fetch_users(state: &AppState, token: &str) -> Result<Vec<WebUser>, WebError> {
    let query = "query { getAllUsers { id email pseudo role } }";
    field(state, Service::Users, Some(token), "getAllUsers", query, json!({})).await
}

pub async fn fetch_profile(
    state: &AppState,
    token: &str,
    user_id: &str,
) -> Result<Option<WebProfile>, WebError> {
    let query = format!("query($id: String!) {{ getUserById(id: $id) {{ {PROFILE_FIELDS} }} }}");
    field(state, Service::Users, Some(token), "getUserById", &query, json!({ "id": user_id })).await
}

pub async fn update_user(
    state: &AppState,
    token: &str,
    user_id: &str,
    email: &str,
    pseudo: &str,
    password: Option<&str>,
) -> Result<WebUser, WebError> {
    let query = "mutation($id: String!, $email: String, $pseudo: String, $password: String) { \
        updateUser(id: $id, email: $email, pseudo: $pseudo, password: $password) { id email pseudo role } }";
    let variables = json!({ "id": user_id, "email": email, "pseudo": pseudo, "password": password });
    field(state, Service::Users, Some(token), "updateUser", query, variables).await
}

pub async fn delete_user(state: &AppState, token: &str, user_id: &str) -> Result<WebUser, WebError> {
    let query = "mutation($id: String!) { deleteUser(id: $id) { id email pseudo role } }";
    field(state, Service::Users, Some(token), "deleteUser", query, json!({ "id": user_id })).await
}

// Courses service

pub async fn fetch_courses(
    state: &AppState,
    token: &str,
    search: Option<&str>,
) -> Result<Vec<WebCourse>, WebError> {
    match search {
        Some(name) => {
            let query = format!(
                "query($name: String!) {{ getCoursesByNameLike(name: $name) {{ {COURSE_FIELDS} }} }}"
            );
            field(state, Service::Courses, Some(token), "getCoursesByNameLike", &query, json!({ "name": name })).await
        }
        None => {
            let query = format!("query {{ getAllCourses {{ {COURSE_FIELDS} }} }}");
            field(state, Service::Courses, Some(token), "getAllCourses", &query, json!({})).await
        }
    }
}

pub async fn fetch_course(
    state: &AppState,
    token: &str,
    course_id: &str,
) -> Result<Option<WebCourse>, WebError> {
    let query = format!(
        "query($id: String!) {{ getCourseById(id: $id) {{ {COURSE_FIELDS} students {{ id email pseudo role }} }} }}"
    );
    field(state, Service::Courses, Some(token), "getCourseById", &query, json!({ "id": course_id })).await
}

pub async fn create_course(
    state: &AppState,
    token: &str,
    variables: Value,
) -> Result<WebCourse, WebError> {
    let query = format!(
        "mutation($name: String!, $professorId: String!, $description: String, $startDate: String, $endDate: String!, $hours: Int) {{ \
         createCourse(name: $name, professorId: $professorId, description: $description, startDate: $startDate, endDate: $endDate, hours: $hours) {{ {COURSE_FIELDS} }} }}"
    );
    field(state, Service::Courses, Some(token), "createCourse", &query, variables).await
}

pub async fn update_course_students(
    state: &AppState,
    token: &str,
    course_id: &str,
    student_id: &str,
    action: &str,
) -> Result<(), WebError> {
    let query = "mutation($courseId: String!, $studentId: String!, $action: ActionType!) { \
        updateCourseStudents(courseId: $courseId, studentId: $studentId, action: $action) { id } }";
    let variables = json!({ "courseId": course_id, "studentId": student_id, "action": action });
    let _: Value = field(state, Service::Courses, Some(token), "updateCourseStudents", query, variables).await?;
    Ok(())
}

pub async fn delete_course(state: &AppState, token: &str, course_id: &str) -> Result<(), WebError> {
    let query = "mutation($id: String!) { deleteCourse(id: $id) { id } }";
    let _: Value = field(state, Service::Courses, Some(token), "deleteCourse", query, json!({ "id": course_id })).await?;
    Ok(())
}

// Grades service

pub async fn fetch_student_grades(
    state: &AppState,
    token: &str,
    user_id: &str,
) -> Result<Vec<WebGrade>, WebError> {
    let query = format!("query($userId: String!) {{ getGradesForStudent(userId: $userId) {{ {GRADE_FIELDS} }} }}");
    field(state, Service::Grades, Some(token), "getGradesForStudent", &query, json!({ "userId": user_id })).await
}

pub async fn fetch_professor_grades(state: &AppState, token: &str) -> Result<Vec<WebGrade>, WebError> {
    let query = format!("query {{ getGradesForProfessor {{ {GRADE_FIELDS} }} }}");
    field(state, Service::Grades, Some(token), "getGradesForProfessor", &query, json!({})).await
}

pub async fn create_grade(
    state: &AppState,
    token: &str,
    user_id: &str,
    course_id: &str,
    note: f64,
    comment: Option<&str>,
) -> Result<(), WebError> {
    let query = "mutation($userId: String!, $courseId: String!, $note: Float!, $comment: String) { \
        createGrade(userId: $userId, courseId: $courseId, note: $note, comment: $comment) { id } }";
    let variables = json!({ "userId": user_id, "courseId": course_id, "note": note, "comment": comment });
    let _: Value = field(state, Service::Grades, Some(token), "createGrade", query, variables).await?;
    Ok(())
}

pub async fn update_grade(
    state: &AppState,
    token: &str,
    grade_id: &str,
    note: Option<f64>,
    comment: Option<&str>,
) -> Result<(), WebError> {
    let query = "mutation($gradeId: String!, $note: Float, $comment: String) { \
        updateGrade(gradeId: $gradeId, note: $note, comment: $comment) { id } }";
    let variables = json!({ "gradeId": grade_id, "note": note, "comment": comment });
    let _: Value = field(state, Service::Grades, Some(token), "updateGrade", query, variables).await?;
    Ok(())
}

pub async fn delete_grade(state: &AppState, token: &str, grade_id: &str) -> Result<(), WebError> {
    let query = "mutation($gradeId: String!) { deleteGrade(gradeId: $gradeId) { id } }";
    let _: Value = field(state, Service::Grades, Some(token), "deleteGrade", query, json!({ "gradeId": grade_id })).await?;
    Ok(())
}
