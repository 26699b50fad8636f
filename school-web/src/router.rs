use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::state::AppState;

pub fn app_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/login", get(handlers::login_page).post(handlers::login_submit))
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register_submit),
        )
        .route("/logout", get(handlers::logout))
        .route(
            "/courses",
            get(handlers::list_courses).post(handlers::create_course),
        )
        .route("/courses/:id", get(handlers::show_course))
        .route("/courses/:id/students", post(handlers::update_enrollment))
        .route("/courses/:id/delete", post(handlers::delete_course))
        .route(
            "/grades",
            get(handlers::list_grades).post(handlers::create_grade),
        )
        .route("/grades/:id", post(handlers::update_grade))
        .route("/grades/:id/delete", post(handlers::delete_grade))
        .route("/students", get(handlers::list_students))
        .route("/students/:id", get(handlers::show_student))
        .route("/schedule", get(handlers::schedule))
        .route(
            "/settings",
            get(handlers::settings_page).post(handlers::update_settings),
        )
        .route("/settings/delete", post(handlers::delete_account))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}
