use reqwest::Client;

/// GraphQL endpoints of the three back-end services.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub users: String,
    pub courses: String,
    pub grades: String,
}

/// Front end settings, read from the environment.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub endpoints: Endpoints,
    pub port: u16,
    pub log_dir: String,
    pub static_dir: String,
}

impl WebConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Self {
            endpoints: Endpoints {
                users: url("USERS_GRAPHQL_URL", "http://127.0.0.1:8080/graphql"),
                courses: url("COURSES_GRAPHQL_URL", "http://127.0.0.1:8081/graphql"),
                grades: url("GRADES_GRAPHQL_URL", "http://127.0.0.1:8082/graphql"),
            },
            port: lookup("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000),
            log_dir: url("SCHOOL_LOG_DIR", "logs"),
            static_dir: url(
                "STATIC_DIR",
                concat!(env!("CARGO_MANIFEST_DIR"), "/static"),
            ),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub graphql_client: Client,
    pub endpoints: Endpoints,
}

impl AppState {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            graphql_client: Client::new(),
            endpoints,
        }
    }
}
