use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use school_core::auth::{peek_claims, Claims};
use school_core::Role;

pub const JWT_COOKIE: &str = "JWT";
const COOKIE_MAX_AGE_SECONDS: i64 = 24 * 60 * 60;

/// The signed-in user as read from the `JWT` cookie.
///
/// The claims are only used to pick what to render; every service call
/// forwards the token and the service verifies it.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub claims: Claims,
}

impl Session {
    pub fn from_jar(jar: &CookieJar) -> Option<Self> {
        let token = jar.get(JWT_COOKIE)?.value().to_string();
        let claims = peek_claims(&token).ok()?;
        if claims.exp <= Utc::now().timestamp() {
            return None;
        }
        Some(Self { token, claims })
    }

    pub fn user_id(&self) -> String {
        self.claims.id.to_string()
    }

    pub fn is_admin(&self) -> bool {
        self.claims.role == Role::Admin
    }
}

/// Pages behind a session send anonymous visitors to the login form.
#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Session::from_jar(&jar).ok_or_else(|| Redirect::to("/login"))
    }
}

pub fn session_cookie(token: &str) -> Result<Cookie<'static>, String> {
    Cookie::parse(format!(
        "{JWT_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={COOKIE_MAX_AGE_SECONDS}"
    ))
    .map_err(|e| format!("Invalid session cookie: {e}"))
}

pub fn expired_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::named(JWT_COOKIE);
    cookie.set_path("/");
    cookie
}
