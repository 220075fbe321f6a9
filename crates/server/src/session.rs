// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session extraction and the login-required gate.
//!
//! Every route that takes a [`SessionPrincipal`] requires a valid session.
//! Requests without one are redirected to the login page.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use missions_api::{AuthenticationService, Principal};
use missions_audit::Cause;
use tracing::{debug, warn};

use crate::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sessionid";

/// Extractor for authenticated requests.
///
/// The session token is read from `Authorization: Bearer <token>` or, when
/// that header is absent, from the `sessionid` cookie.
///
/// # Usage
///
/// ```ignore
/// async fn my_handler(
///     AxumState(app_state): AxumState<AppState>,
///     session: SessionPrincipal,
/// ) -> Result<Json<Response>, HttpError> {
///     // session.principal: Principal
///     Ok(Json(Response { ... }))
/// }
/// ```
///
/// # Errors
///
/// Rejects with a `302 Found` redirect to `/login?next=<path>` when the
/// token is missing, unknown or expired, or the account is inactive.
pub struct SessionPrincipal {
    /// The resolved principal.
    pub principal: Principal,
    /// The session token the request carried.
    pub token: String,
    /// The cause recorded on audit events for this request.
    pub cause: Cause,
}

impl FromRequestParts<AppState> for SessionPrincipal {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let next: String = parts
            .uri
            .path_and_query()
            .map_or_else(|| String::from("/"), |pq| pq.as_str().to_string());

        let token: String = session_token(&parts.headers).ok_or_else(|| {
            debug!(path = %parts.uri.path(), "Request carries no session");
            SessionError::MissingSession { next: next.clone() }
        })?;

        let mut persistence = state.persistence.lock().await;
        let principal: Principal = AuthenticationService::validate_session(&mut persistence, &token)
            .map_err(|e| {
                warn!(error = %e, "Session validation failed");
                SessionError::InvalidSession { next }
            })?;

        debug!(
            username = %principal.username,
            is_superuser = principal.is_superuser,
            "Session validated successfully"
        );

        Ok(Self {
            principal,
            token,
            cause: request_cause(&parts.method, parts.uri.path()),
        })
    }
}

/// Session extraction errors.
///
/// Both variants turn into the same redirect; they differ only in what is
/// logged.
#[derive(Debug)]
pub enum SessionError {
    /// No token was sent.
    MissingSession { next: String },
    /// The token was rejected.
    InvalidSession { next: String },
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (Self::MissingSession { next } | Self::InvalidSession { next }) = self;
        let location: String = login_location(&next);

        match HeaderValue::from_str(&location) {
            Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
            Err(_) => (
                StatusCode::FOUND,
                [(header::LOCATION, HeaderValue::from_static("/login"))],
            )
                .into_response(),
        }
    }
}

/// Builds the cause recorded for a request.
pub fn request_cause(method: &Method, path: &str) -> Cause {
    Cause::new(String::from("http-request"), format!("{method} {path}"))
}

/// Reads the session token from the request headers.
fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(bearer.trim().to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })
}

/// Returns the login URL that leads back to `next`.
///
/// The value is form-encoded with path separators left readable.
pub fn login_location(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes())
        .collect::<String>()
        .replace("%2F", "/");
    format!("/login?next={encoded}")
}

/// Builds the `Set-Cookie` value carrying a new session token.
pub fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_seconds}")
}

/// Builds the `Set-Cookie` value that clears the session cookie.
pub fn cleared_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}
