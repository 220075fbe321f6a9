// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod session;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use missions_api::{
    AddToGroupRequest, ApiError, AuthenticationService, BootstrapStatusResponse,
    BootstrapSuperuserRequest, CreateDivisionRequest, CreateUserRequest, CreatedResponse,
    DeletedResponse, EmployeeForm, FieldCipher, FieldErrors, GenerateReportForm,
    GrantPermissionRequest, IndexResponse, ListAuditEventsResponse, ListDivisionsResponse,
    ListEmployeesResponse, ListUsersResponse, LoginFormResponse, LoginRequest, LogoutResponse,
    MissionDetailsResponse, MissionForm, MissionFormResponse, MissionReportDetailsResponse,
    SetActiveRequest, UpdatedResponse, UserInfo, dev_field_key, parse_field_key,
};
use missions_persistence::SqlitePersistence;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use session::{SessionPrincipal, cleared_session_cookie, request_cause, session_cookie};

/// Mission Tracker Server - HTTP server for the Mission Tracker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "MISSIONS_DATABASE")]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Hex-encoded 32-byte key for sealing social security numbers.
    /// A development key is derived when absent.
    #[arg(long, env = "MISSIONS_FIELD_KEY", hide_env_values = true)]
    field_key: Option<String>,
}

/// Application state shared across handlers.
///
/// This contains the persistence layer wrapped in a Mutex to allow
/// safe concurrent access.
#[derive(Clone)]
pub struct AppState {
    /// The persistence layer.
    persistence: Arc<Mutex<SqlitePersistence>>,
    /// Seals and opens employee social security numbers.
    cipher: FieldCipher,
}

/// Query parameters for the login form.
#[derive(Debug, Deserialize)]
struct LoginFormQuery {
    /// Where a successful login leads.
    next: Option<String>,
}

/// Query parameters for the audit listing.
#[derive(Debug, Deserialize)]
struct AuditQuery {
    /// Maximum number of events to return.
    limit: Option<i64>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
    /// Field errors of a rejected form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
    /// Field errors of a rejected form.
    errors: Option<FieldErrors>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
            errors: self.errors,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let message: String = err.to_string();
        let (status, errors): (StatusCode, Option<FieldErrors>) = match err {
            ApiError::AuthenticationFailed { .. } => (StatusCode::UNAUTHORIZED, None),
            ApiError::Unauthorized { .. } => (StatusCode::FORBIDDEN, None),
            ApiError::ResourceNotFound { .. } => (StatusCode::NOT_FOUND, None),
            ApiError::DomainRuleViolation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, None),
            ApiError::InvalidInput { .. } | ApiError::PasswordPolicyViolation { .. } => {
                (StatusCode::BAD_REQUEST, None)
            }
            ApiError::InvalidForm { errors } => (StatusCode::BAD_REQUEST, Some(errors)),
            ApiError::Internal { .. } => {
                error!(error = %message, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };
        Self {
            status,
            message,
            errors,
        }
    }
}

/// Builds a `201 Created` response pointing at the new record.
fn created(response: CreatedResponse) -> Response {
    match HeaderValue::from_str(&response.location) {
        Ok(location) => (
            StatusCode::CREATED,
            [(header::LOCATION, location)],
            Json(response),
        )
            .into_response(),
        Err(_) => (StatusCode::CREATED, Json(response)).into_response(),
    }
}

/// Builds a response that sets or clears the session cookie.
fn with_cookie<T: Serialize>(cookie: &str, body: T) -> Result<Response, HttpError> {
    let value: HeaderValue = HeaderValue::from_str(cookie).map_err(|e| HttpError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("Invalid cookie value: {e}"),
        errors: None,
    })?;
    Ok((StatusCode::OK, [(header::SET_COOKIE, value)], Json(body)).into_response())
}

/// Handler for GET `/health` endpoint.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
    })
}

/// Handler for GET `/login` endpoint.
///
/// Describes the form and echoes the `next` path the session redirect
/// carried.
async fn handle_login_form(Query(query): Query<LoginFormQuery>) -> Json<LoginFormResponse> {
    Json(missions_api::login_form(query.next.as_deref()))
}

/// Handler for POST `/login` endpoint.
///
/// Returns the session token and sets the `sessionid` cookie.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response = missions_api::login(
        &mut persistence,
        &req,
        request_cause(&Method::POST, "/login"),
    )?;
    drop(persistence);

    let cookie: String = session_cookie(
        &response.session_token,
        AuthenticationService::SESSION_EXPIRATION.whole_seconds(),
    );
    with_cookie(&cookie, response)
}

/// Handler for POST `/logout` endpoint.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<Response, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: LogoutResponse = missions_api::logout(
        &mut persistence,
        &session.token,
        &session.principal,
        session.cause,
    )?;
    drop(persistence);

    with_cookie(&cleared_session_cookie(), response)
}

/// Handler for GET `/bootstrap/status` endpoint.
async fn handle_bootstrap_status(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<BootstrapStatusResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::check_bootstrap_status(&mut persistence)?))
}

/// Handler for POST `/bootstrap/superuser` endpoint.
async fn handle_bootstrap_superuser(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BootstrapSuperuserRequest>,
) -> Result<Response, HttpError> {
    info!(username = %req.username, "Handling bootstrap_superuser request");

    let mut persistence = app_state.persistence.lock().await;
    let response = missions_api::bootstrap_superuser(
        &mut persistence,
        &req,
        request_cause(&Method::POST, "/bootstrap/superuser"),
    )?;
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handler for GET `/` endpoint.
async fn handle_index(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<Json<IndexResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::index(
        &mut persistence,
        &session.principal,
    )?))
}

/// Handler for GET `/mission/create` endpoint.
async fn handle_mission_create_form(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<Json<MissionFormResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::mission_create_form(
        &mut persistence,
        &session.principal,
    )?))
}

/// Handler for POST `/mission/create` endpoint.
async fn handle_mission_create(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Json(form): Json<MissionForm>,
) -> Result<Response, HttpError> {
    info!(
        username = %session.principal.username,
        name = %form.name,
        "Handling mission_create request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response = missions_api::mission_create(
        &mut persistence,
        &session.principal,
        &form,
        session.cause,
    )?;
    Ok(created(response))
}

/// Handler for GET `/mission/{id}` endpoint.
async fn handle_mission_details(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(mission_id): Path<i64>,
) -> Result<Json<MissionDetailsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::mission_details(
        &mut persistence,
        &session.principal,
        mission_id,
    )?))
}

/// Handler for GET `/mission/{id}/update` endpoint.
async fn handle_mission_update_form(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(mission_id): Path<i64>,
) -> Result<Json<MissionFormResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::mission_update_form(
        &mut persistence,
        &session.principal,
        mission_id,
    )?))
}

/// Handler for POST `/mission/{id}/update` endpoint.
async fn handle_mission_update(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(mission_id): Path<i64>,
    Json(form): Json<MissionForm>,
) -> Result<Json<UpdatedResponse>, HttpError> {
    info!(
        username = %session.principal.username,
        mission_id,
        "Handling mission_update request"
    );

    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::mission_update(
        &mut persistence,
        &session.principal,
        mission_id,
        &form,
        session.cause,
    )?))
}

/// Handler for POST `/mission/{id}/delete` and DELETE `/mission/{id}`.
async fn handle_mission_delete(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(mission_id): Path<i64>,
) -> Result<Json<DeletedResponse>, HttpError> {
    info!(
        username = %session.principal.username,
        mission_id,
        "Handling mission_delete request"
    );

    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::mission_delete(
        &mut persistence,
        &session.principal,
        mission_id,
        session.cause,
    )?))
}

/// Handler for GET `/mission/{id}/delete` endpoint.
///
/// Deleting needs POST or DELETE. The session and permission are checked
/// first, so anonymous callers are sent to log in and unauthorized ones
/// get 403 rather than a method hint.
async fn handle_mission_delete_get(
    session: SessionPrincipal,
    Path(mission_id): Path<i64>,
) -> Result<Response, HttpError> {
    missions_api::authorize_mission_delete(&session.principal)?;

    warn!(
        username = %session.principal.username,
        mission_id,
        "Refusing to delete a mission via GET"
    );

    let body: Json<ErrorResponse> = Json(ErrorResponse {
        error: true,
        message: String::from("Missions are deleted with POST or DELETE"),
        errors: None,
    });
    Ok((
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, DELETE")],
        body,
    )
        .into_response())
}

/// Handler for GET `/mission/{id}/generate-report` endpoint.
///
/// Reports are only generated by POST; once the session and permission
/// checks pass, the caller is sent back to the index.
async fn handle_mission_report_generate_get(
    session: SessionPrincipal,
    Path(_mission_id): Path<i64>,
) -> Result<Response, HttpError> {
    missions_api::authorize_report_generate(&session.principal)?;
    Ok((StatusCode::FOUND, [(header::LOCATION, "/")]).into_response())
}

/// Handler for POST `/mission/{id}/generate-report` endpoint.
async fn handle_mission_report_generate(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(mission_id): Path<i64>,
    Json(form): Json<GenerateReportForm>,
) -> Result<Response, HttpError> {
    info!(
        username = %session.principal.username,
        mission_id,
        "Handling mission_report_generate request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response = missions_api::mission_report_generate(
        &mut persistence,
        &session.principal,
        mission_id,
        &form,
        session.cause,
    )?;
    Ok(created(response))
}

/// Handler for GET `/mission-report/{id}` endpoint.
async fn handle_mission_report_details(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(report_id): Path<i64>,
) -> Result<Json<MissionReportDetailsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::mission_report_details(
        &mut persistence,
        &session.principal,
        report_id,
    )?))
}

/// Handler for POST `/mission-report/{id}/delete` endpoint.
async fn handle_mission_report_delete(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(report_id): Path<i64>,
) -> Result<Json<DeletedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::mission_report_delete(
        &mut persistence,
        &session.principal,
        report_id,
        session.cause,
    )?))
}

/// Handler for GET `/directory/users` endpoint.
async fn handle_list_users(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<Json<ListUsersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::list_users(
        &mut persistence,
        &session.principal,
    )?))
}

/// Handler for POST `/directory/users` endpoint.
async fn handle_create_user(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Json(req): Json<CreateUserRequest>,
) -> Result<Response, HttpError> {
    info!(
        username = %session.principal.username,
        new_username = %req.username,
        "Handling create_user request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let user: UserInfo = missions_api::create_user(
        &mut persistence,
        &session.principal,
        &req,
        session.cause,
    )?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// Handler for POST `/directory/users/{id}/groups` endpoint.
async fn handle_add_user_to_group(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(user_id): Path<i64>,
    Json(req): Json<AddToGroupRequest>,
) -> Result<Json<UserInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::add_user_to_group(
        &mut persistence,
        &session.principal,
        user_id,
        &req,
        session.cause,
    )?))
}

/// Handler for POST `/directory/users/{id}/permissions` endpoint.
async fn handle_grant_user_permission(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(user_id): Path<i64>,
    Json(req): Json<GrantPermissionRequest>,
) -> Result<Json<UserInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::grant_user_permission(
        &mut persistence,
        &session.principal,
        user_id,
        &req,
        session.cause,
    )?))
}

/// Handler for POST `/directory/users/{id}/active` endpoint.
async fn handle_set_user_active(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(user_id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<UserInfo>, HttpError> {
    info!(
        username = %session.principal.username,
        user_id,
        is_active = req.is_active,
        "Handling set_user_active request"
    );

    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::set_user_active(
        &mut persistence,
        &session.principal,
        user_id,
        &req,
        session.cause,
    )?))
}

/// Handler for GET `/directory/divisions` endpoint.
async fn handle_list_divisions(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<Json<ListDivisionsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::list_divisions(
        &mut persistence,
        &session.principal,
    )?))
}

/// Handler for POST `/directory/divisions` endpoint.
async fn handle_create_division(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Json(req): Json<CreateDivisionRequest>,
) -> Result<Response, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response = missions_api::create_division(
        &mut persistence,
        &session.principal,
        &req,
        session.cause,
    )?;
    Ok(created(response))
}

/// Handler for POST `/directory/divisions/{id}/delete` endpoint.
async fn handle_delete_division(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(division_id): Path<i64>,
) -> Result<Json<DeletedResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::delete_division(
        &mut persistence,
        &session.principal,
        division_id,
        session.cause,
    )?))
}

/// Handler for GET `/directory/employees` endpoint.
async fn handle_list_employees(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<Json<ListEmployeesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::list_employees(
        &mut persistence,
        &session.principal,
        &app_state.cipher,
    )?))
}

/// Handler for POST `/directory/employees` endpoint.
async fn handle_create_employee(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Json(form): Json<EmployeeForm>,
) -> Result<Response, HttpError> {
    info!(
        username = %session.principal.username,
        user_id = form.user_id,
        "Handling create_employee request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response = missions_api::create_employee(
        &mut persistence,
        &session.principal,
        &app_state.cipher,
        &form,
        session.cause,
    )?;
    Ok(created(response))
}

/// Handler for POST `/directory/employees/{id}/delete` endpoint.
async fn handle_delete_employee(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(employee_id): Path<i64>,
) -> Result<Json<DeletedResponse>, HttpError> {
    info!(
        username = %session.principal.username,
        employee_id,
        "Handling delete_employee request"
    );

    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::delete_employee(
        &mut persistence,
        &session.principal,
        employee_id,
        session.cause,
    )?))
}

/// Handler for GET `/audit` endpoint.
async fn handle_list_audit_events(
    AxumState(app_state): AxumState<AppState>,
    session: SessionPrincipal,
    Query(query): Query<AuditQuery>,
) -> Result<Json<ListAuditEventsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(missions_api::list_audit_events(
        &mut persistence,
        &session.principal,
        query.limit,
    )?))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/login", get(handle_login_form).post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/bootstrap/status", get(handle_bootstrap_status))
        .route("/bootstrap/superuser", post(handle_bootstrap_superuser))
        .route("/", get(handle_index))
        .route(
            "/mission/create",
            get(handle_mission_create_form).post(handle_mission_create),
        )
        .route(
            "/mission/{id}",
            get(handle_mission_details).delete(handle_mission_delete),
        )
        .route(
            "/mission/{id}/update",
            get(handle_mission_update_form).post(handle_mission_update),
        )
        .route(
            "/mission/{id}/delete",
            get(handle_mission_delete_get).post(handle_mission_delete),
        )
        .route(
            "/mission/{id}/generate-report",
            get(handle_mission_report_generate_get).post(handle_mission_report_generate),
        )
        .route("/mission-report/{id}", get(handle_mission_report_details))
        .route(
            "/mission-report/{id}/delete",
            post(handle_mission_report_delete),
        )
        .route(
            "/directory/users",
            get(handle_list_users).post(handle_create_user),
        )
        .route(
            "/directory/users/{id}/groups",
            post(handle_add_user_to_group),
        )
        .route(
            "/directory/users/{id}/permissions",
            post(handle_grant_user_permission),
        )
        .route("/directory/users/{id}/active", post(handle_set_user_active))
        .route(
            "/directory/divisions",
            get(handle_list_divisions).post(handle_create_division),
        )
        .route(
            "/directory/divisions/{id}/delete",
            post(handle_delete_division),
        )
        .route(
            "/directory/employees",
            get(handle_list_employees).post(handle_create_employee),
        )
        .route(
            "/directory/employees/{id}/delete",
            post(handle_delete_employee),
        )
        .route("/audit", get(handle_list_audit_events))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Mission Tracker Server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let mut persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };

    let expired: usize = persistence.delete_expired_sessions(OffsetDateTime::now_utc())?;
    if expired > 0 {
        info!(expired, "Removed expired sessions");
    }

    if persistence.count_users()? == 0 {
        warn!("No accounts exist; create the first superuser via POST /bootstrap/superuser");
    }

    let field_key: [u8; 32] = if let Some(hex_key) = &args.field_key {
        parse_field_key(hex_key)?
    } else {
        warn!("No field key configured; using the development key");
        dev_field_key()
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        cipher: FieldCipher::new(field_key),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests;
