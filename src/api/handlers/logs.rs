//! Central log store handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::LOG_TAG;
use crate::api::dto::{
    CleanupQuery, CleanupResponse, CreateLogRequest, DateRangeQuery, ErrorResponse,
    LogCountQuery, LogCountResponse, LogEntryResponse, LogSearchQuery, LogStatResponse,
    LogSummaryResponse,
};
use crate::api::middleware::ClientMeta;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{LogEntry, LogLevel, ServiceName};
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

/// # Routes
/// - `GET /services`, `GET /levels` - Public
/// - `POST /`, `GET /search`, `GET /my-logs` - Any caller
/// - Everything else - Admin
pub fn log_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_logs, create_log))
        .routes(routes!(search_logs))
        .routes(routes!(my_logs))
        .routes(routes!(logs_by_service))
        .routes(routes!(logs_by_level))
        .routes(routes!(log_summary))
        .routes(routes!(log_stats))
        .routes(routes!(log_count))
        .routes(routes!(cleanup_logs))
        .routes(routes!(list_services))
        .routes(routes!(list_levels))
        .routes(routes!(get_log))
}

fn to_responses(entries: Vec<LogEntry>) -> Vec<LogEntryResponse> {
    entries.into_iter().map(LogEntryResponse::from).collect()
}

/// GET /api/logs - Newest first, at most 1000
#[utoipa::path(
    get,
    path = "/",
    tag = LOG_TAG,
    responses(
        (status = 200, description = "Latest log entries", body = Vec<LogEntryResponse>),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn list_logs(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<LogEntryResponse>>> {
    caller.require_admin()?;
    let entries = state.services.logs.list().await?;
    Ok(Json(to_responses(entries)))
}

/// GET /api/logs/search - Non-admins only see their own entries
#[utoipa::path(
    get,
    path = "/search",
    tag = LOG_TAG,
    params(LogSearchQuery),
    responses(
        (status = 200, description = "One page of matching entries", body = Vec<LogEntryResponse>),
        (status = 400, description = "Unknown service or level", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn search_logs(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedQuery(query): ValidatedQuery<LogSearchQuery>,
) -> AppResult<Json<Vec<LogEntryResponse>>> {
    let (filter, page, page_size) = query.into_filter()?;
    let entries = state
        .services
        .logs
        .search(&caller, filter, page, page_size)
        .await?;
    Ok(Json(to_responses(entries)))
}

/// GET /api/logs/{id}
#[utoipa::path(
    get,
    path = "/{id}",
    tag = LOG_TAG,
    params(("id" = i32, Path, description = "Log entry ID")),
    responses(
        (status = 200, description = "Log entry found", body = LogEntryResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Log entry not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn get_log(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LogEntryResponse>> {
    caller.require_admin()?;
    let entry = state.services.logs.get(id).await?;
    Ok(Json(LogEntryResponse::from(entry)))
}

/// GET /api/logs/service/{service} - At most 500
#[utoipa::path(
    get,
    path = "/service/{service}",
    tag = LOG_TAG,
    params(("service" = String, Path, description = "Service name, e.g. PaymentsService")),
    responses(
        (status = 200, description = "Entries from the service", body = Vec<LogEntryResponse>),
        (status = 400, description = "Unknown service", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn logs_by_service(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(service): Path<String>,
) -> AppResult<Json<Vec<LogEntryResponse>>> {
    caller.require_admin()?;
    let entries = state.services.logs.by_service(&service).await?;
    Ok(Json(to_responses(entries)))
}

/// GET /api/logs/level/{level} - At most 500, level is case-insensitive
#[utoipa::path(
    get,
    path = "/level/{level}",
    tag = LOG_TAG,
    params(("level" = String, Path, description = "Level name, e.g. ERROR")),
    responses(
        (status = 200, description = "Entries at the level", body = Vec<LogEntryResponse>),
        (status = 400, description = "Unknown level", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn logs_by_level(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(level): Path<String>,
) -> AppResult<Json<Vec<LogEntryResponse>>> {
    caller.require_admin()?;
    let entries = state.services.logs.by_level(&level).await?;
    Ok(Json(to_responses(entries)))
}

/// GET /api/logs/my-logs - At most 500
#[utoipa::path(
    get,
    path = "/my-logs",
    tag = LOG_TAG,
    responses((status = 200, description = "Entries attributed to the caller", body = Vec<LogEntryResponse>)),
    security(("bearerAuth" = []))
)]
async fn my_logs(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<LogEntryResponse>>> {
    let entries = state.services.logs.my_logs(&caller).await?;
    Ok(Json(to_responses(entries)))
}

/// POST /api/logs
///
/// Request id, client address and user agent default to those of the HTTP
/// request when the body leaves them out.
#[utoipa::path(
    post,
    path = "/",
    tag = LOG_TAG,
    request_body = CreateLogRequest,
    responses(
        (status = 201, description = "Log entry stored", body = LogEntryResponse),
        (status = 400, description = "Invalid service, level or field length", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn create_log(
    State(state): State<AppState>,
    caller: AuthUser,
    meta: ClientMeta,
    ValidatedJson(payload): ValidatedJson<CreateLogRequest>,
) -> AppResult<(StatusCode, Json<LogEntryResponse>)> {
    let mut draft = payload.into_draft();
    draft.request_id = draft.request_id.or(meta.request_id);
    draft.ip_address = draft.ip_address.or(meta.ip_address);
    draft.user_agent = draft.user_agent.or(meta.user_agent);

    let entry = state.services.logs.create(&caller, draft).await?;
    Ok((StatusCode::CREATED, Json(LogEntryResponse::from(entry))))
}

/// GET /api/logs/summary - Defaults to the last 7 days
#[utoipa::path(
    get,
    path = "/summary",
    tag = LOG_TAG,
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Totals by service and level", body = LogSummaryResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn log_summary(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> AppResult<Json<LogSummaryResponse>> {
    caller.require_admin()?;
    let summary = state
        .services
        .logs
        .summary(range.from_date, range.to_date)
        .await?;
    Ok(Json(LogSummaryResponse::from(summary)))
}

/// GET /api/logs/stats - Defaults to the last 30 days
#[utoipa::path(
    get,
    path = "/stats",
    tag = LOG_TAG,
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Counts per day, service and level", body = Vec<LogStatResponse>),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn log_stats(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<LogStatResponse>>> {
    caller.require_admin()?;
    let stats = state.services.logs.stats(range.from_date, range.to_date).await?;
    Ok(Json(stats.into_iter().map(LogStatResponse::from).collect()))
}

/// GET /api/logs/count
#[utoipa::path(
    get,
    path = "/count",
    tag = LOG_TAG,
    params(LogCountQuery),
    responses(
        (status = 200, description = "Number of matching entries", body = LogCountResponse),
        (status = 400, description = "Unknown service or level", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn log_count(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<LogCountQuery>,
) -> AppResult<Json<LogCountResponse>> {
    caller.require_admin()?;
    let count = state
        .services
        .logs
        .count(query.service.as_deref(), query.level.as_deref())
        .await?;
    Ok(Json(LogCountResponse { count }))
}

/// DELETE /api/logs/cleanup - Entries from the last 24 hours are never deleted
#[utoipa::path(
    delete,
    path = "/cleanup",
    tag = LOG_TAG,
    params(CleanupQuery),
    responses(
        (status = 200, description = "Old entries deleted", body = CleanupResponse),
        (status = 400, description = "before_date is within the last day", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn cleanup_logs(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<CleanupQuery>,
) -> AppResult<Json<CleanupResponse>> {
    caller.require_admin()?;
    let outcome = state.services.logs.cleanup(query.before_date).await?;
    Ok(Json(CleanupResponse::from(outcome)))
}

/// GET /api/logs/services - Accepted service names
#[utoipa::path(
    get,
    path = "/services",
    tag = LOG_TAG,
    responses((status = 200, description = "Service names", body = Vec<String>))
)]
async fn list_services() -> Json<Vec<&'static str>> {
    Json(ServiceName::ALL.iter().map(ServiceName::as_str).collect())
}

/// GET /api/logs/levels - Accepted level names
#[utoipa::path(
    get,
    path = "/levels",
    tag = LOG_TAG,
    responses((status = 200, description = "Level names", body = Vec<String>))
)]
async fn list_levels() -> Json<Vec<&'static str>> {
    Json(LogLevel::ALL.iter().map(LogLevel::as_str).collect())
}
