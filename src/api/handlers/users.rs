//! Profile and user administration handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::USER_TAG;
use crate::api::dto::{ChangePasswordRequest, ErrorResponse, UpdateProfileRequest, UserResponse};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::ValidatedJson;

/// # Routes
/// - `GET /profile`, `PUT /profile` - The caller's own account
/// - `POST /change-password`
/// - `GET /` - Active users (Admin)
/// - `GET /{id}` - Owner or Admin
/// - `DELETE /{id}` - Deactivate (Admin)
pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_profile, update_profile))
        .routes(routes!(change_password))
        .routes(routes!(list_users))
        .routes(routes!(get_user, delete_user))
}

/// GET /api/users/profile - Current user's profile
#[utoipa::path(
    get,
    path = "/profile",
    tag = USER_TAG,
    responses(
        (status = 200, description = "Current user information", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account no longer active", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn get_profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users.get(caller.user_id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// PUT /api/users/profile - Update email and names
#[utoipa::path(
    put,
    path = "/profile",
    tag = USER_TAG,
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 409, description = "Email already taken", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .services
        .users
        .update_profile(caller.user_id, payload.into_changes())
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// POST /api/users/change-password
#[utoipa::path(
    post,
    path = "/change-password",
    tag = USER_TAG,
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Current password is incorrect", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn change_password(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    state
        .services
        .users
        .change_password(caller.user_id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users - Active users ordered by username
#[utoipa::path(
    get,
    path = "/",
    tag = USER_TAG,
    responses(
        (status = 200, description = "Active users", body = Vec<UserResponse>),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    caller.require_admin()?;
    let users = state.services.users.list_active().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/{id}",
    tag = USER_TAG,
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Neither the owner nor an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn get_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    caller.require_owner(id)?;
    let user = state.services.users.get(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/{id} - Deactivate a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = USER_TAG,
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    caller.require_admin()?;
    state.services.users.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
