//! Registration and login.

use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::AUTH_TAG;
use crate::api::dto::{ErrorResponse, LoginRequest, LoginResponse, RegisterRequest};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::ValidatedJson;

/// # Routes
/// - `POST /register` - Create an account and get a token
/// - `POST /login` - Exchange credentials for a token
pub fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
}

/// POST /api/auth/register - Register new user
///
/// New accounts always get the `User` role.
#[utoipa::path(
    post,
    path = "/register",
    tag = AUTH_TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = LoginResponse),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse)
    )
)]
async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    let session = state
        .services
        .users
        .register(payload.into_registration())
        .await?;
    Ok((StatusCode::CREATED, Json(LoginResponse::from(session))))
}

/// POST /api/auth/login - Authenticate user
#[utoipa::path(
    post,
    path = "/login",
    tag = AUTH_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials or inactive account", body = ErrorResponse)
    )
)]
async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let session = state
        .services
        .users
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(LoginResponse::from(session)))
}
