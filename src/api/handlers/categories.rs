//! Category handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::CATEGORY_TAG;
use crate::api::dto::{
    CategoryResponse, CreateCategoryRequest, ErrorResponse, UpdateCategoryRequest,
};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::ValidatedJson;

pub fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_categories, create_category))
        .routes(routes!(
            get_category,
            update_category,
            patch_category,
            delete_category
        ))
}

/// GET /api/categories - Active categories with their active product counts
#[utoipa::path(
    get,
    path = "/",
    tag = CATEGORY_TAG,
    responses((status = 200, description = "Active categories", body = Vec<CategoryResponse>))
)]
async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CategoryResponse>>> {
    let categories = state.services.categories.list().await?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

/// GET /api/categories/{id}
#[utoipa::path(
    get,
    path = "/{id}",
    tag = CATEGORY_TAG,
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<CategoryResponse>> {
    let category = state.services.categories.get(id).await?;
    Ok(Json(CategoryResponse::from(category)))
}

/// POST /api/categories
#[utoipa::path(
    post,
    path = "/",
    tag = CATEGORY_TAG,
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn create_category(
    State(state): State<AppState>,
    _caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<CategoryResponse>)> {
    let category = state.services.categories.create(payload.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

/// PUT /api/categories/{id}
#[utoipa::path(
    put,
    path = "/{id}",
    tag = CATEGORY_TAG,
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_category(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> AppResult<Json<CategoryResponse>> {
    let category = state
        .services
        .categories
        .update(id, payload.into_changes())
        .await?;
    Ok(Json(CategoryResponse::from(category)))
}

/// PATCH /api/categories/{id} - Same semantics as PUT
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = CATEGORY_TAG,
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn patch_category(
    state: State<AppState>,
    caller: AuthUser,
    id: Path<i32>,
    payload: ValidatedJson<UpdateCategoryRequest>,
) -> AppResult<Json<CategoryResponse>> {
    update_category(state, caller, id, payload).await
}

/// DELETE /api/categories/{id} - Refused while active products remain
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = CATEGORY_TAG,
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category still has active products", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn delete_category(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    caller.require_admin()?;
    state.services.categories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
