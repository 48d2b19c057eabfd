//! Product catalogue handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::PRODUCT_TAG;
use crate::api::dto::{
    CreateProductRequest, ErrorResponse, ProductResponse, ProductSearchQuery,
    UpdateProductRequest, UpdateStockRequest,
};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::services::ProductView;
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

/// # Routes
/// - `GET /`, `GET /search` - Public reads
/// - `GET /{id}`, `POST /`, `PUT|PATCH /{id}`, `PATCH /{id}/stock` - Authenticated
/// - `DELETE /{id}` - Admin
pub fn product_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_products, create_product))
        .routes(routes!(search_products))
        .routes(routes!(get_product, update_product, patch_product, delete_product))
        .routes(routes!(update_stock))
}

fn views_to_responses(views: Vec<ProductView>) -> Vec<ProductResponse> {
    views.into_iter().map(ProductResponse::from).collect()
}

/// GET /api/products - Active products ordered by name
#[utoipa::path(
    get,
    path = "/",
    tag = PRODUCT_TAG,
    responses((status = 200, description = "Active products", body = Vec<ProductResponse>))
)]
async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<ProductResponse>>> {
    let products = state.services.products.list().await?;
    Ok(Json(views_to_responses(products)))
}

/// GET /api/products/search
#[utoipa::path(
    get,
    path = "/search",
    tag = PRODUCT_TAG,
    params(ProductSearchQuery),
    responses(
        (status = 200, description = "One page of matching products", body = Vec<ProductResponse>),
        (status = 400, description = "Invalid query", body = ErrorResponse)
    )
)]
async fn search_products(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ProductSearchQuery>,
) -> AppResult<Json<Vec<ProductResponse>>> {
    let (filter, page, page_size) = query.into_filter();
    let products = state.services.products.search(filter, page, page_size).await?;
    Ok(Json(views_to_responses(products)))
}

/// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn get_product(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ProductResponse>> {
    let product = state.services.products.get(id).await?;
    Ok(Json(ProductResponse::from(product)))
}

/// POST /api/products
#[utoipa::path(
    post,
    path = "/",
    tag = PRODUCT_TAG,
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid request or unknown category", body = ErrorResponse),
        (status = 409, description = "SKU already in use", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn create_product(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    let product = state
        .services
        .products
        .create(payload.into_draft(), &caller.username)
        .await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

/// PUT /api/products/{id} - Omitted fields are left unchanged
#[utoipa::path(
    put,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_product(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<ProductResponse>> {
    let product = state
        .services
        .products
        .update(id, payload.into_changes(), &caller.username)
        .await?;
    Ok(Json(ProductResponse::from(product)))
}

/// PATCH /api/products/{id} - Same semantics as PUT
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn patch_product(
    state: State<AppState>,
    caller: AuthUser,
    id: Path<i32>,
    payload: ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<ProductResponse>> {
    update_product(state, caller, id, payload).await
}

/// PATCH /api/products/{id}/stock
#[utoipa::path(
    patch,
    path = "/{id}/stock",
    tag = PRODUCT_TAG,
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateStockRequest,
    responses(
        (status = 200, description = "Stock updated", body = ProductResponse),
        (status = 400, description = "Negative quantity", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_stock(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateStockRequest>,
) -> AppResult<Json<ProductResponse>> {
    let product = state
        .services
        .products
        .update_stock(id, payload.quantity, &caller.username)
        .await?;
    Ok(Json(ProductResponse::from(product)))
}

/// DELETE /api/products/{id} - Soft delete
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn delete_product(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    caller.require_admin()?;
    state.services.products.delete(id, &caller.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
