//! Payment handlers. Every route requires a caller; non-admins only see
//! their own payments.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::PAYMENT_TAG;
use crate::api::dto::{
    CreatePaymentRequest, ErrorResponse, PaymentResponse, PaymentSearchQuery, RevenueResponse,
    UpdatePaymentStatusRequest,
};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::services::PaymentView;
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

pub fn payment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_payments, create_payment))
        .routes(routes!(search_payments))
        .routes(routes!(my_payments))
        .routes(routes!(payments_by_order))
        .routes(routes!(total_revenue))
        .routes(routes!(get_payment))
        .routes(routes!(update_payment_status))
        .routes(routes!(process_payment))
}

fn to_responses(views: Vec<PaymentView>) -> Vec<PaymentResponse> {
    views.into_iter().map(PaymentResponse::from).collect()
}

/// GET /api/payments - Newest first, at most 1000
#[utoipa::path(
    get,
    path = "/",
    tag = PAYMENT_TAG,
    responses(
        (status = 200, description = "All payments", body = Vec<PaymentResponse>),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn list_payments(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    caller.require_admin()?;
    let payments = state.services.payments.list_all().await?;
    Ok(Json(to_responses(payments)))
}

/// GET /api/payments/search
#[utoipa::path(
    get,
    path = "/search",
    tag = PAYMENT_TAG,
    params(PaymentSearchQuery),
    responses(
        (status = 200, description = "One page of matching payments", body = Vec<PaymentResponse>),
        (status = 400, description = "Invalid query", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn search_payments(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedQuery(query): ValidatedQuery<PaymentSearchQuery>,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    let (filter, page, page_size) = query.into_filter();
    let payments = state
        .services
        .payments
        .search(&caller, filter, page, page_size)
        .await?;
    Ok(Json(to_responses(payments)))
}

/// GET /api/payments/my-payments
#[utoipa::path(
    get,
    path = "/my-payments",
    tag = PAYMENT_TAG,
    responses((status = 200, description = "The caller's payments", body = Vec<PaymentResponse>)),
    security(("bearerAuth" = []))
)]
async fn my_payments(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    let payments = state.services.payments.my_payments(&caller).await?;
    Ok(Json(to_responses(payments)))
}

/// GET /api/payments/order/{order_id}
#[utoipa::path(
    get,
    path = "/order/{order_id}",
    tag = PAYMENT_TAG,
    params(("order_id" = i32, Path, description = "Order ID")),
    responses((status = 200, description = "Payments for the order", body = Vec<PaymentResponse>)),
    security(("bearerAuth" = []))
)]
async fn payments_by_order(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(order_id): Path<i32>,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    let payments = state.services.payments.by_order(&caller, order_id).await?;
    Ok(Json(to_responses(payments)))
}

/// GET /api/payments/{id}
#[utoipa::path(
    get,
    path = "/{id}",
    tag = PAYMENT_TAG,
    params(("id" = i32, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment found", body = PaymentResponse),
        (status = 403, description = "Neither the owner nor an admin", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn get_payment(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PaymentResponse>> {
    let payment = state.services.payments.get(&caller, id).await?;
    Ok(Json(PaymentResponse::from(payment)))
}

/// POST /api/payments - Starts as Pending, owned by the caller
#[utoipa::path(
    post,
    path = "/",
    tag = PAYMENT_TAG,
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment created", body = PaymentResponse),
        (status = 400, description = "Invalid amount or payment method", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn create_payment(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<PaymentResponse>)> {
    let payment = state
        .services
        .payments
        .create(&caller, payload.into_draft())
        .await?;
    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

/// PUT /api/payments/{id}/status - Pending to Completed or Failed only
#[utoipa::path(
    put,
    path = "/{id}/status",
    tag = PAYMENT_TAG,
    params(("id" = i32, Path, description = "Payment ID")),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = PaymentResponse),
        (status = 400, description = "Invalid target status", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 409, description = "Payment is no longer pending", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_payment_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdatePaymentStatusRequest>,
) -> AppResult<Json<PaymentResponse>> {
    caller.require_admin()?;
    let payment = state
        .services
        .payments
        .update_status(id, payload.status, payload.transaction_id)
        .await?;
    Ok(Json(PaymentResponse::from(payment)))
}

/// POST /api/payments/{id}/process - Completes a pending payment
#[utoipa::path(
    post,
    path = "/{id}/process",
    tag = PAYMENT_TAG,
    params(("id" = i32, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment completed", body = PaymentResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 409, description = "Payment already processed", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn process_payment(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PaymentResponse>> {
    caller.require_admin()?;
    let payment = state.services.payments.process(id).await?;
    Ok(Json(PaymentResponse::from(payment)))
}

/// GET /api/payments/revenue/total - Sum of completed payments
#[utoipa::path(
    get,
    path = "/revenue/total",
    tag = PAYMENT_TAG,
    responses(
        (status = 200, description = "Total revenue", body = RevenueResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn total_revenue(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<RevenueResponse>> {
    caller.require_admin()?;
    let revenue = state.services.payments.total_revenue().await?;
    Ok(Json(RevenueResponse::from(revenue)))
}
