//! Payment method handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::PAYMENT_METHOD_TAG;
use crate::api::dto::{CreatePaymentMethodRequest, ErrorResponse, PaymentMethodResponse};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::ValidatedJson;

pub fn payment_method_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_payment_methods, create_payment_method))
        .routes(routes!(get_payment_method))
}

/// GET /api/payment-methods - Active methods ordered by name
#[utoipa::path(
    get,
    path = "/",
    tag = PAYMENT_METHOD_TAG,
    responses((status = 200, description = "Active payment methods", body = Vec<PaymentMethodResponse>)),
    security(("bearerAuth" = []))
)]
async fn list_payment_methods(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<Json<Vec<PaymentMethodResponse>>> {
    let methods = state.services.payment_methods.list().await?;
    Ok(Json(methods.into_iter().map(PaymentMethodResponse::from).collect()))
}

/// GET /api/payment-methods/{id}
#[utoipa::path(
    get,
    path = "/{id}",
    tag = PAYMENT_METHOD_TAG,
    params(("id" = i32, Path, description = "Payment method ID")),
    responses(
        (status = 200, description = "Payment method found", body = PaymentMethodResponse),
        (status = 404, description = "Payment method not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn get_payment_method(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PaymentMethodResponse>> {
    let method = state.services.payment_methods.get(id).await?;
    Ok(Json(PaymentMethodResponse::from(method)))
}

/// POST /api/payment-methods
#[utoipa::path(
    post,
    path = "/",
    tag = PAYMENT_METHOD_TAG,
    request_body = CreatePaymentMethodRequest,
    responses(
        (status = 201, description = "Payment method created", body = PaymentMethodResponse),
        (status = 400, description = "Fee outside 0 to 100", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn create_payment_method(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreatePaymentMethodRequest>,
) -> AppResult<(StatusCode, Json<PaymentMethodResponse>)> {
    caller.require_admin()?;
    let method = state
        .services
        .payment_methods
        .create(payload.into_draft())
        .await?;
    Ok((StatusCode::CREATED, Json(PaymentMethodResponse::from(method))))
}
