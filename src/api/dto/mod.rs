//! Request and response bodies, one module per service.

mod auth;
mod category;
mod error;
mod health;
mod log;
mod payment;
mod product;
mod user;

use bigdecimal::{BigDecimal, RoundingMode};

pub use auth::{ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest};
pub use category::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use log::{
    CleanupQuery, CleanupResponse, CreateLogRequest, DateRangeQuery, LogCountQuery,
    LogCountResponse, LogEntryResponse, LogSearchQuery, LogStatResponse, LogSummaryResponse,
};
pub use payment::{
    CreatePaymentMethodRequest, CreatePaymentRequest, PaymentMethodResponse, PaymentResponse,
    PaymentSearchQuery, RevenueResponse, UpdatePaymentStatusRequest,
};
pub use product::{
    CreateProductRequest, ProductResponse, ProductSearchQuery, UpdateProductRequest,
    UpdateStockRequest,
};
pub use user::{UpdateProfileRequest, UserResponse};

/// Money is kept at two decimal places, rounding half up.
pub(crate) fn money(value: BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}
