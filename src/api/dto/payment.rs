//! Payment and payment method DTOs.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::money;
use crate::models::{PaymentFilter, PaymentStatus};
use crate::services::{
    PaymentDraft, PaymentMethodDraft, PaymentMethodView, PaymentView, RevenueSummary,
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePaymentRequest {
    #[schema(example = 1001)]
    pub order_id: i32,
    /// Must be greater than 0
    #[schema(value_type = f64, example = 49.9, minimum = 0.01)]
    pub amount: BigDecimal,
    #[schema(example = 1)]
    pub payment_method_id: i32,
    #[validate(length(max = 255, message = "Description cannot exceed 255 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 100, message = "Reference cannot exceed 100 characters"))]
    pub reference: Option<String>,
}

impl CreatePaymentRequest {
    pub fn into_draft(self) -> PaymentDraft {
        PaymentDraft {
            order_id: self.order_id,
            amount: money(self.amount),
            payment_method_id: self.payment_method_id,
            description: self.description,
            reference: self.reference,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdatePaymentStatusRequest {
    pub status: PaymentStatus,
    /// Used when completing; generated when absent
    #[validate(length(min = 1, max = 100, message = "Transaction ID must be between 1 and 100 characters"))]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PaymentSearchQuery {
    pub order_id: Option<i32>,
    pub status: Option<PaymentStatus>,
    pub payment_method_id: Option<i32>,
    #[param(value_type = Option<f64>)]
    pub min_amount: Option<BigDecimal>,
    #[param(value_type = Option<f64>)]
    pub max_amount: Option<BigDecimal>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    /// Ignored for non-admin callers
    pub user_id: Option<i32>,
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: Option<u32>,
    /// Defaults to 10, capped at 100
    #[validate(range(min = 1, message = "Page size must be at least 1"))]
    #[param(minimum = 1, maximum = 100, example = 10)]
    pub page_size: Option<u32>,
}

impl PaymentSearchQuery {
    pub fn into_filter(self) -> (PaymentFilter, Option<u32>, Option<u32>) {
        let filter = PaymentFilter {
            order_id: self.order_id,
            status: self.status,
            payment_method_id: self.payment_method_id,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            from_date: self.from_date,
            to_date: self.to_date,
            user_id: self.user_id,
        };
        (filter, self.page, self.page_size)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub order_id: i32,
    #[schema(value_type = String, example = "49.90")]
    pub amount: BigDecimal,
    pub payment_method_id: i32,
    pub payment_method_name: Option<String>,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub user_id: i32,
    pub payment_date: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PaymentView> for PaymentResponse {
    fn from(view: PaymentView) -> Self {
        let payment = view.payment;
        Self {
            id: payment.id,
            order_id: payment.order_id,
            amount: payment.amount,
            payment_method_id: payment.payment_method_id,
            payment_method_name: view.payment_method_name,
            status: payment.status,
            transaction_id: payment.transaction_id,
            description: payment.description,
            reference: payment.reference,
            user_id: payment.user_id,
            payment_date: payment.payment_date,
            processed_at: payment.processed_at,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevenueResponse {
    #[schema(value_type = String, example = "1520.75")]
    pub total_revenue: BigDecimal,
    #[schema(example = "USD")]
    pub currency: String,
}

impl From<RevenueSummary> for RevenueResponse {
    fn from(summary: RevenueSummary) -> Self {
        Self {
            total_revenue: money(summary.total_revenue),
            currency: summary.currency,
        }
    }
}

// ============================================================================
// Payment methods
// ============================================================================

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePaymentMethodRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    #[schema(example = "Gift Card", max_length = 50)]
    pub name: String,
    #[validate(length(max = 255, message = "Description cannot exceed 255 characters"))]
    pub description: Option<String>,
    /// Percentage between 0 and 100
    #[serde(default)]
    #[schema(value_type = f64, example = 1.5, minimum = 0, maximum = 100)]
    pub processing_fee: BigDecimal,
}

impl CreatePaymentMethodRequest {
    pub fn into_draft(self) -> PaymentMethodDraft {
        PaymentMethodDraft {
            name: self.name,
            description: self.description,
            processing_fee: money(self.processing_fee),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethodResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    #[schema(value_type = String, example = "2.90")]
    pub processing_fee: BigDecimal,
    pub payment_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentMethodView> for PaymentMethodResponse {
    fn from(view: PaymentMethodView) -> Self {
        Self {
            id: view.method.id,
            name: view.method.name,
            description: view.method.description,
            is_active: view.method.is_active,
            processing_fee: view.method.processing_fee,
            payment_count: view.payment_count,
            created_at: view.method.created_at,
        }
    }
}
