//! Payments and their one-way status lifecycle.
//!
//! Every status change is a conditional update on `status = 'Pending'`, so of
//! two concurrent attempts on the same payment at most one succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{NewPayment, Payment, PaymentFilter, PaymentStatus, PaymentTransition, Window};
use crate::repositories::{PaymentMethodRepository, PaymentRepository};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const LIST_LIMIT: i64 = 1000;
pub const REVENUE_CURRENCY: &str = "USD";

#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub order_id: i32,
    pub amount: BigDecimal,
    pub payment_method_id: i32,
    pub description: Option<String>,
    pub reference: Option<String>,
}

/// A payment with its method's name resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentView {
    pub payment: Payment,
    pub payment_method_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueSummary {
    pub total_revenue: BigDecimal,
    pub currency: String,
}

#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    methods: Arc<dyn PaymentMethodRepository>,
}

/// `TXN_{yyyyMMddHHmmss}_{id}`
pub fn generate_transaction_id(payment_id: i32, at: DateTime<Utc>) -> String {
    format!("TXN_{}_{}", at.format("%Y%m%d%H%M%S"), payment_id)
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        methods: Arc<dyn PaymentMethodRepository>,
    ) -> Self {
        Self { payments, methods }
    }

    /// Newest first, at most 1000 rows.
    pub async fn list_all(&self) -> AppResult<Vec<PaymentView>> {
        let payments = self.payments.list(Window::first(LIST_LIMIT)).await?;
        self.views(payments).await
    }

    /// Non-admin callers only ever see their own payments, whatever `user_id` they ask for.
    pub async fn search(
        &self,
        caller: &AuthUser,
        mut filter: PaymentFilter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> AppResult<Vec<PaymentView>> {
        if !caller.is_admin() {
            filter.user_id = Some(caller.user_id);
        }
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let payments = self
            .payments
            .search(&filter, Window::page(page.unwrap_or(1), page_size))
            .await?;
        self.views(payments).await
    }

    pub async fn my_payments(&self, caller: &AuthUser) -> AppResult<Vec<PaymentView>> {
        let filter = PaymentFilter {
            user_id: Some(caller.user_id),
            ..Default::default()
        };
        let payments = self.payments.search(&filter, Window::first(LIST_LIMIT)).await?;
        self.views(payments).await
    }

    pub async fn by_order(&self, caller: &AuthUser, order_id: i32) -> AppResult<Vec<PaymentView>> {
        let filter = PaymentFilter {
            order_id: Some(order_id),
            user_id: (!caller.is_admin()).then_some(caller.user_id),
            ..Default::default()
        };
        let payments = self.payments.search(&filter, Window::first(LIST_LIMIT)).await?;
        self.views(payments).await
    }

    /// Existence is checked before ownership, so a missing id is 404 for everyone.
    pub async fn get(&self, caller: &AuthUser, payment_id: i32) -> AppResult<PaymentView> {
        let payment = self.find(payment_id).await?;
        caller.require_owner(payment.user_id)?;
        self.view(payment).await
    }

    pub async fn create(&self, caller: &AuthUser, draft: PaymentDraft) -> AppResult<PaymentView> {
        if draft.amount <= BigDecimal::zero() {
            return Err(AppError::validation("amount", "Amount must be greater than 0"));
        }
        let method = self
            .methods
            .find_by_id(draft.payment_method_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(|| {
                AppError::validation(
                    "payment_method_id",
                    format!(
                        "Payment method {} does not exist or is inactive",
                        draft.payment_method_id
                    ),
                )
            })?;

        let now = Utc::now();
        let payment = self
            .payments
            .create(NewPayment {
                order_id: draft.order_id,
                amount: draft.amount,
                payment_method_id: method.id,
                status: PaymentStatus::Pending,
                description: draft.description,
                reference: draft.reference,
                user_id: caller.user_id,
                payment_date: now,
                created_at: now,
            })
            .await?;

        tracing::info!(
            payment_id = payment.id,
            order_id = payment.order_id,
            user_id = caller.user_id,
            amount = %payment.amount,
            "Payment created"
        );
        Ok(PaymentView {
            payment,
            payment_method_name: Some(method.name),
        })
    }

    /// Moves a pending payment to `Completed` or `Failed`.
    ///
    /// Completing without a transaction id generates one. Asking for `Pending`
    /// is a validation error; any change to a non-pending payment is a conflict.
    pub async fn update_status(
        &self,
        payment_id: i32,
        status: PaymentStatus,
        transaction_id: Option<String>,
    ) -> AppResult<PaymentView> {
        let now = Utc::now();
        if !PaymentStatus::Pending.can_transition_to(status) {
            return Err(AppError::validation(
                "status",
                "A payment cannot be moved back to Pending",
            ));
        }

        let transaction_id = match status {
            PaymentStatus::Completed => Some(
                transaction_id.unwrap_or_else(|| generate_transaction_id(payment_id, now)),
            ),
            PaymentStatus::Pending | PaymentStatus::Failed => None,
        };
        let transition = PaymentTransition {
            status,
            transaction_id,
            processed_at: Some(now),
            updated_at: now,
        };

        let payment = self.transition(payment_id, transition).await?;
        tracing::info!(payment_id, status = %payment.status, "Payment status updated");
        self.view(payment).await
    }

    /// Completes a pending payment with a generated transaction id.
    pub async fn process(&self, payment_id: i32) -> AppResult<PaymentView> {
        let now = Utc::now();
        let payment = self
            .transition(
                payment_id,
                PaymentTransition {
                    status: PaymentStatus::Completed,
                    transaction_id: Some(generate_transaction_id(payment_id, now)),
                    processed_at: Some(now),
                    updated_at: now,
                },
            )
            .await?;

        tracing::info!(
            payment_id,
            transaction_id = payment.transaction_id.as_deref().unwrap_or_default(),
            "Payment processed"
        );
        self.view(payment).await
    }

    pub async fn total_revenue(&self) -> AppResult<RevenueSummary> {
        Ok(RevenueSummary {
            total_revenue: self.payments.total_completed().await?,
            currency: REVENUE_CURRENCY.to_string(),
        })
    }

    async fn transition(
        &self,
        payment_id: i32,
        transition: PaymentTransition,
    ) -> AppResult<Payment> {
        let target = transition.status;
        if let Some(payment) = self.payments.transition(payment_id, transition).await? {
            return Ok(payment);
        }

        let current = self.find(payment_id).await?;
        tracing::warn!(
            payment_id,
            current = %current.status,
            %target,
            "Rejected payment transition"
        );
        Err(AppError::conflict(format!(
            "Payment {} is {} and cannot become {}",
            payment_id, current.status, target
        )))
    }

    async fn find(&self, payment_id: i32) -> AppResult<Payment> {
        self.payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found("payment", "id", payment_id))
    }

    async fn method_names(&self) -> AppResult<HashMap<i32, String>> {
        Ok(self
            .methods
            .list_all()
            .await?
            .into_iter()
            .map(|m| (m.id, m.name))
            .collect())
    }

    async fn view(&self, payment: Payment) -> AppResult<PaymentView> {
        let payment_method_name = self
            .methods
            .find_by_id(payment.payment_method_id)
            .await?
            .map(|m| m.name);
        Ok(PaymentView {
            payment,
            payment_method_name,
        })
    }

    async fn views(&self, payments: Vec<Payment>) -> AppResult<Vec<PaymentView>> {
        let names = self.method_names().await?;
        Ok(payments
            .into_iter()
            .map(|payment| PaymentView {
                payment_method_name: names.get(&payment.payment_method_id).cloned(),
                payment,
            })
            .collect())
    }
}
