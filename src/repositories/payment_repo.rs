//! Payment persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{NewPayment, Payment, PaymentFilter, PaymentStatus, PaymentTransition, Window};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, new_payment: NewPayment) -> Result<Payment, AppError>;

    async fn find_by_id(&self, payment_id: i32) -> Result<Option<Payment>, AppError>;

    /// Newest first by payment date.
    async fn list(&self, window: Window) -> Result<Vec<Payment>, AppError>;

    /// Payments matching every set filter field, newest first.
    async fn search(
        &self,
        filter: &PaymentFilter,
        window: Window,
    ) -> Result<Vec<Payment>, AppError>;

    /// Applies `transition` only while the row is still `Pending`, in one
    /// conditional update. `None` when no row was changed, either because the
    /// id is unknown or the payment already left `Pending`.
    async fn transition(
        &self,
        payment_id: i32,
        transition: PaymentTransition,
    ) -> Result<Option<Payment>, AppError>;

    /// Sum of `Completed` amounts; zero when there are none.
    async fn total_completed(&self) -> Result<BigDecimal, AppError>;

    /// Payment count per payment method id.
    async fn count_by_method(&self) -> Result<HashMap<i32, i64>, AppError>;
}

#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: AsyncDbPool,
}

impl PgPaymentRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn create(&self, new_payment: NewPayment) -> Result<Payment, AppError> {
        use crate::schema::payments::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(payments)
            .values(&new_payment)
            .returning(Payment::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn find_by_id(&self, payment_id: i32) -> Result<Option<Payment>, AppError> {
        use crate::schema::payments::dsl::*;
        let mut conn = self.pool.get().await?;

        payments
            .filter(id.eq(payment_id))
            .select(Payment::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn list(&self, window: Window) -> Result<Vec<Payment>, AppError> {
        use crate::schema::payments::dsl::*;
        let mut conn = self.pool.get().await?;

        payments
            .order((payment_date.desc(), id.desc()))
            .offset(window.offset)
            .limit(window.limit)
            .select(Payment::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn search(
        &self,
        filter: &PaymentFilter,
        window: Window,
    ) -> Result<Vec<Payment>, AppError> {
        use crate::schema::payments::dsl::*;
        let mut conn = self.pool.get().await?;

        let mut query = payments.select(Payment::as_select()).into_boxed();

        if let Some(order) = filter.order_id {
            query = query.filter(order_id.eq(order));
        }
        if let Some(wanted) = filter.status {
            query = query.filter(status.eq(wanted));
        }
        if let Some(method) = filter.payment_method_id {
            query = query.filter(payment_method_id.eq(method));
        }
        if let Some(min) = filter.min_amount.clone() {
            query = query.filter(amount.ge(min));
        }
        if let Some(max) = filter.max_amount.clone() {
            query = query.filter(amount.le(max));
        }
        if let Some(from) = filter.from_date {
            query = query.filter(payment_date.ge(from));
        }
        if let Some(to) = filter.to_date {
            query = query.filter(payment_date.le(to));
        }
        if let Some(owner) = filter.user_id {
            query = query.filter(user_id.eq(owner));
        }

        query
            .order((payment_date.desc(), id.desc()))
            .offset(window.offset)
            .limit(window.limit)
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn transition(
        &self,
        payment_id: i32,
        transition: PaymentTransition,
    ) -> Result<Option<Payment>, AppError> {
        use crate::schema::payments::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(
            payments
                .filter(id.eq(payment_id))
                .filter(status.eq(PaymentStatus::Pending)),
        )
        .set(&transition)
        .returning(Payment::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(AppError::from)
    }

    async fn total_completed(&self) -> Result<BigDecimal, AppError> {
        use crate::schema::payments::dsl::*;
        let mut conn = self.pool.get().await?;

        let total: Option<BigDecimal> = payments
            .filter(status.eq(PaymentStatus::Completed))
            .select(diesel::dsl::sum(amount))
            .first(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(total.unwrap_or_default())
    }

    async fn count_by_method(&self) -> Result<HashMap<i32, i64>, AppError> {
        use crate::schema::payments::dsl::*;
        let mut conn = self.pool.get().await?;

        let counts: Vec<(i32, i64)> = payments
            .group_by(payment_method_id)
            .select((payment_method_id, diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(counts.into_iter().collect())
    }
}
