//! Payment method persistence. The reference rows come from the migrations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{NewPaymentMethod, PaymentMethod};

#[async_trait]
pub trait PaymentMethodRepository: Send + Sync {
    async fn create(&self, new_method: NewPaymentMethod) -> Result<PaymentMethod, AppError>;

    async fn find_by_id(&self, method_id: i32) -> Result<Option<PaymentMethod>, AppError>;

    /// Active methods ordered by name.
    async fn list_active(&self) -> Result<Vec<PaymentMethod>, AppError>;

    /// Every method, active or not.
    async fn list_all(&self) -> Result<Vec<PaymentMethod>, AppError>;
}

#[derive(Clone)]
pub struct PgPaymentMethodRepository {
    pool: AsyncDbPool,
}

impl PgPaymentMethodRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentMethodRepository for PgPaymentMethodRepository {
    async fn create(&self, new_method: NewPaymentMethod) -> Result<PaymentMethod, AppError> {
        use crate::schema::payment_methods::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(payment_methods)
            .values(&new_method)
            .returning(PaymentMethod::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn find_by_id(&self, method_id: i32) -> Result<Option<PaymentMethod>, AppError> {
        use crate::schema::payment_methods::dsl::*;
        let mut conn = self.pool.get().await?;

        payment_methods
            .filter(id.eq(method_id))
            .select(PaymentMethod::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn list_active(&self) -> Result<Vec<PaymentMethod>, AppError> {
        use crate::schema::payment_methods::dsl::*;
        let mut conn = self.pool.get().await?;

        payment_methods
            .filter(is_active.eq(true))
            .order(name.asc())
            .select(PaymentMethod::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn list_all(&self) -> Result<Vec<PaymentMethod>, AppError> {
        use crate::schema::payment_methods::dsl::*;
        let mut conn = self.pool.get().await?;

        payment_methods
            .order(id.asc())
            .select(PaymentMethod::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
