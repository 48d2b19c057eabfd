//! Product persistence. Rows are never deleted; `is_active = false` hides them.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{NewProduct, Product, ProductFilter, UpdateProduct, Window};
use crate::repositories::like_pattern;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, new_product: NewProduct) -> Result<Product, AppError>;

    async fn find_active(&self, product_id: i32) -> Result<Option<Product>, AppError>;

    /// Active products ordered by name.
    async fn list_active(&self) -> Result<Vec<Product>, AppError>;

    /// Active products matching every set filter field, ordered by name.
    async fn search(
        &self,
        filter: &ProductFilter,
        window: Window,
    ) -> Result<Vec<Product>, AppError>;

    async fn update(
        &self,
        product_id: i32,
        changes: UpdateProduct,
    ) -> Result<Option<Product>, AppError>;

    /// Active product count per category id. Categories without products are absent.
    async fn count_active_by_category(&self) -> Result<HashMap<i32, i64>, AppError>;
}

#[derive(Clone)]
pub struct PgProductRepository {
    pool: AsyncDbPool,
}

impl PgProductRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, new_product: NewProduct) -> Result<Product, AppError> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(products)
            .values(&new_product)
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn find_active(&self, product_id: i32) -> Result<Option<Product>, AppError> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        products
            .filter(id.eq(product_id))
            .filter(is_active.eq(true))
            .select(Product::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn list_active(&self) -> Result<Vec<Product>, AppError> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        products
            .filter(is_active.eq(true))
            .order((name.asc(), id.asc()))
            .select(Product::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn search(
        &self,
        filter: &ProductFilter,
        window: Window,
    ) -> Result<Vec<Product>, AppError> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        let mut query = products
            .filter(is_active.eq(true))
            .select(Product::as_select())
            .into_boxed();

        if let Some(term) = filter.search.as_deref() {
            let pattern = like_pattern(term);
            query = query.filter(
                name.ilike(pattern.clone())
                    .or(description.assume_not_null().ilike(pattern)),
            );
        }
        if let Some(category) = filter.category_id {
            query = query.filter(category_id.eq(category));
        }
        if let Some(min) = filter.min_price.clone() {
            query = query.filter(price.ge(min));
        }
        if let Some(max) = filter.max_price.clone() {
            query = query.filter(price.le(max));
        }
        match filter.in_stock {
            Some(true) => query = query.filter(stock.gt(0)),
            Some(false) => query = query.filter(stock.eq(0)),
            None => {}
        }

        query
            .order((name.asc(), id.asc()))
            .offset(window.offset)
            .limit(window.limit)
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn update(
        &self,
        product_id: i32,
        changes: UpdateProduct,
    ) -> Result<Option<Product>, AppError> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(products.filter(id.eq(product_id)))
            .set(&changes)
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn count_active_by_category(&self) -> Result<HashMap<i32, i64>, AppError> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        let counts: Vec<(i32, i64)> = products
            .filter(is_active.eq(true))
            .group_by(category_id)
            .select((category_id, diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(counts.into_iter().collect())
    }
}
