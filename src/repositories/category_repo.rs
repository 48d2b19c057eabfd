//! Category persistence.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{Category, NewCategory, UpdateCategory};

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, new_category: NewCategory) -> Result<Category, AppError>;

    /// Active category by id.
    async fn find_active(&self, category_id: i32) -> Result<Option<Category>, AppError>;

    /// Active categories ordered by name.
    async fn list_active(&self) -> Result<Vec<Category>, AppError>;

    /// Every category, active or not. Used to resolve names for product views.
    async fn list_all(&self) -> Result<Vec<Category>, AppError>;

    async fn update(
        &self,
        category_id: i32,
        changes: UpdateCategory,
    ) -> Result<Option<Category>, AppError>;
}

#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: AsyncDbPool,
}

impl PgCategoryRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, new_category: NewCategory) -> Result<Category, AppError> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(categories)
            .values(&new_category)
            .returning(Category::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn find_active(&self, category_id: i32) -> Result<Option<Category>, AppError> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        categories
            .filter(id.eq(category_id))
            .filter(is_active.eq(true))
            .select(Category::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn list_active(&self) -> Result<Vec<Category>, AppError> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        categories
            .filter(is_active.eq(true))
            .order(name.asc())
            .select(Category::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn list_all(&self) -> Result<Vec<Category>, AppError> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        categories
            .order(id.asc())
            .select(Category::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn update(
        &self,
        category_id: i32,
        changes: UpdateCategory,
    ) -> Result<Option<Category>, AppError> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(categories.filter(id.eq(category_id)))
            .set(&changes)
            .returning(Category::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }
}
