use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::models::{Category, NewCategory, UpdateCategory};
use crate::repositories::{CategoryRepository, ProductRepository};

#[derive(Debug, Clone)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A category with the number of active products filed under it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryView {
    pub category: Category,
    pub product_count: i64,
}

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CategoryService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            categories,
            products,
        }
    }

    /// Active categories ordered by name.
    pub async fn list(&self) -> AppResult<Vec<CategoryView>> {
        let counts = self.products.count_active_by_category().await?;
        Ok(self
            .categories
            .list_active()
            .await?
            .into_iter()
            .map(|category| CategoryView {
                product_count: counts.get(&category.id).copied().unwrap_or(0),
                category,
            })
            .collect())
    }

    pub async fn get(&self, category_id: i32) -> AppResult<CategoryView> {
        let category = self.find(category_id).await?;
        self.view(category).await
    }

    pub async fn create(&self, draft: CategoryDraft) -> AppResult<CategoryView> {
        let category = self
            .categories
            .create(NewCategory {
                name: draft.name,
                description: draft.description,
                is_active: true,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(category_id = category.id, name = %category.name, "Category created");
        Ok(CategoryView {
            category,
            product_count: 0,
        })
    }

    pub async fn update(
        &self,
        category_id: i32,
        changes: CategoryChanges,
    ) -> AppResult<CategoryView> {
        self.find(category_id).await?;
        let category = self
            .categories
            .update(
                category_id,
                UpdateCategory {
                    name: changes.name,
                    description: changes.description,
                    is_active: None,
                    updated_at: Some(Utc::now()),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("category", "id", category_id))?;

        self.view(category).await
    }

    /// Soft delete, refused while any active product still references the category.
    pub async fn delete(&self, category_id: i32) -> AppResult<()> {
        self.find(category_id).await?;

        let in_use = self
            .products
            .count_active_by_category()
            .await?
            .get(&category_id)
            .copied()
            .unwrap_or(0);
        if in_use > 0 {
            return Err(AppError::conflict(format!(
                "Category {} still has {} active product(s)",
                category_id, in_use
            )));
        }

        self.categories
            .update(
                category_id,
                UpdateCategory {
                    is_active: Some(false),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(category_id, "Category deleted");
        Ok(())
    }

    async fn find(&self, category_id: i32) -> AppResult<Category> {
        self.categories
            .find_active(category_id)
            .await?
            .ok_or_else(|| AppError::not_found("category", "id", category_id))
    }

    async fn view(&self, category: Category) -> AppResult<CategoryView> {
        let product_count = self
            .products
            .count_active_by_category()
            .await?
            .get(&category.id)
            .copied()
            .unwrap_or(0);
        Ok(CategoryView {
            category,
            product_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::{MemoryCategoryRepository, MemoryProductRepository};
    use crate::services::{ProductDraft, ProductService};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn services() -> (CategoryService, ProductService) {
        let categories: Arc<dyn CategoryRepository> = Arc::new(MemoryCategoryRepository::seeded());
        let products: Arc<dyn ProductRepository> = Arc::new(MemoryProductRepository::default());
        (
            CategoryService::new(categories.clone(), products.clone()),
            ProductService::new(products, categories),
        )
    }

    fn widget(category_id: i32) -> ProductDraft {
        ProductDraft {
            name: "Widget".to_string(),
            description: None,
            price: BigDecimal::from_str("9.99").unwrap(),
            category_id,
            sku: None,
            stock: 0,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_list_counts_active_products() {
        let (categories, products) = services();
        products.create(widget(1), "alice").await.unwrap();
        products.create(widget(1), "alice").await.unwrap();

        let views = categories.list().await.unwrap();
        assert_eq!(views.len(), 4);
        let electronics = views.iter().find(|v| v.category.id == 1).unwrap();
        assert_eq!(electronics.product_count, 2);
        assert!(views.iter().filter(|v| v.category.id != 1).all(|v| v.product_count == 0));
    }

    #[tokio::test]
    async fn test_delete_blocked_by_active_product() {
        let (categories, products) = services();
        let product = products.create(widget(2), "alice").await.unwrap();

        assert!(matches!(categories.delete(2).await, Err(AppError::Conflict { .. })));

        products.delete(product.product.id, "admin").await.unwrap();
        categories.delete(2).await.unwrap();

        assert!(matches!(categories.get(2).await, Err(AppError::NotFound { .. })));
        assert!(matches!(categories.delete(2).await, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_and_partial_update() {
        let (categories, _) = services();
        let created = categories
            .create(CategoryDraft {
                name: "Garden".to_string(),
                description: Some("Outdoor".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(created.product_count, 0);

        let updated = categories
            .update(
                created.category.id,
                CategoryChanges {
                    name: Some("Garden & Patio".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.category.name, "Garden & Patio");
        assert_eq!(updated.category.description.as_deref(), Some("Outdoor"));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let (categories, _) = services();
        let err = categories
            .create(CategoryDraft {
                name: "Books".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
    }
}
