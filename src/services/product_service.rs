//! Product catalog. Products are never hard-deleted; `delete` clears `is_active`.

use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product, ProductFilter, UpdateProduct, Window};
use crate::repositories::{CategoryRepository, ProductRepository};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub category_id: i32,
    pub sku: Option<String>,
    pub stock: i32,
    pub image_url: Option<String>,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub category_id: Option<i32>,
    pub sku: Option<String>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
}

/// A product with its category's name resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductView {
    pub product: Product,
    pub category_name: Option<String>,
}

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl ProductService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            products,
            categories,
        }
    }

    /// Active products ordered by name.
    pub async fn list(&self) -> AppResult<Vec<ProductView>> {
        let products = self.products.list_active().await?;
        self.views(products).await
    }

    /// `page` is one-based; `page_size` defaults to 10 and is capped at 100.
    pub async fn search(
        &self,
        filter: ProductFilter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> AppResult<Vec<ProductView>> {
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let window = Window::page(page.unwrap_or(1), page_size);
        let products = self.products.search(&filter, window).await?;
        self.views(products).await
    }

    pub async fn get(&self, product_id: i32) -> AppResult<ProductView> {
        let product = self.find(product_id).await?;
        self.view(product).await
    }

    pub async fn create(&self, draft: ProductDraft, created_by: &str) -> AppResult<ProductView> {
        check_price(&draft.price)?;
        check_stock(draft.stock)?;
        self.require_category(draft.category_id).await?;

        let product = self
            .products
            .create(NewProduct {
                name: draft.name,
                description: draft.description,
                price: draft.price,
                category_id: draft.category_id,
                sku: draft.sku,
                stock: draft.stock,
                is_active: true,
                image_url: draft.image_url,
                created_at: Utc::now(),
                created_by: created_by.to_string(),
            })
            .await?;

        tracing::info!(
            product_id = product.id,
            name = %product.name,
            %created_by,
            "Product created"
        );
        self.view(product).await
    }

    pub async fn update(
        &self,
        product_id: i32,
        changes: ProductChanges,
        updated_by: &str,
    ) -> AppResult<ProductView> {
        self.find(product_id).await?;
        if let Some(price) = changes.price.as_ref() {
            check_price(price)?;
        }
        if let Some(stock) = changes.stock {
            check_stock(stock)?;
        }
        if let Some(category_id) = changes.category_id {
            self.require_category(category_id).await?;
        }

        let product = self
            .apply(
                product_id,
                UpdateProduct {
                    name: changes.name,
                    description: changes.description,
                    price: changes.price,
                    category_id: changes.category_id,
                    sku: changes.sku,
                    stock: changes.stock,
                    image_url: changes.image_url,
                    ..Default::default()
                },
                updated_by,
            )
            .await?;

        tracing::info!(product_id, %updated_by, "Product updated");
        self.view(product).await
    }

    pub async fn update_stock(
        &self,
        product_id: i32,
        quantity: i32,
        updated_by: &str,
    ) -> AppResult<ProductView> {
        check_stock(quantity)?;
        self.find(product_id).await?;

        let product = self
            .apply(
                product_id,
                UpdateProduct {
                    stock: Some(quantity),
                    ..Default::default()
                },
                updated_by,
            )
            .await?;

        tracing::info!(product_id, quantity, "Stock updated");
        self.view(product).await
    }

    pub async fn delete(&self, product_id: i32, deleted_by: &str) -> AppResult<()> {
        self.find(product_id).await?;
        self.apply(
            product_id,
            UpdateProduct {
                is_active: Some(false),
                ..Default::default()
            },
            deleted_by,
        )
        .await?;

        tracing::info!(product_id, %deleted_by, "Product deleted");
        Ok(())
    }

    async fn apply(
        &self,
        product_id: i32,
        mut changes: UpdateProduct,
        actor: &str,
    ) -> AppResult<Product> {
        changes.updated_at = Some(Utc::now());
        changes.updated_by = Some(actor.to_string());
        self.products
            .update(product_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("product", "id", product_id))
    }

    async fn find(&self, product_id: i32) -> AppResult<Product> {
        self.products
            .find_active(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("product", "id", product_id))
    }

    async fn require_category(&self, category_id: i32) -> AppResult<()> {
        match self.categories.find_active(category_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::validation(
                "category_id",
                format!("Category {} does not exist or is inactive", category_id),
            )),
        }
    }

    async fn category_names(&self) -> AppResult<HashMap<i32, String>> {
        Ok(self
            .categories
            .list_all()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect())
    }

    async fn view(&self, product: Product) -> AppResult<ProductView> {
        let category_name = self
            .categories
            .list_all()
            .await?
            .into_iter()
            .find(|c| c.id == product.category_id)
            .map(|c| c.name);
        Ok(ProductView {
            product,
            category_name,
        })
    }

    async fn views(&self, products: Vec<Product>) -> AppResult<Vec<ProductView>> {
        let names = self.category_names().await?;
        Ok(products
            .into_iter()
            .map(|product| ProductView {
                category_name: names.get(&product.category_id).cloned(),
                product,
            })
            .collect())
    }
}

fn check_price(price: &BigDecimal) -> AppResult<()> {
    if price <= &BigDecimal::zero() {
        return Err(AppError::validation("price", "Price must be greater than 0"));
    }
    Ok(())
}

fn check_stock(stock: i32) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::validation("stock", "Stock cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::{MemoryCategoryRepository, MemoryProductRepository};
    use std::str::FromStr;

    fn service() -> ProductService {
        ProductService::new(
            Arc::new(MemoryProductRepository::default()),
            Arc::new(MemoryCategoryRepository::seeded()),
        )
    }

    fn price(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn draft(name: &str, value: &str, category_id: i32, stock: i32) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: None,
            price: price(value),
            category_id,
            sku: None,
            stock,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_update_stock_only() {
        let service = service();
        let created = service
            .create(draft("Widget", "9.99", 1, 0), "alice")
            .await
            .unwrap();
        assert_eq!(created.product.stock, 0);
        assert!(created.product.is_active);
        assert_eq!(created.product.created_by, "alice");
        assert_eq!(created.category_name.as_deref(), Some("Electronics"));

        let updated = service
            .update(
                created.product.id,
                ProductChanges {
                    stock: Some(5),
                    ..Default::default()
                },
                "bob",
            )
            .await
            .unwrap();
        assert_eq!(updated.product.stock, 5);
        assert_eq!(updated.product.name, "Widget");
        assert_eq!(updated.product.price, price("9.99"));
        assert_eq!(updated.product.category_id, 1);
        assert_eq!(updated.product.updated_by.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let service = service();

        let err = service
            .create(draft("Widget", "0", 1, 0), "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "price"));

        let err = service
            .create(draft("Widget", "1.00", 99, 0), "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "category_id"));

        let err = service
            .create(draft("Widget", "1.00", 1, -1), "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "stock"));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_product() {
        let service = service();
        let id = service
            .create(draft("Lamp", "20.00", 2, 3), "alice")
            .await
            .unwrap()
            .product
            .id;

        service.delete(id, "admin").await.unwrap();
        assert!(matches!(service.get(id).await, Err(AppError::NotFound { .. })));
        assert!(matches!(service.delete(id, "admin").await, Err(AppError::NotFound { .. })));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_filters_and_pages() {
        let service = service();
        service.create(draft("Desk Lamp", "25.00", 2, 4), "a").await.unwrap();
        service.create(draft("Floor Lamp", "80.00", 2, 0), "a").await.unwrap();
        service.create(draft("Phone", "300.00", 1, 9), "a").await.unwrap();

        let lamps = service
            .search(
                ProductFilter {
                    search: Some("LAMP".to_string()),
                    ..Default::default()
                },
                None,
                None,
            )
            .await
            .unwrap();
        let names: Vec<&str> = lamps.iter().map(|v| v.product.name.as_str()).collect();
        assert_eq!(names, ["Desk Lamp", "Floor Lamp"]);

        let in_stock_cheap = service
            .search(
                ProductFilter {
                    max_price: Some(price("100")),
                    in_stock: Some(true),
                    ..Default::default()
                },
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(in_stock_cheap.len(), 1);
        assert_eq!(in_stock_cheap[0].product.name, "Desk Lamp");

        let second_page = service
            .search(ProductFilter::default(), Some(2), Some(2))
            .await
            .unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].product.name, "Phone");
    }

    #[tokio::test]
    async fn test_update_stock_rejects_negative() {
        let service = service();
        let id = service
            .create(draft("Widget", "1.00", 1, 1), "a")
            .await
            .unwrap()
            .product
            .id;

        assert!(matches!(
            service.update_stock(id, -3, "a").await,
            Err(AppError::Validation { .. })
        ));
        let view = service.update_stock(id, 12, "a").await.unwrap();
        assert_eq!(view.product.stock, 12);
    }
}
