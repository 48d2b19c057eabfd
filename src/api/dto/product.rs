//! Product DTOs.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::money;
use crate::models::ProductFilter;
use crate::services::{ProductChanges, ProductDraft, ProductView};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[schema(example = "Desk Lamp", max_length = 100)]
    pub name: String,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
    /// Must be at least 0.01
    #[schema(value_type = f64, example = 24.99, minimum = 0.01)]
    pub price: BigDecimal,
    #[schema(example = 1)]
    pub category_id: i32,
    #[validate(length(max = 50, message = "SKU cannot exceed 50 characters"))]
    pub sku: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    #[validate(length(max = 255, message = "Image URL cannot exceed 255 characters"))]
    pub image_url: Option<String>,
}

impl CreateProductRequest {
    pub fn into_draft(self) -> ProductDraft {
        ProductDraft {
            name: self.name,
            description: self.description,
            price: money(self.price),
            category_id: self.category_id,
            sku: self.sku,
            stock: self.stock,
            image_url: self.image_url,
        }
    }
}

/// Partial update; omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
    #[schema(value_type = Option<f64>, minimum = 0.01)]
    pub price: Option<BigDecimal>,
    pub category_id: Option<i32>,
    #[validate(length(max = 50, message = "SKU cannot exceed 50 characters"))]
    pub sku: Option<String>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
    #[validate(length(max = 255, message = "Image URL cannot exceed 255 characters"))]
    pub image_url: Option<String>,
}

impl UpdateProductRequest {
    pub fn into_changes(self) -> ProductChanges {
        ProductChanges {
            name: self.name,
            description: self.description,
            price: self.price.map(money),
            category_id: self.category_id,
            sku: self.sku,
            stock: self.stock,
            image_url: self.image_url,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateStockRequest {
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    #[schema(example = 25, minimum = 0)]
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ProductSearchQuery {
    /// Case-insensitive match on name or description
    pub search: Option<String>,
    pub category_id: Option<i32>,
    #[param(value_type = Option<f64>)]
    pub min_price: Option<BigDecimal>,
    #[param(value_type = Option<f64>)]
    pub max_price: Option<BigDecimal>,
    pub in_stock: Option<bool>,
    /// One-based page number
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: Option<u32>,
    /// Defaults to 10, capped at 100
    #[validate(range(min = 1, message = "Page size must be at least 1"))]
    #[param(minimum = 1, maximum = 100, example = 10)]
    pub page_size: Option<u32>,
}

impl ProductSearchQuery {
    pub fn into_filter(self) -> (ProductFilter, Option<u32>, Option<u32>) {
        let filter = ProductFilter {
            search: self.search.filter(|s| !s.trim().is_empty()),
            category_id: self.category_id,
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock: self.in_stock,
        };
        (filter, self.page, self.page_size)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "24.99")]
    pub price: BigDecimal,
    pub category_id: i32,
    pub category_name: Option<String>,
    pub sku: Option<String>,
    pub stock: i32,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_by: Option<String>,
}

impl From<ProductView> for ProductResponse {
    fn from(view: ProductView) -> Self {
        let product = view.product;
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            category_id: product.category_id,
            category_name: view.category_name,
            sku: product.sku,
            stock: product.stock,
            is_active: product.is_active,
            image_url: product.image_url,
            created_at: product.created_at,
            updated_at: product.updated_at,
            created_by: product.created_by,
            updated_by: product.updated_by,
        }
    }
}
