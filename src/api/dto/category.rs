use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::services::{CategoryChanges, CategoryDraft, CategoryView};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[schema(example = "Garden", max_length = 100)]
    pub name: String,
    #[validate(length(max = 300, message = "Description cannot exceed 300 characters"))]
    pub description: Option<String>,
}

impl CreateCategoryRequest {
    pub fn into_draft(self) -> CategoryDraft {
        CategoryDraft {
            name: self.name,
            description: self.description,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 300, message = "Description cannot exceed 300 characters"))]
    pub description: Option<String>,
}

impl UpdateCategoryRequest {
    pub fn into_changes(self) -> CategoryChanges {
        CategoryChanges {
            name: self.name,
            description: self.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// Active products in this category
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CategoryView> for CategoryResponse {
    fn from(view: CategoryView) -> Self {
        Self {
            id: view.category.id,
            name: view.category.name,
            description: view.category.description,
            is_active: view.category.is_active,
            product_count: view.product_count,
            created_at: view.category.created_at,
            updated_at: view.category.updated_at,
        }
    }
}
