use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const AUTH_TAG: &str = "Auth";
pub const USER_TAG: &str = "Users";
pub const PRODUCT_TAG: &str = "Products";
pub const CATEGORY_TAG: &str = "Categories";
pub const PAYMENT_TAG: &str = "Payments";
pub const PAYMENT_METHOD_TAG: &str = "PaymentMethods";
pub const LOG_TAG: &str = "Logs";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront",
        description = "Users, products, payments and logs services",
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::error::ValidationFieldError,
            crate::models::Role,
            crate::models::PaymentStatus,
            crate::models::LogLevel,
            crate::models::ServiceName,
        )
    ),
    tags(
        (name = AUTH_TAG, description = "Registration and login"),
        (name = USER_TAG, description = "Profiles and user administration"),
        (name = PRODUCT_TAG, description = "Product catalogue"),
        (name = CATEGORY_TAG, description = "Product categories"),
        (name = PAYMENT_TAG, description = "Payments and their lifecycle"),
        (name = PAYMENT_METHOD_TAG, description = "Accepted payment methods"),
        (name = LOG_TAG, description = "Central log store and reports"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer Token Authentication"))
                        .build(),
                ),
            )
        }
    }
}
