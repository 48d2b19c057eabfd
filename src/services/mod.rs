//! Service layer for business logic operations.
//!
//! Services encapsulate business rules and coordinate between
//! repositories and handlers.

mod category_service;
mod log_service;
mod payment_method_service;
mod payment_service;
mod product_service;
mod user_service;

pub use category_service::{CategoryChanges, CategoryDraft, CategoryService, CategoryView};
pub use log_service::{CleanupOutcome, LogDraft, LogService, LogStat, LogSummary};
pub use payment_method_service::{PaymentMethodDraft, PaymentMethodService, PaymentMethodView};
pub use payment_service::{PaymentDraft, PaymentService, PaymentView, RevenueSummary};
pub use product_service::{ProductChanges, ProductDraft, ProductService, ProductView};
pub use user_service::{ProfileChanges, Registration, Session, UserService};

use crate::auth::TokenCodec;
use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// Held in the Axum application state; cloning copies `Arc`s.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub categories: CategoryService,
    pub products: ProductService,
    pub payment_methods: PaymentMethodService,
    pub payments: PaymentService,
    pub logs: LogService,
}

impl Services {
    pub fn new(repos: Repositories, tokens: TokenCodec) -> Self {
        Self {
            users: UserService::new(repos.users, tokens),
            categories: CategoryService::new(repos.categories.clone(), repos.products.clone()),
            products: ProductService::new(repos.products, repos.categories.clone()),
            payment_methods: PaymentMethodService::new(
                repos.payment_methods.clone(),
                repos.payments.clone(),
            ),
            payments: PaymentService::new(repos.payments, repos.payment_methods),
            logs: LogService::new(repos.logs),
        }
    }
}
