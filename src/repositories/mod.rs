//! Data access. Each entity has a narrow async trait with a PostgreSQL
//! implementation (diesel-async) and an in-memory one.

mod category_repo;
mod log_entry_repo;
pub mod memory;
mod payment_method_repo;
mod payment_repo;
mod product_repo;
mod user_repo;

use std::sync::Arc;

pub use category_repo::{CategoryRepository, PgCategoryRepository};
pub use log_entry_repo::{LogEntryRepository, PgLogEntryRepository};
pub use payment_method_repo::{PaymentMethodRepository, PgPaymentMethodRepository};
pub use payment_repo::{PaymentRepository, PgPaymentRepository};
pub use product_repo::{PgProductRepository, ProductRepository};
pub use user_repo::{PgUserRepository, UserRepository};

#[cfg(test)]
pub use payment_repo::MockPaymentRepository;
#[cfg(test)]
pub use user_repo::MockUserRepository;

use crate::db::AsyncDbPool;

/// One handle per entity store. Cloning copies `Arc`s.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub payment_methods: Arc<dyn PaymentMethodRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub logs: Arc<dyn LogEntryRepository>,
}

impl Repositories {
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            payment_methods: Arc::new(PgPaymentMethodRepository::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool.clone())),
            logs: Arc::new(PgLogEntryRepository::new(pool)),
        }
    }

    /// Empty stores except for the reference data the migrations seed.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUserRepository::default()),
            categories: Arc::new(memory::MemoryCategoryRepository::seeded()),
            products: Arc::new(memory::MemoryProductRepository::default()),
            payment_methods: Arc::new(memory::MemoryPaymentMethodRepository::seeded()),
            payments: Arc::new(memory::MemoryPaymentRepository::default()),
            logs: Arc::new(memory::MemoryLogEntryRepository::default()),
        }
    }
}

/// `%term%` for LIKE/ILIKE with the wildcard characters in `term` escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
