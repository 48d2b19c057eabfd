//! HTTP request handlers, one module per resource.

pub mod auth;
pub mod categories;
pub mod health;
pub mod logs;
pub mod payment_methods;
pub mod payments;
pub mod products;
pub mod users;
