//! Database models for every service.
//!
//! Enumerations are stored as `VARCHAR` columns; `text_column!` wires their
//! `as_str`/`FromStr` pair into diesel's `ToSql`/`FromSql` for PostgreSQL.

/// Implements `ToSql<Text, Pg>` and `FromSql<Text, Pg>` through the type's
/// `as_str()` and `FromStr` implementations.
macro_rules! text_column {
    ($ty:ty) => {
        impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg> for $ty {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
            ) -> diesel::serialize::Result {
                use std::io::Write;
                out.write_all(self.as_str().as_bytes())?;
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg> for $ty {
            fn from_sql(
                bytes: <diesel::pg::Pg as diesel::backend::Backend>::RawValue<'_>,
            ) -> diesel::deserialize::Result<Self> {
                let raw = <String as diesel::deserialize::FromSql<
                    diesel::sql_types::Text,
                    diesel::pg::Pg,
                >>::from_sql(bytes)?;
                raw.parse::<$ty>().map_err(|e| e.to_string().into())
            }
        }
    };
}

pub mod category;
pub mod log_entry;
pub mod payment;
pub mod payment_method;
pub mod product;
pub mod user;

pub use category::{Category, NewCategory, UpdateCategory};
pub use log_entry::{LogActivity, LogEntry, LogFilter, LogLevel, NewLogEntry, ServiceName};
pub use payment::{NewPayment, Payment, PaymentFilter, PaymentStatus, PaymentTransition};
pub use payment_method::{NewPaymentMethod, PaymentMethod};
pub use product::{NewProduct, Product, ProductFilter, UpdateProduct};
pub use user::{NewUser, Role, UpdateUser, User};

/// Offset/limit window applied to list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

impl Window {
    /// First `limit` rows.
    pub fn first(limit: i64) -> Self {
        Self { offset: 0, limit }
    }

    /// One-based page of `page_size` rows.
    pub fn page(page: u32, page_size: u32) -> Self {
        let page = page.max(1) as i64;
        let page_size = page_size.max(1) as i64;
        Self {
            offset: (page - 1) * page_size,
            limit: page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_page_offsets() {
        assert_eq!(Window::page(1, 10), Window { offset: 0, limit: 10 });
        assert_eq!(Window::page(3, 25), Window { offset: 50, limit: 25 });
        assert_eq!(Window::page(0, 0), Window { offset: 0, limit: 1 });
        assert_eq!(Window::first(500), Window { offset: 0, limit: 500 });
    }
}
