use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::payment_methods)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentMethod {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// Percentage, 0 to 100
    pub processing_fee: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::payment_methods)]
pub struct NewPaymentMethod {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub processing_fee: BigDecimal,
    pub created_at: DateTime<Utc>,
}
