use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payment lifecycle. Only `Pending` may change, and only to a terminal state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(self, PaymentStatus::Pending) && next.is_terminal()
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Completed" => Ok(PaymentStatus::Completed),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("Unknown payment status: {}", other)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column!(PaymentStatus);

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Payment {
    pub id: i32,
    pub order_id: i32,
    pub amount: BigDecimal,
    pub payment_method_id: i32,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub user_id: i32,
    pub payment_date: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment {
    pub order_id: i32,
    pub amount: BigDecimal,
    pub payment_method_id: i32,
    pub status: PaymentStatus,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub user_id: i32,
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Column changes applied when a pending payment reaches a terminal state.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::payments)]
pub struct PaymentTransition {
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub order_id: Option<i32>,
    pub status: Option<PaymentStatus>,
    pub payment_method_id: Option<i32>,
    pub min_amount: Option<BigDecimal>,
    pub max_amount: Option<BigDecimal>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub user_id: Option<i32>,
}

impl PaymentFilter {
    pub fn matches(&self, payment: &Payment) -> bool {
        self.order_id.is_none_or(|v| v == payment.order_id)
            && self.status.is_none_or(|v| v == payment.status)
            && self
                .payment_method_id
                .is_none_or(|v| v == payment.payment_method_id)
            && self.min_amount.as_ref().is_none_or(|v| &payment.amount >= v)
            && self.max_amount.as_ref().is_none_or(|v| &payment.amount <= v)
            && self.from_date.is_none_or(|v| payment.payment_date >= v)
            && self.to_date.is_none_or(|v| payment.payment_date <= v)
            && self.user_id.is_none_or(|v| v == payment.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_one_directional() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Pending));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Completed".parse::<PaymentStatus>(), Ok(PaymentStatus::Completed));
        assert!("Refunded".parse::<PaymentStatus>().is_err());
    }
}
