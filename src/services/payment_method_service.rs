use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::models::{NewPaymentMethod, PaymentMethod};
use crate::repositories::{PaymentMethodRepository, PaymentRepository};

#[derive(Debug, Clone)]
pub struct PaymentMethodDraft {
    pub name: String,
    pub description: Option<String>,
    pub processing_fee: BigDecimal,
}

/// A payment method with how many payments used it.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethodView {
    pub method: PaymentMethod,
    pub payment_count: i64,
}

#[derive(Clone)]
pub struct PaymentMethodService {
    methods: Arc<dyn PaymentMethodRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl PaymentMethodService {
    pub fn new(
        methods: Arc<dyn PaymentMethodRepository>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self { methods, payments }
    }

    /// Active methods ordered by name.
    pub async fn list(&self) -> AppResult<Vec<PaymentMethodView>> {
        let counts = self.payments.count_by_method().await?;
        Ok(self
            .methods
            .list_active()
            .await?
            .into_iter()
            .map(|method| PaymentMethodView {
                payment_count: counts.get(&method.id).copied().unwrap_or(0),
                method,
            })
            .collect())
    }

    pub async fn get(&self, method_id: i32) -> AppResult<PaymentMethodView> {
        let method = self
            .methods
            .find_by_id(method_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(|| AppError::not_found("payment_method", "id", method_id))?;

        let payment_count = self
            .payments
            .count_by_method()
            .await?
            .get(&method.id)
            .copied()
            .unwrap_or(0);
        Ok(PaymentMethodView {
            method,
            payment_count,
        })
    }

    /// Fee is a percentage and must lie in `0..=100`.
    pub async fn create(&self, draft: PaymentMethodDraft) -> AppResult<PaymentMethodView> {
        if draft.processing_fee < BigDecimal::from(0)
            || draft.processing_fee > BigDecimal::from(100)
        {
            return Err(AppError::validation(
                "processing_fee",
                "Processing fee must be between 0 and 100",
            ));
        }

        let method = self
            .methods
            .create(NewPaymentMethod {
                name: draft.name,
                description: draft.description,
                is_active: true,
                processing_fee: draft.processing_fee,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(method_id = method.id, name = %method.name, "Payment method created");
        Ok(PaymentMethodView {
            method,
            payment_count: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::{MemoryPaymentMethodRepository, MemoryPaymentRepository};
    use std::str::FromStr;

    fn service() -> PaymentMethodService {
        PaymentMethodService::new(
            Arc::new(MemoryPaymentMethodRepository::seeded()),
            Arc::new(MemoryPaymentRepository::default()),
        )
    }

    #[tokio::test]
    async fn test_seeded_methods_listed_by_name() {
        let names: Vec<String> = service()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.method.name)
            .collect();
        assert_eq!(names, ["Apple Pay", "Bank Transfer", "Credit Card", "PayPal"]);
    }

    #[tokio::test]
    async fn test_create_checks_fee_range() {
        let service = service();
        let err = service
            .create(PaymentMethodDraft {
                name: "Crypto".to_string(),
                description: None,
                processing_fee: BigDecimal::from_str("100.5").unwrap(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "processing_fee"));

        let view = service
            .create(PaymentMethodDraft {
                name: "Crypto".to_string(),
                description: Some("Stablecoins".to_string()),
                processing_fee: BigDecimal::from_str("1.5").unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(view.payment_count, 0);
        assert_eq!(service.get(view.method.id).await.unwrap().method.name, "Crypto");
    }

    #[tokio::test]
    async fn test_unknown_method_not_found() {
        assert!(matches!(service().get(42).await, Err(AppError::NotFound { .. })));
    }
}
