//! Outbound ports: interfaces for talking to external systems
//!
//! [`PaymentGateway`] decouples the booking use cases from the concrete
//! payment provider. The simulated implementation lives in
//! [`infrastructure::payment`](crate::infrastructure::payment).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainResult, Money, UserId};

/// Outcome of a charge attempt.
///
/// A declined charge is a normal result (`success == false`), not an `Err`.
/// `Err` is reserved for the gateway being unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub error: Option<String>,
}

impl PaymentResult {
    pub fn approved(transaction_id: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id.into()),
            error: None,
        }
    }

    pub fn declined(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn process_payment(
        &self,
        user_id: &UserId,
        amount: &Money,
        payment_method_id: &str,
    ) -> DomainResult<PaymentResult>;

    /// Reverse an approved charge.
    async fn refund_payment(&self, transaction_id: &str) -> DomainResult<()>;
}

pub type SharedPaymentGateway = Arc<dyn PaymentGateway>;
