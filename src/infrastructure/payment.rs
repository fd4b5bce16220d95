//! Simulated payment provider
//!
//! Approves every charge except for payment methods registered as declined.
//! Approved charges are kept in a ledger keyed by transaction id; a refund
//! moves the charge out of the ledger.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::ports::{PaymentGateway, PaymentResult};
use crate::domain::{DomainError, DomainResult, Money, UserId};

#[derive(Debug, Clone)]
pub struct Charge {
    pub user_id: UserId,
    pub amount: Money,
    pub payment_method_id: String,
}

#[derive(Default)]
pub struct SimulatedPaymentGateway {
    declined_methods: DashMap<String, String>,
    ledger: DashMap<String, Charge>,
    refunded: DashMap<String, Charge>,
}

impl SimulatedPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every charge against `payment_method_id` is declined with `reason`.
    pub fn decline_method(&self, payment_method_id: &str, reason: &str) {
        self.declined_methods
            .insert(payment_method_id.to_string(), reason.to_string());
    }

    pub fn charge_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn charge(&self, transaction_id: &str) -> Option<Charge> {
        self.ledger.get(transaction_id).map(|c| c.clone())
    }

    pub fn refund_count(&self) -> usize {
        self.refunded.len()
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn process_payment(
        &self,
        user_id: &UserId,
        amount: &Money,
        payment_method_id: &str,
    ) -> DomainResult<PaymentResult> {
        if payment_method_id.trim().is_empty() {
            return Ok(PaymentResult::declined("payment method is required"));
        }
        if let Some(reason) = self.declined_methods.get(payment_method_id) {
            warn!(
                user_id = %user_id,
                amount = %amount,
                payment_method_id,
                reason = %reason.as_str(),
                "Payment declined"
            );
            return Ok(PaymentResult::declined(reason.clone()));
        }

        let transaction_id = format!("txn_{}", Uuid::new_v4().simple());
        self.ledger.insert(
            transaction_id.clone(),
            Charge {
                user_id: user_id.clone(),
                amount: amount.clone(),
                payment_method_id: payment_method_id.to_string(),
            },
        );
        info!(
            user_id = %user_id,
            amount = %amount,
            transaction_id = %transaction_id,
            "Payment approved"
        );
        Ok(PaymentResult::approved(transaction_id))
    }

    async fn refund_payment(&self, transaction_id: &str) -> DomainResult<()> {
        let (transaction_id, charge) = self
            .ledger
            .remove(transaction_id)
            .ok_or_else(|| DomainError::not_found("Payment", "transaction_id", transaction_id))?;
        info!(
            user_id = %charge.user_id,
            amount = %charge.amount,
            transaction_id = %transaction_id,
            "Payment refunded"
        );
        self.refunded.insert(transaction_id, charge);
        Ok(())
    }
}
