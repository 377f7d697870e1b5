//! Mock payment gateway
//!
//! Stands in for the hosted checkout sheet: records every order and settles it
//! with a scripted outcome.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use ob_core::domain::entities::{CheckoutOrder, PaymentReceipt};
use ob_core::errors::PaymentError;
use ob_core::services::PaymentGateway;

#[derive(Debug, Clone, Default)]
enum Outcome {
    #[default]
    Approve,
    Cancel,
    Decline { code: String, description: String },
}

/// Gateway that approves, cancels or declines every checkout
#[derive(Default)]
pub struct MockPaymentGateway {
    outcome: Outcome,
    orders: Mutex<Vec<CheckoutOrder>>,
}

impl MockPaymentGateway {
    /// Gateway that approves every payment
    pub fn approving() -> Self {
        Self::default()
    }

    /// Gateway where the user closes the checkout sheet
    pub fn cancelling() -> Self {
        Self {
            outcome: Outcome::Cancel,
            ..Default::default()
        }
    }

    /// Gateway that declines with the given gateway error
    pub fn declining(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Decline {
                code: code.into(),
                description: description.into(),
            },
            ..Default::default()
        }
    }

    /// Orders seen so far
    pub fn orders(&self) -> Vec<CheckoutOrder> {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn checkout(&self, order: &CheckoutOrder) -> Result<PaymentReceipt, PaymentError> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(order.clone());

        tracing::info!(
            target: "payment_gateway",
            provider = "mock",
            order_id = %order.order_id,
            amount_paise = order.amount_paise,
            method = %order.method,
            "Checkout opened (mock)"
        );

        match &self.outcome {
            Outcome::Approve => Ok(PaymentReceipt {
                payment_id: format!("pay_{}", Uuid::new_v4().simple()),
                order_id: order.order_id.clone(),
                amount_paise: order.amount_paise,
                paid_at: Utc::now(),
            }),
            Outcome::Cancel => Err(PaymentError::Cancelled),
            Outcome::Decline { code, description } => Err(PaymentError::Failed {
                code: code.clone(),
                description: description.clone(),
            }),
        }
    }
}
