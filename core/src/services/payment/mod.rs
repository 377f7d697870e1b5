//! One-time platform fee checkout

use async_trait::async_trait;
use std::sync::Arc;

use ob_shared::PaymentConfig;

use crate::domain::entities::payment::{CheckoutOrder, PaymentMethod, PaymentReceipt};
use crate::errors::PaymentError;

pub const PLATFORM_FEE_DESCRIPTION: &str = "Platform Fee Payment";

/// External payment gateway
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn checkout(&self, order: &CheckoutOrder) -> Result<PaymentReceipt, PaymentError>;
}

/// Collects the platform fee through a [`PaymentGateway`]
pub struct PlatformFeeCheckout {
    gateway: Arc<dyn PaymentGateway>,
    config: PaymentConfig,
}

impl PlatformFeeCheckout {
    pub fn new(gateway: Arc<dyn PaymentGateway>, config: PaymentConfig) -> Self {
        Self { gateway, config }
    }

    /// Fee as shown to the user, e.g. `₹100.00`
    pub fn amount_label(&self) -> String {
        self.config.display_amount()
    }

    pub fn build_order(&self, method: PaymentMethod, contact: &str) -> CheckoutOrder {
        CheckoutOrder {
            order_id: CheckoutOrder::new_order_id(),
            amount_paise: self.config.platform_fee_paise,
            currency: self.config.currency.clone(),
            description: PLATFORM_FEE_DESCRIPTION.to_string(),
            merchant_name: self.config.merchant_name.clone(),
            method,
            contact: contact.to_string(),
        }
    }

    /// Charge the platform fee; the user must have agreed to pay it
    pub async fn pay(
        &self,
        method: PaymentMethod,
        agreed: bool,
        contact: &str,
    ) -> Result<PaymentReceipt, PaymentError> {
        if !agreed {
            return Err(PaymentError::TermsNotAccepted);
        }

        let order = self.build_order(method, contact);
        tracing::info!(
            order_id = %order.order_id,
            amount_paise = order.amount_paise,
            method = %method,
            event = "payment_started",
            "Starting platform fee checkout"
        );

        match self.gateway.checkout(&order).await {
            Ok(receipt) => {
                tracing::info!(
                    order_id = %receipt.order_id,
                    payment_id = %receipt.payment_id,
                    event = "payment_succeeded",
                    "Platform fee paid"
                );
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(
                    order_id = %order.order_id,
                    error_code = err.code(),
                    error = %err,
                    event = "payment_failed",
                    "Platform fee checkout failed"
                );
                Err(err)
            }
        }
    }
}
