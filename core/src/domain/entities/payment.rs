//! Platform fee checkout entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Payment options offered on the fee screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Upi,
    PhonePe,
    NetBanking,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [Self::Upi, Self::PhonePe, Self::NetBanking];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::PhonePe => "PhonePe",
            Self::NetBanking => "Net Banking",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '_', '-'], "").as_str() {
            "upi" => Ok(Self::Upi),
            "phonepe" => Ok(Self::PhonePe),
            "netbanking" => Ok(Self::NetBanking),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

/// Order handed to the payment gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOrder {
    /// `order_<uuid>`
    pub order_id: String,
    pub amount_paise: u64,
    pub currency: String,
    pub description: String,
    pub merchant_name: String,
    pub method: PaymentMethod,
    /// Payer's E.164 phone, prefilled on the checkout sheet
    pub contact: String,
}

impl CheckoutOrder {
    pub fn new_order_id() -> String {
        format!("order_{}", Uuid::new_v4().simple())
    }
}

/// Successful payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub order_id: String,
    pub amount_paise: u64,
    pub paid_at: DateTime<Utc>,
}
