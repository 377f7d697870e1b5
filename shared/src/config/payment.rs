//! Platform fee payment configuration

use serde::{Deserialize, Serialize};

/// Settings for the one-time platform fee
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentConfig {
    /// Fee in the smallest currency unit (paise)
    #[serde(default = "default_platform_fee")]
    pub platform_fee_paise: u64,

    /// ISO currency code
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Merchant name shown on the checkout sheet
    #[serde(default = "default_merchant_name")]
    pub merchant_name: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            platform_fee_paise: default_platform_fee(),
            currency: default_currency(),
            merchant_name: default_merchant_name(),
        }
    }
}

impl PaymentConfig {
    /// Fee formatted for display (e.g., ₹100.00)
    pub fn display_amount(&self) -> String {
        let symbol = if self.currency == "INR" { "₹" } else { "" };
        format!(
            "{}{}.{:02}",
            symbol,
            self.platform_fee_paise / 100,
            self.platform_fee_paise % 100
        )
    }
}

fn default_platform_fee() -> u64 {
    10_000 // ₹100.00
}

fn default_currency() -> String {
    String::from("INR")
}

fn default_merchant_name() -> String {
    String::from("Onboard")
}
