//! Payment gateway adapter.
//!
//! The API only ever asks a gateway to open an order for an amount; capture,
//! webhooks and refunds happen on the gateway side. [`RazorpayGateway`] talks
//! to the Razorpay orders API, anything else can implement
//! [`PaymentGateway`] (tests use an in-memory stub).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::config::PaymentConfig;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Payment gateway is not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error [{status}]: {message}")]
    Provider { status: u16, message: String },
}

pub type PaymentResult<T> = Result<T, PaymentError>;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GatewayOrderRequest {
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens an order on the gateway and returns its raw order object.
    async fn create_order(&self, request: &GatewayOrderRequest) -> PaymentResult<Value>;

    /// Publishable key handed to the client to complete checkout.
    fn key_id(&self) -> &str;

    fn currency(&self) -> &str;
}

/// Largest major-unit amount accepted for a single payment order.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// Converts a positive major-unit amount into minor units.
pub fn to_minor_units(amount: Option<f64>) -> PaymentResult<i64> {
    match amount {
        Some(value) if value.is_finite() && value > 0.0 && value <= MAX_AMOUNT => {
            Ok((value * 100.0).round() as i64)
        }
        _ => Err(PaymentError::InvalidAmount),
    }
}

pub fn new_receipt() -> String {
    format!("rcpt_{}", Uuid::new_v4().simple())
}

pub struct RazorpayGateway {
    config: PaymentConfig,
    client: Client,
}

impl RazorpayGateway {
    pub fn new(config: PaymentConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> PaymentResult<Value> {
        let url = format!("{}/v1/orders", self.config.api_base.trim_end_matches('/'));
        tracing::debug!(amount = request.amount, receipt = %request.receipt, "creating gateway order");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = body
                .pointer("/error/description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(PaymentError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    fn key_id(&self) -> &str {
        &self.config.key_id
    }

    fn currency(&self) -> &str {
        &self.config.currency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_is_converted_to_minor_units() {
        assert_eq!(to_minor_units(Some(499.0)).unwrap(), 49900);
        assert_eq!(to_minor_units(Some(19.99)).unwrap(), 1999);
    }

    #[test]
    fn non_positive_or_missing_amount_is_rejected() {
        for amount in [None, Some(0.0), Some(-5.0), Some(f64::NAN), Some(f64::INFINITY)] {
            assert!(matches!(
                to_minor_units(amount),
                Err(PaymentError::InvalidAmount)
            ));
        }
    }

    #[test]
    fn amount_above_ceiling_is_rejected() {
        assert_eq!(to_minor_units(Some(MAX_AMOUNT)).unwrap(), 100_000_000_000);
        for amount in [Some(MAX_AMOUNT + 1.0), Some(1e15), Some(f64::MAX)] {
            assert!(matches!(
                to_minor_units(amount),
                Err(PaymentError::InvalidAmount)
            ));
        }
    }

    #[test]
    fn receipts_are_unique_and_short() {
        let a = new_receipt();
        let b = new_receipt();
        assert_ne!(a, b);
        assert!(a.starts_with("rcpt_"));
        assert!(a.len() <= 40);
    }
}
