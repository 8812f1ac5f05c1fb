//! Payment gateway port and the HMAC-signing in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Money;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors reported by a payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Signature does not match the order/payment pair.
    #[error("invalid payment signature")]
    InvalidSignature,

    /// Signature is not valid hex.
    #[error("malformed payment signature")]
    MalformedSignature,

    /// Gateway refused to open an order for this amount.
    #[error("invalid amount {0}")]
    InvalidAmount(i64),

    /// Gateway is unreachable or failed internally.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Gateway-side order opened for a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// External payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a gateway order for `amount`, sent as integer minor units.
    async fn create_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;

    /// Checks the signature the client received from the gateway after
    /// capturing `payment_id` against `gateway_order_id`.
    async fn verify_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError>;

    /// Public key id handed to clients for checkout.
    fn key_id(&self) -> &str;
}

#[derive(Debug, Default)]
struct GatewayState {
    orders: HashMap<String, GatewayOrder>,
    next_id: u32,
    fail_on_create: bool,
}

/// In-process gateway.
///
/// Issues sequential order ids (`order_0001`, …) and verifies signatures as
/// hex-encoded HMAC-SHA256 of `"{gateway_order_id}|{payment_id}"` keyed with
/// the shared secret.
#[derive(Debug, Clone)]
pub struct InMemoryPaymentGateway {
    key_id: String,
    secret: String,
    state: Arc<RwLock<GatewayState>>,
}

impl InMemoryPaymentGateway {
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
            state: Arc::new(RwLock::new(GatewayState::default())),
        }
    }

    /// Signature a real gateway would hand the client after capture.
    pub fn sign(&self, gateway_order_id: &str, payment_id: &str) -> String {
        self.mac()
            .map(|mut mac| {
                mac.update(signature_payload(gateway_order_id, payment_id).as_bytes());
                hex::encode(mac.finalize().into_bytes())
            })
            .unwrap_or_default()
    }

    /// Configures the gateway to fail on the next create calls.
    pub fn set_fail_on_create(&self, fail: bool) {
        if let Ok(mut state) = self.state.write() {
            state.fail_on_create = fail;
        }
    }

    /// Returns the number of gateway orders opened.
    pub fn order_count(&self) -> usize {
        self.state.read().map(|s| s.orders.len()).unwrap_or(0)
    }

    /// Looks up a gateway order by id.
    pub fn order(&self, gateway_order_id: &str) -> Option<GatewayOrder> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.orders.get(gateway_order_id).cloned())
    }

    fn mac(&self) -> Result<HmacSha256, GatewayError> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| GatewayError::Unavailable(format!("signing key rejected: {e}")))
    }
}

fn signature_payload(gateway_order_id: &str, payment_id: &str) -> String {
    format!("{gateway_order_id}|{payment_id}")
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        if amount.is_negative() {
            return Err(GatewayError::InvalidAmount(amount.minor()));
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| GatewayError::Unavailable("gateway state poisoned".to_string()))?;

        if state.fail_on_create {
            return Err(GatewayError::Unavailable("order creation refused".to_string()));
        }

        state.next_id += 1;
        let order = GatewayOrder {
            id: format!("order_{:04}", state.next_id),
            amount: amount.minor(),
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        };
        state.orders.insert(order.id.clone(), order.clone());

        Ok(order)
    }

    async fn verify_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError> {
        let expected = hex::decode(signature).map_err(|_| GatewayError::MalformedSignature)?;

        let mut mac = self.mac()?;
        mac.update(signature_payload(gateway_order_id, payment_id).as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| GatewayError::InvalidSignature)
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}
