//! Hosted Checkout Integration
//!
//! Creates provider-hosted checkout sessions for the recurring premium
//! subscription. The caller's user id rides along as opaque session
//! metadata; the provider echoes it back on the completion webhook and the
//! synchronizer uses it to credit the right account.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems,
};

use crate::error::{PaymentError, Result};
use crate::webhook::USER_ID_METADATA_KEY;

/// Bound on the outbound provider call; a hung request becomes a retryable
/// provider error rather than a stuck handler.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Narrow payment-provider boundary for checkout creation.
///
/// Implement this per processor; handlers and tests only see the trait.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Request a hosted checkout session and return its redirect target.
    async fn create_session(&self, request: CheckoutRequest) -> Result<HostedCheckout>;
}

/// Request to create a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Correlation id embedded as session metadata
    pub user_id: String,

    /// Customer email
    pub customer_email: String,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,
}

/// Result of creating a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HostedCheckout {
    /// Provider session id
    pub id: String,

    /// URL to redirect the user to
    pub url: String,
}

/// Stripe-backed checkout provider
pub struct StripeCheckout {
    client: Client,
    price_id: String,
}

impl StripeCheckout {
    /// Create a new Stripe checkout provider for a configured price.
    pub fn new(secret_key: &str, price_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(secret_key),
            price_id: price_id.into(),
        }
    }

    /// Create from environment variables.
    ///
    /// Both the secret key and the price id must be present; missing
    /// configuration is reported here, before any outbound call is ever
    /// attempted.
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let price_id = std::env::var("STRIPE_PRICE_ID")
            .map_err(|_| PaymentError::Config("STRIPE_PRICE_ID not set".into()))?;

        Ok(Self::new(&secret_key, price_id))
    }
}

#[async_trait]
impl CheckoutProvider for StripeCheckout {
    async fn create_session(&self, request: CheckoutRequest) -> Result<HostedCheckout> {
        let mut params = CreateCheckoutSession::new();
        params.customer_email = Some(&request.customer_email);
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.mode = Some(CheckoutSessionMode::Subscription);

        let mut metadata = HashMap::new();
        metadata.insert(USER_ID_METADATA_KEY.to_string(), request.user_id.clone());
        params.metadata = Some(metadata);

        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price: Some(self.price_id.clone()),
            ..Default::default()
        }]);

        let session = tokio::time::timeout(
            PROVIDER_TIMEOUT,
            StripeCheckoutSession::create(&self.client, params),
        )
        .await
        .map_err(|_| PaymentError::Provider("checkout session request timed out".into()))?
        .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Provider("no checkout URL returned".into()))?;

        Ok(HostedCheckout {
            id: session.id.to_string(),
            url,
        })
    }
}
