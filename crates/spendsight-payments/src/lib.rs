//! # spendsight-payments
//!
//! Checkout initiation and entitlement synchronization for SpendSight.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐      ┌──────────────────┐      ┌─────────────┐
//! │  Your Site  │─────▶│  Stripe Hosted   │─────▶│  Your Site  │
//! │  (billing)  │      │  Checkout Page   │      │ (dashboard) │
//! └─────────────┘      └────────┬─────────┘      └─────────────┘
//!                               │ webhook (async, at-least-once)
//!                               ▼
//!                      ┌──────────────────┐      ┌──────────────────┐
//!                      │ EntitlementSync  │─────▶│ EntitlementStore │
//!                      │ verify + apply   │      │ is_active = true │
//!                      └──────────────────┘      └──────────────────┘
//! ```
//!
//! The user's id is embedded in the session as metadata at creation time
//! and read back from the completion event, so nothing client-supplied can
//! ever flip the flag. The redirect back to the site proves nothing; only
//! the verified webhook does.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spendsight_payments::{CheckoutProvider, CheckoutRequest, StripeCheckout};
//!
//! let stripe = StripeCheckout::from_env()?;
//! let session = stripe.create_session(CheckoutRequest {
//!     user_id: user.id.clone(),
//!     customer_email: user.email.clone(),
//!     success_url: format!("{origin}/dashboard?checkout=success"),
//!     cancel_url: format!("{origin}/billing?checkout=cancelled"),
//! }).await?;
//!
//! // Redirect user to: session.url
//! ```

mod checkout;
mod entitlement;
mod error;
mod webhook;

pub use checkout::{CheckoutProvider, CheckoutRequest, HostedCheckout, StripeCheckout};
pub use entitlement::{EntitlementStore, MemoryEntitlementStore, UserAccount};
pub use error::{PaymentError, Result};
pub use webhook::{
    CHECKOUT_COMPLETED, EntitlementSync, SyncOutcome, USER_ID_METADATA_KEY, WebhookEvent,
    verify_signature,
};
