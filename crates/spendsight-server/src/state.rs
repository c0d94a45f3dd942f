//! Application State

use std::sync::Arc;

use spendsight_campaigns::CampaignStore;
use spendsight_payments::{CheckoutProvider, EntitlementStore, EntitlementSync};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Campaign persistence
    pub campaigns: Arc<dyn CampaignStore>,

    /// User entitlement persistence
    pub entitlements: Arc<dyn EntitlementStore>,

    /// Checkout provider (None if not configured)
    pub checkout: Option<Arc<dyn CheckoutProvider>>,

    /// Webhook synchronizer (None if no signing secret configured)
    pub sync: Option<Arc<EntitlementSync>>,

    /// Configured fallback for checkout redirect origins
    pub public_base_url: Option<String>,
}
