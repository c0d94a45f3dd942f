//! SpendSight HTTP Server
//!
//! Axum-based service exposing campaign tracking, CSV import/export, and
//! Stripe billing endpoints. Stores and the payment provider are built at
//! startup and injected through [`state::AppState`]; nothing ambient.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spendsight_campaigns::MemoryCampaignStore;
use spendsight_payments::{CheckoutProvider, EntitlementSync, MemoryEntitlementStore, StripeCheckout};

use crate::handlers::{
    campaign_summary, create_campaign, create_checkout, delete_campaign, entitlement_status,
    export_campaigns, health_check, import_campaigns, list_campaigns, stripe_webhook,
    update_campaign,
};
use crate::state::AppState;

fn app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))
        // Billing
        .route("/api/checkout", post(create_checkout))
        .route("/webhook/stripe", post(stripe_webhook))
        .route("/api/entitlement", get(entitlement_status))
        // Campaigns
        .route("/api/campaigns", post(create_campaign).get(list_campaigns))
        .route("/api/campaigns/import", post(import_campaigns))
        .route("/api/campaigns/export", get(export_campaigns))
        .route("/api/campaigns/summary", get(campaign_summary))
        .route(
            "/api/campaigns/{id}",
            put(update_campaign).delete(delete_campaign),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Stores. The memory implementations back development; swap in durable
    // implementations of the same traits for production.
    let campaigns = Arc::new(MemoryCampaignStore::new());
    let entitlements = Arc::new(MemoryEntitlementStore::new());

    // Checkout side: requires secret key and price id, checked up front
    let checkout: Option<Arc<dyn CheckoutProvider>> = match StripeCheckout::from_env() {
        Ok(provider) => {
            tracing::info!("✓ Stripe checkout configured");
            Some(Arc::new(provider))
        }
        Err(e) => {
            tracing::warn!("⚠ Stripe checkout disabled: {e}");
            tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_PRICE_ID in .env");
            None
        }
    };

    // Webhook side: requires the signing secret
    let sync = match std::env::var("STRIPE_WEBHOOK_SECRET") {
        Ok(secret) => {
            tracing::info!("✓ Stripe webhook configured");
            Some(Arc::new(EntitlementSync::new(entitlements.clone(), secret)))
        }
        Err(_) => {
            tracing::warn!("⚠ Stripe webhook disabled - set STRIPE_WEBHOOK_SECRET in .env");
            None
        }
    };

    let state = AppState {
        campaigns,
        entitlements: entitlements.clone(),
        checkout,
        sync,
        public_base_url: std::env::var("PUBLIC_BASE_URL").ok(),
    };

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 SpendSight server running on http://{}", addr);
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                - Health check");
    tracing::info!("  POST /api/checkout          - Create Stripe checkout session");
    tracing::info!("  POST /webhook/stripe        - Stripe payment webhook");
    tracing::info!("  GET  /api/entitlement       - Entitlement flag for a user");
    tracing::info!("  POST /api/campaigns         - Add a campaign");
    tracing::info!("  GET  /api/campaigns         - List campaigns");
    tracing::info!("  PUT  /api/campaigns/{{id}}    - Update a campaign");
    tracing::info!("  DEL  /api/campaigns/{{id}}    - Delete a campaign");
    tracing::info!("  POST /api/campaigns/import  - Bulk import from CSV");
    tracing::info!("  GET  /api/campaigns/export  - Export to CSV");
    tracing::info!("  GET  /api/campaigns/summary - Aggregate figures");
    tracing::info!("");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
