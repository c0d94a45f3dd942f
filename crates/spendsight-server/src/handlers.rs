//! HTTP Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spendsight_campaigns::{
    Campaign, CampaignInput, CampaignStore, CampaignSummary, FREE_CAMPAIGN_LIMIT, SkippedRow,
    StoreError, duplicate_name, export_csv, import_csv, validate,
};
use spendsight_payments::{CheckoutProvider, CheckoutRequest, EntitlementStore, PaymentError};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checkout_configured: bool,
    pub webhook_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutBody {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutUrlResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignBody {
    pub user_id: String,
    pub name: String,
    pub spend: String,
    pub revenue: String,
    pub date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignBody {
    pub user_id: String,
    pub name: String,
    pub spend: String,
    pub revenue: String,
    pub date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Serialize)]
pub struct EntitlementResponse {
    pub active: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(message: impl Into<String>) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: message.into(),
    })
}

fn store_failure(e: StoreError) -> ApiError {
    tracing::error!(error = %e, "campaign store failure");
    (StatusCode::INTERNAL_SERVER_ERROR, error("Storage failure"))
}

fn entitlement_failure(e: PaymentError) -> ApiError {
    tracing::error!(error = %e, "entitlement store failure");
    (StatusCode::INTERNAL_SERVER_ERROR, error("Storage failure"))
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

// ============================================================================
// Health
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        checkout_configured: state.checkout.is_some(),
        webhook_configured: state.sync.is_some(),
    })
}

// ============================================================================
// Billing
// ============================================================================

/// Create a hosted checkout session for the premium subscription.
///
/// Redirect targets derive from the request origin, falling back to the
/// configured public base URL. Configuration is checked before any call
/// leaves the process.
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateCheckoutBody>,
) -> Result<Json<CheckoutUrlResponse>, ApiError> {
    let user_id = body.user_id.as_deref().map(str::trim).unwrap_or_default();
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();

    if user_id.is_empty() || email.is_empty() {
        return Err((StatusCode::BAD_REQUEST, error("Missing userId or email")));
    }

    let Some(checkout) = state.checkout.as_ref() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            error("Stripe not configured"),
        ));
    };

    let origin = request_origin(&headers, state.public_base_url.as_deref());

    let request = CheckoutRequest {
        user_id: user_id.to_string(),
        customer_email: email.to_string(),
        success_url: format!("{origin}/dashboard?checkout=success"),
        cancel_url: format!("{origin}/billing?checkout=cancelled"),
    };

    let session = checkout.create_session(request).await.map_err(|e| {
        tracing::error!(error = %e, "checkout session creation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, error(e.user_message()))
    })?;

    Ok(Json(CheckoutUrlResponse { url: session.url }))
}

/// Prefer the incoming request's origin; fall back to the configured public
/// base, then a sane local default.
fn request_origin(headers: &HeaderMap, public_base_url: Option<&str>) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .or_else(|| public_base_url.map(ToString::to_string))
        .unwrap_or_else(|| "http://localhost:3000".to_string())
}

/// Payment webhook endpoint.
///
/// The body must arrive as raw bytes: verification recomputes the signature
/// over exactly what was sent. 400 tells the provider the delivery was bad;
/// 500 tells it to retry later.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)> {
    let Some(sync) = state.sync.as_ref() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Webhook not configured".to_string(),
        ));
    };

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or((
            StatusCode::BAD_REQUEST,
            "Missing stripe-signature header".to_string(),
        ))?;

    match sync.process(&body, signature) {
        Ok(outcome) => {
            tracing::debug!(?outcome, "webhook processed");
            Ok(StatusCode::OK)
        }
        Err(e) if matches!(e, PaymentError::Signature(_) | PaymentError::Parse(_)) => {
            tracing::warn!(error = %e, "webhook rejected");
            Err((StatusCode::BAD_REQUEST, format!("Webhook Error: {e}")))
        }
        Err(e) => {
            tracing::error!(error = %e, "webhook apply failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Webhook processing failed".to_string(),
            ))
        }
    }
}

/// Read-only entitlement flag for a user
pub async fn entitlement_status(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<EntitlementResponse>, ApiError> {
    let active = state
        .entitlements
        .entitled(&query.user_id)
        .map_err(entitlement_failure)?;

    Ok(Json(EntitlementResponse { active }))
}

// ============================================================================
// Campaigns
// ============================================================================

/// Manual campaign entry: strict validation, duplicate-name rejection, and
/// the free-plan campaign cap for non-entitled users.
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(body): Json<CreateCampaignBody>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let input = CampaignInput {
        name: body.name,
        spend: body.spend,
        revenue: body.revenue,
        date: body.date,
    };
    let valid = validate(&input).map_err(|e| (StatusCode::BAD_REQUEST, error(e.to_string())))?;

    let existing = state.campaigns.list(&body.user_id).map_err(store_failure)?;

    if duplicate_name(&existing, &valid.name) {
        return Err((StatusCode::BAD_REQUEST, error("Duplicate campaign name")));
    }

    let entitled = state
        .entitlements
        .entitled(&body.user_id)
        .map_err(entitlement_failure)?;

    if !entitled && existing.len() >= FREE_CAMPAIGN_LIMIT {
        return Err((
            StatusCode::FORBIDDEN,
            error("Free plan limit reached. Upgrade to add more campaigns."),
        ));
    }

    let created = state
        .campaigns
        .bulk_insert(&[valid.owned_by(&body.user_id)])
        .map_err(store_failure)?;

    let Some(campaign) = created.into_iter().next() else {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, error("Storage failure")));
    };

    Ok((StatusCode::CREATED, Json(campaign)))
}

/// List a user's campaigns, newest date first
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    let mut campaigns = state.campaigns.list(&query.user_id).map_err(store_failure)?;
    campaigns.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(Json(campaigns))
}

/// Update a campaign's fields, recomputing ROI.
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCampaignBody>,
) -> Result<StatusCode, ApiError> {
    let input = CampaignInput {
        name: body.name,
        spend: body.spend,
        revenue: body.revenue,
        date: body.date,
    };
    let valid = validate(&input).map_err(|e| (StatusCode::BAD_REQUEST, error(e.to_string())))?;

    // Renaming onto another campaign's name is still a duplicate; the
    // campaign being updated itself is not.
    let others: Vec<Campaign> = state
        .campaigns
        .list(&body.user_id)
        .map_err(store_failure)?
        .into_iter()
        .filter(|c| c.id != id)
        .collect();

    if duplicate_name(&others, &valid.name) {
        return Err((StatusCode::BAD_REQUEST, error("Duplicate campaign name")));
    }

    match state.campaigns.update(id, &valid.into_patch()) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, error("Campaign not found")))
        }
        Err(e) => Err(store_failure(e)),
    }
}

/// Delete a campaign
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.campaigns.delete(id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, error("Campaign not found")))
        }
        Err(e) => Err(store_failure(e)),
    }
}

/// Bulk import campaigns from a CSV body.
///
/// Cell-level problems are coerced, not rejected; the whole batch lands in
/// one atomic insert or not at all.
pub async fn import_campaigns(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
    body: String,
) -> Result<Json<ImportResponse>, ApiError> {
    let batch = import_csv(&body, &query.user_id, &today())
        .map_err(|e| (StatusCode::BAD_REQUEST, error(e.to_string())))?;

    let created = state
        .campaigns
        .bulk_insert(&batch.rows)
        .map_err(store_failure)?;

    tracing::info!(
        user_id = %query.user_id,
        imported = created.len(),
        skipped = batch.skipped.len(),
        "csv import complete"
    );

    Ok(Json(ImportResponse {
        imported: created.len(),
        skipped: batch.skipped,
    }))
}

/// Export a user's campaigns as a downloadable CSV artifact.
pub async fn export_campaigns(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Response, ApiError> {
    let user = state
        .entitlements
        .user(&query.user_id)
        .map_err(entitlement_failure)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, error("User not found")))?;

    let mut campaigns = state.campaigns.list(&query.user_id).map_err(store_failure)?;
    campaigns.sort_by(|a, b| b.date.cmp(&a.date));

    let csv = export_csv(&campaigns, &user.email);
    let disposition = format!("attachment; filename=\"ad-spend-campaigns-{}.csv\"", today());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, disposition.as_str()),
        ],
        csv,
    )
        .into_response())
}

/// Aggregate spend/revenue/ROI figures for a user's campaign set
pub async fn campaign_summary(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<CampaignSummary>, ApiError> {
    let campaigns = state.campaigns.list(&query.user_id).map_err(store_failure)?;

    Ok(Json(CampaignSummary::of(&campaigns)))
}

// ============================================================================
// Tests
// ============================================================================
