//! Payment Webhook Handling
//!
//! Verifies inbound payment-provider notifications and applies the
//! entitlement update for completed checkouts.
//!
//! Each delivery runs the same short state machine:
//!
//! ```text
//! Received → SignatureVerifying → Rejected            (400, nothing touched)
//!                              → Verified → Ignored   (200, wrong event type
//!                                                      or no user to credit)
//!                                         → Applied   (200, flag set)
//!                                         → Failed    (500, provider retries)
//! ```
//!
//! The signature is recomputed over the raw, unparsed body; anything that
//! re-serializes the payload upstream will break verification. Delivery is
//! at-least-once, so the apply step is a single idempotent write.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::entitlement::EntitlementStore;
use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of a signed timestamp (replay protection).
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// The one event type that flips an entitlement.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Metadata key carrying the correlated user, set at session creation and
/// echoed back verbatim by the provider.
pub const USER_ID_METADATA_KEY: &str = "userId";

/// Minimal event envelope. Everything beyond the type and the completed
/// session's metadata is provider detail this core does not consume.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub data: EventData,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub object: EventObject,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventObject {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Result of processing one verified delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Entitlement flag set for the correlated user
    Applied { user_id: String },

    /// Verified but produced no state change; acknowledged so the provider
    /// does not redeliver
    Ignored { event_type: String },
}

/// Verify a `t=...,v1=...` signature header against the raw request body.
///
/// Recomputes HMAC-SHA256 over `"{t}.{body}"` with the shared secret and
/// compares in constant time. Accepts the delivery if any `v1` candidate
/// matches and the timestamp is within tolerance.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str) -> Result<()> {
    let mut timestamp_raw = None;
    let mut candidates = Vec::new();

    for item in header.split(',') {
        match item.trim().split_once('=') {
            Some(("t", value)) => timestamp_raw = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp_raw =
        timestamp_raw.ok_or_else(|| PaymentError::Signature("missing timestamp".into()))?;
    let timestamp: i64 = timestamp_raw
        .parse()
        .map_err(|_| PaymentError::Signature("malformed timestamp".into()))?;

    if candidates.is_empty() {
        return Err(PaymentError::Signature("missing v1 signature".into()));
    }

    if (Utc::now().timestamp() - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(PaymentError::Signature(
            "timestamp outside tolerance".into(),
        ));
    }

    for candidate in candidates {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| PaymentError::Signature("invalid signing secret".into()))?;
        mac.update(timestamp_raw.as_bytes());
        mac.update(b".");
        mac.update(payload);

        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(PaymentError::Signature("signature mismatch".into()))
}

/// Entitlement synchronizer: one instance per process, stateless across
/// requests.
pub struct EntitlementSync {
    store: Arc<dyn EntitlementStore>,
    signing_secret: String,
}

impl EntitlementSync {
    pub fn new(store: Arc<dyn EntitlementStore>, signing_secret: impl Into<String>) -> Self {
        Self {
            store,
            signing_secret: signing_secret.into(),
        }
    }

    /// Verify the signature over the raw body, then parse the envelope.
    /// No state is touched on either failure.
    pub fn verify_and_parse(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent> {
        verify_signature(payload, signature, &self.signing_secret)?;

        serde_json::from_slice(payload).map_err(|e| PaymentError::Parse(e.to_string()))
    }

    /// Apply a verified event.
    ///
    /// Only `checkout.session.completed` acts; everything else is
    /// acknowledged untouched. Redelivery of the same completed session
    /// re-runs the same constant write and succeeds again.
    pub fn apply(&self, event: &WebhookEvent) -> Result<SyncOutcome> {
        if event.event_type != CHECKOUT_COMPLETED {
            tracing::debug!(event_type = %event.event_type, "ignoring webhook event");
            return Ok(SyncOutcome::Ignored {
                event_type: event.event_type.clone(),
            });
        }

        let session = event.data.object.id.as_deref().unwrap_or("unknown");

        let Some(user_id) = event.data.object.metadata.get(USER_ID_METADATA_KEY) else {
            // Anomalous but not an error: there is no safe user to credit,
            // and a retry would not produce one.
            tracing::warn!(session, "completed checkout without user metadata");
            return Ok(SyncOutcome::Ignored {
                event_type: event.event_type.clone(),
            });
        };

        self.store.set_entitlement(user_id, true)?;

        tracing::info!(user_id = %user_id, session, "entitlement activated");

        Ok(SyncOutcome::Applied {
            user_id: user_id.clone(),
        })
    }

    /// Run the full pipeline for one inbound delivery.
    pub fn process(&self, payload: &[u8], signature: &str) -> Result<SyncOutcome> {
        let event = self.verify_and_parse(payload, signature)?;
        self.apply(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::{MemoryEntitlementStore, UserAccount};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "whsec_test_secret";

    fn sign_at(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    fn sign(payload: &[u8], secret: &str) -> String {
        sign_at(payload, secret, Utc::now().timestamp())
    }

    fn completed_payload(user_id: Option<&str>) -> Vec<u8> {
        let metadata = match user_id {
            Some(id) => serde_json::json!({ "userId": id }),
            None => serde_json::json!({}),
        };
        serde_json::json!({
            "type": CHECKOUT_COMPLETED,
            "data": { "object": { "id": "cs_test_123", "metadata": metadata } }
        })
        .to_string()
        .into_bytes()
    }

    fn sync_with_user() -> (EntitlementSync, Arc<MemoryEntitlementStore>) {
        let store = Arc::new(MemoryEntitlementStore::new());
        store.insert_user(UserAccount::new("user-1", "ads@example.com"));
        (EntitlementSync::new(store.clone(), SECRET), store)
    }

    /// Store double that counts entitlement writes.
    struct RecordingStore {
        set_calls: AtomicUsize,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                set_calls: AtomicUsize::new(0),
            }
        }
    }

    impl EntitlementStore for RecordingStore {
        fn user(&self, _user_id: &str) -> Result<Option<UserAccount>> {
            Ok(None)
        }

        fn user_by_email(&self, _email: &str) -> Result<Option<UserAccount>> {
            Ok(None)
        }

        fn set_entitlement(&self, _user_id: &str, _active: bool) -> Result<()> {
            self.set_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Store double whose writes always fail.
    struct FailingStore;

    impl EntitlementStore for FailingStore {
        fn user(&self, _user_id: &str) -> Result<Option<UserAccount>> {
            Ok(None)
        }

        fn user_by_email(&self, _email: &str) -> Result<Option<UserAccount>> {
            Ok(None)
        }

        fn set_entitlement(&self, _user_id: &str, _active: bool) -> Result<()> {
            Err(PaymentError::Storage("connection lost".into()))
        }
    }

    #[test]
    fn test_completed_checkout_activates_user() {
        let (sync, store) = sync_with_user();
        let payload = completed_payload(Some("user-1"));

        let outcome = sync.process(&payload, &sign(&payload, SECRET)).unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Applied {
                user_id: "user-1".into()
            }
        );
        assert!(store.entitled("user-1").unwrap());
    }

    #[test]
    fn test_redelivery_is_idempotent() {
        let (sync, store) = sync_with_user();
        let payload = completed_payload(Some("user-1"));
        let signature = sign(&payload, SECRET);

        let first = sync.process(&payload, &signature).unwrap();
        let second = sync.process(&payload, &signature).unwrap();

        assert_eq!(first, second);
        assert!(store.entitled("user-1").unwrap());
    }

    #[test]
    fn test_tampered_payload_rejected_before_apply() {
        let store = Arc::new(RecordingStore::new());
        let sync = EntitlementSync::new(store.clone(), SECRET);

        let payload = completed_payload(Some("user-1"));
        let signature = sign(&payload, SECRET);

        let mut tampered = payload.clone();
        tampered[0] ^= 1;

        let result = sync.process(&tampered, &signature);
        assert!(matches!(result, Err(PaymentError::Signature(_))));
        assert_eq!(store.set_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (sync, _) = sync_with_user();
        let payload = completed_payload(Some("user-1"));

        let result = sync.process(&payload, &sign(&payload, "whsec_other"));
        assert!(matches!(result, Err(PaymentError::Signature(_))));
    }

    #[test]
    fn test_unrelated_event_acknowledged_without_side_effects() {
        let (sync, store) = sync_with_user();
        let payload = serde_json::json!({
            "type": "charge.refunded",
            "data": { "object": { "id": "ch_1", "metadata": { "userId": "user-1" } } }
        })
        .to_string()
        .into_bytes();

        let outcome = sync.process(&payload, &sign(&payload, SECRET)).unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Ignored {
                event_type: "charge.refunded".into()
            }
        );
        assert!(!store.entitled("user-1").unwrap());
    }

    #[test]
    fn test_completed_checkout_without_user_is_ignored() {
        let (sync, store) = sync_with_user();
        let payload = completed_payload(None);

        let outcome = sync.process(&payload, &sign(&payload, SECRET)).unwrap();

        assert!(matches!(outcome, SyncOutcome::Ignored { .. }));
        assert!(!store.entitled("user-1").unwrap());
    }

    #[test]
    fn test_old_timestamp_rejected() {
        let (sync, _) = sync_with_user();
        let payload = completed_payload(Some("user-1"));
        let stale = Utc::now().timestamp() - SIGNATURE_TOLERANCE_SECS - 60;

        let result = sync.process(&payload, &sign_at(&payload, SECRET, stale));
        assert!(matches!(result, Err(PaymentError::Signature(_))));
    }

    #[test]
    fn test_malformed_header_rejected() {
        let (sync, _) = sync_with_user();
        let payload = completed_payload(Some("user-1"));

        for header in ["", "v1=abcd", "t=notanumber,v1=abcd", "t=123"] {
            let result = sync.process(&payload, header);
            assert!(
                matches!(result, Err(PaymentError::Signature(_))),
                "header {header:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_valid_signature_over_garbage_is_parse_error() {
        let (sync, _) = sync_with_user();
        let payload = b"not json at all".to_vec();

        let result = sync.process(&payload, &sign(&payload, SECRET));
        assert!(matches!(result, Err(PaymentError::Parse(_))));
    }

    #[test]
    fn test_store_failure_surfaces_as_retryable() {
        let sync = EntitlementSync::new(Arc::new(FailingStore), SECRET);
        let payload = completed_payload(Some("user-1"));

        let result = sync.process(&payload, &sign(&payload, SECRET));
        match result {
            Err(err @ PaymentError::Storage(_)) => assert!(err.is_retryable()),
            other => panic!("expected storage error, got {other:?}"),
        }
    }
}
