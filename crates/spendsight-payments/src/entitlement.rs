//! Entitlement Store Boundary
//!
//! Durable per-user paid-access flag consumed and mutated by the webhook
//! synchronizer. The flag is never read from caller-supplied input; the
//! only path to `true` is a verified payment-completion event.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A user account as seen by the entitlement layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub email: String,

    /// Whether the user has paid access
    pub is_active: bool,
}

impl UserAccount {
    /// New account without entitlement. Activation only happens through the
    /// synchronizer.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            is_active: false,
        }
    }

    /// Paid access?
    pub fn is_premium(&self) -> bool {
        self.is_active
    }
}

/// Entitlement storage trait
pub trait EntitlementStore: Send + Sync {
    /// Look up a user by id
    fn user(&self, user_id: &str) -> Result<Option<UserAccount>>;

    /// Look up a user by email
    fn user_by_email(&self, email: &str) -> Result<Option<UserAccount>>;

    /// Set the paid-access flag. A single constant write: applying the same
    /// value twice must succeed and leave the same state (duplicate webhook
    /// deliveries race here, so no read-modify-write).
    fn set_entitlement(&self, user_id: &str, active: bool) -> Result<()>;

    /// Current flag value; `false` for unknown users
    fn entitled(&self, user_id: &str) -> Result<bool> {
        Ok(self.user(user_id)?.is_some_and(|u| u.is_premium()))
    }
}

/// In-memory entitlement store (for development and tests)
pub struct MemoryEntitlementStore {
    users: RwLock<HashMap<String, UserAccount>>,
}

impl Default for MemoryEntitlementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEntitlementStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Register an account. Account creation itself belongs to the auth
    /// layer; this is the seam it writes through.
    pub fn insert_user(&self, user: UserAccount) {
        let mut users = self.users.write().unwrap();
        users.insert(user.id.clone(), user);
    }
}

impl EntitlementStore for MemoryEntitlementStore {
    fn user(&self, user_id: &str) -> Result<Option<UserAccount>> {
        let users = self.users.read().unwrap();
        Ok(users.get(user_id).cloned())
    }

    fn user_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    fn set_entitlement(&self, user_id: &str, active: bool) -> Result<()> {
        let mut users = self.users.write().unwrap();

        match users.get_mut(user_id) {
            Some(user) => user.is_active = active,
            None => {
                // A completed payment must not be dropped just because the
                // account row arrives late; record the flag under the id.
                tracing::warn!(user_id, "entitlement set for unknown user");
                let mut user = UserAccount::new(user_id, "");
                user.is_active = active;
                users.insert(user_id.to_string(), user);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_starts_unentitled() {
        let user = UserAccount::new("user-1", "ads@example.com");
        assert!(!user.is_premium());
    }

    #[test]
    fn test_set_entitlement_flips_flag() {
        let store = MemoryEntitlementStore::new();
        store.insert_user(UserAccount::new("user-1", "ads@example.com"));

        assert!(!store.entitled("user-1").unwrap());
        store.set_entitlement("user-1", true).unwrap();
        assert!(store.entitled("user-1").unwrap());
    }

    #[test]
    fn test_set_entitlement_is_idempotent() {
        let store = MemoryEntitlementStore::new();
        store.insert_user(UserAccount::new("user-1", "ads@example.com"));

        store.set_entitlement("user-1", true).unwrap();
        store.set_entitlement("user-1", true).unwrap();
        assert!(store.entitled("user-1").unwrap());
    }

    #[test]
    fn test_lookup_by_email() {
        let store = MemoryEntitlementStore::new();
        store.insert_user(UserAccount::new("user-1", "ads@example.com"));

        let found = store.user_by_email("ads@example.com").unwrap().unwrap();
        assert_eq!(found.id, "user-1");
        assert!(store.user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_unknown_user_not_entitled() {
        let store = MemoryEntitlementStore::new();
        assert!(!store.entitled("missing").unwrap());
    }
}
