//! Campaign Store Boundary
//!
//! Narrow persistence interface consumed by the ingestion pipeline and the
//! manual write paths. Implement it for a concrete backend; the in-memory
//! implementation here backs tests and development.

use std::sync::RwLock;

use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Campaign, CampaignPatch, NewCampaign};

/// Campaign persistence trait
pub trait CampaignStore: Send + Sync {
    /// Insert a batch as one atomic operation: either every row lands or
    /// none do. Returns the stored campaigns with their assigned ids.
    fn bulk_insert(&self, rows: &[NewCampaign]) -> Result<Vec<Campaign>, StoreError>;

    /// All campaigns owned by a user, in insertion order.
    fn list(&self, owner_id: &str) -> Result<Vec<Campaign>, StoreError>;

    /// Replace a campaign's mutable fields.
    fn update(&self, id: Uuid, patch: &CampaignPatch) -> Result<(), StoreError>;

    /// Remove a campaign.
    fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// In-memory campaign store (for development and tests)
pub struct MemoryCampaignStore {
    campaigns: RwLock<Vec<Campaign>>,
}

impl Default for MemoryCampaignStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCampaignStore {
    pub fn new() -> Self {
        Self {
            campaigns: RwLock::new(Vec::new()),
        }
    }
}

impl CampaignStore for MemoryCampaignStore {
    fn bulk_insert(&self, rows: &[NewCampaign]) -> Result<Vec<Campaign>, StoreError> {
        let created: Vec<Campaign> = rows
            .iter()
            .map(|row| Campaign {
                id: Uuid::new_v4(),
                owner_id: row.owner_id.clone(),
                name: row.name.clone(),
                spend: row.spend,
                revenue: row.revenue,
                roi: row.roi,
                date: row.date.clone(),
            })
            .collect();

        let mut campaigns = self.campaigns.write().unwrap();
        campaigns.extend(created.iter().cloned());

        Ok(created)
    }

    fn list(&self, owner_id: &str) -> Result<Vec<Campaign>, StoreError> {
        let campaigns = self.campaigns.read().unwrap();
        Ok(campaigns
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn update(&self, id: Uuid, patch: &CampaignPatch) -> Result<(), StoreError> {
        let mut campaigns = self.campaigns.write().unwrap();

        let Some(campaign) = campaigns.iter_mut().find(|c| c.id == id) else {
            return Err(StoreError::NotFound(id));
        };

        campaign.name = patch.name.clone();
        campaign.spend = patch.spend;
        campaign.revenue = patch.revenue;
        campaign.roi = patch.roi;
        campaign.date = patch.date.clone();

        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut campaigns = self.campaigns.write().unwrap();

        let Some(position) = campaigns.iter().position(|c| c.id == id) else {
            return Err(StoreError::NotFound(id));
        };

        campaigns.remove(position);
        Ok(())
    }
}
