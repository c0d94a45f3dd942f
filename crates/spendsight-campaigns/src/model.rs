//! Domain Models
//!
//! Core data types for campaign tracking. Uses `rust_decimal` for all
//! monetary values - never use f64 for money!

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How many campaigns a non-entitled user may hold.
pub const FREE_CAMPAIGN_LIMIT: usize = 3;

/// One tracked marketing effort.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Campaign {
    /// Opaque identifier, assigned by the store at insert
    pub id: Uuid,

    /// Owning user
    pub owner_id: String,

    /// Display name, unique per owner (case-insensitive)
    pub name: String,

    /// Money spent on the campaign
    pub spend: Decimal,

    /// Revenue attributed to the campaign
    pub revenue: Decimal,

    /// Return on investment as a ratio. Derived from spend and revenue on
    /// every write, never settable on its own.
    pub roi: Decimal,

    /// Calendar date as `YYYY-MM-DD`, stored verbatim
    pub date: String,
}

/// A fully materialized campaign row awaiting insert.
///
/// Produced by the manual-entry validator or the CSV import pipeline; the
/// store assigns the id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewCampaign {
    pub owner_id: String,
    pub name: String,
    pub spend: Decimal,
    pub revenue: Decimal,
    pub roi: Decimal,
    pub date: String,
}

/// Replacement fields for an explicit campaign update.
///
/// Carries the recomputed `roi` so the store never derives it itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignPatch {
    pub name: String,
    pub spend: Decimal,
    pub revenue: Decimal,
    pub roi: Decimal,
    pub date: String,
}

/// Aggregate figures over a user's campaign set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub total_spend: Decimal,
    pub total_revenue: Decimal,
    pub net_profit: Decimal,

    /// Mean ROI across campaigns, expressed as a percentage
    pub average_roi_pct: Decimal,
}

impl CampaignSummary {
    pub fn of(campaigns: &[Campaign]) -> Self {
        let total_spend: Decimal = campaigns.iter().map(|c| c.spend).sum();
        let total_revenue: Decimal = campaigns.iter().map(|c| c.revenue).sum();

        let average_roi_pct = if campaigns.is_empty() {
            Decimal::ZERO
        } else {
            let total_roi: Decimal = campaigns.iter().map(|c| c.roi).sum();
            total_roi / Decimal::from(campaigns.len()) * Decimal::ONE_HUNDRED
        };

        Self {
            total_spend,
            total_revenue,
            net_profit: total_revenue - total_spend,
            average_roi_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn campaign(spend: Decimal, revenue: Decimal, roi: Decimal) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            owner_id: "user-1".into(),
            name: "Test".into(),
            spend,
            revenue,
            roi,
            date: "2025-06-01".into(),
        }
    }

    #[test]
    fn test_summary_totals() {
        let campaigns = vec![
            campaign(dec!(100), dec!(150), dec!(0.5)),
            campaign(dec!(200), dec!(150), dec!(-0.25)),
        ];

        let summary = CampaignSummary::of(&campaigns);
        assert_eq!(summary.total_spend, dec!(300));
        assert_eq!(summary.total_revenue, dec!(300));
        assert_eq!(summary.net_profit, dec!(0));
        assert_eq!(summary.average_roi_pct, dec!(12.5));
    }

    #[test]
    fn test_summary_empty() {
        let summary = CampaignSummary::of(&[]);
        assert_eq!(summary.total_spend, Decimal::ZERO);
        assert_eq!(summary.average_roi_pct, Decimal::ZERO);
    }
}
