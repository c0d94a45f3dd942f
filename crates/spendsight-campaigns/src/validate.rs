//! Campaign Validation
//!
//! Pure functions for validating and normalizing a single manually entered
//! campaign record. Nothing here touches a store: the duplicate-name check
//! runs against a caller-supplied campaign set so the same function serves
//! both the manual-entry and batch paths.

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::model::{Campaign, CampaignPatch, NewCampaign};

/// Minimum campaign name length after trimming.
pub const MIN_NAME_LEN: usize = 3;

/// Raw form fields for one campaign, exactly as submitted.
#[derive(Clone, Debug, Default)]
pub struct CampaignInput {
    pub name: String,
    pub spend: String,
    pub revenue: String,
    pub date: String,
}

/// A validated, normalized campaign with its derived ROI.
#[derive(Clone, Debug)]
pub struct ValidCampaign {
    pub name: String,
    pub spend: Decimal,
    pub revenue: Decimal,
    pub roi: Decimal,
    pub date: String,
}

impl ValidCampaign {
    /// Attach an owner, producing an insertable row.
    pub fn owned_by(self, owner_id: impl Into<String>) -> NewCampaign {
        NewCampaign {
            owner_id: owner_id.into(),
            name: self.name,
            spend: self.spend,
            revenue: self.revenue,
            roi: self.roi,
            date: self.date,
        }
    }

    /// Turn the validated fields into an update patch.
    pub fn into_patch(self) -> CampaignPatch {
        CampaignPatch {
            name: self.name,
            spend: self.spend,
            revenue: self.revenue,
            roi: self.roi,
            date: self.date,
        }
    }
}

/// Validate and normalize one campaign record.
///
/// The date is required but otherwise accepted as an opaque string; calendar
/// validity is not checked. Known gap, kept as-is.
pub fn validate(input: &CampaignInput) -> Result<ValidCampaign, ValidationError> {
    let name = input.name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::InvalidName);
    }

    let spend = parse_decimal(&input.spend, "spend")?;
    let revenue = parse_decimal(&input.revenue, "revenue")?;

    let date = input.date.trim();
    if date.is_empty() {
        return Err(ValidationError::InvalidDate);
    }

    Ok(ValidCampaign {
        name: name.to_string(),
        spend,
        revenue,
        roi: roi(spend, revenue),
        date: date.to_string(),
    })
}

/// Return on investment as a ratio.
///
/// Zero spend yields exactly zero, regardless of revenue. Callers depend on
/// this convention; do not substitute infinity or an error.
pub fn roi(spend: Decimal, revenue: Decimal) -> Decimal {
    if spend == Decimal::ZERO {
        Decimal::ZERO
    } else {
        (revenue - spend) / spend
    }
}

/// Case-insensitive duplicate-name check against an in-scope campaign set.
///
/// Applied by the manual write paths only; the import pipeline deliberately
/// skips it.
pub fn duplicate_name(existing: &[Campaign], name: &str) -> bool {
    let target = name.trim().to_lowercase();
    existing.iter().any(|c| c.name.to_lowercase() == target)
}

fn parse_decimal(value: &str, field: &'static str) -> Result<Decimal, ValidationError> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|_| ValidationError::InvalidNumber { field })
}
