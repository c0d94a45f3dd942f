//! # spendsight-campaigns
//!
//! Campaign tracking domain for SpendSight: validation, ROI computation,
//! CSV ingestion/export, and the campaign store boundary.
//!
//! ## Two write paths, two strictness levels
//!
//! Manual entry and batch import intentionally disagree about how much bad
//! input they tolerate:
//!
//! ```text
//! ┌──────────────┐   validate() + duplicate_name()   ┌───────────────┐
//! │ Manual entry │──────────── strict ──────────────▶│               │
//! └──────────────┘                                   │ CampaignStore │
//! ┌──────────────┐   import_csv() coercions          │  bulk_insert  │
//! │  CSV import  │─────────── lenient ──────────────▶│               │
//! └──────────────┘                                   └───────────────┘
//! ```
//!
//! Manual entry rejects short names, unparseable numbers, missing dates,
//! and duplicate names. Import substitutes defaults for all of those and
//! never checks duplicates. Both paths derive ROI through the same policy:
//! zero spend means zero ROI, otherwise `(revenue - spend) / spend`.

pub mod error;
pub mod ingest;
pub mod model;
pub mod store;
pub mod validate;

pub use error::{IngestError, StoreError, ValidationError};
pub use ingest::{EXPORT_HEADER, ImportBatch, SkippedRow, UNNAMED_CAMPAIGN, export_csv, import_csv};
pub use model::{
    Campaign, CampaignPatch, CampaignSummary, FREE_CAMPAIGN_LIMIT, NewCampaign,
};
pub use store::{CampaignStore, MemoryCampaignStore};
pub use validate::{
    CampaignInput, MIN_NAME_LEN, ValidCampaign, duplicate_name, roi, validate,
};
