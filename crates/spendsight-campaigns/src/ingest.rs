//! CSV Ingestion Pipeline
//!
//! Bulk import of campaign rows from untrusted CSV text, and the inverse
//! path serializing stored campaigns back to CSV.
//!
//! The import path is deliberately more permissive than manual entry:
//! malformed money cells become `0`, a blank name becomes
//! `"Unnamed Campaign"`, and a blank date becomes the import-time date.
//! Minimum-length and duplicate-name rules do not apply here. Keep the
//! asymmetry; the strict rules live in [`crate::validate`] and only guard
//! the manual paths.
//!
//! Cells are split on bare commas, matching the unquoted artifact this
//! pipeline itself exports.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::model::{Campaign, NewCampaign};
use crate::validate::roi;

/// Exact header row of the exported artifact.
pub const EXPORT_HEADER: &str = "Campaign Name,Ad Spend,Revenue,ROI (%),Date,User Email";

/// Fallback name for rows imported without one.
pub const UNNAMED_CAMPAIGN: &str = "Unnamed Campaign";

/// Result of parsing one CSV batch: the materialized rows ready for a
/// single bulk insert, plus a report of rows that could not be read.
#[derive(Clone, Debug)]
pub struct ImportBatch {
    pub rows: Vec<NewCampaign>,
    pub skipped: Vec<SkippedRow>,
}

/// One structurally unreadable row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number in the submitted text
    pub line: usize,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Column {
    Name,
    Spend,
    Revenue,
    Date,
    Ignored,
}

/// Map a header cell to its column role.
///
/// Matched on the lower-cased, trimmed form. The export header spellings
/// are accepted as aliases so an exported artifact imports cleanly; ROI and
/// email columns are ignored on the way in (ROI is always recomputed).
fn classify_header(cell: &str) -> Column {
    match cell.trim().to_lowercase().as_str() {
        "name" | "campaign name" => Column::Name,
        "spend" | "ad spend" => Column::Spend,
        "revenue" => Column::Revenue,
        "date" => Column::Date,
        _ => Column::Ignored,
    }
}

/// Parse a CSV batch into insertable campaign rows for `owner_id`.
///
/// `today` (as `YYYY-MM-DD`) fills rows whose date cell is blank, so the
/// pipeline itself stays clock-free.
pub fn import_csv(text: &str, owner_id: &str, today: &str) -> Result<ImportBatch, IngestError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return Err(IngestError::Empty);
    };

    let columns: Vec<Column> = header_line.split(',').map(classify_header).collect();

    let missing: Vec<&str> = [
        (Column::Name, "name"),
        (Column::Spend, "spend"),
        (Column::Revenue, "revenue"),
        (Column::Date, "date"),
    ]
    .iter()
    .filter(|(role, _)| !columns.contains(role))
    .map(|(_, label)| *label)
    .collect();

    if !missing.is_empty() {
        return Err(IngestError::MissingHeader {
            missing: missing.join(", "),
        });
    }

    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for (index, line) in lines {
        let cells: Vec<&str> = line.split(',').collect();

        // A row with more cells than the header is ambiguous under bare-comma
        // splitting; report it instead of guessing.
        if cells.len() > columns.len() {
            skipped.push(SkippedRow {
                line: index + 1,
                reason: format!(
                    "row has {} cells but the header has {} columns",
                    cells.len(),
                    columns.len()
                ),
            });
            continue;
        }

        let mut name = None;
        let mut spend_cell = None;
        let mut revenue_cell = None;
        let mut date_cell = None;

        for (i, column) in columns.iter().enumerate() {
            let cell = cells.get(i).map(|c| c.trim());
            match column {
                Column::Name => name = cell,
                Column::Spend => spend_cell = cell,
                Column::Revenue => revenue_cell = cell,
                Column::Date => date_cell = cell,
                Column::Ignored => {}
            }
        }

        let spend = coerce_money(spend_cell);
        let revenue = coerce_money(revenue_cell);

        rows.push(NewCampaign {
            owner_id: owner_id.to_string(),
            name: name
                .filter(|n| !n.is_empty())
                .unwrap_or(UNNAMED_CAMPAIGN)
                .to_string(),
            spend,
            revenue,
            roi: roi(spend, revenue),
            date: date_cell
                .filter(|d| !d.is_empty())
                .unwrap_or(today)
                .to_string(),
        });
    }

    if !skipped.is_empty() {
        tracing::warn!(count = skipped.len(), "skipped unreadable csv rows");
    }

    Ok(ImportBatch { rows, skipped })
}

/// Coerce a money cell to a decimal.
///
/// Trims, strips one leading dollar sign, and falls back to zero on
/// anything unparseable. A malformed cell must never abort the batch.
fn coerce_money(cell: Option<&str>) -> Decimal {
    let raw = cell.unwrap_or("").trim();
    let raw = raw.strip_prefix('$').unwrap_or(raw);
    raw.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

/// Serialize campaigns to downloadable CSV text.
///
/// Spend and revenue carry a dollar sign and two decimals; ROI is a bare
/// percentage with two decimals. Rows come out in input order - sort before
/// calling if a particular order matters.
pub fn export_csv(campaigns: &[Campaign], user_email: &str) -> String {
    use std::fmt::Write;

    let mut out = String::from(EXPORT_HEADER);
    out.push('\n');

    for c in campaigns {
        let _ = writeln!(
            out,
            "{},${:.2},${:.2},{:.2},{},{}",
            c.name,
            c.spend,
            c.revenue,
            c.roi * Decimal::ONE_HUNDRED,
            c.date,
            user_email
        );
    }

    out
}
