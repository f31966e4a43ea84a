//! Summary table export
//!
//! Serializes the finished runs to a CSV file with a stable column order,
//! and parses such files back for the standalone plot entry point. The
//! destination is replaced wholesale on every export; there is no merging
//! with prior summaries.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sweep::{RunIdent, RunRecord};
use crate::{Error, Result};

/// Column order of the exported summary table.
pub const SUMMARY_COLUMNS: [&str; 9] = [
    "run",
    "roc_auc",
    "accuracy",
    "hidden_size",
    "L_layers",
    "L_cycles",
    "lr",
    "checkpoint",
    "config",
];

/// One exported row: a finished run flattened for the summary table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRow {
    /// Run directory name.
    pub run: String,
    /// Primary metric.
    pub roc_auc: f64,
    /// Secondary metric.
    pub accuracy: f64,
    /// `arch.hidden_size`
    pub hidden_size: u32,
    /// `arch.L_layers`
    #[serde(rename = "L_layers")]
    pub layers: u32,
    /// `arch.L_cycles`
    #[serde(rename = "L_cycles")]
    pub cycles: u32,
    /// Learning rate.
    pub lr: f64,
    /// Latest checkpoint path; empty when the run has none.
    pub checkpoint: String,
    /// Config document path.
    pub config: String,
}

impl SummaryRow {
    /// Flatten a finished record into a row.
    ///
    /// Returns `None` for incomplete records; only finished runs are
    /// exportable.
    #[must_use]
    pub fn from_record(record: &RunRecord) -> Option<Self> {
        Some(Self {
            run: record.run_name().to_string(),
            roc_auc: record.roc_auc()?,
            accuracy: record.accuracy()?,
            hidden_size: record.ident().hidden_size(),
            layers: record.ident().layers(),
            cycles: record.ident().cycles(),
            lr: record.ident().lr(),
            checkpoint: record
                .checkpoint()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            config: record.config().display().to_string(),
        })
    }

    /// The hyperparameter tuple of this row.
    #[must_use]
    pub const fn ident(&self) -> RunIdent {
        RunIdent::new(self.cycles, self.layers, self.hidden_size, self.lr)
    }
}

/// Write the summary table, replacing any existing file.
///
/// The header row is always present, even with zero data rows: a
/// degenerate but valid table.
///
/// # Errors
///
/// Returns an error if the destination cannot be written.
pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    // The serde writer skips headers for an empty input, so the header is
    // written as an explicit record.
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(SUMMARY_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a summary table previously written by [`write_summary`] (or an
/// externally supplied table with the same columns).
///
/// # Errors
///
/// Returns an error if the file cannot be read, or names the first row
/// that fails to deserialize.
pub fn read_summary(path: &Path) -> Result<Vec<SummaryRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for (index, result) in reader.deserialize().enumerate() {
        let row: SummaryRow = result.map_err(|err| Error::TableRow {
            row: index + 1,
            reason: err.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}
