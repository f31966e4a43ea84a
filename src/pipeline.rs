//! Aggregate-and-report orchestration
//!
//! Ties the read side together: locate runs, load records, select the
//! best finished run, export the summary table, render the heatmap. The
//! two empty cases ("no runs at all", "no finished runs yet") are
//! explicit outcomes, not errors; an in-progress sweep hits both
//! routinely.

use std::path::PathBuf;

use tracing::warn;

use crate::config::SweepLayout;
use crate::export::{self, SummaryRow};
use crate::report::{self, Axis};
use crate::sweep::{best, locator, RunRecord, SweepTable};
use crate::Result;

/// Palette the aggregation pipeline renders with; the standalone plot
/// entry point takes the palette as an argument instead.
const DEFAULT_PALETTE: &str = "viridis";

/// What one pipeline invocation produced.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// No directory under the sweep root parsed as a run.
    NoRuns,
    /// Runs exist, but none has reported both metrics yet.
    NoFinished {
        /// Number of located runs.
        total: usize,
    },
    /// The summary was exported; the heatmap may have failed softly.
    Reported {
        /// Number of located runs.
        total: usize,
        /// Number of finished runs exported.
        finished: usize,
        /// The best finished run.
        best: SummaryRow,
        /// Where the summary table was written.
        summary_file: PathBuf,
        /// Where the heatmap was written, unless rendering failed.
        heatmap_file: Option<PathBuf>,
    },
}

impl PipelineOutcome {
    /// One-line, user-facing description of the outcome.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NoRuns => "No sweep runs found.".to_string(),
            Self::NoFinished { total } => {
                format!("No finished runs yet ({total} located, none reported metrics).")
            }
            Self::Reported { finished, summary_file, .. } => {
                format!("Summary of {finished} finished runs saved to {}", summary_file.display())
            }
        }
    }
}

/// Run the aggregation pipeline over one sweep.
///
/// Incomplete runs are carried but excluded from ranking, export, and
/// plotting; a rendering failure is downgraded to a warning because the
/// summary table has already been written by then.
///
/// # Errors
///
/// Returns an error for a missing sweep root, a run without a config
/// document, or a summary-table write failure.
pub fn run_pipeline(layout: &SweepLayout) -> Result<PipelineOutcome> {
    let runs = locator::parsed_runs(layout)?;
    if runs.is_empty() {
        return Ok(PipelineOutcome::NoRuns);
    }

    let mut table = SweepTable::new();
    for run in &runs {
        table.push(RunRecord::load(layout, run)?);
    }
    let total = table.len();

    let finished = table.finished();
    let rows: Vec<SummaryRow> = finished.iter().filter_map(SummaryRow::from_record).collect();
    let best_row = best(&finished).and_then(SummaryRow::from_record);
    let Some(best_row) = best_row else {
        return Ok(PipelineOutcome::NoFinished { total });
    };

    export::write_summary(&layout.summary_file, &rows)?;

    let heatmap_file = match report::render_rows(
        &rows,
        Axis::HiddenSize,
        DEFAULT_PALETTE,
        &layout.heatmap_file,
    ) {
        Ok(()) => Some(layout.heatmap_file.clone()),
        Err(err) => {
            warn!(error = %err, "unable to render heatmap");
            None
        }
    };

    Ok(PipelineOutcome::Reported {
        total,
        finished: rows.len(),
        best: best_row,
        summary_file: layout.summary_file.clone(),
        heatmap_file,
    })
}
