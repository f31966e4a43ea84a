//! 2D reshaping of the sweep table
//!
//! The sweep varies four hyperparameters; a heatmap has two axes. One
//! hyperparameter becomes the row axis and the remaining three collapse
//! into a composite column key, so every run lands in exactly one cell.
//! The pivot is pure data shaping; rendering lives in
//! [`heatmap`](super::heatmap).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::export::SummaryRow;
use crate::{Error, Result};

/// Fixed composite order: the non-row axes contribute to the column key
/// in this sequence.
const COMPOSITE_ORDER: [Axis; 4] = [Axis::Layers, Axis::Cycles, Axis::HiddenSize, Axis::Lr];

/// A hyperparameter axis of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `hidden_size`
    HiddenSize,
    /// `L_layers`
    Layers,
    /// `L_cycles`
    Cycles,
    /// `lr`
    Lr,
}

impl Axis {
    /// The axis's column name in the summary table.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::HiddenSize => "hidden_size",
            Self::Layers => "L_layers",
            Self::Cycles => "L_cycles",
            Self::Lr => "lr",
        }
    }

    /// The axis value of one row, as a sortable number.
    #[must_use]
    pub fn value(self, row: &SummaryRow) -> f64 {
        match self {
            Self::HiddenSize => f64::from(row.hidden_size),
            Self::Layers => f64::from(row.layers),
            Self::Cycles => f64::from(row.cycles),
            Self::Lr => row.lr,
        }
    }

    /// The axis value of one row, as an axis label.
    #[must_use]
    pub fn label(self, row: &SummaryRow) -> String {
        match self {
            Self::HiddenSize => row.hidden_size.to_string(),
            Self::Layers => row.layers.to_string(),
            Self::Cycles => row.cycles.to_string(),
            Self::Lr => trim_lr(row.lr),
        }
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hidden_size" => Ok(Self::HiddenSize),
            "L_layers" => Ok(Self::Layers),
            "L_cycles" => Ok(Self::Cycles),
            "lr" => Ok(Self::Lr),
            other => Err(Error::UnknownAxis(other.to_string())),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Format a learning rate for axis labels: four decimals with trailing
/// zeros (and a bare trailing dot) trimmed, so `0.0010` reads `0.001`.
#[must_use]
pub fn trim_lr(lr: f64) -> String {
    format!("{lr:.4}")
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// The pivoted metric grid: rows by one hyperparameter, columns by the
/// composite of the remaining three, cells holding the primary metric.
#[derive(Debug, Clone)]
pub struct MetricGrid {
    row_axis: Axis,
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    col_title: String,
    cells: Vec<Vec<Option<f64>>>,
    vmin: f64,
    vmax: f64,
}

impl MetricGrid {
    /// Pivot summary rows into a grid.
    ///
    /// Rows are sorted ascending by row-axis value, columns
    /// lexicographically by composite key. When two records collide on
    /// the same cell the later one wins, deterministically, and the
    /// collision is logged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyGrid`] for an empty input, since the color scale
    /// is undefined without observed values.
    pub fn pivot(rows: &[SummaryRow], row_axis: Axis) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyGrid);
        }

        let mut row_keys: Vec<f64> = rows.iter().map(|r| row_axis.value(r)).collect();
        row_keys.sort_by(f64::total_cmp);
        row_keys.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);

        let mut col_keys: Vec<String> = rows.iter().map(|r| composite_key(r, row_axis)).collect();
        col_keys.sort();
        col_keys.dedup();

        let mut cells = vec![vec![None; col_keys.len()]; row_keys.len()];
        for row in rows {
            let Ok(ri) = row_keys.binary_search_by(|k| k.total_cmp(&row_axis.value(row))) else {
                continue;
            };
            let Ok(ci) = col_keys.binary_search(&composite_key(row, row_axis)) else {
                continue;
            };
            if cells[ri][ci].is_some() {
                debug!(run = %row.run, "duplicate grid cell, later record wins");
            }
            cells[ri][ci] = Some(row.roc_auc);
        }

        let vmin = rows.iter().map(|r| r.roc_auc).fold(f64::INFINITY, f64::min);
        let vmax = rows
            .iter()
            .map(|r| r.roc_auc)
            .fold(f64::NEG_INFINITY, f64::max);

        // Row labels reuse the first row carrying each key, so integer
        // axes render without decimal noise.
        let row_labels = row_keys
            .iter()
            .map(|key| {
                rows.iter()
                    .find(|r| row_axis.value(r).total_cmp(key) == Ordering::Equal)
                    .map_or_else(|| key.to_string(), |r| row_axis.label(r))
            })
            .collect();

        Ok(Self {
            row_axis,
            row_labels,
            col_labels: col_keys,
            col_title: composite_title(row_axis),
            cells,
            vmin,
            vmax,
        })
    }

    /// The designated row axis.
    #[must_use]
    pub const fn row_axis(&self) -> Axis {
        self.row_axis
    }

    /// Row labels, ascending by axis value.
    #[must_use]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    /// Column labels, lexicographic by composite key.
    #[must_use]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    /// Title of the composite column axis (joined axis names).
    #[must_use]
    pub fn col_title(&self) -> &str {
        &self.col_title
    }

    /// Number of grid rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    /// Number of grid columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.col_labels.len()
    }

    /// Cell value, `None` for combinations no run covered.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| *r.get(col)?)
    }

    /// Smallest observed metric (bottom of the shared color scale).
    #[must_use]
    pub const fn vmin(&self) -> f64 {
        self.vmin
    }

    /// Largest observed metric (top of the shared color scale).
    #[must_use]
    pub const fn vmax(&self) -> f64 {
        self.vmax
    }

    /// Map a value onto the shared color scale as `0.0..=1.0`.
    ///
    /// A degenerate scale (all values equal) maps everything to the
    /// middle of the palette.
    #[must_use]
    pub fn normalized(&self, value: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span <= f64::EPSILON {
            return 0.5;
        }
        ((value - self.vmin) / span).clamp(0.0, 1.0)
    }
}

fn composite_key(row: &SummaryRow, row_axis: Axis) -> String {
    COMPOSITE_ORDER
        .iter()
        .filter(|axis| **axis != row_axis)
        .map(|axis| axis.label(row))
        .collect::<Vec<_>>()
        .join("-")
}

fn composite_title(row_axis: Axis) -> String {
    COMPOSITE_ORDER
        .iter()
        .filter(|axis| **axis != row_axis)
        .map(|axis| axis.column_name())
        .collect::<Vec<_>>()
        .join("-")
}
