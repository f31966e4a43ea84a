//! Grid reporting: pivot + heatmap
//!
//! Reshapes the finished-run table into a 2D metric grid ([`grid`]) and
//! renders it as an annotated color-mapped image ([`heatmap`]) using a
//! named palette ([`palette`]).

pub mod grid;
pub mod heatmap;
pub mod palette;

use std::path::Path;

pub use grid::{Axis, MetricGrid};
pub use palette::Palette;

use crate::export::SummaryRow;
use crate::Result;

/// Pivot summary rows and render the heatmap in one step.
///
/// # Errors
///
/// Returns an error for an empty table, an unknown palette name, or a
/// rendering failure.
pub fn render_rows(
    rows: &[SummaryRow],
    row_axis: Axis,
    palette_name: &str,
    output: &Path,
) -> Result<()> {
    let palette = Palette::by_name(palette_name)?;
    let grid = MetricGrid::pivot(rows, row_axis)?;
    heatmap::render(&grid, &palette, output)
}
