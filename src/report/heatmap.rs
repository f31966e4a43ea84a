//! Heatmap rendering
//!
//! Treats the plotting backend as a pure function from a pivoted grid to
//! a raster image: filled cells on the shared color scale, each annotated
//! with its value to four decimal places, axis labels taken from the
//! pivot. Everything is drawn in pixel coordinates on the bitmap backend,
//! so the output is byte-for-byte reproducible for the same table.

use std::path::Path;

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

use super::grid::MetricGrid;
use super::palette::Palette;
use crate::{Error, Result};

const CELL_W: i32 = 96;
const CELL_H: i32 = 48;
const MARGIN_LEFT: i32 = 110;
const MARGIN_TOP: i32 = 56;
const MARGIN_BOTTOM: i32 = 76;
const MARGIN_RIGHT: i32 = 24;

const TITLE: &str = "ClinVar Sweep ROC AUC";

fn draw_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> Error {
    Error::Render(err.to_string())
}

/// Render a metric grid to a PNG file.
///
/// Parent directories of `output` are created when absent. The file is
/// replaced wholesale.
///
/// # Errors
///
/// Returns [`Error::Render`] when the backend cannot draw (unavailable
/// fonts, unwritable target), or an IO error when the parent directory
/// cannot be created. Callers inside the aggregation pipeline downgrade
/// these to a warning; the standalone plot entry point treats them as
/// fatal.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render(grid: &MetricGrid, palette: &Palette, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let n_rows = grid.n_rows() as i32;
    let n_cols = grid.n_cols() as i32;
    let width = (MARGIN_LEFT + n_cols * CELL_W + MARGIN_RIGHT) as u32;
    let height = (MARGIN_TOP + n_rows * CELL_H + MARGIN_BOTTOM) as u32;

    let root = BitMapBackend::new(output, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let title_style = ("sans-serif", 24)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    root.draw(&Text::new(TITLE, (width as i32 / 2, 12), title_style))
        .map_err(draw_error)?;

    let label_style = ("sans-serif", 15).into_font().color(&BLACK);
    let cell_style = ("sans-serif", 14).into_font();

    for ri in 0..n_rows {
        let y0 = MARGIN_TOP + ri * CELL_H;
        for ci in 0..n_cols {
            let x0 = MARGIN_LEFT + ci * CELL_W;
            let Some(value) = grid.cell(ri as usize, ci as usize) else {
                continue;
            };
            let t = grid.normalized(value);
            root.draw(&Rectangle::new(
                [(x0, y0), (x0 + CELL_W, y0 + CELL_H)],
                palette.color(t).filled(),
            ))
            .map_err(draw_error)?;
            root.draw(&Rectangle::new(
                [(x0, y0), (x0 + CELL_W, y0 + CELL_H)],
                WHITE.stroke_width(1),
            ))
            .map_err(draw_error)?;

            let text_color = if palette.needs_light_text(t) { &WHITE } else { &BLACK };
            let value_style = cell_style
                .clone()
                .color(text_color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            root.draw(&Text::new(
                format!("{value:.4}"),
                (x0 + CELL_W / 2, y0 + CELL_H / 2),
                value_style,
            ))
            .map_err(draw_error)?;
        }

        let row_style = label_style
            .clone()
            .pos(Pos::new(HPos::Right, VPos::Center));
        root.draw(&Text::new(
            grid.row_labels()[ri as usize].clone(),
            (MARGIN_LEFT - 8, y0 + CELL_H / 2),
            row_style,
        ))
        .map_err(draw_error)?;
    }

    let grid_bottom = MARGIN_TOP + n_rows * CELL_H;
    for ci in 0..n_cols {
        let x0 = MARGIN_LEFT + ci * CELL_W;
        let col_style = label_style
            .clone()
            .pos(Pos::new(HPos::Center, VPos::Top));
        root.draw(&Text::new(
            grid.col_labels()[ci as usize].clone(),
            (x0 + CELL_W / 2, grid_bottom + 6),
            col_style,
        ))
        .map_err(draw_error)?;
    }

    let x_title_style = ("sans-serif", 17)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    root.draw(&Text::new(
        grid.col_title().to_string(),
        (MARGIN_LEFT + n_cols * CELL_W / 2, height as i32 - 8),
        x_title_style,
    ))
    .map_err(draw_error)?;

    let y_title_style = ("sans-serif", 17)
        .into_font()
        .color(&BLACK)
        .transform(FontTransform::Rotate270)
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw(&Text::new(
        grid.row_axis().column_name(),
        (18, MARGIN_TOP + n_rows * CELL_H / 2),
        y_title_style,
    ))
    .map_err(draw_error)?;

    root.present().map_err(draw_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::SummaryRow;
    use crate::report::grid::Axis;

    fn rows() -> Vec<SummaryRow> {
        vec![
            SummaryRow {
                run: "arch.L_cycles=2,arch.L_layers=1,arch.hidden_size=64,lr=0.001".to_string(),
                roc_auc: 0.91,
                accuracy: 0.85,
                hidden_size: 64,
                layers: 1,
                cycles: 2,
                lr: 1e-3,
                checkpoint: String::new(),
                config: String::new(),
            },
            SummaryRow {
                run: "arch.L_cycles=4,arch.L_layers=1,arch.hidden_size=128,lr=0.001".to_string(),
                roc_auc: 0.88,
                accuracy: 0.81,
                hidden_size: 128,
                layers: 1,
                cycles: 4,
                lr: 1e-3,
                checkpoint: String::new(),
                config: String::new(),
            },
        ]
    }

    #[test]
    fn test_render_writes_image_and_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("figures/heatmap.png");
        let grid = MetricGrid::pivot(&rows(), Axis::HiddenSize).unwrap();
        let palette = Palette::by_name("viridis").unwrap();

        render(&grid, &palette, &output).unwrap();
        assert!(output.is_file());
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }
}
