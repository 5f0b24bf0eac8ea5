//! Figure of the demo: objective contours, shaded infeasible regions and the optimum.

use std::path::Path;

use ndarray::Array2;
use plotly::common::{
    ColorBar, ColorScale, ColorScaleElement, Line, Marker, MarkerSymbol, Mode, Title,
};
use plotly::contour::{Coloring, Contour, Contours};
use plotly::layout::Axis;
use plotly::{Layout, Plot, Scatter};

use crate::grid::GridSamples;
use crate::problem::{CONTOUR_LEVELS, INFEASIBLE_RANGE};

const INFEASIBLE_FILL: &str = "rgba(255, 0, 0, 0.2)";

/// Rows of the transposed array: `z[j][i]` is the value at `(x1[i], x2[j])`,
/// the orientation plotly expects for `Contour::new(x1, x2, z)`.
fn transposed_rows(values: &Array2<f64>) -> Vec<Vec<f64>> {
    values.t().rows().into_iter().map(|row| row.to_vec()).collect()
}

/// 1 where `value` lies in `[lo, hi]`, 0 elsewhere.
fn region_indicator(values: &Array2<f64>, (lo, hi): (f64, f64)) -> Array2<f64> {
    values.mapv(|v| if (lo..=hi).contains(&v) { 1.0 } else { 0.0 })
}

fn infeasible_overlay(
    grid: &GridSamples,
    values: &Array2<f64>,
    name: &str,
) -> Box<Contour<Vec<f64>>> {
    let indicator = region_indicator(values, INFEASIBLE_RANGE);
    Contour::new(grid.x1.to_vec(), grid.x2.to_vec(), transposed_rows(&indicator))
        .name(name)
        .auto_contour(false)
        .contours(
            Contours::new()
                .start(0.5)
                .end(0.5)
                .size(1.0)
                .coloring(Coloring::Fill),
        )
        .color_scale(ColorScale::Vector(vec![
            ColorScaleElement(0.0, "rgba(0, 0, 0, 0)".to_string()),
            ColorScaleElement(1.0, INFEASIBLE_FILL.to_string()),
        ]))
        .line(Line::new().width(0.0))
        .show_scale(false)
}

/// Builds the figure for a solved demo problem.
pub fn build_plot(grid: &GridSamples, optimum: &[f64]) -> Plot {
    let objective = Contour::new(grid.x1.to_vec(), grid.x2.to_vec(), transposed_rows(&grid.fun))
        .name("f(x)")
        .n_contours(CONTOUR_LEVELS)
        .contours(Contours::new().coloring(Coloring::Lines))
        .color_bar(ColorBar::new());

    let star = Scatter::new(vec![optimum[0]], vec![optimum[1]])
        .mode(Mode::Markers)
        .name("x*")
        .marker(
            Marker::new()
                .color("red")
                .size(15)
                .symbol(MarkerSymbol::Star),
        );

    let layout = Layout::new()
        .title(Title::with_text("Constrained optimization"))
        .x_axis(Axis::new().title(Title::with_text("x1")))
        .y_axis(Axis::new().title(Title::with_text("x2")));

    let mut plot = Plot::new();
    plot.add_trace(objective);
    plot.add_trace(infeasible_overlay(grid, &grid.con1, "g1 < 0"));
    plot.add_trace(infeasible_overlay(grid, &grid.con2, "g2 < 0"));
    plot.add_trace(star);
    plot.set_layout(layout);
    plot
}

/// Writes a standalone HTML page of the figure.
pub fn write_html(plot: &Plot, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, plot.to_html())?;
    log::info!("figure written to {}", path.display());
    Ok(())
}
