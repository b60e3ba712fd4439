//! Figure rendering: one subplot per requested metric.
//!
//! The layout fixes the column count and grows rows to fit; panels are
//! line charts (one swept parameter) or contour / curve-family charts
//! (two swept parameters).

use std::error::Error;
use std::path::Path;

use plotters::coord::{CoordTranslate, Shift};
use plotters::prelude::*;
use rayon::prelude::*;

use crate::cli::PlotRequest;
use crate::results_table::ResultsTable;
use crate::sweep_grid::{fmt_g, regrid_metric, SweepGrid};

/// Fixed subplot column count; rows grow to fit the requested metrics.
pub const SUBPLOT_COLS: usize = 2;
const PANEL_WIDTH: u32 = 600;
const PANEL_HEIGHT: u32 = 400;
const CONTOUR_LEVELS: usize = 10;
const COLORBAR_WIDTH: i32 = 80;

/// Axis scaling of one panel, from the log index lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisScale {
    Linear,
    LogX,
    LogY,
    LogLog,
}

impl AxisScale {
    pub fn from_flags(log_x: bool, log_y: bool) -> AxisScale {
        match (log_x, log_y) {
            (true, true) => AxisScale::LogLog,
            (true, false) => AxisScale::LogX,
            (false, true) => AxisScale::LogY,
            (false, false) => AxisScale::Linear,
        }
    }

    pub fn for_panel(index: usize, logx: &[usize], logy: &[usize]) -> AxisScale {
        AxisScale::from_flags(logx.contains(&index), logy.contains(&index))
    }

    fn log_x(self) -> bool {
        matches!(self, AxisScale::LogX | AxisScale::LogLog)
    }

    fn log_y(self) -> bool {
        matches!(self, AxisScale::LogY | AxisScale::LogLog)
    }
}

/// Render the figure for a plot request into `output`.
///
/// Returns Ok(false) without writing anything when the request cannot be
/// plotted: no metrics, or a parameter count other than one or two.
pub fn render_figure(
    table: &ResultsTable,
    request: &PlotRequest,
    output: &Path,
) -> Result<bool, Box<dyn Error>> {
    if request.metrics.is_empty() {
        eprintln!("Warning: no metrics requested; nothing to plot.");
        return Ok(false);
    }
    if request.sweep_params.is_empty() || request.sweep_params.len() > 2 {
        eprintln!(
            "Warning: plotting needs one or two swept parameters (got {}); skipping.",
            request.sweep_params.len()
        );
        return Ok(false);
    }

    let n_plots = request.metrics.len();
    let n_rows = (n_plots + SUBPLOT_COLS - 1) / SUBPLOT_COLS;
    let size = (
        PANEL_WIDTH * SUBPLOT_COLS as u32,
        PANEL_HEIGHT * n_rows as u32,
    );

    let root = BitMapBackend::new(output, size).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((n_rows, SUBPLOT_COLS));

    if request.sweep_params.len() == 1 {
        let param = &request.sweep_params[0];
        let xs = table.column(param)?;
        for (i, metric) in request.metrics.iter().enumerate() {
            let ys = table.column(metric)?;
            let scale = AxisScale::for_panel(i, &request.logx_panels, &request.logy_panels);
            draw_metric_line(&panels[i], metric, param, &xs, &ys, scale)?;
        }
    } else {
        let param_x = &request.sweep_params[0];
        let param_y = &request.sweep_params[1];
        let x_raw = table.column(param_x)?;
        let y_raw = table.column(param_y)?;

        // Regridding is independent per metric.
        let grids: Vec<SweepGrid> = request
            .metrics
            .par_iter()
            .map(|metric| {
                table
                    .column(metric)
                    .map(|z_raw| regrid_metric(metric, &x_raw, &y_raw, &z_raw))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        for (i, (metric, grid)) in request.metrics.iter().zip(&grids).enumerate() {
            if request.contour_panels.contains(&i) {
                draw_metric_contour(&panels[i], metric, param_x, param_y, grid)?;
            } else {
                let scale = AxisScale::for_panel(i, &request.logx_panels, &request.logy_panels);
                draw_metric_curves(&panels[i], metric, param_x, param_y, grid, scale)?;
            }
        }
    }

    root.present()?;
    Ok(true)
}

/// Line chart of one metric against the single swept parameter.
fn draw_metric_line<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    metric: &str,
    param: &str,
    xs: &[f64],
    ys: &[f64],
    scale: AxisScale,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let scale = effective_scale(metric, scale, xs, ys);
    let bounds = (axis_bounds(xs, scale.log_x()), axis_bounds(ys, scale.log_y()));
    let ((x_lo, x_hi), (y_lo, y_hi)) = match bounds {
        (Some(xb), Some(yb)) => (xb, yb),
        _ => {
            eprintln!("Warning: metric '{}' has no plottable data.", metric);
            return draw_empty_panel(area, metric, "no finite data");
        }
    };
    let segments = plottable_segments(xs, ys, scale);

    match scale {
        AxisScale::Linear => {
            let mut chart = ChartBuilder::on(area)
                .caption(metric, ("sans-serif", 20))
                .margin(12)
                .x_label_area_size(35)
                .y_label_area_size(50)
                .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
            chart.configure_mesh().x_desc(param).y_desc(metric).draw()?;
            draw_segments(&mut chart, &segments)?;
        }
        AxisScale::LogX => {
            let mut chart = ChartBuilder::on(area)
                .caption(metric, ("sans-serif", 20))
                .margin(12)
                .x_label_area_size(35)
                .y_label_area_size(50)
                .build_cartesian_2d((x_lo..x_hi).log_scale(), y_lo..y_hi)?;
            chart.configure_mesh().x_desc(param).y_desc(metric).draw()?;
            draw_segments(&mut chart, &segments)?;
        }
        AxisScale::LogY => {
            let mut chart = ChartBuilder::on(area)
                .caption(metric, ("sans-serif", 20))
                .margin(12)
                .x_label_area_size(35)
                .y_label_area_size(50)
                .build_cartesian_2d(x_lo..x_hi, (y_lo..y_hi).log_scale())?;
            chart.configure_mesh().x_desc(param).y_desc(metric).draw()?;
            draw_segments(&mut chart, &segments)?;
        }
        AxisScale::LogLog => {
            let mut chart = ChartBuilder::on(area)
                .caption(metric, ("sans-serif", 20))
                .margin(12)
                .x_label_area_size(35)
                .y_label_area_size(50)
                .build_cartesian_2d((x_lo..x_hi).log_scale(), (y_lo..y_hi).log_scale())?;
            chart.configure_mesh().x_desc(param).y_desc(metric).draw()?;
            draw_segments(&mut chart, &segments)?;
        }
    }
    Ok(())
}

/// One curve per second-parameter value, metric on the y axis.
fn draw_metric_curves<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    metric: &str,
    param_x: &str,
    param_y: &str,
    grid: &SweepGrid,
    scale: AxisScale,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let all_z: Vec<f64> = grid.z.iter().copied().collect();
    let scale = effective_scale(metric, scale, &grid.x, &all_z);
    let bounds = (
        axis_bounds(&grid.x, scale.log_x()),
        axis_bounds(&all_z, scale.log_y()),
    );
    let ((x_lo, x_hi), (y_lo, y_hi)) = match bounds {
        (Some(xb), Some(yb)) => (xb, yb),
        _ => {
            eprintln!("Warning: metric '{}' has no plottable data.", metric);
            return draw_empty_panel(area, metric, "no finite data");
        }
    };

    match scale {
        AxisScale::Linear => {
            let mut chart = ChartBuilder::on(area)
                .caption(metric, ("sans-serif", 20))
                .margin(12)
                .x_label_area_size(35)
                .y_label_area_size(50)
                .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
            chart.configure_mesh().x_desc(param_x).y_desc(metric).draw()?;
            if draw_curve_family(&mut chart, param_y, grid, scale)? {
                draw_legend(&mut chart)?;
            }
        }
        AxisScale::LogX => {
            let mut chart = ChartBuilder::on(area)
                .caption(metric, ("sans-serif", 20))
                .margin(12)
                .x_label_area_size(35)
                .y_label_area_size(50)
                .build_cartesian_2d((x_lo..x_hi).log_scale(), y_lo..y_hi)?;
            chart.configure_mesh().x_desc(param_x).y_desc(metric).draw()?;
            if draw_curve_family(&mut chart, param_y, grid, scale)? {
                draw_legend(&mut chart)?;
            }
        }
        AxisScale::LogY => {
            let mut chart = ChartBuilder::on(area)
                .caption(metric, ("sans-serif", 20))
                .margin(12)
                .x_label_area_size(35)
                .y_label_area_size(50)
                .build_cartesian_2d(x_lo..x_hi, (y_lo..y_hi).log_scale())?;
            chart.configure_mesh().x_desc(param_x).y_desc(metric).draw()?;
            if draw_curve_family(&mut chart, param_y, grid, scale)? {
                draw_legend(&mut chart)?;
            }
        }
        AxisScale::LogLog => {
            let mut chart = ChartBuilder::on(area)
                .caption(metric, ("sans-serif", 20))
                .margin(12)
                .x_label_area_size(35)
                .y_label_area_size(50)
                .build_cartesian_2d((x_lo..x_hi).log_scale(), (y_lo..y_hi).log_scale())?;
            chart.configure_mesh().x_desc(param_x).y_desc(metric).draw()?;
            if draw_curve_family(&mut chart, param_y, grid, scale)? {
                draw_legend(&mut chart)?;
            }
        }
    }
    Ok(())
}

/// Filled-contour rendering of one metric over the sweep lattice, with a
/// color bar strip on the right. The metric range is quantized into equal
/// value bands; NaN cells are left unpainted.
fn draw_metric_contour<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    metric: &str,
    param_x: &str,
    param_y: &str,
    grid: &SweepGrid,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let (z_lo, z_hi) = match finite_bounds(grid.z.iter().copied()) {
        Some(bounds) => bounds,
        None => {
            eprintln!("Warning: metric '{}' has no plottable data.", metric);
            return draw_empty_panel(area, metric, "no finite data");
        }
    };

    let x_edges = cell_edges(&grid.x);
    let y_edges = cell_edges(&grid.y);

    let (width, _) = area.dim_in_pixel();
    let (plot_area, bar_area) = area.split_horizontally(width as i32 - COLORBAR_WIDTH);

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(metric, ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(
            x_edges[0]..x_edges[x_edges.len() - 1],
            y_edges[0]..y_edges[y_edges.len() - 1],
        )?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(param_x)
        .y_desc(param_y)
        .draw()?;

    let (nx, ny) = (grid.x.len(), grid.y.len());
    let cells = (0..nx)
        .flat_map(|i| (0..ny).map(move |j| (i, j)))
        .filter_map(|(i, j)| {
            let z = grid.z[[i, j]];
            if !z.is_finite() {
                return None;
            }
            Some(Rectangle::new(
                [
                    (x_edges[i], y_edges[j]),
                    (x_edges[i + 1], y_edges[j + 1]),
                ],
                band_color(z, z_lo, z_hi).filled(),
            ))
        });
    chart.draw_series(cells)?;

    draw_colorbar(&bar_area, metric, z_lo, z_hi)?;
    Ok(())
}

/// Vertical band-color legend mapping the metric range.
fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    metric: &str,
    z_lo: f64,
    z_hi: f64,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let (bar_lo, bar_hi) = if z_hi > z_lo {
        (z_lo, z_hi)
    } else {
        padded_range(z_lo, z_hi)
    };

    let mut bar = ChartBuilder::on(area)
        .margin(12)
        .y_label_area_size(45)
        .build_cartesian_2d(0.0..1.0, bar_lo..bar_hi)?;
    bar.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_desc(metric)
        .draw()?;

    let step = (bar_hi - bar_lo) / CONTOUR_LEVELS as f64;
    bar.draw_series((0..CONTOUR_LEVELS).map(|band| {
        let lo = bar_lo + band as f64 * step;
        Rectangle::new(
            [(0.0, lo), (1.0, lo + step)],
            viridis((band as f64 + 0.5) / CONTOUR_LEVELS as f64).filled(),
        )
    }))?;
    Ok(())
}

/// Draw every curve of the family; returns whether any legend label was
/// attached (a fully-NaN curve draws nothing and gets no label).
fn draw_curve_family<DB, CT>(
    chart: &mut ChartContext<'_, DB, CT>,
    param_y: &str,
    grid: &SweepGrid,
    scale: AxisScale,
) -> Result<bool, Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
    CT: CoordTranslate<From = (f64, f64)>,
{
    let mut any_labeled = false;
    for (j, &yj) in grid.y.iter().enumerate() {
        let color = Palette99::pick(j).to_rgba();
        let zs: Vec<f64> = grid.z.column(j).to_vec();
        let mut labeled = false;
        for segment in plottable_segments(&grid.x, &zs, scale) {
            let series = chart.draw_series(LineSeries::new(
                segment.into_iter(),
                color.stroke_width(2),
            ))?;
            if !labeled {
                series
                    .label(format!("{}={}", param_y, fmt_g(yj, 2)))
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                labeled = true;
                any_labeled = true;
            }
        }
    }
    Ok(any_labeled)
}

fn draw_legend<DB, CT>(chart: &mut ChartContext<'_, DB, CT>) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
    CT: CoordTranslate<From = (f64, f64)>,
{
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

fn draw_segments<DB, CT>(
    chart: &mut ChartContext<'_, DB, CT>,
    segments: &[Vec<(f64, f64)>],
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
    CT: CoordTranslate<From = (f64, f64)>,
{
    for segment in segments {
        chart.draw_series(LineSeries::new(
            segment.iter().copied(),
            BLUE.stroke_width(2),
        ))?;
    }
    Ok(())
}

/// Panel placeholder when a metric has nothing to draw.
fn draw_empty_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    metric: &str,
    note: &str,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    area.draw(&Text::new(
        format!("{}: {}", metric, note),
        (20, 20),
        ("sans-serif", 15),
    ))?;
    Ok(())
}

/// Demote a log axis to linear when the data has no positive values to
/// span, with a warning naming the metric.
fn effective_scale(metric: &str, requested: AxisScale, xs: &[f64], ys: &[f64]) -> AxisScale {
    let mut log_x = requested.log_x();
    let mut log_y = requested.log_y();
    if log_x && !xs.iter().any(|v| v.is_finite() && *v > 0.0) {
        eprintln!(
            "Warning: metric '{}': no positive x values; falling back to a linear x axis.",
            metric
        );
        log_x = false;
    }
    if log_y && !ys.iter().any(|v| v.is_finite() && *v > 0.0) {
        eprintln!(
            "Warning: metric '{}': no positive y values; falling back to a linear y axis.",
            metric
        );
        log_y = false;
    }
    AxisScale::from_flags(log_x, log_y)
}

/// Split a sampled curve into drawable runs. NaN samples break the line
/// into gaps; on a log axis non-positive samples are dropped the same way.
fn plottable_segments(xs: &[f64], ys: &[f64], scale: AxisScale) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (&x, &y) in xs.iter().zip(ys) {
        let drawable = x.is_finite()
            && y.is_finite()
            && (!scale.log_x() || x > 0.0)
            && (!scale.log_y() || y > 0.0);
        if drawable {
            current.push((x, y));
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Finite min/max over an iterator, None when no finite values remain.
fn finite_bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo <= hi {
        Some((lo, hi))
    } else {
        None
    }
}

/// Pad a data range by 10%, widening degenerate ranges so the chart never
/// collapses to zero height.
fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    let pad = if span.abs() < 1e-12 {
        if lo.abs() < 1e-12 {
            0.5
        } else {
            0.1 * lo.abs()
        }
    } else {
        0.1 * span
    };
    (lo - pad, hi + pad)
}

/// Multiplicative padding keeps log-axis bounds positive.
fn padded_log_range(lo: f64, hi: f64) -> (f64, f64) {
    if lo == hi {
        (lo / 2.0, hi * 2.0)
    } else {
        (lo / 1.1, hi * 1.1)
    }
}

/// Data bounds padded for an axis; log axes only span the positive values.
fn axis_bounds(values: &[f64], log: bool) -> Option<(f64, f64)> {
    if log {
        let (lo, hi) = finite_bounds(values.iter().copied().filter(|v| *v > 0.0))?;
        Some(padded_log_range(lo, hi))
    } else {
        let (lo, hi) = finite_bounds(values.iter().copied())?;
        Some(padded_range(lo, hi))
    }
}

/// Cell boundaries for a sorted axis: midpoints between neighbors, outer
/// edges extended by half the neighboring interval.
fn cell_edges(centers: &[f64]) -> Vec<f64> {
    let n = centers.len();
    if n == 1 {
        let half = if centers[0] != 0.0 {
            centers[0].abs() * 0.05
        } else {
            0.5
        };
        return vec![centers[0] - half, centers[0] + half];
    }
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(centers[0] - (centers[1] - centers[0]) / 2.0);
    for i in 1..n {
        edges.push((centers[i - 1] + centers[i]) / 2.0);
    }
    edges.push(centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2.0);
    edges
}

/// Quantize z into one of the contour bands and color it.
fn band_color(z: f64, z_lo: f64, z_hi: f64) -> RGBColor {
    let span = z_hi - z_lo;
    let t = if span > 0.0 {
        ((z - z_lo) / span).clamp(0.0, 1.0)
    } else {
        0.5
    };
    let band = ((t * CONTOUR_LEVELS as f64).floor() as usize).min(CONTOUR_LEVELS - 1);
    viridis((band as f64 + 0.5) / CONTOUR_LEVELS as f64)
}

/// Viridis approximation mapping t in [0, 1] to RGB (purple → teal →
/// yellow), close enough to matplotlib's for diagnostic plots.
fn viridis(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let r = (0.267 + t * (0.329 - 0.267 + t * (0.984 - 0.329))) * 255.0;
    let g = (0.005 + t * (0.569 - 0.005 + t * (0.906 - 0.569))) * 255.0;
    let b = (0.329 + t * (0.758 - 0.329 - t * (0.758 - 0.121))) * 255.0;
    RGBColor(
        r.clamp(0.0, 255.0) as u8,
        g.clamp(0.0, 255.0) as u8,
        b.clamp(0.0, 255.0) as u8,
    )
}
