//! Heatmaps of the density grids with the phase envelope overlaid.
use crate::density::DensityGrids;
use crate::errors::{MapError, MapResult};
use crate::grid::GridAxes;
use ndarray::Array2;
use phasemap_core::PhaseEnvelope;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt;
use std::path::Path;

const FIGURE_SIZE: (u32, u32) = (1600, 700);
const COLORBAR_WIDTH: i32 = 110;
const COLORBAR_STEPS: usize = 200;
const NAN_COLOR: RGBColor = RGBColor(200, 200, 200);
const VIRIDIS: [(f64, f64, f64); 5] = [
    (68.0, 1.0, 84.0),
    (59.0, 82.0, 139.0),
    (33.0, 145.0, 140.0),
    (94.0, 201.0, 98.0),
    (253.0, 231.0, 37.0),
];

/// Two corners in (pressure, temperature) coordinates.
type Bounds = ((f64, f64), (f64, f64));

fn plot_error<E: fmt::Display>(error: E) -> MapError {
    MapError::PlotError(error.to_string())
}

/// Map a value in [0, 1] onto a viridis-like color scale.
fn colormap(value: f64) -> RGBColor {
    if !value.is_finite() {
        return NAN_COLOR;
    }
    let scaled = value.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let f = scaled - i as f64;
    let (r0, g0, b0) = VIRIDIS[i];
    let (r1, g1, b1) = VIRIDIS[i + 1];
    let mix = |a: f64, b: f64| (a + f * (b - a)).round() as u8;
    RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// Range of the finite values of a grid. Grids without finite values or
/// with a single value are mapped to a unit range.
fn value_range(grid: &Array2<f64>) -> (f64, f64) {
    let (min, max) = grid
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min < max {
        (min, max)
    } else {
        let base = if min.is_finite() { min } else { 0.0 };
        (base, base + 1.0)
    }
}

/// Clip the segment a-b to the rectangle `bounds` (Liang-Barsky).
fn clip_segment(a: (f64, f64), b: (f64, f64), bounds: Bounds) -> Option<Bounds> {
    let ((xmin, ymin), (xmax, ymax)) = bounds;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-dx, a.0 - xmin),
        (dx, xmax - a.0),
        (-dy, a.1 - ymin),
        (dy, ymax - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }
    (t0 <= t1).then(|| {
        (
            (a.0 + t0 * dx, a.1 + t0 * dy),
            (a.0 + t1 * dx, a.1 + t1 * dy),
        )
    })
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    axes: &GridAxes,
    grid: &Array2<f64>,
    envelope: &PhaseEnvelope,
) -> MapResult<()> {
    let (nt, np) = grid.dim();
    let (p0, p1) = (axes.pressures[0], axes.pressures[np - 1]);
    let (t0, t1) = (axes.temperatures[0], axes.temperatures[nt - 1]);
    let (vmin, vmax) = value_range(grid);
    let normalize = |v: f64| (v - vmin) / (vmax - vmin);

    let width = area.dim_in_pixel().0 as i32;
    let (heat_area, bar_area) = area.split_horizontally(width - COLORBAR_WIDTH);

    let mut chart = ChartBuilder::on(&heat_area)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .build_cartesian_2d(p0..p1, t0..t1)
        .map_err(plot_error)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Pressure (Pa)")
        .y_desc("Temperature (K)")
        .x_labels(6)
        .x_label_formatter(&|p| format!("{:.1e}", p))
        .draw()
        .map_err(plot_error)?;

    // cells span the grid extent evenly
    let dp = (p1 - p0) / np as f64;
    let dt = (t1 - t0) / nt as f64;
    chart
        .draw_series(grid.indexed_iter().map(|((i, j), &v)| {
            let lower = (p0 + j as f64 * dp, t0 + i as f64 * dt);
            let upper = (p0 + (j + 1) as f64 * dp, t0 + (i + 1) as f64 * dt);
            Rectangle::new([lower, upper], colormap(normalize(v)).filled())
        }))
        .map_err(plot_error)?;

    let bounds = ((p0, t0), (p1, t1));
    chart
        .draw_series(envelope.points.windows(2).filter_map(|w| {
            let a = (w[0].pressure, w[0].temperature);
            let b = (w[1].pressure, w[1].temperature);
            clip_segment(a, b, bounds)
                .map(|(a, b)| PathElement::new(vec![a, b], RED.stroke_width(2)))
        }))
        .map_err(plot_error)?;

    let mut bar = ChartBuilder::on(&bar_area)
        .margin_top(42)
        .margin_bottom(55)
        .margin_right(10)
        .y_label_area_size(0)
        .right_y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, vmin..vmax)
        .map_err(plot_error)?;
    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_label_formatter(&|v| format!("{:.0}", v))
        .draw()
        .map_err(plot_error)?;
    let step = (vmax - vmin) / COLORBAR_STEPS as f64;
    bar.draw_series((0..COLORBAR_STEPS).map(|k| {
        let lo = vmin + k as f64 * step;
        Rectangle::new(
            [(0.0, lo), (1.0, lo + step)],
            colormap((k as f64 + 0.5) / COLORBAR_STEPS as f64).filled(),
        )
    }))
    .map_err(plot_error)?;
    Ok(())
}

/// Render gas and liquid densities side by side into a PNG file.
pub fn render_density_map<P: AsRef<Path>>(
    path: P,
    axes: &GridAxes,
    grids: &DensityGrids,
    envelope: &PhaseEnvelope,
) -> MapResult<()> {
    let root = BitMapBackend::new(path.as_ref(), FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    let root = root
        .titled(
            "Density of the mixture CO2/N2 as a function of T and P",
            ("sans-serif", 28),
        )
        .map_err(plot_error)?;
    let panels = root.split_evenly((1, 2));
    draw_panel(
        &panels[0],
        "Gas Phase Density (kg/m^3)",
        axes,
        &grids.gas,
        envelope,
    )?;
    draw_panel(
        &panels[1],
        "Liquid Phase Density (kg/m^3)",
        axes,
        &grids.liquid,
        envelope,
    )?;
    root.present().map_err(plot_error)?;
    Ok(())
}
