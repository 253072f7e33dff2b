//! Scatter plot of the first two embedding dimensions, colored by bin.

use std::{fmt, ops::Range, path::Path};

use plotters::prelude::*;

use crate::{error::KmerBinError, table::ClusteredTable};

#[cfg(feature = "tracing")]
use tracing::info;

/// Width and height of the image, in pixels.
pub const PLOT_SIZE: u32 = 2000;
const POINT_RADIUS: i32 = 1;
const PADDING: f64 = 0.05;

/// ColorBrewer "Spectral", dark red to purple.
const SPECTRAL: [RGBColor; 11] = [
    RGBColor(0x9e, 0x01, 0x42),
    RGBColor(0xd5, 0x3e, 0x4f),
    RGBColor(0xf4, 0x6d, 0x43),
    RGBColor(0xfd, 0xae, 0x61),
    RGBColor(0xfe, 0xe0, 0x8b),
    RGBColor(0xff, 0xff, 0xbf),
    RGBColor(0xe6, 0xf5, 0x98),
    RGBColor(0xab, 0xdd, 0xa4),
    RGBColor(0x66, 0xc2, 0xa5),
    RGBColor(0x32, 0x88, 0xbd),
    RGBColor(0x5e, 0x4f, 0xa2),
];

/// Renders `table` to a PNG at `path`.
///
/// Each read is a point at `(D1, D2)`; each label is written once, in bold,
/// at the first read carrying it.
///
/// # Errors
///
/// Returns [`KmerBinError::Plot`] if the embedding has fewer than two
/// dimensions or the image cannot be drawn or saved.
pub fn plot_clusters(table: &ClusteredTable, path: &Path) -> Result<(), KmerBinError> {
    if table.n_components() < 2 {
        return Err(KmerBinError::Plot {
            details: format!(
                "plotting needs at least 2 embedding dimensions, found {}",
                table.n_components()
            ),
            path: path.to_path_buf(),
        });
    }

    let embedding = table.embedding();
    let points: Vec<(f64, f64)> = embedding
        .rows()
        .into_iter()
        .map(|row| (row[0], row[1]))
        .collect();
    let (x_range, y_range) = square_ranges(&points);

    let labels = table.bin_ids();
    let lowest = labels.iter().copied().min().unwrap_or(0);
    let highest = labels.iter().copied().max().unwrap_or(0);

    let root = BitMapBackend::new(path, (PLOT_SIZE, PLOT_SIZE)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error(path))?;
    let root = root.margin(20, 20, 20, 20);

    let mut chart = ChartBuilder::on(&root)
        .caption(title(table), ("sans-serif", 48))
        .x_label_area_size(80)
        .y_label_area_size(100)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_error(path))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("UMAP1")
        .y_desc("UMAP2")
        .axis_desc_style(("sans-serif", 36))
        .label_style(("sans-serif", 28))
        .draw()
        .map_err(plot_error(path))?;

    chart
        .draw_series(points.iter().zip(labels).map(|(&(x, y), &label)| {
            Circle::new(
                (x, y),
                POINT_RADIUS,
                color_for(label, lowest, highest).filled(),
            )
        }))
        .map_err(plot_error(path))?;

    chart
        .draw_series(table.first_row_by_label().into_iter().map(|(label, row)| {
            Text::new(
                label.to_string(),
                points[row],
                ("sans-serif", 40, FontStyle::Bold).into_font().color(&BLACK),
            )
        }))
        .map_err(plot_error(path))?;

    root.present().map_err(plot_error(path))?;

    #[cfg(feature = "tracing")]
    info!(path = %path.display(), labels = table.n_labels(), "Cluster plot written");

    Ok(())
}

/// `Projecting {reads} reads. {labels} clusters generated by HDBSCAN`, where
/// noise counts as a label.
pub fn title(table: &ClusteredTable) -> String {
    format!(
        "Projecting {} reads. {} clusters generated by HDBSCAN",
        table.n_reads(),
        table.n_labels()
    )
}

/// Palette color of `label`, spread linearly over `lowest..=highest`.
pub fn color_for(label: i32, lowest: i32, highest: i32) -> RGBColor {
    let last = SPECTRAL.len() - 1;
    if highest <= lowest {
        return SPECTRAL[0];
    }
    let t = f64::from(label.clamp(lowest, highest) - lowest) / f64::from(highest - lowest);
    SPECTRAL[(t * last as f64).round() as usize]
}

/// Equal-length x and y ranges centered on the points, padded on each side.
fn square_ranges(points: &[(f64, f64)]) -> (Range<f64>, Range<f64>) {
    let (x_min, x_max) = bounds(points.iter().map(|p| p.0));
    let (y_min, y_max) = bounds(points.iter().map(|p| p.1));
    if !(x_min.is_finite() && y_min.is_finite()) {
        return (-1.0..1.0, -1.0..1.0);
    }

    let span = (x_max - x_min).max(y_max - y_min);
    let half = if span > 0.0 {
        span * (0.5 + PADDING)
    } else {
        1.0
    };
    let (cx, cy) = ((x_min + x_max) / 2.0, (y_min + y_max) / 2.0);
    ((cx - half)..(cx + half), (cy - half)..(cy + half))
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn plot_error<E: fmt::Display>(path: &Path) -> impl Fn(E) -> KmerBinError + '_ {
    move |e| KmerBinError::Plot {
        details: e.to_string(),
        path: path.to_path_buf(),
    }
}
