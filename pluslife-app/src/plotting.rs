//! Amplification curves of a testrun, one line per channel.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use pluslife_core::testrun::Testrun;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Line colour per channel index.
pub const CHANNEL_COLORS: [RGBColor; 7] = [
    RGBColor(0xa6, 0xce, 0xe3),
    RGBColor(0x1f, 0x78, 0xb4),
    RGBColor(0xb2, 0xdf, 0x8a),
    RGBColor(0x33, 0xa0, 0x2c),
    RGBColor(0xfb, 0x9a, 0x99),
    RGBColor(0xe3, 0x1a, 0x1c),
    RGBColor(0xfd, 0xbf, 0x6f),
];

/// Points per smoothed curve.
const SMOOTHED_POINTS: usize = 500;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    /// Shift every channel so its first readings sit at zero.
    pub normalize: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            normalize: true,
        }
    }
}

/// An RGB raster, three bytes per pixel, row-major.
#[derive(Debug, Clone)]
pub struct PlotImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Groups samples by channel as `(minutes, value)` points in arrival order.
pub fn channel_series(testrun: &Testrun, normalize: bool) -> BTreeMap<u32, Vec<(f64, f64)>> {
    let mut series: BTreeMap<u32, Vec<(f64, f64)>> = BTreeMap::new();
    for sample in &testrun.samples {
        series
            .entry(sample.starting_channel)
            .or_default()
            .push((sample.sampling_minutes(), sample.first_channel_result as f64));
    }

    if normalize {
        for points in series.values_mut() {
            let base = baseline(points);
            for point in points.iter_mut() {
                point.1 -= base;
            }
        }
    }
    series
}

/// Mean of the first one to three values.
fn baseline(points: &[(f64, f64)]) -> f64 {
    let head = &points[..points.len().min(3)];
    if head.is_empty() {
        return 0.0;
    }
    head.iter().map(|p| p.1).sum::<f64>() / head.len() as f64
}

/// Resamples a series along a natural cubic spline.
///
/// Series with fewer than four points, or whose times do not strictly
/// increase, are returned unchanged.
pub fn smooth(points: &[(f64, f64)], resolution: usize) -> Vec<(f64, f64)> {
    let n = points.len();
    if n < 4 || resolution < 2 || points.windows(2).any(|w| w[1].0 <= w[0].0) {
        return points.to_vec();
    }

    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();

    // Second derivatives, zero at both ends, via the Thomas algorithm.
    let mut m = vec![0.0; n];
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];
    for i in 1..n - 1 {
        let a = h[i - 1];
        let b = 2.0 * (h[i - 1] + h[i]);
        let c = h[i];
        let d = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
        let denom = b - a * c_prime[i - 1];
        c_prime[i] = c / denom;
        d_prime[i] = (d - a * d_prime[i - 1]) / denom;
    }
    for i in (1..n - 1).rev() {
        m[i] = d_prime[i] - c_prime[i] * m[i + 1];
    }

    let (first, last) = (xs[0], xs[n - 1]);
    let step = (last - first) / (resolution - 1) as f64;
    let mut segment = 0;
    (0..resolution)
        .map(|k| {
            let t = if k == resolution - 1 { last } else { first + step * k as f64 };
            while segment < n - 2 && t > xs[segment + 1] {
                segment += 1;
            }
            let i = segment;
            let hi = h[i];
            let left = xs[i + 1] - t;
            let right = t - xs[i];
            let y = m[i] * left.powi(3) / (6.0 * hi)
                + m[i + 1] * right.powi(3) / (6.0 * hi)
                + (ys[i] / hi - m[i] * hi / 6.0) * left
                + (ys[i + 1] / hi - m[i + 1] * hi / 6.0) * right;
            (t, y)
        })
        .collect()
}

fn axis_range(values: impl Iterator<Item = f64>, margin: f64) -> std::ops::Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * margin } else { 1.0 };
    (lo - pad)..(hi + pad)
}

fn draw_curves<DB>(root: DrawingArea<DB, Shift>, testrun: &Testrun, options: &PlotOptions) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let curves: BTreeMap<u32, Vec<(f64, f64)>> = channel_series(testrun, options.normalize)
        .into_iter()
        .map(|(channel, points)| (channel, smooth(&points, SMOOTHED_POINTS)))
        .collect();

    let x_range = axis_range(curves.values().flatten().map(|p| p.0), 0.0);
    let y_range = axis_range(curves.values().flatten().map(|p| p.1), 0.1);

    let title = format!("Pluslife Test of {} at {}", testrun.test_type, testrun.start);
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 40).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, y_range)?;

    chart.configure_mesh().x_desc("Time [min]").draw()?;

    for (channel, points) in &curves {
        let color = CHANNEL_COLORS[*channel as usize % CHANNEL_COLORS.len()];
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(format!("Channel {}", channel))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Renders the plot straight to a PNG file.
pub fn render_png(testrun: &Testrun, options: &PlotOptions, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    draw_curves(root, testrun, options)?;
    info!(path = %path.display(), "saved plot");
    Ok(())
}

/// Renders the plot into an in-memory RGB raster.
pub fn render_rgb(testrun: &Testrun, options: &PlotOptions) -> Result<PlotImage> {
    let mut pixels = vec![0u8; options.width as usize * options.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (options.width, options.height))
            .into_drawing_area();
        draw_curves(root, testrun, options)?;
    }
    Ok(PlotImage {
        width: options.width,
        height: options.height,
        pixels,
    })
}
