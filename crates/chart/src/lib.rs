use std::path::Path;

use chrono::{TimeZone, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use common::{Error, Kline, Result};

/// Output size in pixels.
pub const CHART_SIZE: (u32, u32) = (1000, 500);

const FONT_FAMILY: &str = "sans-serif";
static FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Make the bundled font available to plotters under `sans-serif`.
fn register_fonts() -> Result<()> {
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, FONT)
        .map_err(|_| chart_err("InvalidFont"))
}

/// Render close prices as a titled line chart with grid, axis labels and
/// legend, and write it to `path` as PNG.
pub fn render_close_prices(
    klines: &[Kline],
    title: &str,
    y_desc: &str,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    if klines.is_empty() {
        return Err(Error::Chart("no K-lines to plot".to_string()));
    }
    register_fonts()?;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    draw(&root, klines, title, y_desc)?;
    root.present().map_err(chart_err)?;

    info!(path = %path.display(), points = klines.len(), "Chart saved");
    Ok(())
}

fn draw(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    klines: &[Kline],
    title: &str,
    y_desc: &str,
) -> Result<()> {
    let points: Vec<(i64, f64)> = klines
        .iter()
        .map(|k| (k.open_time.timestamp_millis(), k.close))
        .collect();
    let (x_range, y_range) = bounds(&points);

    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT_FAMILY, 24))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc("Time (UTC)")
        .y_desc(y_desc)
        .x_labels(8)
        .x_label_formatter(&|ms: &i64| format_ms(*ms))
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(points, &BLUE))
        .map_err(chart_err)?
        .label("Close Price")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err)?;

    Ok(())
}

/// Axis ranges with a 2% price pad; a single point still gets a non-empty range.
fn bounds(points: &[(i64, f64)]) -> (std::ops::Range<i64>, std::ops::Range<f64>) {
    let x_min = points.iter().map(|p| p.0).min().unwrap_or(0);
    let x_max = points.iter().map(|p| p.0).max().unwrap_or(0);
    let y_min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let pad = ((y_max - y_min) * 0.02).max(y_max.abs() * 0.001).max(1e-9);
    let x_end = if x_max > x_min { x_max } else { x_min + 1 };
    (x_min..x_end, (y_min - pad)..(y_max + pad))
}

fn format_ms(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn chart_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Chart(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn series(n: usize) -> Vec<Kline> {
        let start = Utc.timestamp_millis_opt(1_690_000_000_000).unwrap();
        (0..n)
            .map(|i| {
                let close = 29_000.0 + (i as f64 * 37.0) % 250.0;
                Kline {
                    open_time: start + Duration::hours(i as i64),
                    open: close - 10.0,
                    high: close + 20.0,
                    low: close - 20.0,
                    close,
                    volume: 1.0,
                }
            })
            .collect()
    }

    #[test]
    fn writes_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        render_close_prices(&series(24), "BTC/USDT 1-Hour Price", "Price (USDT)", &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn caption_axes_and_grid_are_drawn() {
        let (w, h) = CHART_SIZE;
        let mut buf = vec![0u8; (w * h * 3) as usize];
        register_fonts().unwrap();
        {
            let root = BitMapBackend::with_buffer(&mut buf, CHART_SIZE).into_drawing_area();
            draw(&root, &series(24), "BTCUSDT 1-Hour Close Price", "Price (USDT)").unwrap();
            root.present().unwrap();
        }

        let inked = |xs: std::ops::Range<u32>, ys: std::ops::Range<u32>| {
            ys.clone().any(|y| {
                xs.clone().any(|x| {
                    let i = ((y * w + x) * 3) as usize;
                    buf[i..i + 3] != [255u8; 3]
                })
            })
        };
        // Caption band above the plot area.
        assert!(inked(300..700, 0..45), "caption missing");
        // Y-axis label area left of the plot.
        assert!(inked(15..95, 100..400), "y-axis labels missing");
        // X-axis label area below the plot.
        assert!(inked(200..800, h - 70..h - 15), "x-axis labels missing");
    }

    #[test]
    fn empty_series_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_close_prices(&[], "empty", "Price", dir.path().join("x.png")).unwrap_err();
        assert!(matches!(err, Error::Chart(_)));
    }

    #[test]
    fn flat_single_point_has_non_empty_ranges() {
        let (x, y) = bounds(&[(1_690_000_000_000, 100.0)]);
        assert!(x.end > x.start);
        assert!(y.end > y.start);
    }

    #[test]
    fn label_format_is_utc() {
        assert_eq!(format_ms(1_690_000_000_000), "07-22 04:26");
    }
}
