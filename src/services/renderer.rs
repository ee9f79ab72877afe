//! Dashboard Renderer
//!
//! Slices the merged series to a trailing window and draws stacked panels.
//! `None` indicator values draw nothing; line series break at gaps.

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{DailyBar, MergedRow, PanelKind};
use crate::services::volume_profile::VolumeProfile;

const UP_COLOR: RGBColor = RGBColor(220, 38, 38);
const DOWN_COLOR: RGBColor = RGBColor(22, 163, 74);
const MA5_COLOR: RGBColor = RGBColor(255, 165, 0);
const MA20_COLOR: RGBColor = RGBColor(255, 0, 255);
const BAND_COLOR: RGBColor = RGBColor(128, 128, 128);
const FAST_LINE_COLOR: RGBColor = RGBColor(37, 99, 235);
const SLOW_LINE_COLOR: RGBColor = RGBColor(234, 88, 12);
const PROFILE_COLOR: RGBColor = RGBColor(100, 116, 139);
const GRID_COLOR: RGBColor = RGBColor(226, 232, 240);

/// Trailing window of merged rows handed to a renderer
#[derive(Debug, Clone, Copy)]
pub struct DashboardFrame<'a> {
    pub symbol: &'a str,
    pub rows: &'a [MergedRow],
}

impl<'a> DashboardFrame<'a> {
    /// Keep the last `display_window` rows (all of them when fewer)
    pub fn from_rows(symbol: &'a str, rows: &'a [MergedRow], display_window: usize) -> Self {
        let start = rows.len().saturating_sub(display_window);
        Self {
            symbol,
            rows: &rows[start..],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn bars(&self) -> Vec<&'a DailyBar> {
        self.rows.iter().map(|r| &r.bar).collect()
    }
}

/// Turns a frame into an image file
pub trait DashboardRenderer {
    fn render(
        &self,
        frame: &DashboardFrame<'_>,
        profile: &VolumeProfile,
        path: &Path,
    ) -> Result<()>;
}

/// PNG renderer backed by a bitmap canvas
#[derive(Debug, Clone)]
pub struct PngRenderer {
    pub width: u32,
    pub height: u32,
    pub panels: Vec<PanelKind>,
}

impl Default for PngRenderer {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1600,
            panels: PanelKind::default_set(),
        }
    }
}

impl PngRenderer {
    pub fn new(panels: Vec<PanelKind>) -> Self {
        Self {
            panels,
            ..Self::default()
        }
    }

    /// Pixel height of each panel, proportional to its ratio; the last panel
    /// takes the rounding remainder
    pub fn panel_heights(&self) -> Vec<u32> {
        let total_ratio: u32 = self.panels.iter().map(|p| p.height_ratio()).sum();
        if total_ratio == 0 {
            return Vec::new();
        }

        let mut heights: Vec<u32> = self
            .panels
            .iter()
            .map(|p| self.height * p.height_ratio() / total_ratio)
            .collect();
        let used: u32 = heights.iter().sum();
        if let Some(last) = heights.last_mut() {
            *last += self.height - used;
        }
        heights
    }
}

impl DashboardRenderer for PngRenderer {
    fn render(
        &self,
        frame: &DashboardFrame<'_>,
        profile: &VolumeProfile,
        path: &Path,
    ) -> Result<()> {
        if frame.is_empty() {
            return Err(Error::Render(format!("No rows to draw for {}", frame.symbol)));
        }

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut remaining = root.clone();
        let heights = self.panel_heights();
        for (panel, height) in self.panels.iter().zip(heights) {
            let (area, rest) = remaining.split_vertically(height as i32);
            draw_panel(&area, *panel, frame, profile)?;
            remaining = rest;
        }

        root.present().map_err(render_err)?;
        tracing::info!(
            "Rendered {} rows for {} to {}",
            frame.len(),
            frame.symbol,
            path.display()
        );
        Ok(())
    }
}

fn render_err<E: std::fmt::Debug>(e: E) -> Error {
    Error::Render(format!("{:?}", e))
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: PanelKind,
    frame: &DashboardFrame<'_>,
    profile: &VolumeProfile,
) -> Result<()> {
    let rows = frame.rows;
    match panel {
        PanelKind::Price => draw_price_panel(area, rows, profile),
        PanelKind::Volume => {
            let bars: Vec<(f64, RGBColor)> = rows
                .iter()
                .map(|r| {
                    let color = if r.bar.is_up() { UP_COLOR } else { DOWN_COLOR };
                    (r.bar.volume as f64, color)
                })
                .collect();
            draw_bar_panel(area, &bars)
        }
        PanelKind::Institutional => {
            draw_bar_panel(area, &signed_bars(rows.iter().map(|r| r.chips.institutional_total)))
        }
        PanelKind::Margin => {
            draw_bar_panel(area, &signed_bars(rows.iter().map(|r| r.chips.margin_delta)))
        }
        PanelKind::Breadth => {
            draw_bar_panel(area, &signed_bars(rows.iter().map(|r| r.chips.buy_sell_diff)))
        }
        PanelKind::Stochastic => {
            let k: Vec<Option<f64>> = rows.iter().map(|r| r.indicators.k).collect();
            let d: Vec<Option<f64>> = rows.iter().map(|r| r.indicators.d).collect();
            draw_line_panel(area, &[(k, FAST_LINE_COLOR), (d, SLOW_LINE_COLOR)], &[])
        }
        PanelKind::Macd => {
            let dif: Vec<Option<f64>> = rows.iter().map(|r| r.indicators.dif).collect();
            let dea: Vec<Option<f64>> = rows.iter().map(|r| r.indicators.dea).collect();
            let hist = signed_bars(rows.iter().map(|r| r.indicators.macd_hist.unwrap_or(0.0)));
            draw_line_panel(area, &[(dif, FAST_LINE_COLOR), (dea, SLOW_LINE_COLOR)], &hist)
        }
    }
}

/// Red for non-negative values, green for negative
fn signed_bars(values: impl Iterator<Item = f64>) -> Vec<(f64, RGBColor)> {
    values
        .map(|v| (v, if v >= 0.0 { UP_COLOR } else { DOWN_COLOR }))
        .collect()
}

/// Split a series at `None` into drawable (x, y) runs
pub fn line_segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) if v.is_finite() => current.push((i as f64, *v)),
            _ => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Y range covering all values with a small margin
pub fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if min > max {
        return -1.0..1.0;
    }
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }

    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

fn x_range(len: usize) -> Range<f64> {
    -0.5..(len as f64 - 0.5)
}

fn draw_price_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    rows: &[MergedRow],
    profile: &VolumeProfile,
) -> Result<()> {
    let y_range = padded_range(rows.iter().flat_map(|r| {
        [
            Some(r.bar.low),
            Some(r.bar.high),
            r.indicators.bb_up,
            r.indicators.bb_low,
        ]
        .into_iter()
        .flatten()
    }));

    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .build_cartesian_2d(x_range(rows.len()), y_range)
        .map_err(render_err)?;

    // Volume profile along the right edge, behind the candles
    if let Some(max_volume) = profile
        .levels
        .iter()
        .map(|l| l.volume)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .filter(|v| *v > 0.0)
    {
        let right = rows.len() as f64 - 0.5;
        let max_width = rows.len() as f64 * 0.25;
        chart
            .draw_series(profile.levels.iter().map(|level| {
                let width = level.volume / max_volume * max_width;
                Rectangle::new(
                    [(right - width, level.price), (right, level.price + profile.bucket_size)],
                    PROFILE_COLOR.mix(0.25).filled(),
                )
            }))
            .map_err(render_err)?;
    }

    // Candles
    chart
        .draw_series(rows.iter().enumerate().map(|(i, r)| {
            let color = if r.bar.is_up() { UP_COLOR } else { DOWN_COLOR };
            PathElement::new(vec![(i as f64, r.bar.low), (i as f64, r.bar.high)], color)
        }))
        .map_err(render_err)?;
    chart
        .draw_series(rows.iter().enumerate().map(|(i, r)| {
            let color = if r.bar.is_up() { UP_COLOR } else { DOWN_COLOR };
            let x = i as f64;
            Rectangle::new([(x - 0.35, r.bar.open), (x + 0.35, r.bar.close)], color.filled())
        }))
        .map_err(render_err)?;

    let overlays: [(Vec<Option<f64>>, RGBColor, u32); 4] = [
        (rows.iter().map(|r| r.indicators.ma5).collect(), MA5_COLOR, 1),
        (rows.iter().map(|r| r.indicators.ma20).collect(), MA20_COLOR, 2),
        (rows.iter().map(|r| r.indicators.bb_up).collect(), BAND_COLOR, 1),
        (rows.iter().map(|r| r.indicators.bb_low).collect(), BAND_COLOR, 1),
    ];
    for (values, color, width) in overlays.iter() {
        for segment in line_segments(values) {
            chart
                .draw_series(LineSeries::new(segment, color.stroke_width(*width)))
                .map_err(render_err)?;
        }
    }

    Ok(())
}

fn draw_bar_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    bars: &[(f64, RGBColor)],
) -> Result<()> {
    let y_range = padded_range(bars.iter().map(|(v, _)| *v).chain(std::iter::once(0.0)));

    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .build_cartesian_2d(x_range(bars.len()), y_range)
        .map_err(render_err)?;
    draw_baseline(&mut chart, bars.len())?;

    draw_bars(&mut chart, bars)
}

type PanelChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw_baseline<DB: DrawingBackend>(chart: &mut PanelChart<'_, DB>, len: usize) -> Result<()> {
    let x = x_range(len);
    let baseline = PathElement::new(vec![(x.start, 0.0), (x.end, 0.0)], GRID_COLOR);
    chart
        .draw_series(std::iter::once(baseline))
        .map_err(render_err)?;
    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    chart: &mut PanelChart<'_, DB>,
    bars: &[(f64, RGBColor)],
) -> Result<()> {
    chart
        .draw_series(bars.iter().enumerate().map(|(i, (value, color))| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *value)], color.filled())
        }))
        .map_err(render_err)?;
    Ok(())
}

fn draw_line_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    lines: &[(Vec<Option<f64>>, RGBColor)],
    bars: &[(f64, RGBColor)],
) -> Result<()> {
    let len = lines.iter().map(|(v, _)| v.len()).max().unwrap_or(0).max(bars.len());
    let y_range = padded_range(
        lines
            .iter()
            .flat_map(|(values, _)| values.iter().flatten().copied())
            .chain(bars.iter().map(|(v, _)| *v)),
    );

    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .build_cartesian_2d(x_range(len), y_range)
        .map_err(render_err)?;
    draw_baseline(&mut chart, len)?;

    if !bars.is_empty() {
        draw_bars(&mut chart, bars)?;
    }

    for (values, color) in lines {
        for segment in line_segments(values) {
            chart
                .draw_series(LineSeries::new(segment, color.stroke_width(1)))
                .map_err(render_err)?;
        }
    }

    Ok(())
}
