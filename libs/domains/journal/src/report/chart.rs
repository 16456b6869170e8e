//! Raster line chart of bucketed event counts

use crate::buckets::{Granularity, TimeBucket};
use crate::error::RenderError;

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 400;

const BACKGROUND: Rgb = Rgb(255, 255, 255);
const AXIS: Rgb = Rgb(64, 64, 64);
const GRID: Rgb = Rgb(226, 226, 226);
const LINE: Rgb = Rgb(75, 192, 192);
const MARKER: Rgb = Rgb(44, 130, 130);

const MARGIN_LEFT: u32 = 50;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 20;
const MARGIN_BOTTOM: u32 = 40;
const GRID_LINES: u32 = 5;

/// Input to a chart renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    pub granularity: Granularity,
    pub buckets: Vec<TimeBucket>,
}

/// Rendered chart: packed 8-bit RGB rows, top row first, plus the axis
/// extents so a document can label it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub peak: u64,
    pub first_label: String,
    pub last_label: String,
}

pub trait ChartRenderer: Send + Sync {
    fn render(&self, series: &ChartSeries) -> Result<ChartImage, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb(u8, u8, u8);

struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32, fill: Rgb) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[fill.0, fill.1, fill.2]);
        }
        Self { width, height, pixels }
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let offset = ((y as usize) * self.width as usize + x as usize) * 3;
        self.pixels[offset..offset + 3].copy_from_slice(&[color.0, color.1, color.2]);
    }

    fn hline(&mut self, x0: i64, x1: i64, y: i64, color: Rgb) {
        for x in x0.min(x1)..=x0.max(x1) {
            self.put(x, y, color);
        }
    }

    fn vline(&mut self, x: i64, y0: i64, y1: i64, color: Rgb) {
        for y in y0.min(y1)..=y0.max(y1) {
            self.put(x, y, color);
        }
    }

    /// Bresenham, drawn two pixels thick.
    fn line(&mut self, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);

        loop {
            self.put(x, y, color);
            self.put(x, y + 1, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn disc(&mut self, cx: i64, cy: i64, radius: i64, color: Rgb) {
        for y in -radius..=radius {
            for x in -radius..=radius {
                if x * x + y * y <= radius * radius {
                    self.put(cx + x, cy + y, color);
                }
            }
        }
    }
}

/// Built-in line chart renderer; no fonts, text is left to the document.
#[derive(Debug, Clone, Copy)]
pub struct RasterChartRenderer {
    width: u32,
    height: u32,
}

impl Default for RasterChartRenderer {
    fn default() -> Self {
        Self::new(CHART_WIDTH, CHART_HEIGHT)
    }
}

impl RasterChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn plot_area(&self) -> Result<(i64, i64, i64, i64), RenderError> {
        if self.width <= MARGIN_LEFT + MARGIN_RIGHT || self.height <= MARGIN_TOP + MARGIN_BOTTOM {
            return Err(RenderError::Chart(format!(
                "canvas {}x{} is too small",
                self.width, self.height
            )));
        }
        Ok((
            MARGIN_LEFT as i64,
            MARGIN_TOP as i64,
            (self.width - MARGIN_RIGHT - 1) as i64,
            (self.height - MARGIN_BOTTOM - 1) as i64,
        ))
    }
}

impl ChartRenderer for RasterChartRenderer {
    fn render(&self, series: &ChartSeries) -> Result<ChartImage, RenderError> {
        let (Some(first), Some(last)) = (series.buckets.first(), series.buckets.last()) else {
            return Err(RenderError::EmptySeries);
        };
        let (left, top, right, bottom) = self.plot_area()?;
        let mut canvas = Canvas::new(self.width, self.height, BACKGROUND);

        for i in 0..=GRID_LINES {
            let y = bottom - (bottom - top) * i as i64 / GRID_LINES as i64;
            canvas.hline(left, right, y, GRID);
        }
        canvas.vline(left, top, bottom, AXIS);
        canvas.hline(left, right, bottom, AXIS);

        let peak = series.buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        let n = series.buckets.len() as i64;
        let points: Vec<(i64, i64)> = series
            .buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| {
                let x = if n == 1 {
                    (left + right) / 2
                } else {
                    left + (right - left) * i as i64 / (n - 1)
                };
                let y = bottom - ((bottom - top) as u64 * bucket.count / peak) as i64;
                (x, y)
            })
            .collect();

        for pair in points.windows(2) {
            canvas.line(pair[0], pair[1], LINE);
        }
        for &(x, y) in &points {
            canvas.disc(x, y, 3, MARKER);
        }

        Ok(ChartImage {
            title: series.title.clone(),
            width: canvas.width,
            height: canvas.height,
            pixels: canvas.pixels,
            peak,
            first_label: first.label.clone(),
            last_label: last.label.clone(),
        })
    }
}
