//! Off-screen chart rasterizer
//!
//! Draws a [`ChartSpec`] into an isolated RGB bitmap. Geometry is expressed in
//! logical pixels and multiplied by the oversampling factor, so a 480x300
//! panel at 2x produces a 960x600 image. Labels are not rasterized; the
//! export pipeline typesets them next to the bitmap.

use image::{Rgb, RgbImage};
use std::f32::consts::{PI, TAU};
use thiserror::Error;

use super::palette::{normalize_color, AXIS, BACKGROUND};
use super::spec::{ChartKind, ChartSpec};

/// Largest bitmap edge the rasterizer will allocate
pub const MAX_DIMENSION: u32 = 8192;

/// Size and resolution of a rendered panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    /// Physical pixels per logical pixel
    pub oversampling: u32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            width: 480,
            height: 300,
            oversampling: 2,
        }
    }
}

/// Rasterization failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RasterError {
    #[error("Panel has zero size ({width}x{height} at {oversampling}x)")]
    ZeroSize {
        width: u32,
        height: u32,
        oversampling: u32,
    },

    #[error("Panel too large: {width}x{height} px exceeds the 8192 px limit")]
    TooLarge { width: u32, height: u32 },
}

/// Isolated drawing surface in logical coordinates
pub struct Canvas {
    image: RgbImage,
    scale: f32,
}

impl Canvas {
    /// Allocate a canvas filled with the panel background
    pub fn new(options: RasterOptions) -> Result<Self, RasterError> {
        let RasterOptions {
            width,
            height,
            oversampling,
        } = options;

        if width == 0 || height == 0 || oversampling == 0 {
            return Err(RasterError::ZeroSize {
                width,
                height,
                oversampling,
            });
        }

        let px_width = width.checked_mul(oversampling).unwrap_or(u32::MAX);
        let px_height = height.checked_mul(oversampling).unwrap_or(u32::MAX);
        if px_width > MAX_DIMENSION || px_height > MAX_DIMENSION {
            return Err(RasterError::TooLarge {
                width: px_width,
                height: px_height,
            });
        }

        Ok(Self {
            image: RgbImage::from_pixel(px_width, px_height, BACKGROUND),
            scale: oversampling as f32,
        })
    }

    /// Logical width
    pub fn width(&self) -> f32 {
        self.image.width() as f32 / self.scale
    }

    /// Logical height
    pub fn height(&self) -> f32 {
        self.image.height() as f32 / self.scale
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Visit every physical pixel whose center lies in the logical box,
    /// passing the pixel center in logical coordinates
    fn for_each_in_box<F>(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, mut paint: F)
    where
        F: FnMut(f32, f32) -> Option<Rgb<u8>>,
    {
        let max_x = self.image.width() as f32;
        let max_y = self.image.height() as f32;
        let px0 = (x0 * self.scale).floor().clamp(0.0, max_x) as u32;
        let py0 = (y0 * self.scale).floor().clamp(0.0, max_y) as u32;
        let px1 = (x1 * self.scale).ceil().clamp(0.0, max_x) as u32;
        let py1 = (y1 * self.scale).ceil().clamp(0.0, max_y) as u32;

        for py in py0..py1 {
            for px in px0..px1 {
                let lx = (px as f32 + 0.5) / self.scale;
                let ly = (py as f32 + 0.5) / self.scale;
                if let Some(color) = paint(lx, ly) {
                    self.image.put_pixel(px, py, color);
                }
            }
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb<u8>) {
        self.for_each_in_box(x, y, x + w, y + h, |_, _| Some(color));
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: Rgb<u8>) {
        let r2 = r * r;
        self.for_each_in_box(cx - r, cy - r, cx + r, cy + r, |x, y| {
            let (dx, dy) = (x - cx, y - cy);
            (dx * dx + dy * dy <= r2).then_some(color)
        });
    }

    pub fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgb<u8>) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = (dx * dx + dy * dy).sqrt();
        let steps = ((length * self.scale * 2.0).ceil() as usize).max(1);
        let radius = width / 2.0;

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.fill_circle(from.0 + dx * t, from.1 + dy * t, radius, color);
        }
    }

    pub fn stroke_polygon(&mut self, points: &[(f32, f32)], width: f32, color: Rgb<u8>) {
        for (i, &from) in points.iter().enumerate() {
            let to = points[(i + 1) % points.len()];
            self.stroke_line(from, to, width, color);
        }
    }

    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: Rgb<u8>) {
        if points.len() < 3 {
            return;
        }
        let (mut x0, mut y0, mut x1, mut y1) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for &(x, y) in points {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        self.for_each_in_box(x0, y0, x1, y1, |x, y| {
            point_in_polygon(x, y, points).then_some(color)
        });
    }

    /// Pie wedges clockwise from twelve o'clock; `shares` must sum to 1
    pub fn fill_wedges(&mut self, cx: f32, cy: f32, r: f32, shares: &[(f32, Rgb<u8>)]) {
        let mut bounds = Vec::with_capacity(shares.len());
        let mut acc = 0.0f32;
        for &(share, color) in shares {
            acc += share;
            bounds.push((acc, color));
        }
        let r2 = r * r;

        self.for_each_in_box(cx - r, cy - r, cx + r, cy + r, |x, y| {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy > r2 {
                return None;
            }
            let angle = dx.atan2(-dy).rem_euclid(TAU);
            let fraction = angle / TAU;
            bounds
                .iter()
                .find(|(upper, _)| fraction < *upper)
                .or_else(|| bounds.last())
                .map(|&(_, color)| color)
        });
    }
}

fn point_in_polygon(x: f32, y: f32, points: &[(f32, f32)]) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Mix `color` towards the background; `amount` 0 keeps the color
fn tint(color: Rgb<u8>, amount: f32) -> Rgb<u8> {
    let mix = |c: u8, bg: u8| (c as f32 * (1.0 - amount) + bg as f32 * amount).round() as u8;
    Rgb([
        mix(color.0[0], BACKGROUND.0[0]),
        mix(color.0[1], BACKGROUND.0[1]),
        mix(color.0[2], BACKGROUND.0[2]),
    ])
}

const MARGIN: f32 = 24.0;

/// Render a chart into a new bitmap
pub fn render_chart(spec: &ChartSpec, options: RasterOptions) -> Result<RgbImage, RasterError> {
    let mut canvas = Canvas::new(options)?;

    if !spec.is_empty() {
        match spec.kind {
            ChartKind::Pie => draw_pie(&mut canvas, spec),
            ChartKind::Bar => draw_bars(&mut canvas, spec),
            ChartKind::Line => draw_line(&mut canvas, spec),
            ChartKind::Radar => draw_radar(&mut canvas, spec),
        }
    }

    Ok(canvas.into_image())
}

fn draw_pie(canvas: &mut Canvas, spec: &ChartSpec) {
    let total = spec.total();
    if total <= 0.0 {
        return;
    }
    let shares: Vec<(f32, Rgb<u8>)> = spec
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| ((p.value / total) as f32, normalize_color(&p.color, i)))
        .collect();

    let cx = canvas.width() / 2.0;
    let cy = canvas.height() / 2.0;
    let r = (canvas.width().min(canvas.height()) / 2.0 - MARGIN).max(1.0);
    canvas.fill_wedges(cx, cy, r, &shares);
}

fn draw_bars(canvas: &mut Canvas, spec: &ChartSpec) {
    let max = spec.max_value().max(1.0);
    let left = MARGIN;
    let top = MARGIN;
    let width = canvas.width() - 2.0 * MARGIN;
    let height = canvas.height() - 2.0 * MARGIN;
    let slot = height / spec.points.len() as f32;
    let bar = slot * 0.7;

    for (i, point) in spec.points.iter().enumerate() {
        let length = (point.value / max) as f32 * width;
        let y = top + slot * i as f32 + (slot - bar) / 2.0;
        canvas.fill_rect(left, y, length, bar, normalize_color(&point.color, i));
    }

    canvas.stroke_line((left, top), (left, top + height), 1.0, AXIS);
}

fn draw_line(canvas: &mut Canvas, spec: &ChartSpec) {
    let max = spec.max_value().max(1.0);
    let left = MARGIN;
    let bottom = canvas.height() - MARGIN;
    let width = canvas.width() - 2.0 * MARGIN;
    let height = canvas.height() - 2.0 * MARGIN;

    for step in 1..=4 {
        let y = bottom - height * step as f32 / 4.0;
        canvas.stroke_line((left, y), (left + width, y), 0.5, tint(AXIS, 0.6));
    }
    canvas.stroke_line((left, bottom), (left + width, bottom), 1.0, AXIS);
    canvas.stroke_line((left, bottom), (left, bottom - height), 1.0, AXIS);

    let n = spec.points.len();
    let coords: Vec<(f32, f32)> = spec
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x = if n == 1 {
                left + width / 2.0
            } else {
                left + width * i as f32 / (n - 1) as f32
            };
            (x, bottom - (p.value / max) as f32 * height)
        })
        .collect();

    let color = spec
        .points
        .first()
        .map(|p| normalize_color(&p.color, 0))
        .unwrap_or(AXIS);

    for pair in coords.windows(2) {
        canvas.stroke_line(pair[0], pair[1], 2.0, color);
    }
    for &(x, y) in &coords {
        canvas.fill_circle(x, y, 3.5, color);
    }
}

fn draw_radar(canvas: &mut Canvas, spec: &ChartSpec) {
    let max = spec.max_value().max(1.0);
    let cx = canvas.width() / 2.0;
    let cy = canvas.height() / 2.0;
    let r = (canvas.width().min(canvas.height()) / 2.0 - MARGIN).max(1.0);
    let n = spec.points.len();

    let vertex = |i: usize, radius: f32| {
        let angle = -PI / 2.0 + TAU * i as f32 / n as f32;
        (cx + radius * angle.cos(), cy + radius * angle.sin())
    };

    let grid = tint(AXIS, 0.4);
    for ring in 1..=4 {
        let radius = r * ring as f32 / 4.0;
        let ring_points: Vec<(f32, f32)> = (0..n).map(|i| vertex(i, radius)).collect();
        if n >= 3 {
            canvas.stroke_polygon(&ring_points, 0.5, grid);
        }
    }
    for i in 0..n {
        canvas.stroke_line((cx, cy), vertex(i, r), 0.5, grid);
    }

    let color = spec
        .points
        .first()
        .map(|p| normalize_color(&p.color, 0))
        .unwrap_or(AXIS);
    let shape: Vec<(f32, f32)> = spec
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| vertex(i, (p.value / max) as f32 * r))
        .collect();

    canvas.fill_polygon(&shape, tint(color, 0.5));
    if n >= 3 {
        canvas.stroke_polygon(&shape, 1.5, color);
    }
    for &(x, y) in &shape {
        canvas.fill_circle(x, y, 2.5, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::palette::SERIES_COLORS;

    fn count_color(image: &RgbImage, color: Rgb<u8>) -> usize {
        image.pixels().filter(|p| **p == color).count()
    }

    #[test]
    fn test_oversampling_doubles_dimensions() {
        let spec = ChartSpec::new(ChartKind::Bar, "t", "v").point("a", "a: 1", 1.0);
        let image = render_chart(&spec, RasterOptions::default()).unwrap();
        assert_eq!(image.dimensions(), (960, 600));
    }

    #[test]
    fn test_rejects_degenerate_sizes() {
        let spec = ChartSpec::new(ChartKind::Pie, "t", "v");
        let zero = RasterOptions {
            width: 0,
            ..RasterOptions::default()
        };
        assert!(matches!(render_chart(&spec, zero), Err(RasterError::ZeroSize { .. })));

        let huge = RasterOptions {
            width: 5000,
            height: 100,
            oversampling: 2,
        };
        assert!(matches!(render_chart(&spec, huge), Err(RasterError::TooLarge { .. })));
    }

    #[test]
    fn test_pie_wedges_proportional() {
        let spec = ChartSpec::new(ChartKind::Pie, "t", "v")
            .point("a", "a", 3.0)
            .point("b", "b", 1.0);
        let image = render_chart(&spec, RasterOptions::default()).unwrap();

        let a = count_color(&image, normalize_color(SERIES_COLORS[0], 0));
        let b = count_color(&image, normalize_color(SERIES_COLORS[1], 1));
        assert!(a > 0 && b > 0);
        let ratio = a as f64 / b as f64;
        assert!((ratio - 3.0).abs() < 0.1, "ratio was {}", ratio);
    }

    #[test]
    fn test_empty_chart_is_blank() {
        let spec = ChartSpec::new(ChartKind::Line, "t", "v");
        let image = render_chart(&spec, RasterOptions::default()).unwrap();
        assert_eq!(count_color(&image, BACKGROUND), (960 * 600) as usize);
    }

    #[test]
    fn test_longest_bar_spans_plot_width() {
        let spec = ChartSpec::new(ChartKind::Bar, "t", "v")
            .point("a", "a", 10.0)
            .point("b", "b", 5.0);
        let options = RasterOptions {
            width: 200,
            height: 100,
            oversampling: 1,
        };
        let image = render_chart(&spec, options).unwrap();
        let a = count_color(&image, normalize_color(SERIES_COLORS[0], 0));
        let b = count_color(&image, normalize_color(SERIES_COLORS[1], 1));
        assert!(a > b);
        assert!((a as f64 / b as f64 - 2.0).abs() < 0.15);
    }

    #[test]
    fn test_radar_and_line_draw_something() {
        for kind in [ChartKind::Radar, ChartKind::Line] {
            let spec = ChartSpec::new(kind, "t", "v")
                .point("w", "w", 1.0)
                .point("s", "s", 2.0)
                .point("u", "u", 3.0)
                .point("a", "a", 0.0);
            let image = render_chart(&spec, RasterOptions::default()).unwrap();
            let series = normalize_color(SERIES_COLORS[0], 0);
            assert!(count_color(&image, series) > 0, "{} drew nothing", kind);
        }
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!(point_in_polygon(5.0, 5.0, &square));
        assert!(!point_in_polygon(15.0, 5.0, &square));
    }
}
