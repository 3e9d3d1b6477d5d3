//! Chart colors
//!
//! Color strings in chart specs may come from configuration or future
//! themes; the rasterizer only understands opaque sRGB, so everything is
//! normalized here first.

use image::Rgb;

/// Series colors, cycled per data point
pub const SERIES_COLORS: [&str; 6] = [
    "#0088FE", // Blue
    "#00C49F", // Teal
    "#FFBB28", // Amber
    "#FF8042", // Orange
    "#8884D8", // Lavender
    "#82CA9D", // Green
];

/// Page background of rendered panels
pub const BACKGROUND: Rgb<u8> = Rgb([248, 250, 252]);

/// Axes and grid lines
pub const AXIS: Rgb<u8> = Rgb([148, 163, 184]);

/// Parse a color, falling back to the palette entry for `fallback_idx`
///
/// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa` (alpha is composited onto
/// [`BACKGROUND`]). Anything else (`oklch(...)`, named colors, garbage)
/// yields the fallback.
pub fn normalize_color(color: &str, fallback_idx: usize) -> Rgb<u8> {
    parse_hex(color).unwrap_or_else(|| {
        let fallback = SERIES_COLORS[fallback_idx % SERIES_COLORS.len()];
        parse_hex(fallback).unwrap_or(AXIS)
    })
}

fn parse_hex(color: &str) -> Option<Rgb<u8>> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(Rgb(rgb))
        }
        6 => Some(Rgb([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ])),
        8 => {
            let alpha = channel(&hex[6..8])? as f32 / 255.0;
            let blend = |c: u8, bg: u8| (c as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8;
            Some(Rgb([
                blend(channel(&hex[0..2])?, BACKGROUND.0[0]),
                blend(channel(&hex[2..4])?, BACKGROUND.0[1]),
                blend(channel(&hex[4..6])?, BACKGROUND.0[2]),
            ]))
        }
        _ => None,
    }
}
