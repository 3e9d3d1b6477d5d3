//! PDF assembly
//!
//! Two passes: [`plan_document`] lays every block out on pages without
//! touching printpdf, then [`write_document`] replays the plan into a
//! document. Chart bitmaps come from the off-screen rasterizer so the visible
//! terminal output is never involved.

use image::{DynamicImage, Rgb, RgbImage};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference,
};
use tracing::debug;

use super::error::ExportResult;
use super::layout::{
    fit_ratio, natural_size_mm, wrap_text, FlowCursor, PageGeometry, Placement, IMAGE_DPI,
};
use super::report::{Report, Section};
use crate::chart::{normalize_color, render_chart, ChartKind, ChartSpec, RasterOptions};

/// Characters per wrapped body line at body size across the content width
const WRAP_CHARS: usize = 95;

const TEXT_COLOR: Rgb<u8> = Rgb([30, 41, 59]);
const MUTED_COLOR: Rgb<u8> = Rgb([100, 116, 139]);

const TITLE_PT: f32 = 16.0;
const SUBTITLE_PT: f32 = 9.0;
const SECTION_GAP_MM: f32 = 4.0;

/// Font and line metrics of a run of text
#[derive(Debug, Clone, Copy, PartialEq)]
struct TextStyle {
    size_pt: f32,
    line_mm: f32,
    bold: bool,
    color: Rgb<u8>,
}

impl TextStyle {
    fn with_color(self, color: Rgb<u8>) -> Self {
        Self { color, ..self }
    }
}

const HEADING: TextStyle = TextStyle {
    size_pt: 13.0,
    line_mm: 8.0,
    bold: true,
    color: TEXT_COLOR,
};

const BODY: TextStyle = TextStyle {
    size_pt: 10.0,
    line_mm: 5.0,
    bold: false,
    color: TEXT_COLOR,
};

/// What a draw operation puts on the page
#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    Text {
        text: String,
        size_pt: f32,
        bold: bool,
        color: Rgb<u8>,
        /// Baseline, measured from the top edge
        baseline_mm: f32,
    },
    Image {
        /// Index into the rasterized chart list
        chart: usize,
        top_mm: f32,
        width_mm: f32,
        height_mm: f32,
        /// Scale applied to the 300 dpi natural size
        scale: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawOp {
    pub page: usize,
    pub x_mm: f32,
    pub kind: DrawKind,
}

/// Positioned content of a whole document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPlan {
    pub page_count: usize,
    pub ops: Vec<DrawOp>,
}

impl DocumentPlan {
    pub fn ops_on(&self, page: usize) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(move |op| op.page == page)
    }

    pub fn image_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op.kind, DrawKind::Image { .. }))
            .count()
    }
}

/// Characters the Windows-1252 table adds in 0x80..=0x9F
const WIN_ANSI_EXTRA: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

/// Make text encodable by the built-in PDF fonts
///
/// Built-in fonts only cover Windows-1252 and printpdf drops anything else
/// without notice. Sub- and superscript digits become plain digits, combining
/// marks are dropped (the base letter stays), common symbols get an ASCII
/// spelling, and every other character becomes `?`.
pub fn win_ansi_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' | '\u{A0}'..='\u{FF}' => out.push(c),
            c if WIN_ANSI_EXTRA.contains(c) => out.push(c),
            '\u{2080}'..='\u{2089}' => out.push(digit(c as u32 - 0x2080)),
            '\u{2070}' => out.push('0'),
            '\u{2074}'..='\u{2079}' => out.push(digit(c as u32 - 0x2070)),
            '\u{0300}'..='\u{036F}' => {}
            '\t' | '\n' | '\r' => out.push(' '),
            '≤' => out.push_str("<="),
            '≥' => out.push_str(">="),
            '→' => out.push_str("->"),
            '−' | '‐' | '‑' => out.push('-'),
            '\u{2009}' | '\u{202F}' => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}

fn digit(n: u32) -> char {
    char::from_digit(n, 10).unwrap_or('?')
}

fn text_op(slot: &Placement, x_mm: f32, text: &str, style: TextStyle) -> DrawOp {
    DrawOp {
        page: slot.page,
        x_mm,
        kind: DrawKind::Text {
            text: win_ansi_text(text),
            size_pt: style.size_pt,
            bold: style.bold,
            color: style.color,
            baseline_mm: slot.top_mm + style.line_mm * 0.75,
        },
    }
}

/// Legend entry printed under a chart
fn legend_line(chart: &ChartSpec, idx: usize) -> String {
    let point = &chart.points[idx];
    match chart.kind {
        ChartKind::Pie => format!("{} ({:.1}%)", point.tooltip, chart.percent(idx)),
        _ => point.tooltip.clone(),
    }
}

/// Rasterize every non-empty chart of a report, in section order
pub fn rasterize_charts(
    report: &Report,
    options: RasterOptions,
) -> ExportResult<Vec<Option<RgbImage>>> {
    report
        .sections
        .iter()
        .filter_map(|section| match section {
            Section::Chart(chart) => Some(chart),
            Section::Text { .. } => None,
        })
        .map(|chart| {
            if chart.is_empty() {
                Ok(None)
            } else {
                Ok(Some(render_chart(chart, options)?))
            }
        })
        .collect()
}

/// Lay out a report
///
/// `chart_sizes` holds the pixel size of each chart bitmap in section order,
/// `None` for charts without data.
pub fn plan_document(
    report: &Report,
    chart_sizes: &[Option<(u32, u32)>],
    geometry: PageGeometry,
) -> DocumentPlan {
    let mut cursor = FlowCursor::new(geometry);
    let mut ops = Vec::new();
    let left = geometry.margin_mm;
    let mut chart_idx = 0;

    for section in &report.sections {
        match section {
            Section::Text { heading, lines } => {
                let slot = cursor.place(HEADING.line_mm);
                ops.push(text_op(&slot, left, heading, HEADING));

                for line in lines.iter().flat_map(|l| wrap_text(l, WRAP_CHARS)) {
                    let slot = cursor.place(BODY.line_mm);
                    ops.push(text_op(&slot, left, &line, BODY));
                }
            }
            Section::Chart(chart) => {
                let size = chart_sizes.get(chart_idx).copied().flatten();
                let this_chart = chart_idx;
                chart_idx += 1;

                match size {
                    Some((w_px, h_px)) => {
                        let (w_mm, h_mm) = natural_size_mm(w_px, h_px);
                        let scale = fit_ratio(
                            w_mm,
                            h_mm,
                            geometry.content_width(),
                            geometry.max_panel_height_mm,
                        );
                        let (width_mm, height_mm) = (w_mm * scale, h_mm * scale);

                        // Title and bitmap move to the next page together
                        let slot = cursor.place(HEADING.line_mm + height_mm);
                        ops.push(text_op(&slot, left, &chart.title, HEADING));
                        ops.push(DrawOp {
                            page: slot.page,
                            x_mm: left + (geometry.content_width() - width_mm) / 2.0,
                            kind: DrawKind::Image {
                                chart: this_chart,
                                top_mm: slot.top_mm + HEADING.line_mm,
                                width_mm,
                                height_mm,
                                scale,
                            },
                        });

                        for (i, point) in chart.points.iter().enumerate() {
                            let slot = cursor.place(BODY.line_mm);
                            let style = BODY.with_color(normalize_color(&point.color, i));
                            ops.push(text_op(&slot, left, &legend_line(chart, i), style));
                        }
                    }
                    None => {
                        let slot = cursor.place(HEADING.line_mm + BODY.line_mm);
                        ops.push(text_op(&slot, left, &chart.title, HEADING));
                        let line = Placement {
                            top_mm: slot.top_mm + HEADING.line_mm,
                            height_mm: BODY.line_mm,
                            ..slot
                        };
                        let muted = BODY.with_color(MUTED_COLOR);
                        ops.push(text_op(&line, left, "No data available.", muted));
                    }
                }
            }
        }
        cursor.skip(SECTION_GAP_MM);
    }

    DocumentPlan {
        page_count: cursor.page_count(),
        ops,
    }
}

fn rgb_color(color: Rgb<u8>) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        color.0[0] as f32 / 255.0,
        color.0[1] as f32 / 255.0,
        color.0[2] as f32 / 255.0,
        None,
    ))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn draw_header(
    layer: &PdfLayerReference,
    report: &Report,
    fonts: &Fonts,
    geometry: &PageGeometry,
    page: usize,
    page_count: usize,
) {
    let to_pdf_y = |top: f32| Mm(geometry.height_mm - top);
    let left = Mm(geometry.margin_mm);

    layer.set_fill_color(rgb_color(TEXT_COLOR));
    layer.use_text(
        win_ansi_text(&report.title),
        TITLE_PT,
        left,
        to_pdf_y(geometry.margin_mm + 7.0),
        &fonts.bold,
    );

    layer.set_fill_color(rgb_color(MUTED_COLOR));
    layer.use_text(
        report.subtitle(),
        SUBTITLE_PT,
        left,
        to_pdf_y(geometry.margin_mm + 13.0),
        &fonts.regular,
    );
    layer.use_text(
        format!("Page {} / {}", page + 1, page_count),
        SUBTITLE_PT,
        left,
        to_pdf_y(geometry.height_mm - geometry.margin_mm / 2.0),
        &fonts.regular,
    );
}

/// Replay a plan into a PDF byte buffer
pub fn write_document(
    report: &Report,
    plan: &DocumentPlan,
    charts: Vec<Option<RgbImage>>,
    geometry: PageGeometry,
) -> ExportResult<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        report.title.as_str(),
        Mm(geometry.width_mm),
        Mm(geometry.height_mm),
        "Layer 1",
    );
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
    };

    let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
    for page in 1..plan.page_count {
        let (page_idx, layer_idx) = doc.add_page(
            Mm(geometry.width_mm),
            Mm(geometry.height_mm),
            format!("Layer {}", page + 1),
        );
        layers.push(doc.get_page(page_idx).get_layer(layer_idx));
    }

    for (page, layer) in layers.iter().enumerate() {
        draw_header(layer, report, &fonts, &geometry, page, plan.page_count);
    }

    let mut charts: Vec<Option<DynamicImage>> = charts
        .into_iter()
        .map(|c| c.map(DynamicImage::ImageRgb8))
        .collect();

    for op in &plan.ops {
        let Some(layer) = layers.get(op.page) else {
            continue;
        };
        match &op.kind {
            DrawKind::Text {
                text,
                size_pt,
                bold,
                color,
                baseline_mm,
            } => {
                let font = if *bold { &fonts.bold } else { &fonts.regular };
                layer.set_fill_color(rgb_color(*color));
                layer.use_text(
                    text.as_str(),
                    *size_pt,
                    Mm(op.x_mm),
                    Mm(geometry.height_mm - baseline_mm),
                    font,
                );
            }
            DrawKind::Image {
                chart,
                top_mm,
                height_mm,
                scale,
                ..
            } => {
                let Some(bitmap) = charts.get_mut(*chart).and_then(Option::take) else {
                    continue;
                };
                Image::from_dynamic_image(&bitmap).add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(op.x_mm)),
                        translate_y: Some(Mm(geometry.height_mm - top_mm - height_mm)),
                        scale_x: Some(*scale),
                        scale_y: Some(*scale),
                        dpi: Some(IMAGE_DPI),
                        ..Default::default()
                    },
                );
            }
        }
    }

    save(doc)
}

fn save(doc: PdfDocumentReference) -> ExportResult<Vec<u8>> {
    Ok(doc.save_to_bytes()?)
}

/// Rasterize, lay out and serialize a report
pub fn build_document(
    report: &Report,
    raster: RasterOptions,
    geometry: PageGeometry,
) -> ExportResult<Vec<u8>> {
    let charts = rasterize_charts(report, raster)?;
    let sizes: Vec<Option<(u32, u32)>> = charts
        .iter()
        .map(|c| c.as_ref().map(|img| img.dimensions()))
        .collect();

    let plan = plan_document(report, &sizes, geometry);
    debug!(
        pages = plan.page_count,
        images = plan.image_count(),
        ops = plan.ops.len(),
        "Report laid out"
    );

    write_document(report, &plan, charts, geometry)
}
