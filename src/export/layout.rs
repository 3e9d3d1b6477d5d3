//! Page layout
//!
//! Flows report blocks onto A4 portrait pages. Everything here works in
//! millimetres measured from the top-left corner of the page; the PDF writer
//! flips the vertical axis.

/// Resolution bitmaps are embedded at
pub const IMAGE_DPI: f32 = 300.0;

const MM_PER_INCH: f32 = 25.4;

/// Physical page and margin sizes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    /// Space above the content reserved for the title and timestamp
    pub header_mm: f32,
    /// Tallest a chart panel may be drawn
    pub max_panel_height_mm: f32,
}

impl PageGeometry {
    /// A4 portrait
    pub fn a4() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 15.0,
            header_mm: 20.0,
            max_panel_height_mm: 90.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    /// First usable line below the header
    pub fn content_top(&self) -> f32 {
        self.margin_mm + self.header_mm
    }

    pub fn content_bottom(&self) -> f32 {
        self.height_mm - self.margin_mm
    }

    pub fn content_height(&self) -> f32 {
        self.content_bottom() - self.content_top()
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Natural size in mm of a bitmap embedded at [`IMAGE_DPI`]
pub fn natural_size_mm(width_px: u32, height_px: u32) -> (f32, f32) {
    (
        width_px as f32 / IMAGE_DPI * MM_PER_INCH,
        height_px as f32 / IMAGE_DPI * MM_PER_INCH,
    )
}

/// Scale factor fitting a `width` x `height` box into `max_width` x
/// `max_height` while preserving aspect ratio
pub fn fit_ratio(width: f32, height: f32, max_width: f32, max_height: f32) -> f32 {
    if width <= 0.0 || height <= 0.0 {
        return 1.0;
    }
    (max_width / width).min(max_height / height)
}

/// Greedy word wrap on character count
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// A positioned block on a page
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub page: usize,
    /// Distance from the top edge of the page to the top of the block
    pub top_mm: f32,
    pub height_mm: f32,
}

/// Top-down flow of blocks across pages
#[derive(Debug, Clone)]
pub struct FlowCursor {
    geometry: PageGeometry,
    page: usize,
    y: f32,
}

impl FlowCursor {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            page: 0,
            y: geometry.content_top(),
        }
    }

    /// Number of pages touched so far
    pub fn page_count(&self) -> usize {
        self.page + 1
    }

    /// Claim `height` mm, starting a new page when it does not fit
    ///
    /// A block taller than a whole page is placed at the top of a fresh page
    /// and allowed to overflow.
    pub fn place(&mut self, height: f32) -> Placement {
        let at_top = (self.y - self.geometry.content_top()).abs() < f32::EPSILON;
        if self.y + height > self.geometry.content_bottom() && !at_top {
            self.page += 1;
            self.y = self.geometry.content_top();
        }

        let placement = Placement {
            page: self.page,
            top_mm: self.y,
            height_mm: height,
        };
        self.y += height;
        placement
    }

    /// Add vertical space without forcing a page break
    pub fn skip(&mut self, height: f32) {
        self.y = (self.y + height).min(self.geometry.content_bottom());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_content_box() {
        let page = PageGeometry::a4();
        assert_eq!(page.content_width(), 180.0);
        assert_eq!(page.content_top(), 35.0);
        assert_eq!(page.content_bottom(), 282.0);
    }

    #[test]
    fn test_fit_ratio_preserves_aspect() {
        let ratio = fit_ratio(100.0, 50.0, 180.0, 90.0);
        assert_eq!(ratio, 1.8);
        let ratio = fit_ratio(100.0, 100.0, 180.0, 90.0);
        assert_eq!(ratio, 0.9);
        assert_eq!(fit_ratio(0.0, 10.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn test_natural_size_at_300_dpi() {
        let (w, h) = natural_size_mm(300, 600);
        assert!((w - 25.4).abs() < 1e-4);
        assert!((h - 50.8).abs() < 1e-4);
    }

    #[test]
    fn test_flow_breaks_pages() {
        let mut cursor = FlowCursor::new(PageGeometry::a4());
        let first = cursor.place(100.0);
        let second = cursor.place(100.0);
        let third = cursor.place(100.0);

        assert_eq!((first.page, first.top_mm), (0, 35.0));
        assert_eq!((second.page, second.top_mm), (0, 135.0));
        assert_eq!((third.page, third.top_mm), (1, 35.0));
        assert_eq!(cursor.page_count(), 2);
    }

    #[test]
    fn test_oversized_block_does_not_loop() {
        let mut cursor = FlowCursor::new(PageGeometry::a4());
        let block = cursor.place(400.0);
        assert_eq!(block.page, 0);
        let next = cursor.place(10.0);
        assert_eq!(next.page, 1);
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);

        let lines = wrap_text("first\n\nsecond", 80);
        assert_eq!(lines, vec!["first", "", "second"]);

        assert_eq!(wrap_text("", 10), vec![String::new()]);
        assert_eq!(wrap_text("averyveryverylongword", 5), vec!["averyveryverylongword"]);
    }
}
