//! Chart Renderer
//!
//! - [`spec`]: aggregate summaries → pie / bar / line / radar descriptions
//! - [`raster`]: off-screen bitmap rendering of a description
//! - [`palette`]: series colors and color normalization

pub mod palette;
pub mod raster;
pub mod spec;

pub use palette::{normalize_color, SERIES_COLORS};
pub use raster::{render_chart, Canvas, RasterError, RasterOptions};
pub use spec::{
    category_chart, dashboard_charts, organisation_chart, seasonal_chart, source_chart,
    statistics_charts, yearly_chart, ChartKind, ChartPoint, ChartSpec,
};
