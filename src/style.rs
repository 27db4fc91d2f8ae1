use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Chart style
// ---------------------------------------------------------------------------

/// Rendering defaults shared by every report.
///
/// Sizes are given in points (1/72 inch) and scaled by `dpi`, so the same
/// style renders a proportionally identical chart at any resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    /// Output resolution; figure sizes are in inches.
    pub dpi: f64,
    pub font_family: String,
    pub title_font_pt: f64,
    pub label_font_pt: f64,
    pub tick_font_pt: f64,
    pub line_width_pt: f64,
    pub marker_pt: f64,
    /// Draw the background grid.
    pub grid: bool,
    pub grid_color: RGBColor,
    pub background: RGBColor,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            dpi: 300.0,
            font_family: "sans-serif".to_string(),
            title_font_pt: 12.0,
            label_font_pt: 10.0,
            tick_font_pt: 9.0,
            line_width_pt: 1.5,
            marker_pt: 3.0,
            grid: true,
            grid_color: RGBColor(223, 223, 223),
            background: RGBColor(255, 255, 255),
        }
    }
}

impl ChartStyle {
    /// Points → pixels at this style's resolution.
    pub fn px(&self, points: f64) -> f64 {
        points * self.dpi / 72.0
    }

    /// Points → whole pixels, never below one.
    pub fn px_u32(&self, points: f64) -> u32 {
        self.px(points).round().max(1.0) as u32
    }

    /// Figure size in inches → image size in pixels.
    pub fn figure_pixels(&self, (width_in, height_in): (f64, f64)) -> (u32, u32) {
        (
            (width_in * self.dpi).round().max(1.0) as u32,
            (height_in * self.dpi).round().max(1.0) as u32,
        )
    }
}
