use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Categorical palette: one colour per series
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            to_rgb(rgb)
        })
        .collect()
}

/// Colour of the `i`-th series when `n` are drawn.
pub fn series_color(i: usize, n: usize) -> RGBColor {
    generate_palette(n.max(1))
        .get(i % n.max(1))
        .copied()
        .unwrap_or(RGBColor(0, 0, 0))
}

// ---------------------------------------------------------------------------
// Sequential ramp: value → colour for heatmaps
// ---------------------------------------------------------------------------

/// Yellow → orange → red stops, light to dark.
const HEAT_STOPS: [(u8, u8, u8); 9] = [
    (255, 255, 204),
    (255, 237, 160),
    (254, 217, 118),
    (254, 178, 76),
    (253, 141, 60),
    (252, 78, 42),
    (227, 26, 28),
    (189, 0, 38),
    (128, 0, 38),
];

fn linear(stop: (u8, u8, u8)) -> LinSrgb {
    Srgb::new(stop.0, stop.1, stop.2)
        .into_format::<f32>()
        .into_linear()
}

/// Map `t` in `[0, 1]` onto the heat ramp, interpolating in linear RGB.
/// Values outside the range are clamped.
pub fn heat_color(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) as f32 } else { 0.0 };
    let scaled = t * (HEAT_STOPS.len() - 1) as f32;
    let lo = (scaled.floor() as usize).min(HEAT_STOPS.len() - 2);
    let frac = scaled - lo as f32;

    let mixed = linear(HEAT_STOPS[lo]).mix(linear(HEAT_STOPS[lo + 1]), frac);
    let rgb: Srgb = mixed.into_color();
    to_rgb(rgb)
}

/// Black or white, whichever reads better on `background`.
pub fn annotation_color(background: RGBColor) -> RGBColor {
    let lin = linear((background.0, background.1, background.2));
    let luminance = 0.2126 * lin.red + 0.7152 * lin.green + 0.0722 * lin.blue;
    if luminance > 0.4 {
        RGBColor(38, 38, 38)
    } else {
        RGBColor(255, 255, 255)
    }
}

fn to_rgb(rgb: Srgb) -> RGBColor {
    let rgb = rgb.into_format::<u8>();
    RGBColor(rgb.red, rgb.green, rgb.blue)
}
