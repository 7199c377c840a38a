use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use edu_dashboard::data::model::Level;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Interpolate along a light → dark ramp of `hue` for `t` in `[0, 1]`.
/// Used for the score-coloured ranking bars.
pub fn sequential(hue: f32, t: f64) -> Color32 {
    let t = t.clamp(0.0, 1.0) as f32;
    let hsl = Hsl::new(hue, 0.35 + 0.4 * t, 0.75 - 0.4 * t);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

pub const GREENS: f32 = 130.0;
pub const REDS: f32 = 2.0;

pub const MALE: Color32 = Color32::from_rgb(0x34, 0x98, 0xdb);
pub const FEMALE: Color32 = Color32::from_rgb(0xe7, 0x4c, 0x3c);

/// Fixed colour per education level.
pub fn level_color(level: Level) -> Color32 {
    match level {
        Level::Primary => Color32::from_rgb(0x34, 0x98, 0xdb),
        Level::Middle => Color32::from_rgb(0x2e, 0xcc, 0x71),
        Level::Secondary => Color32::from_rgb(0xf3, 0x9c, 0x12),
        Level::Higher => Color32::from_rgb(0x9b, 0x59, 0xb6),
    }
}

// ---------------------------------------------------------------------------
// Color mapping: province → Color32
// ---------------------------------------------------------------------------

/// Maps each province to a distinct colour, stable for the session.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    pub fn new(categories: &[String]) -> Self {
        let palette = generate_palette(categories.len());
        let mapping = categories
            .iter()
            .cloned()
            .zip(palette)
            .collect();
        ColorMap { mapping }
    }

    pub fn color_for(&self, category: &str) -> Color32 {
        self.mapping
            .get(category)
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}
