use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

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
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: file name → Color32
// ---------------------------------------------------------------------------

/// Maps the file names of the loaded spectra to distinct line colours,
/// mirroring a per-file legend colouring.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Build a colour map from the file names in display order.
    pub fn new<'a>(files: impl Iterator<Item = &'a str>) -> Self {
        let files: Vec<&str> = files.collect();
        let palette = generate_palette(files.len());
        ColorMap {
            mapping: files
                .into_iter()
                .zip(palette)
                .map(|(f, c)| (f.to_string(), c))
                .collect(),
        }
    }

    pub fn color_for(&self, file: &str) -> Color32 {
        self.mapping.get(file).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_distinct_entries() {
        let palette = generate_palette(12);
        assert_eq!(palette.len(), 12);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_file_falls_back_to_gray() {
        let map = ColorMap::new(["a.csv", "b.csv"].into_iter());
        assert_ne!(map.color_for("a.csv"), map.color_for("b.csv"));
        assert_eq!(map.color_for("zzz.csv"), Color32::GRAY);
    }
}
