//! Metrics for the standard PDF Helvetica faces.
//!
//! Reports are set in the base-14 Helvetica family, which every PDF viewer
//! ships, so no font program is embedded. Widths come from the Adobe AFM files
//! in thousandths of an em for the printable ASCII range.

/// A font face available to the painter, named by its PDF base font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontFace {
    #[default]
    Regular,
    Bold,
    Oblique,
}

impl FontFace {
    pub const ALL: [FontFace; 3] = [FontFace::Regular, FontFace::Bold, FontFace::Oblique];

    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
            FontFace::Oblique => "Helvetica-Oblique",
        }
    }

    /// The resource name the page content streams use (`/F1`, ...).
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
            FontFace::Oblique => "F3",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            FontFace::Regular | FontFace::Oblique => &HELVETICA_WIDTHS,
            FontFace::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    /// Advance width of one character in em thousandths.
    pub fn char_units(self, c: char) -> u16 {
        let code = c as u32;
        if (32..=126).contains(&code) {
            self.widths()[(code - 32) as usize]
        } else {
            FALLBACK_UNITS
        }
    }

    /// Width of `text` set at `size` points.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_units(c) as u32).sum();
        units as f32 * size / 1000.0
    }

    pub fn ascent(self, size: f32) -> f32 {
        size * 0.718
    }
}

const FALLBACK_UNITS: u16 = 556;

#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_glyph_widths() {
        assert_eq!(FontFace::Regular.char_units(' '), 278);
        assert_eq!(FontFace::Regular.char_units('W'), 944);
        assert_eq!(FontFace::Regular.char_units('~'), 584);
        assert_eq!(FontFace::Bold.char_units('a'), 556);
        assert_eq!(FontFace::Bold.char_units('b'), 611);
        assert_eq!(FontFace::Regular.char_units('é'), FALLBACK_UNITS);
    }

    #[test]
    fn text_width_scales_with_size() {
        let w10 = FontFace::Regular.text_width("Tower", 10.0);
        let w20 = FontFace::Regular.text_width("Tower", 20.0);
        assert!((w20 - 2.0 * w10).abs() < 0.001);
        assert_eq!(FontFace::Regular.text_width("", 12.0), 0.0);
    }

    #[test]
    fn resource_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            FontFace::ALL.iter().map(|f| f.resource_name()).collect();
        assert_eq!(names.len(), 3);
    }
}
