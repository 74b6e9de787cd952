use crate::fonts::FontFace;
use towerdoc_types::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Everything the painter needs to set a run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontFace,
    pub size: f32,
    pub color: Color,
    /// Line box height as a multiple of `size`.
    pub line_height: f32,
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::body(10.0)
    }
}

impl TextStyle {
    pub fn body(size: f32) -> Self {
        Self {
            font: FontFace::Regular,
            size,
            color: Color::BLACK,
            line_height: 1.35,
            align: TextAlign::Left,
        }
    }

    /// Section and sub-section headings; level 1 is the largest.
    pub fn heading(base_size: f32, level: u8) -> Self {
        let scale = match level {
            0 | 1 => 1.8,
            2 => 1.4,
            _ => 1.15,
        };
        Self {
            font: FontFace::Bold,
            size: base_size * scale,
            color: Color::BRAND,
            line_height: 1.25,
            align: TextAlign::Left,
        }
    }

    pub fn caption(base_size: f32) -> Self {
        Self {
            font: FontFace::Oblique,
            size: base_size * 0.85,
            color: Color::gray(80),
            line_height: 1.3,
            align: TextAlign::Center,
        }
    }

    pub fn table_header(base_size: f32) -> Self {
        Self {
            font: FontFace::Bold,
            size: base_size * 0.9,
            color: Color::WHITE,
            line_height: 1.3,
            align: TextAlign::Left,
        }
    }

    pub fn table_cell(base_size: f32) -> Self {
        Self {
            size: base_size * 0.9,
            line_height: 1.3,
            ..Self::body(base_size)
        }
    }

    pub fn with_font(mut self, font: FontFace) -> Self {
        self.font = font;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn line_box(&self) -> f32 {
        self.size * self.line_height
    }

    pub fn measure(&self, text: &str) -> f32 {
        self.font.text_width(text, self.size)
    }
}

/// A fill and/or stroke for rectangles and rules.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
}

impl BoxStyle {
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            stroke_width: 0.0,
        }
    }

    pub fn outlined(color: Color, width: f32) -> Self {
        Self {
            fill: None,
            stroke: Some(color),
            stroke_width: width,
        }
    }
}
