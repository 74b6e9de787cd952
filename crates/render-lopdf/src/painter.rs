use crate::helpers::to_win_ansi;
use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};
use std::collections::HashMap;
use towerdoc_layout::{BoxStyle, FontFace, LayoutElement, PositionedElement, TextAlign, TextStyle};
use towerdoc_types::{Color, ResourceUri};

/// Turns one page of positioned elements into a content stream.
///
/// Layout coordinates are top-down; PDF user space is bottom-up, so every y
/// is flipped against `page_height`.
pub(crate) struct PageContext<'a> {
    page_height: f32,
    content: Content,
    state: PageRenderState,
    xobject_names: &'a HashMap<ResourceUri, String>,
    footer_text: &'a str,
}

#[derive(Default, Clone, PartialEq)]
struct PageRenderState {
    font: Option<(FontFace, f32)>,
    fill_color: Option<Color>,
}

impl<'a> PageContext<'a> {
    pub(crate) fn new(
        page_height: f32,
        xobject_names: &'a HashMap<ResourceUri, String>,
        footer_text: &'a str,
    ) -> Self {
        Self {
            page_height,
            content: Content { operations: vec![] },
            state: PageRenderState::default(),
            xobject_names,
            footer_text,
        }
    }

    pub(crate) fn finish(self) -> Content {
        self.content
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.content.operations.push(Operation::new(operator, operands));
    }

    pub(crate) fn draw_element(&mut self, el: &PositionedElement) {
        match &el.element {
            LayoutElement::Text(text) => self.draw_text(&text.content, &text.style, el),
            LayoutElement::Box(style) => self.draw_box(style, el),
            LayoutElement::Rule(style) => self.draw_rule(style, el),
            LayoutElement::Image(image) => match self.xobject_names.get(&image.src) {
                Some(name) => {
                    let name = name.clone();
                    self.draw_image(&name, el)
                }
                None => {
                    log::warn!("Image '{}' was not prepared; drawing an empty frame.", image.src);
                    self.draw_box(
                        &BoxStyle {
                            fill: Some(Color::gray(225)),
                            stroke: Some(Color::gray(150)),
                            stroke_width: 0.75,
                        },
                        el,
                    );
                }
            },
            LayoutElement::PageNumberPlaceholder(style) => {
                let text = self.footer_text;
                self.draw_text(text, style, el)
            }
            // Link areas become annotations, not content.
            LayoutElement::Link(_) => {}
        }
    }

    fn set_font(&mut self, face: FontFace, size: f32) {
        if self.state.font != Some((face, size)) {
            self.op(
                "Tf",
                vec![Object::Name(face.resource_name().as_bytes().to_vec()), size.into()],
            );
            self.state.font = Some((face, size));
        }
    }

    fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color != Some(color) {
            let [r, g, b] = color.to_unit();
            self.op("rg", vec![r.into(), g.into(), b.into()]);
            self.state.fill_color = Some(color);
        }
    }

    fn set_stroke(&mut self, color: Color, width: f32) {
        let [r, g, b] = color.to_unit();
        self.op("w", vec![width.into()]);
        self.op("RG", vec![r.into(), g.into(), b.into()]);
    }

    fn draw_text(&mut self, content: &str, style: &TextStyle, el: &PositionedElement) {
        if content.trim().is_empty() {
            return;
        }
        let width = style.measure(content);
        let x = el.x
            + match style.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((el.width - width) / 2.0).max(0.0),
                TextAlign::Right => (el.width - width).max(0.0),
            };
        let baseline_y = el.y + (el.height - style.size) / 2.0 + style.font.ascent(style.size);

        self.op("BT", vec![]);
        // Text state persists only within BT/ET.
        self.state.font = None;
        self.set_font(style.font, style.size);
        self.set_fill_color(style.color);
        self.op("Td", vec![x.into(), (self.page_height - baseline_y).into()]);
        self.op(
            "Tj",
            vec![Object::String(to_win_ansi(content), StringFormat::Literal)],
        );
        self.op("ET", vec![]);
    }

    fn draw_box(&mut self, style: &BoxStyle, el: &PositionedElement) {
        let y = self.page_height - (el.y + el.height);
        let rect = vec![el.x.into(), y.into(), el.width.into(), el.height.into()];
        if let Some(fill) = style.fill {
            self.set_fill_color(fill);
            self.op("re", rect.clone());
            self.op("f", vec![]);
        }
        if let Some(stroke) = style.stroke {
            if style.stroke_width > 0.0 {
                self.set_stroke(stroke, style.stroke_width);
                self.op("re", rect);
                self.op("S", vec![]);
            }
        }
    }

    fn draw_rule(&mut self, style: &BoxStyle, el: &PositionedElement) {
        let Some(color) = style.stroke.or(style.fill) else {
            return;
        };
        let line_y = self.page_height - el.y;
        self.set_stroke(color, style.stroke_width.max(0.25));
        self.op("m", vec![el.x.into(), line_y.into()]);
        self.op("l", vec![(el.x + el.width).into(), line_y.into()]);
        self.op("S", vec![]);
    }

    fn draw_image(&mut self, name: &str, el: &PositionedElement) {
        let y = self.page_height - (el.y + el.height);
        self.op("q", vec![]);
        self.op(
            "cm",
            vec![
                el.width.into(),
                0.into(),
                0.into(),
                el.height.into(),
                el.x.into(),
                y.into(),
            ],
        );
        self.op("Do", vec![Object::Name(name.as_bytes().to_vec())]);
        self.op("Q", vec![]);
    }
}
