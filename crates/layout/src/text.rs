//! Greedy line breaking over Helvetica advance widths.

use crate::style::TextStyle;

#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub text: String,
    pub width: f32,
}

/// Breaks `text` into lines no wider than `max_width`.
///
/// Explicit newlines always break. A single word wider than the line is split
/// between characters. Empty input yields no lines; a blank paragraph between
/// two newlines yields an empty line so vertical spacing is kept.
pub fn break_lines(text: &str, max_width: f32, style: &TextStyle) -> Vec<LineLayout> {
    let mut lines = Vec::new();
    if text.trim().is_empty() {
        return lines;
    }

    let space_width = style.measure(" ");
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0;

        for word in paragraph.split_whitespace() {
            let word_width = style.measure(word);
            let needed = if current.is_empty() {
                word_width
            } else {
                current_width + space_width + word_width
            };

            if needed <= max_width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_width = needed;
                continue;
            }

            if !current.is_empty() {
                lines.push(LineLayout {
                    text: std::mem::take(&mut current),
                    width: current_width,
                });
                current_width = 0.0;
            }

            if word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
            } else {
                let mut pieces = split_long_word(word, max_width, style);
                if let Some(last) = pieces.pop() {
                    lines.extend(pieces);
                    current_width = last.width;
                    current = last.text;
                }
            }
        }

        lines.push(LineLayout {
            text: current,
            width: current_width,
        });
    }

    lines
}

fn split_long_word(word: &str, max_width: f32, style: &TextStyle) -> Vec<LineLayout> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut width = 0.0;
    for c in word.chars() {
        let cw = style.font.text_width(c.encode_utf8(&mut [0; 4]), style.size);
        if width + cw > max_width && !current.is_empty() {
            pieces.push(LineLayout {
                text: std::mem::take(&mut current),
                width,
            });
            width = 0.0;
        }
        current.push(c);
        width += cw;
    }
    if !current.is_empty() {
        pieces.push(LineLayout { text: current, width });
    }
    pieces
}

/// Shortens `text` with a trailing ellipsis so it fits `max_width`.
pub fn truncate_to_width(text: &str, max_width: f32, style: &TextStyle) -> String {
    if style.measure(text) <= max_width {
        return text.to_string();
    }
    let ellipsis = "...";
    let budget = max_width - style.measure(ellipsis);
    let mut out = String::new();
    let mut width = 0.0;
    for c in text.chars() {
        let cw = style.font.text_width(c.encode_utf8(&mut [0; 4]), style.size);
        if width + cw > budget {
            break;
        }
        out.push(c);
        width += cw;
    }
    out.push_str(ellipsis);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> TextStyle {
        TextStyle::body(10.0)
    }

    #[test]
    fn short_text_is_one_line() {
        let lines = break_lines("Tower inspection", 500.0, &style());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Tower inspection");
        assert!((lines[0].width - style().measure("Tower inspection")).abs() < 0.001);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let text = "one two three four five six seven eight nine ten";
        let lines = break_lines(text, 60.0, &style());
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width <= 60.0 + 0.001, "{:?} too wide", line);
        }
        let rejoined: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(rejoined.join(" "), text);
    }

    #[test]
    fn newlines_force_breaks() {
        let lines = break_lines("first\n\nthird", 500.0, &style());
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "", "third"]);
    }

    #[test]
    fn long_words_split_by_character() {
        let lines = break_lines("WWWWWWWWWWWWWWWWWWWW", 50.0, &style());
        assert!(lines.len() > 1);
        assert_eq!(lines.iter().map(|l| l.text.clone()).collect::<String>(), "WWWWWWWWWWWWWWWWWWWW");
    }

    #[test]
    fn blank_text_has_no_lines() {
        assert!(break_lines("   ", 100.0, &style()).is_empty());
    }

    #[test]
    fn truncation_adds_ellipsis() {
        let s = truncate_to_width("A very long site name for a cell", 60.0, &style());
        assert!(s.ends_with("..."));
        assert!(style().measure(&s) <= 60.0);
        assert_eq!(truncate_to_width("ok", 60.0, &style()), "ok");
    }
}
