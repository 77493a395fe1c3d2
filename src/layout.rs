//! Wrapping and placement of translated text inside its rectangle. The same
//! layout runs for previews and for the final render, so what the editor
//! shows is what the writer draws.

use crate::geometry::PdfRect;

const MIN_FONT_SIZE: f32 = 10.0;
const MAX_FONT_SIZE: f32 = 16.0;
const TEXT_PADDING: f32 = 4.0;
const LINE_SPACING_FACTOR: f32 = 1.2;

/// Ratio of average glyph advance to font size used when no real metrics
/// are available.
const APPROX_CHAR_FACTOR: f32 = 0.6;

/// Text measurement seam. Real deployments inject font-metric-backed
/// implementations; the approximate default produces line breaks close to,
/// but not necessarily identical to, the metric-exact ones.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

/// Width model of `chars × font_size × 0.6`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTextMeasure;

impl TextMeasure for ApproxTextMeasure {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let glyphs = text.chars().count() as f32;
        glyphs * font_size * APPROX_CHAR_FACTOR
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub baseline_y: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub font_size: f32,
    pub line_spacing: f32,
    /// Opaque fill covering the whole rectangle, drawn before any line.
    pub background: PdfRect,
    pub lines: Vec<PlacedLine>,
}

/// Pure layout: same text, box and measure always produce the same lines.
/// Lines that would overflow the box bottom are truncated, never shrunk or
/// spilled.
#[must_use]
pub fn layout_block(text: &str, rect: PdfRect, measure: &dyn TextMeasure) -> TextLayout {
    let font_size = (rect.height / 2.5).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
    let line_spacing = font_size * LINE_SPACING_FACTOR;
    let max_width = rect.width - 2.0 * TEXT_PADDING;

    let wrapped = wrap_words(text, max_width, font_size, measure);

    let mut lines = Vec::with_capacity(wrapped.len());
    let mut baseline_y = rect.top() - TEXT_PADDING - font_size;
    for line in wrapped {
        if baseline_y > rect.y + font_size {
            let width = measure.text_width(&line, font_size);
            lines.push(PlacedLine {
                x: rect.x + rect.width - width - TEXT_PADDING,
                baseline_y,
                width,
                text: line,
            });
        }
        baseline_y -= line_spacing;
    }

    TextLayout {
        font_size,
        line_spacing,
        background: rect,
        lines,
    }
}

/// Greedy word wrap. A single word wider than the available width gets its
/// own line rather than being split mid-word.
#[must_use]
pub fn wrap_words(
    text: &str,
    max_width: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure.text_width(&candidate, font_size) <= max_width {
            current = candidate;
        } else if current.is_empty() {
            lines.push(word.to_string());
        } else {
            lines.push(std::mem::take(&mut current));
            if measure.text_width(word, font_size) <= max_width {
                current = word.to_string();
            } else {
                lines.push(word.to_string());
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ApproxTextMeasure, TextMeasure, layout_block, wrap_words};
    use crate::geometry::PdfRect;

    /// Every glyph is exactly `font_size` wide, which makes expected break
    /// points trivial to compute by hand.
    struct SquareMeasure;

    impl TextMeasure for SquareMeasure {
        fn text_width(&self, text: &str, font_size: f32) -> f32 {
            #[allow(clippy::cast_precision_loss)]
            let glyphs = text.chars().count() as f32;
            glyphs * font_size
        }
    }

    const BOX: PdfRect = PdfRect {
        x: 300.0,
        y: 500.0,
        width: 108.0,
        height: 40.0,
    };

    #[test]
    fn font_size_tracks_box_height_within_bounds() {
        let short = PdfRect { height: 10.0, ..BOX };
        let tall = PdfRect { height: 200.0, ..BOX };

        assert_eq!(layout_block("x", short, &ApproxTextMeasure).font_size, 10.0);
        assert_eq!(layout_block("x", BOX, &ApproxTextMeasure).font_size, 16.0);
        assert_eq!(layout_block("x", tall, &ApproxTextMeasure).font_size, 16.0);
    }

    #[test]
    fn wraps_greedily_at_measured_width() {
        // box width 108 - 8 padding = 100; font 16 => 6 glyphs per line
        let lines = wrap_words("ab cd ef", 100.0, 16.0, &SquareMeasure);
        assert_eq!(lines, vec!["ab cd", "ef"]);
    }

    #[test]
    fn oversized_word_stands_alone_without_splitting() {
        let lines = wrap_words("hi incomprehensible yo", 100.0, 16.0, &SquareMeasure);
        assert_eq!(lines, vec!["hi", "incomprehensible", "yo"]);
    }

    #[test]
    fn lines_are_right_aligned_inside_the_box() {
        let tall = PdfRect { height: 100.0, ..BOX };
        let layout = layout_block("ab cd ef", tall, &SquareMeasure);
        assert_eq!(layout.lines.len(), 2);

        let first = &layout.lines[0];
        assert_eq!(first.text, "ab cd");
        // width 5 glyphs * 16 = 80; x = 300 + 108 - 80 - 4
        assert_eq!(first.x, 324.0);
        // baseline = top (600) - padding (4) - font (16)
        assert_eq!(first.baseline_y, 580.0);

        let second = &layout.lines[1];
        assert_eq!(second.baseline_y, 580.0 - 16.0 * 1.2);
    }

    #[test]
    fn overflowing_lines_are_suppressed_not_wrapped_further() {
        // 40pt box fits two 19.2pt steps before baselines dip below
        // bottom + font_size
        let layout = layout_block("aa bb cc dd ee ff gg hh", BOX, &SquareMeasure);
        let total_wrapped = wrap_words("aa bb cc dd ee ff gg hh", 100.0, 16.0, &SquareMeasure);

        assert!(layout.lines.len() < total_wrapped.len());
        for line in &layout.lines {
            assert!(line.baseline_y > BOX.y + layout.font_size);
        }
    }

    #[test]
    fn empty_text_yields_background_only() {
        let layout = layout_block("", BOX, &ApproxTextMeasure);
        assert!(layout.lines.is_empty());
        assert_eq!(layout.background, BOX);
    }

    #[test]
    fn layout_is_deterministic() {
        let first = layout_block("repeatable layout check", BOX, &ApproxTextMeasure);
        let second = layout_block("repeatable layout check", BOX, &ApproxTextMeasure);
        assert_eq!(first, second);
    }
}
