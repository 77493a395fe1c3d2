use serde::{Deserialize, Serialize};

use crate::geometry::{FrontendRect, PageSize};

/// Page value carried by a repeated rectangle before it is expanded onto
/// concrete pages.
pub const REPEATED_PAGE: i32 = -1;

/// Extraction found no runs inside the rectangle. A valid outcome, not an
/// error.
pub const NO_TEXT_FOUND: &str = "No text found in this area";

/// Per-rectangle marker set when the extraction stage itself faulted.
pub const EXTRACTION_FAILED: &str = "Text extraction failed";

/// Per-rectangle marker set by the orchestration layer when a rectangle
/// could not be processed at all.
pub const DETECTION_FAILED: &str = "Text detection failed";

/// Per-item marker substituted when the external translation call failed.
pub const TRANSLATION_FAILED: &str = "Translation failed";

/// Per-item marker for rectangles whose source text never reached the
/// translation map.
pub const TRANSLATION_NOT_FOUND: &str = "Translation not found";

/// One positioned text fragment from a PDF content stream. `x`/`y` locate
/// the baseline origin in PDF space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextRun {
    /// Run height, falling back to a nominal 12pt body size when the source
    /// did not report one.
    #[must_use]
    pub fn height_or_default(&self) -> f32 {
        if self.height > 0.0 { self.height } else { 12.0 }
    }

    /// Run width, estimated from glyph count when the source did not report
    /// one. The 1.8 divisor approximates average glyph advance relative to
    /// the em height.
    #[must_use]
    pub fn estimated_width(&self) -> f32 {
        if self.width > 0.0 {
            self.width
        } else {
            #[allow(clippy::cast_precision_loss)]
            let glyphs = self.text.chars().count() as f32;
            glyphs * (self.height_or_default() / 1.8)
        }
    }
}

/// All runs collected from one page, with the page's native dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRuns {
    pub page_index: usize,
    pub size: PageSize,
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RectMode {
    #[default]
    Individual,
    Repeated,
}

impl RectMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Individual => Self::Repeated,
            Self::Repeated => Self::Individual,
        }
    }

    /// Editor stroke color for this mode. Derived rather than stored so the
    /// hint can never disagree with the mode.
    #[must_use]
    pub const fn stroke_hint(self) -> &'static str {
        match self {
            Self::Individual => "#ff4d4d",
            Self::Repeated => "#8b5cf6",
        }
    }

    #[must_use]
    pub const fn fill_hint(self) -> &'static str {
        match self {
            Self::Individual => "rgba(255, 77, 77, 0.1)",
            Self::Repeated => "rgba(139, 92, 244, 0.1)",
        }
    }
}

/// The central entity: one editable text area, in frontend canvas
/// coordinates, together with the bookkeeping every later stage depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    pub id: String,
    /// 0-based page index, or [`REPEATED_PAGE`] for an unexpanded template.
    pub page: i32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub mode: RectMode,
    #[serde(default)]
    pub is_manual: bool,
    /// Template id, set only on rectangles expanded from a repeated template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl Rectangle {
    #[must_use]
    pub fn frontend_rect(&self) -> FrontendRect {
        FrontendRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    #[must_use]
    pub const fn is_repeated(&self) -> bool {
        matches!(self.mode, RectMode::Repeated)
    }

    /// Text the translation stage should operate on: extracted text when
    /// present, otherwise the detection placeholder.
    #[must_use]
    pub fn source_text(&self) -> &str {
        self.extracted_text.as_deref().unwrap_or(&self.text)
    }

    /// Page dimensions to use when mapping this rectangle back to PDF space.
    /// Auto-detected rectangles carry the width captured at detection time;
    /// manual rectangles fall back to the live page.
    #[must_use]
    pub fn scale_page(&self, live: PageSize) -> PageSize {
        PageSize {
            width: self.page_width.unwrap_or(live.width),
            height: live.height,
        }
    }
}

/// True when the string is real content rather than a stage marker.
#[must_use]
pub fn is_translatable(text: &str) -> bool {
    !text.trim().is_empty()
        && text != NO_TEXT_FOUND
        && text != EXTRACTION_FAILED
        && text != DETECTION_FAILED
}

/// True when a translation value should be drawn rather than skipped.
#[must_use]
pub fn is_renderable_translation(translation: &str) -> bool {
    !translation.trim().is_empty()
        && translation != TRANSLATION_FAILED
        && translation != TRANSLATION_NOT_FOUND
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawKind {
    Fill,
    Text,
    Image,
}

/// One drawing operation for the render collaborator, in PDF space.
/// For `Text` the rectangle fields describe the measured line box and
/// `pdf_y` is the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawInstruction {
    pub page: usize,
    pub draw_kind: DrawKind,
    pub pdf_x: f32,
    pub pdf_y: f32,
    pub pdf_width: f32,
    pub pdf_height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl DrawInstruction {
    #[must_use]
    pub fn fill(page: usize, rect: crate::geometry::PdfRect) -> Self {
        Self {
            page,
            draw_kind: DrawKind::Fill,
            pdf_x: rect.x,
            pdf_y: rect.y,
            pdf_width: rect.width,
            pdf_height: rect.height,
            text: None,
            font_size: None,
            image_ref: None,
        }
    }

    #[must_use]
    pub fn text_line(
        page: usize,
        x: f32,
        baseline_y: f32,
        line_width: f32,
        font_size: f32,
        text: String,
    ) -> Self {
        Self {
            page,
            draw_kind: DrawKind::Text,
            pdf_x: x,
            pdf_y: baseline_y,
            pdf_width: line_width,
            pdf_height: font_size,
            text: Some(text),
            font_size: Some(font_size),
            image_ref: None,
        }
    }

    #[must_use]
    pub fn image(page: usize, rect: crate::geometry::PdfRect, image_ref: impl Into<String>) -> Self {
        Self {
            page,
            draw_kind: DrawKind::Image,
            pdf_x: rect.x,
            pdf_y: rect.y,
            pdf_width: rect.width,
            pdf_height: rect.height,
            text: None,
            font_size: None,
            image_ref: Some(image_ref.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{RectMode, Rectangle, TextRun, collapse_whitespace, is_translatable};

    #[test]
    fn estimates_run_width_from_glyph_count() {
        let run = TextRun {
            text: "Hello".to_string(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 12.0,
        };
        let expected = 5.0 * (12.0 / 1.8);
        assert!((run.estimated_width() - expected).abs() < 1e-4);

        let sized = TextRun {
            width: 33.0,
            ..run
        };
        assert!((sized.estimated_width() - 33.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rectangle_wire_shape_uses_camel_case_and_omits_absent_fields() {
        let rect = Rectangle {
            id: "rect_1_0".to_string(),
            page: 0,
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
            text: "sample".to_string(),
            mode: RectMode::Repeated,
            is_manual: true,
            original_id: None,
            original_x: Some(10.0),
            original_y: None,
            original_width: None,
            original_height: None,
            page_width: Some(612.0),
            page_height: None,
            extracted_text: None,
            translation: None,
        };

        let json = serde_json::to_value(&rect).expect("rectangle serializes");
        assert_eq!(json["mode"], "repeated");
        assert_eq!(json["isManual"], true);
        assert_eq!(json["originalX"], 10.0);
        assert_eq!(json["pageWidth"], 612.0);
        assert!(json.get("originalId").is_none());
        assert!(json.get("extractedText").is_none());

        let back: Rectangle =
            serde_json::from_value(json).expect("rectangle deserializes from its own output");
        assert_eq!(back, rect);
    }

    #[test]
    fn mode_defaults_to_individual_when_absent_from_wire() {
        let rect: Rectangle = serde_json::from_str(
            r#"{"id":"r","page":0,"x":0,"y":0,"width":10,"height":10}"#,
        )
        .expect("minimal rectangle parses");
        assert_eq!(rect.mode, RectMode::Individual);
        assert!(!rect.is_manual);
    }

    #[test]
    fn markers_are_not_translatable() {
        assert!(is_translatable("Hello world"));
        assert!(!is_translatable("No text found in this area"));
        assert!(!is_translatable("Text detection failed"));
        assert!(!is_translatable("   "));
    }

    #[test]
    fn collapses_interior_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc "), "a b c");
    }
}
