//! Conversions between the fixed-width frontend canvas (top-left origin)
//! and native PDF page coordinates (bottom-left origin, PDF points).

use serde::{Deserialize, Serialize};

/// Width of the frontend viewer canvas. Every frontend coordinate in the
/// system is expressed against this width.
pub const FRONTEND_WIDTH: f32 = 800.0;

/// Smallest frontend span a user-editable rectangle may collapse to.
pub const MIN_FRONTEND_SPAN: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// Rectangle on the frontend canvas. `y` grows downward from the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontendRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Rectangle in PDF space. `y` is the bottom edge, growing upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PdfRect {
    #[must_use]
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

#[must_use]
pub fn page_scale(page_width: f32) -> f32 {
    page_width / FRONTEND_WIDTH
}

fn non_negative(span: f32) -> f32 {
    if span.is_sign_negative() { 0.0 } else { span }
}

/// Maps a frontend rectangle onto the page. The vertical axis flips here and
/// nowhere else: callers never hand-roll `page_height - y` arithmetic.
#[must_use]
pub fn to_pdf_space(rect: FrontendRect, page: PageSize) -> PdfRect {
    let scale = page_scale(page.width);
    let width = non_negative(rect.width) * scale;
    let height = non_negative(rect.height) * scale;

    PdfRect {
        x: rect.x * scale,
        y: page.height - rect.y * scale - height,
        width,
        height,
    }
}

/// Inverse of [`to_pdf_space`].
#[must_use]
pub fn to_frontend_space(rect: PdfRect, page: PageSize) -> FrontendRect {
    let scale = page_scale(page.width);
    let width = non_negative(rect.width) / scale;
    let height = non_negative(rect.height) / scale;

    FrontendRect {
        x: rect.x / scale,
        y: (page.height - rect.y - rect.height) / scale,
        width,
        height,
    }
}
