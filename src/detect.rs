use tracing::debug;

use crate::geometry::{PdfRect, to_frontend_space};
use crate::model::{PageRuns, RectMode, Rectangle, collapse_whitespace};

/// Padding added around a detected block, in PDF points.
const BLOCK_PADDING: f32 = 15.0;

/// Detects one text block per page across the whole document. Pages without
/// right-half text contribute no rectangle.
#[must_use]
pub fn detect_blocks(pages: &[PageRuns]) -> Vec<Rectangle> {
    let mut rectangles = Vec::new();
    for page in pages {
        if let Some(rectangle) = detect_page_block(page) {
            debug!(
                page = page.page_index,
                id = %rectangle.id,
                "detected text block"
            );
            rectangles.push(rectangle);
        }
    }
    rectangles
}

/// Bounds every non-empty run on the right half of the page into a single
/// padded rectangle. The design intentionally produces at most one block per
/// page rather than clustering.
#[must_use]
pub fn detect_page_block(page: &PageRuns) -> Option<Rectangle> {
    let half_width = page.size.width / 2.0;
    let right_side = page
        .runs
        .iter()
        .filter(|run| run.x > half_width && !run.text.trim().is_empty())
        .collect::<Vec<_>>();

    if right_side.is_empty() {
        return None;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let mut combined = Vec::with_capacity(right_side.len());

    for run in &right_side {
        let height = run.height_or_default();
        let width = run.estimated_width();

        min_x = min_x.min(run.x);
        max_x = max_x.max(run.x + width);
        // the run origin is its baseline; the glyph box extends upward
        max_y = max_y.max(run.y);
        min_y = min_y.min(run.y - height);
        combined.push(run.text.as_str());
    }

    min_x -= BLOCK_PADDING;
    min_y -= BLOCK_PADDING;
    max_x += BLOCK_PADDING;
    max_y += BLOCK_PADDING;

    let block = PdfRect {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    };
    let frontend = to_frontend_space(block, page.size);

    let index = 0;
    Some(Rectangle {
        id: format!("rect_{}_{index}", page.page_index + 1),
        page: i32::try_from(page.page_index).unwrap_or(0),
        x: frontend.x.round(),
        y: frontend.y.round(),
        width: frontend.width.round(),
        height: frontend.height.round(),
        text: collapse_whitespace(&combined.join(" ")),
        mode: RectMode::Individual,
        is_manual: false,
        original_id: None,
        original_x: Some(block.x),
        original_y: Some(block.y),
        original_width: Some(block.width),
        original_height: Some(block.height),
        page_width: Some(page.size.width),
        page_height: Some(page.size.height),
        extracted_text: None,
        translation: None,
    })
}
