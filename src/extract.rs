use tracing::debug;

use crate::geometry::{PdfRect, to_pdf_space};
use crate::model::{NO_TEXT_FOUND, PageRuns, Rectangle, TextRun, collapse_whitespace};

/// Collects the text of every run intersecting the rectangle, in run order.
/// Returns the [`NO_TEXT_FOUND`] sentinel when nothing matches; faults in the
/// run source are handled upstream, never here.
#[must_use]
pub fn extract_text(rectangle: &Rectangle, page: &PageRuns) -> String {
    let target = to_pdf_space(rectangle.frontend_rect(), page.size);

    let matched = page
        .runs
        .iter()
        .filter(|run| !run.text.trim().is_empty() && run_intersects(run, &target))
        .map(|run| run.text.as_str())
        .collect::<Vec<_>>();

    debug!(
        rect = %rectangle.id,
        page = page.page_index,
        matched = matched.len(),
        "rectangle hit test"
    );

    if matched.is_empty() {
        return NO_TEXT_FOUND.to_string();
    }

    collapse_whitespace(&matched.join(" "))
}

/// Horizontal overlap plus vertical baseline containment. The vertical test
/// compares the run baseline against the box's bottom and top edges measured
/// from the page bottom; comparing against a top-down `y` without the flip
/// selects the wrong band of runs.
pub(crate) fn run_intersects(run: &TextRun, target: &PdfRect) -> bool {
    let run_right = run.x + run.estimated_width();

    let overlaps_horizontally = run.x < target.right() && run_right > target.x;
    let baseline_inside = run.y > target.y && run.y < target.top();

    overlaps_horizontally && baseline_inside
}
