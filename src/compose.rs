use tracing::debug;

use crate::geometry::{FrontendRect, PageSize, to_pdf_space};
use crate::layout::{TextMeasure, layout_block};
use crate::logo::{LogoImage, place_logo};
use crate::model::{DrawInstruction, Rectangle, is_renderable_translation};
use crate::sanitize::{sanitize_for_render, strip_cjk};
use crate::warning::{OverlayWarning, WarningCode};

/// Image reference used for the document logo in emitted instructions.
pub const LOGO_IMAGE_REF: &str = "logo";

#[derive(Debug, Clone)]
pub struct LogoSpec {
    pub image: LogoImage,
    /// Explicit frontend placement; `None` means the default top-right
    /// anchor.
    pub placement: Option<FrontendRect>,
}

/// Builds the ordered drawing program for the whole document: pages in
/// order, the logo first on each page, then per surviving translation an
/// opaque fill followed by its text lines. Items whose translation carries a
/// failure marker contribute nothing, but never suppress the logo or their
/// siblings.
pub fn compose_instructions(
    translations: &[Rectangle],
    logo: Option<&LogoSpec>,
    pages: &[PageSize],
    measure: &dyn TextMeasure,
    warnings: &mut Vec<OverlayWarning>,
) -> Vec<DrawInstruction> {
    let mut instructions = Vec::new();

    for (page_index, page) in pages.iter().enumerate() {
        if let Some(spec) = logo {
            let rect = place_logo(spec.image.intrinsic(), spec.placement, *page);
            instructions.push(DrawInstruction::image(page_index, rect, LOGO_IMAGE_REF));
        }

        for rectangle in translations {
            if rectangle.page == i32::try_from(page_index).unwrap_or(-1) {
                compose_rectangle(rectangle, *page, page_index, measure, &mut instructions);
            }
        }
    }

    let page_count = i32::try_from(pages.len()).unwrap_or(i32::MAX);
    for rectangle in translations {
        if rectangle.page < 0 || rectangle.page >= page_count {
            warnings.push(
                OverlayWarning::new(
                    WarningCode::RectangleOutOfRange,
                    format!("rectangle targets page {} outside the document", rectangle.page),
                )
                .with_rect_id(&rectangle.id),
            );
        }
    }

    instructions
}

fn compose_rectangle(
    rectangle: &Rectangle,
    page: PageSize,
    page_index: usize,
    measure: &dyn TextMeasure,
    instructions: &mut Vec<DrawInstruction>,
) {
    let Some(translation) = rectangle.translation.as_deref() else {
        debug!(rect = %rectangle.id, "rectangle has no translation yet, skipping");
        return;
    };
    if !is_renderable_translation(translation) {
        debug!(rect = %rectangle.id, "skipping failed translation");
        return;
    }

    let sanitized = sanitize_for_render(&strip_cjk(translation));
    let target = to_pdf_space(rectangle.frontend_rect(), rectangle.scale_page(page));
    let layout = layout_block(&sanitized, target, measure);

    instructions.push(DrawInstruction::fill(page_index, layout.background));
    for line in layout.lines {
        instructions.push(DrawInstruction::text_line(
            page_index,
            line.x,
            line.baseline_y,
            line.width,
            layout.font_size,
            line.text,
        ));
    }
}
