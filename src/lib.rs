pub mod compose;
pub mod detect;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod layout;
pub mod lifecycle;
pub mod logo;
pub mod model;
pub mod pdf_io;
pub mod sanitize;
pub mod translate;
pub mod warning;

use tracing::info;

pub use compose::LogoSpec;
pub use error::OverlayError;
pub use lifecycle::{RectState, RectangleSet, expand_repeated};
pub use logo::LogoImage;
pub use model::{DrawInstruction, DrawKind, RectMode, Rectangle};
pub use translate::{MockTranslator, TranslateOptions, Translator};
pub use warning::{OverlayWarning, WarningCode};

use crate::layout::ApproxTextMeasure;
use crate::model::DETECTION_FAILED;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport {
    pub page_count: usize,
    pub rectangle_count: usize,
    pub warnings: Vec<OverlayWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub page_count: usize,
    pub instruction_count: usize,
    pub warnings: Vec<OverlayWarning>,
}

/// Scans the document and proposes one rectangle per page over its
/// right-half text.
pub fn detect_rectangles(
    pdf_bytes: &[u8],
) -> Result<(Vec<Rectangle>, DetectionReport), OverlayError> {
    let mut warnings = Vec::new();
    let pages = pdf_io::read_page_runs(pdf_bytes, &mut warnings)?;
    let rectangles = detect::detect_blocks(&pages);

    if rectangles.is_empty() {
        warnings.push(OverlayWarning::new(
            WarningCode::NoTextDetected,
            "no right-half text blocks were detected in the document",
        ));
    }

    info!(
        pages = pages.len(),
        rectangles = rectangles.len(),
        "rectangle detection completed"
    );

    let report = DetectionReport {
        page_count: pages.len(),
        rectangle_count: rectangles.len(),
        warnings,
    };
    Ok((rectangles, report))
}

/// Expands repeated templates over the document's pages, then extracts the
/// text under every rectangle. A rectangle targeting a missing page gets the
/// failure marker instead of aborting the batch.
pub fn extract_rectangles(
    pdf_bytes: &[u8],
    rectangles: &[Rectangle],
) -> Result<(Vec<Rectangle>, Vec<OverlayWarning>), OverlayError> {
    let mut warnings = Vec::new();
    let pages = pdf_io::read_page_runs(pdf_bytes, &mut warnings)?;
    let expanded = expand_repeated(rectangles, pages.len());

    let mut extracted = Vec::with_capacity(expanded.len());
    for mut rectangle in expanded {
        let page = usize::try_from(rectangle.page)
            .ok()
            .and_then(|index| pages.get(index));

        let text = match page {
            Some(page) => extract::extract_text(&rectangle, page),
            None => {
                warnings.push(
                    OverlayWarning::new(
                        WarningCode::RectangleOutOfRange,
                        format!("rectangle targets page {} outside the document", rectangle.page),
                    )
                    .with_rect_id(&rectangle.id),
                );
                DETECTION_FAILED.to_string()
            }
        };

        rectangle.extracted_text = Some(text);
        extracted.push(rectangle);
    }

    info!(rectangles = extracted.len(), "text extraction completed");
    Ok((extracted, warnings))
}

/// Composes the drawing program for the translated rectangles and applies it
/// to the document.
pub fn render_document(
    pdf_bytes: &[u8],
    translations: &[Rectangle],
    logo: Option<&LogoSpec>,
) -> Result<(Vec<u8>, RenderReport), OverlayError> {
    let mut warnings = Vec::new();
    let sizes = pdf_io::read_page_sizes(pdf_bytes)?;

    let instructions = compose::compose_instructions(
        translations,
        logo,
        &sizes,
        &ApproxTextMeasure,
        &mut warnings,
    );
    let bytes = pdf_io::apply_instructions(
        pdf_bytes,
        &instructions,
        logo.map(|spec| &spec.image),
        &mut warnings,
    )?;

    info!(
        pages = sizes.len(),
        instructions = instructions.len(),
        "render completed"
    );

    let report = RenderReport {
        page_count: sizes.len(),
        instruction_count: instructions.len(),
        warnings,
    };
    Ok((bytes, report))
}

/// Full detect → extract → translate → render cycle over one document.
pub fn process_document(
    pdf_bytes: &[u8],
    translator: &dyn Translator,
    options: &TranslateOptions,
    logo: Option<&LogoSpec>,
) -> Result<(Vec<u8>, Vec<OverlayWarning>), OverlayError> {
    let (rectangles, detection) = detect_rectangles(pdf_bytes)?;
    let mut warnings = detection.warnings;

    let (extracted, extraction_warnings) = extract_rectangles(pdf_bytes, &rectangles)?;
    warnings.extend(extraction_warnings);

    let translated = translate::translate_rectangles(extracted, translator, options, &mut warnings);

    let (bytes, render) = render_document(pdf_bytes, &translated, logo)?;
    warnings.extend(render.warnings);

    Ok((bytes, warnings))
}
