//! Thin adapters over lopdf: collecting positioned text runs from content
//! streams, and applying draw instructions back onto the document.

use std::collections::BTreeMap;

use encoding_rs::UTF_16BE;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, warn};

use crate::error::OverlayError;
use crate::geometry::PageSize;
use crate::logo::LogoImage;
use crate::model::{DrawInstruction, DrawKind, PageRuns, TextRun};
use crate::warning::{OverlayWarning, WarningCode};

/// Fallback when a page carries no resolvable MediaBox (US Letter).
const DEFAULT_PAGE: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Resource names registered for overlay drawing.
const OVERLAY_FONT: &str = "FHeb";
const OVERLAY_LOGO: &str = "ImLogo";

/// Reads per-page text runs and page dimensions. A page whose content cannot
/// be decoded degrades to zero runs with a warning; only a document that
/// fails to load at all is fatal.
pub fn read_page_runs(
    pdf_bytes: &[u8],
    warnings: &mut Vec<OverlayWarning>,
) -> Result<Vec<PageRuns>, OverlayError> {
    let document = Document::load_mem(pdf_bytes)?;
    let pages_map = document.get_pages();
    if pages_map.is_empty() {
        return Err(OverlayError::EmptyDocument);
    }

    let mut pages = Vec::with_capacity(pages_map.len());
    for (index, (_page_no, page_id)) in pages_map.iter().enumerate() {
        let size = page_size(&document, *page_id);
        let runs = match collect_page_runs(&document, *page_id) {
            Ok(runs) => runs,
            Err(error) => {
                warn!(page = index, %error, "page content unreadable, treating as empty");
                warnings.push(
                    OverlayWarning::new(
                        WarningCode::PageUnreadable,
                        format!("page content could not be decoded: {error}"),
                    )
                    .with_page(index),
                );
                Vec::new()
            }
        };

        debug!(page = index, runs = runs.len(), "collected text runs");
        pages.push(PageRuns {
            page_index: index,
            size,
            runs,
        });
    }

    Ok(pages)
}

/// Page dimensions only, without touching content streams. Used by the
/// render stage, which needs geometry for every page but no text.
pub fn read_page_sizes(pdf_bytes: &[u8]) -> Result<Vec<PageSize>, OverlayError> {
    let document = Document::load_mem(pdf_bytes)?;
    let pages_map = document.get_pages();
    if pages_map.is_empty() {
        return Err(OverlayError::EmptyDocument);
    }

    Ok(pages_map
        .values()
        .map(|page_id| page_size(&document, *page_id))
        .collect())
}

/// Page dimensions from the nearest MediaBox, walking the page-tree Parent
/// chain for inherited values.
fn page_size(document: &Document, page_id: ObjectId) -> PageSize {
    if let Some(media_box) = inherited_entry(document, page_id, b"MediaBox")
        && let Some(size) = media_box_size(document, &media_box)
    {
        return size;
    }
    DEFAULT_PAGE
}

/// Looks up `key` on the page dictionary or the nearest ancestor carrying it.
fn inherited_entry(document: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..16 {
        let dict = document.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

fn resolved<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object.as_reference() {
        Ok(id) => document.get_object(id).unwrap_or(object),
        Err(_) => object,
    }
}

fn media_box_size(document: &Document, media_box: &Object) -> Option<PageSize> {
    let values = resolved(document, media_box)
        .as_array()
        .ok()?
        .iter()
        .filter_map(operand_to_f32)
        .collect::<Vec<_>>();

    if values.len() != 4 {
        return None;
    }

    let width = values[2] - values[0];
    let height = values[3] - values[1];
    if width > 0.0 && height > 0.0 {
        Some(PageSize { width, height })
    } else {
        None
    }
}

fn operand_to_f32(object: &Object) -> Option<f32> {
    match object {
        #[allow(clippy::cast_precision_loss)]
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Tracks the text positioning state across one content stream. Only the
/// translation component of the text matrix is kept; rotated or skewed text
/// keeps its anchor point, which is all the detector needs.
struct TextCursor {
    x: f32,
    y: f32,
    line_x: f32,
    line_y: f32,
    leading: f32,
}

impl TextCursor {
    const fn reset() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            line_x: 0.0,
            line_y: 0.0,
            leading: 0.0,
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_x += tx;
        self.line_y += ty;
        self.x = self.line_x;
        self.y = self.line_y;
    }

    fn next_line(&mut self) {
        self.line_y -= self.leading;
        self.x = self.line_x;
        self.y = self.line_y;
    }
}

fn collect_page_runs(
    document: &Document,
    page_id: ObjectId,
) -> Result<Vec<TextRun>, lopdf::Error> {
    let raw_content = document.get_page_content(page_id)?;
    let content = Content::decode(&raw_content)?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut runs = Vec::new();
    let mut cursor = TextCursor::reset();
    let mut encoding = None;
    let mut font_size = DEFAULT_FONT_SIZE;

    for operation in content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => cursor = TextCursor::reset(),
            "Tf" => {
                if let Some(font_name) = operands.first().and_then(|operand| operand.as_name().ok())
                {
                    encoding = encodings.get(font_name).copied();
                }
                if let Some(size) = operands.get(1).and_then(operand_to_f32) {
                    if size > 0.0 {
                        font_size = size;
                    }
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(operand_to_f32) {
                    cursor.leading = leading;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(operand_to_f32).unwrap_or(0.0);
                let ty = operands.get(1).and_then(operand_to_f32).unwrap_or(0.0);
                if operation.operator == "TD" {
                    cursor.leading = -ty;
                }
                cursor.move_line(tx, ty);
            }
            "Tm" => {
                // keep the translation; a/b/c/d shear and scale are ignored
                let e = operands.get(4).and_then(operand_to_f32).unwrap_or(0.0);
                let f = operands.get(5).and_then(operand_to_f32).unwrap_or(0.0);
                cursor.line_x = e;
                cursor.line_y = f;
                cursor.x = e;
                cursor.y = f;
            }
            "T*" => cursor.next_line(),
            "Tj" | "TJ" => {
                emit_run(&mut runs, &mut cursor, encoding, font_size, operands);
            }
            "'" | "\"" => {
                cursor.next_line();
                emit_run(&mut runs, &mut cursor, encoding, font_size, operands);
            }
            _ => {}
        }
    }

    Ok(runs)
}

fn emit_run(
    runs: &mut Vec<TextRun>,
    cursor: &mut TextCursor,
    encoding: Option<&str>,
    font_size: f32,
    operands: &[Object],
) {
    let mut text = String::new();
    collect_operand_text(&mut text, encoding, operands);

    if text.is_empty() {
        return;
    }

    let run = TextRun {
        text,
        x: cursor.x,
        y: cursor.y,
        width: 0.0,
        height: font_size,
    };
    cursor.x += run.estimated_width();
    runs.push(run);
}

fn collect_operand_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => text.push_str(&decode_text_operand(encoding, bytes)),
            Object::Array(items) => collect_operand_text(text, encoding, items),
            Object::Integer(value) => {
                // large negative TJ offsets encode inter-word gaps
                if *value < -100 {
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn decode_text_operand(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    let broken = decoded.contains('\u{FFFD}') || decoded.contains("?Identity-H Unimplemented?");
    if !broken {
        return decoded;
    }

    let wants_utf16 = bytes.starts_with(&[0xFE, 0xFF])
        || encoding.is_some_and(|name| {
            let lower = name.to_ascii_lowercase();
            lower.contains("utf16") || lower.contains("identity-h") || lower.contains("unicode")
        });

    if wants_utf16 {
        let stripped = bytes.strip_prefix(&[0xFE, 0xFF][..]).unwrap_or(bytes);
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(stripped);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    decoded
}

/// Applies the instruction stream to the document and returns the rewritten
/// bytes. Pages are processed in order; a failure on one page is reported
/// and the remaining pages continue.
pub fn apply_instructions(
    pdf_bytes: &[u8],
    instructions: &[DrawInstruction],
    logo: Option<&LogoImage>,
    warnings: &mut Vec<OverlayWarning>,
) -> Result<Vec<u8>, OverlayError> {
    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages().into_iter().collect::<Vec<_>>();
    if pages.is_empty() {
        return Err(OverlayError::EmptyDocument);
    }

    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let logo_id = logo.map(|image| document.add_object(logo_xobject(image)));

    for (index, (_page_no, page_id)) in pages.iter().enumerate() {
        let page_instructions = instructions
            .iter()
            .filter(|instruction| instruction.page == index)
            .collect::<Vec<_>>();
        if page_instructions.is_empty() {
            continue;
        }

        let operations = build_operations(&page_instructions, logo_id.is_some(), index, warnings);
        if operations.is_empty() {
            continue;
        }

        if let Err(error) = append_overlay(&mut document, *page_id, operations, font_id, logo_id) {
            warn!(page = index, %error, "failed to apply overlay, page left unchanged");
            warnings.push(
                OverlayWarning::new(
                    WarningCode::PageRenderFailed,
                    format!("overlay could not be applied: {error}"),
                )
                .with_page(index),
            );
        }
    }

    let mut output = Vec::new();
    document.save_to(&mut output)?;
    Ok(output)
}

fn build_operations(
    page_instructions: &[&DrawInstruction],
    logo_available: bool,
    page: usize,
    warnings: &mut Vec<OverlayWarning>,
) -> Vec<Operation> {
    let mut operations = Vec::new();

    for instruction in page_instructions {
        match instruction.draw_kind {
            DrawKind::Fill => {
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "rg",
                    vec![
                        Object::Real(1.0),
                        Object::Real(1.0),
                        Object::Real(1.0),
                    ],
                ));
                operations.push(Operation::new(
                    "re",
                    vec![
                        Object::Real(instruction.pdf_x),
                        Object::Real(instruction.pdf_y),
                        Object::Real(instruction.pdf_width),
                        Object::Real(instruction.pdf_height),
                    ],
                ));
                operations.push(Operation::new("f", vec![]));
                operations.push(Operation::new("Q", vec![]));
            }
            DrawKind::Text => {
                let Some(text) = instruction.text.as_deref() else {
                    warnings.push(
                        OverlayWarning::new(
                            WarningCode::TextDrawSkipped,
                            "text instruction without text payload",
                        )
                        .with_page(page),
                    );
                    continue;
                };
                let font_size = instruction.font_size.unwrap_or(DEFAULT_FONT_SIZE);

                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![OVERLAY_FONT.into(), Object::Real(font_size)],
                ));
                operations.push(Operation::new(
                    "rg",
                    vec![
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(0.0),
                    ],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![
                        Object::Real(instruction.pdf_x),
                        Object::Real(instruction.pdf_y),
                    ],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
                operations.push(Operation::new("ET", vec![]));
            }
            DrawKind::Image => {
                if !logo_available {
                    warnings.push(
                        OverlayWarning::new(
                            WarningCode::TextDrawSkipped,
                            "image instruction without an embedded logo",
                        )
                        .with_page(page),
                    );
                    continue;
                }
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![
                        Object::Real(instruction.pdf_width),
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(instruction.pdf_height),
                        Object::Real(instruction.pdf_x),
                        Object::Real(instruction.pdf_y),
                    ],
                ));
                operations.push(Operation::new("Do", vec![OVERLAY_LOGO.into()]));
                operations.push(Operation::new("Q", vec![]));
            }
        }
    }

    operations
}

/// Appends the overlay as a balanced `q`/`Q` sandwich around the page's
/// existing streams so leftover graphics state cannot displace the overlay.
fn append_overlay(
    document: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
    font_id: ObjectId,
    logo_id: Option<ObjectId>,
) -> Result<(), lopdf::Error> {
    ensure_overlay_resources(document, page_id, font_id, logo_id)?;

    let existing = {
        let page_dict = document.get_dictionary(page_id)?;
        match page_dict.get(b"Contents") {
            Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let overlay = Content { operations };
    let mut overlay_bytes = Vec::new();
    if !existing.is_empty() {
        // leading newline keeps the Q from gluing onto the previous
        // stream's final token
        overlay_bytes.extend_from_slice(b"\nQ\n");
    }
    overlay_bytes.extend(overlay.encode()?);

    let mut contents = Vec::with_capacity(existing.len() + 2);
    if !existing.is_empty() {
        let prefix_id = document.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        contents.push(Object::Reference(prefix_id));
        contents.extend(existing);
    }
    let overlay_id = document.add_object(Stream::new(dictionary! {}, overlay_bytes));
    contents.push(Object::Reference(overlay_id));

    let page_dict = document
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)?;
    page_dict.set("Contents", Object::Array(contents));
    Ok(())
}

/// Materializes the page's (possibly inherited) Resources dictionary onto
/// the page itself and registers the overlay font and logo in it.
fn ensure_overlay_resources(
    document: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    logo_id: Option<ObjectId>,
) -> Result<(), lopdf::Error> {
    let mut resources = inherited_entry(document, page_id, b"Resources")
        .and_then(|object| dict_value(document, &object))
        .unwrap_or_else(Dictionary::new);

    let mut fonts = resources
        .get(b"Font")
        .ok()
        .cloned()
        .and_then(|object| dict_value(document, &object))
        .unwrap_or_else(Dictionary::new);
    fonts.set(OVERLAY_FONT, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    if let Some(logo_id) = logo_id {
        let mut xobjects = resources
            .get(b"XObject")
            .ok()
            .cloned()
            .and_then(|object| dict_value(document, &object))
            .unwrap_or_else(Dictionary::new);
        xobjects.set(OVERLAY_LOGO, Object::Reference(logo_id));
        resources.set("XObject", Object::Dictionary(xobjects));
    }

    let page_dict = document
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)?;
    page_dict.set("Resources", Object::Dictionary(resources));
    Ok(())
}

fn dict_value(document: &Document, object: &Object) -> Option<Dictionary> {
    resolved(document, object).as_dict().ok().cloned()
}

fn logo_xobject(image: &LogoImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width_px),
            "Height" => i64::from(image.height_px),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        image.data.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::decode_text_operand;

    #[test]
    fn decodes_utf16be_with_bom_when_plain_decoding_breaks() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "שלום".encode_utf16() {
            bytes.extend(unit.to_be_bytes());
        }

        let decoded = decode_text_operand(Some("Identity-H"), &bytes);
        assert_eq!(decoded, "שלום");
    }

    #[test]
    fn plain_ascii_passes_through() {
        assert_eq!(decode_text_operand(None, b"Hello"), "Hello");
    }
}
