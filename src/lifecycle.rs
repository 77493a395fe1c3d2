use serde::Serialize;
use tracing::debug;

use crate::geometry::{FrontendRect, MIN_FRONTEND_SPAN};
use crate::model::{REPEATED_PAGE, RectMode, Rectangle};

/// Default size of a user-created rectangle, in frontend units.
const MANUAL_WIDTH: f32 = 150.0;
const MANUAL_HEIGHT: f32 = 50.0;

/// Viewport center assumed when the caller has no live viewport.
const FALLBACK_CENTER: (f32, f32) = (400.0, 300.0);

/// Downstream progress of a rectangle. Any geometry mutation drops the
/// rectangle back to `Detected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RectState {
    Detected,
    TextExtracted,
    Translated,
}

impl RectState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Detected => "detected",
            Self::TextExtracted => "textExtracted",
            Self::Translated => "translated",
        }
    }
}

/// State is derived from which downstream values survive, so it can never
/// disagree with the data.
#[must_use]
pub fn rectangle_state(rectangle: &Rectangle) -> RectState {
    if rectangle.translation.is_some() {
        RectState::Translated
    } else if rectangle.extracted_text.is_some() {
        RectState::TextExtracted
    } else {
        RectState::Detected
    }
}

/// Expands repeated templates into one concrete rectangle per page and
/// passes everything else through unchanged. Rectangles that already carry
/// an `original_id` are concrete instances, so re-running the expansion over
/// its own output is a no-op rather than a combinatorial blowup.
#[must_use]
pub fn expand_repeated(rectangles: &[Rectangle], total_pages: usize) -> Vec<Rectangle> {
    let mut expanded = Vec::with_capacity(rectangles.len());

    for rectangle in rectangles {
        if rectangle.is_repeated() && rectangle.original_id.is_none() {
            debug!(id = %rectangle.id, total_pages, "expanding repeated rectangle");
            for page in 0..total_pages {
                let mut copy = rectangle.clone();
                copy.page = i32::try_from(page).unwrap_or(REPEATED_PAGE);
                copy.id = format!("{}_page_{page}", rectangle.id);
                copy.original_id = Some(rectangle.id.clone());
                expanded.push(copy);
            }
        } else {
            expanded.push(rectangle.clone());
        }
    }

    expanded
}

/// Owned, versioned rectangle collection. Every mutation returns a new set
/// with a bumped version; callers that hold an old version can detect that
/// their derived data (extracted text, translations) is stale.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RectangleSet {
    version: u64,
    next_manual: u64,
    rectangles: Vec<Rectangle>,
}

impl RectangleSet {
    #[must_use]
    pub fn new(rectangles: Vec<Rectangle>) -> Self {
        Self {
            version: 0,
            next_manual: 1,
            rectangles,
        }
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn rectangles(&self) -> &[Rectangle] {
        &self.rectangles
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Rectangle> {
        self.rectangles.iter().find(|rectangle| rectangle.id == id)
    }

    fn bumped(&self, rectangles: Vec<Rectangle>) -> Self {
        Self {
            version: self.version + 1,
            next_manual: self.next_manual,
            rectangles,
        }
    }

    /// Creates a user-drawn rectangle centered on the viewport (or the fixed
    /// fallback center) with the default 150×50 size.
    #[must_use]
    pub fn add_manual(
        &self,
        mode: RectMode,
        current_page: i32,
        viewport_center: Option<(f32, f32)>,
    ) -> (Self, Rectangle) {
        let (center_x, center_y) = viewport_center.unwrap_or(FALLBACK_CENTER);

        let (prefix, text, page) = match mode {
            RectMode::Individual => ("manual", "Manual Area", current_page),
            RectMode::Repeated => ("repeated", "Repeated Area", REPEATED_PAGE),
        };

        let rectangle = Rectangle {
            id: format!("{prefix}_{}", self.next_manual),
            page,
            x: center_x - MANUAL_WIDTH / 2.0,
            y: center_y - MANUAL_HEIGHT / 2.0,
            width: MANUAL_WIDTH,
            height: MANUAL_HEIGHT,
            text: text.to_string(),
            mode,
            is_manual: true,
            original_id: None,
            original_x: None,
            original_y: None,
            original_width: None,
            original_height: None,
            page_width: None,
            page_height: None,
            extracted_text: None,
            translation: None,
        };

        let mut rectangles = self.rectangles.clone();
        rectangles.push(rectangle.clone());
        let mut next = self.bumped(rectangles);
        next.next_manual += 1;
        (next, rectangle)
    }

    /// Moves/resizes a rectangle. Degenerate spans are clamped to the
    /// minimum rather than rejected, and all downstream data is dropped.
    #[must_use]
    pub fn update_geometry(&self, id: &str, frontend: FrontendRect) -> Self {
        let rectangles = self
            .rectangles
            .iter()
            .map(|rectangle| {
                if rectangle.id != id {
                    return rectangle.clone();
                }

                let mut updated = rectangle.clone();
                updated.x = frontend.x;
                updated.y = frontend.y;
                updated.width = frontend.width.max(MIN_FRONTEND_SPAN);
                updated.height = frontend.height.max(MIN_FRONTEND_SPAN);
                clear_downstream(&mut updated);
                updated
            })
            .collect();

        self.bumped(rectangles)
    }

    #[must_use]
    pub fn delete(&self, id: &str) -> Self {
        let rectangles = self
            .rectangles
            .iter()
            .filter(|rectangle| rectangle.id != id)
            .cloned()
            .collect();
        self.bumped(rectangles)
    }

    /// Flips a rectangle between individual and repeated. A mode change
    /// alters which pages the rectangle applies to, so downstream data is
    /// invalidated like any other geometry mutation.
    #[must_use]
    pub fn toggle_mode(&self, id: &str) -> Self {
        let rectangles = self
            .rectangles
            .iter()
            .map(|rectangle| {
                if rectangle.id != id {
                    return rectangle.clone();
                }

                let mut updated = rectangle.clone();
                updated.mode = rectangle.mode.toggled();
                clear_downstream(&mut updated);
                updated
            })
            .collect();

        self.bumped(rectangles)
    }

    /// Clears cached extraction/translation for one rectangle and reports
    /// the state it lands in.
    #[must_use]
    pub fn invalidate_downstream(&self, id: &str) -> (Self, RectState) {
        let rectangles = self
            .rectangles
            .iter()
            .map(|rectangle| {
                if rectangle.id != id {
                    return rectangle.clone();
                }
                let mut updated = rectangle.clone();
                clear_downstream(&mut updated);
                updated
            })
            .collect();

        let next = self.bumped(rectangles);
        let state = next.get(id).map_or(RectState::Detected, rectangle_state);
        (next, state)
    }

    #[must_use]
    pub fn record_extraction(&self, id: &str, extracted: &str) -> Self {
        let rectangles = self
            .rectangles
            .iter()
            .map(|rectangle| {
                if rectangle.id != id {
                    return rectangle.clone();
                }
                let mut updated = rectangle.clone();
                updated.extracted_text = Some(extracted.to_string());
                updated.translation = None;
                updated
            })
            .collect();
        self.bumped(rectangles)
    }

    #[must_use]
    pub fn record_translation(&self, id: &str, translation: &str) -> Self {
        let rectangles = self
            .rectangles
            .iter()
            .map(|rectangle| {
                if rectangle.id != id {
                    return rectangle.clone();
                }
                let mut updated = rectangle.clone();
                updated.translation = Some(translation.to_string());
                updated
            })
            .collect();
        self.bumped(rectangles)
    }
}

fn clear_downstream(rectangle: &mut Rectangle) {
    rectangle.extracted_text = None;
    rectangle.translation = None;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{RectState, RectangleSet, expand_repeated, rectangle_state};
    use crate::geometry::FrontendRect;
    use crate::model::{REPEATED_PAGE, RectMode, Rectangle};

    fn template(id: &str, mode: RectMode) -> Rectangle {
        Rectangle {
            id: id.to_string(),
            page: if mode == RectMode::Repeated { REPEATED_PAGE } else { 0 },
            x: 325.0,
            y: 275.0,
            width: 150.0,
            height: 50.0,
            text: "area".to_string(),
            mode,
            is_manual: true,
            original_id: None,
            original_x: None,
            original_y: None,
            original_width: None,
            original_height: None,
            page_width: None,
            page_height: None,
            extracted_text: None,
            translation: None,
        }
    }

    #[test]
    fn expands_repeated_template_across_five_pages() {
        let templates = vec![template("repeated_1", RectMode::Repeated)];
        let expanded = expand_repeated(&templates, 5);

        assert_eq!(expanded.len(), 5);
        for (page, rectangle) in expanded.iter().enumerate() {
            assert_eq!(rectangle.id, format!("repeated_1_page_{page}"));
            assert_eq!(rectangle.page, i32::try_from(page).unwrap());
            assert_eq!(rectangle.original_id.as_deref(), Some("repeated_1"));
            assert_eq!(rectangle.x, 325.0);
        }
    }

    #[test]
    fn individual_rectangles_pass_through_expansion() {
        let templates = vec![
            template("manual_1", RectMode::Individual),
            template("repeated_1", RectMode::Repeated),
        ];
        let expanded = expand_repeated(&templates, 3);

        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].id, "manual_1");
        assert_eq!(expanded[0].original_id, None);
    }

    #[test]
    fn double_expansion_is_idempotent() {
        let templates = vec![template("repeated_1", RectMode::Repeated)];
        let once = expand_repeated(&templates, 4);
        let twice = expand_repeated(&once, 4);
        assert_eq!(once, twice);
    }

    #[test]
    fn add_manual_uses_default_size_and_fallback_center() {
        let set = RectangleSet::default();
        let (set, added) = set.add_manual(RectMode::Individual, 2, None);

        assert_eq!(added.id, "manual_1");
        assert_eq!(added.page, 2);
        assert_eq!((added.x, added.y), (325.0, 275.0));
        assert_eq!((added.width, added.height), (150.0, 50.0));
        assert!(added.is_manual);
        assert_eq!(set.version(), 1);

        let (set, repeated) = set.add_manual(RectMode::Repeated, 2, Some((100.0, 100.0)));
        assert_eq!(repeated.id, "repeated_2");
        assert_eq!(repeated.page, REPEATED_PAGE);
        assert_eq!((repeated.x, repeated.y), (25.0, 75.0));
        assert_eq!(set.version(), 2);
    }

    #[test]
    fn geometry_update_clamps_degenerate_spans() {
        let set = RectangleSet::new(vec![template("manual_1", RectMode::Individual)]);
        let set = set.update_geometry(
            "manual_1",
            FrontendRect {
                x: 10.0,
                y: 20.0,
                width: -30.0,
                height: 0.0,
            },
        );

        let rectangle = set.get("manual_1").expect("rectangle survives update");
        assert_eq!(rectangle.width, 5.0);
        assert_eq!(rectangle.height, 5.0);
    }

    #[test]
    fn mutations_invalidate_downstream_state() {
        let set = RectangleSet::new(vec![template("manual_1", RectMode::Individual)]);
        let set = set.record_extraction("manual_1", "Hello");
        assert_eq!(
            rectangle_state(set.get("manual_1").unwrap()),
            RectState::TextExtracted
        );

        let set = set.record_translation("manual_1", "שלום");
        assert_eq!(
            rectangle_state(set.get("manual_1").unwrap()),
            RectState::Translated
        );

        let moved = set.update_geometry(
            "manual_1",
            FrontendRect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 40.0,
            },
        );
        let rectangle = moved.get("manual_1").unwrap();
        assert_eq!(rectangle_state(rectangle), RectState::Detected);
        assert_eq!(rectangle.extracted_text, None);
        assert_eq!(rectangle.translation, None);
    }

    #[test]
    fn re_extraction_discards_stale_translation() {
        let set = RectangleSet::new(vec![template("manual_1", RectMode::Individual)]);
        let set = set.record_extraction("manual_1", "Hello");
        let set = set.record_translation("manual_1", "שלום");
        let set = set.record_extraction("manual_1", "Changed");

        let rectangle = set.get("manual_1").unwrap();
        assert_eq!(rectangle.extracted_text.as_deref(), Some("Changed"));
        assert_eq!(rectangle.translation, None);
    }

    #[test]
    fn toggle_mode_flips_and_invalidates() {
        let set = RectangleSet::new(vec![template("manual_1", RectMode::Individual)]);
        let set = set.record_extraction("manual_1", "Hello");
        let set = set.toggle_mode("manual_1");

        let rectangle = set.get("manual_1").unwrap();
        assert_eq!(rectangle.mode, RectMode::Repeated);
        assert_eq!(rectangle.extracted_text, None);
        assert_eq!(rectangle.mode.stroke_hint(), "#8b5cf6");

        let set = set.toggle_mode("manual_1");
        assert_eq!(set.get("manual_1").unwrap().mode, RectMode::Individual);
    }

    #[test]
    fn invalidate_downstream_reports_new_state() {
        let set = RectangleSet::new(vec![template("manual_1", RectMode::Individual)]);
        let set = set.record_extraction("manual_1", "Hello");
        let (set, state) = set.invalidate_downstream("manual_1");

        assert_eq!(state, RectState::Detected);
        assert_eq!(set.get("manual_1").unwrap().extracted_text, None);
    }

    #[test]
    fn delete_removes_only_the_target() {
        let set = RectangleSet::new(vec![
            template("manual_1", RectMode::Individual),
            template("manual_2", RectMode::Individual),
        ]);
        let set = set.delete("manual_1");

        assert!(set.get("manual_1").is_none());
        assert!(set.get("manual_2").is_some());
        assert_eq!(set.version(), 1);
    }
}
