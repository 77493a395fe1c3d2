#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningCode {
    PageUnreadable,
    NoTextDetected,
    RectangleOutOfRange,
    TranslationFailed,
    TextDrawSkipped,
    PageRenderFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<usize>,
    pub rect_id: Option<String>,
}

impl OverlayWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            rect_id: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_rect_id(mut self, rect_id: impl Into<String>) -> Self {
        self.rect_id = Some(rect_id.into());
        self
    }
}
