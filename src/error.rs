use std::io;

use thiserror::Error;

/// Fatal faults only. Page-level and rectangle-level problems degrade to
/// [`crate::warning::OverlayWarning`] entries instead of aborting the run.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("unsupported logo image: {0}")]
    UnsupportedLogo(String),

    #[error("translation service error: {0}")]
    Translation(String),

    #[error("document has no pages")]
    EmptyDocument,
}
