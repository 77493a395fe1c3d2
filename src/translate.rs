use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::OverlayError;
use crate::model::{Rectangle, TRANSLATION_FAILED, TRANSLATION_NOT_FOUND, is_translatable};
use crate::warning::{OverlayWarning, WarningCode};

/// Boundary to the external translation service. Implementations receive one
/// extracted text value and return its translation.
pub trait Translator {
    fn name(&self) -> &'static str;

    fn translate(&self, text: &str) -> Result<String, OverlayError>;
}

#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Minimum delay between consecutive external calls.
    pub throttle: Duration,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(500),
        }
    }
}

/// Translates every rectangle's source text. Identical texts across
/// rectangles (typically repeated-template instances) trigger exactly one
/// external call; a failed call degrades that text to a per-item marker
/// without aborting the batch.
pub fn translate_rectangles(
    rectangles: Vec<Rectangle>,
    translator: &dyn Translator,
    options: &TranslateOptions,
    warnings: &mut Vec<OverlayWarning>,
) -> Vec<Rectangle> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for rectangle in &rectangles {
        let text = rectangle.source_text();
        if is_translatable(text) && seen.insert(text.to_string()) {
            unique.push(text.to_string());
        }
    }

    info!(
        unique = unique.len(),
        rectangles = rectangles.len(),
        translator = translator.name(),
        "translating unique text values"
    );

    let mut translations = HashMap::new();
    for (index, text) in unique.iter().enumerate() {
        if index > 0 && !options.throttle.is_zero() {
            std::thread::sleep(options.throttle);
        }

        match translator.translate(text) {
            Ok(translated) if !translated.trim().is_empty() => {
                translations.insert(text.clone(), translated);
            }
            Ok(_) => {
                warn!(text = %text, "translator returned an empty response");
                warnings.push(OverlayWarning::new(
                    WarningCode::TranslationFailed,
                    format!("empty translation for \"{text}\""),
                ));
                translations.insert(text.clone(), TRANSLATION_FAILED.to_string());
            }
            Err(error) => {
                warn!(text = %text, %error, "translation call failed");
                warnings.push(OverlayWarning::new(
                    WarningCode::TranslationFailed,
                    format!("failed to translate \"{text}\": {error}"),
                ));
                translations.insert(text.clone(), TRANSLATION_FAILED.to_string());
            }
        }
    }

    rectangles
        .into_iter()
        .map(|mut rectangle| {
            let source = rectangle.source_text();
            let value = translations
                .get(source)
                .cloned()
                .unwrap_or_else(|| TRANSLATION_NOT_FOUND.to_string());
            rectangle.translation = Some(value);
            rectangle
        })
        .collect()
}

/// Deterministic stand-in used when no external service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockTranslator;

const MOCK_TRANSLATIONS: [&str; 8] = [
    "טקסט בעברית לדוגמה",
    "תרגום מדומה לטקסט",
    "זהו תרגום לדוגמה בעברית",
    "טקסט מתורגם לעברית",
    "דוגמה לתרגום עברי",
    "תרגום אוטומטי לעברית",
    "טקסט לדוגמה בעברית",
    "תוכן מתורגם לעברית",
];

impl Translator for MockTranslator {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn translate(&self, text: &str) -> Result<String, OverlayError> {
        let digest: usize = text.bytes().map(usize::from).sum();
        Ok(MOCK_TRANSLATIONS[digest % MOCK_TRANSLATIONS.len()].to_string())
    }
}
