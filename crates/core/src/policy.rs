//! Text replacement policy and the document-level translation driver.

use crate::error::TranslationError;
use crate::types::{Document, TextUnit};
use crate::visitor::{walk_tree, Scope, UnitOrigin, UnitVisitor, WalkStats};
use crate::Language;
use serde::Serialize;

/// The external translation service.
///
/// Implementations block until the call resolves; the traversal does not
/// move on to the next unit before that.
pub trait Translator {
    /// Translate `text` into the language named `language` (e.g. "Finnish").
    fn translate(&self, text: &str, language: &str) -> Result<String, TranslationError>;
}

/// A unit that kept its original text because translation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUnit {
    /// Where the unit lives.
    pub origin: String,
    /// Why the call failed.
    pub error: String,
}

/// Outcome of a translation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Slides walked.
    pub slides: usize,
    /// Units replaced with a translation.
    pub translated: usize,
    /// Units left alone because they were blank.
    pub skipped_empty: usize,
    /// Units whose translation failed.
    pub failed: Vec<FailedUnit>,
    /// Traversal counters summed over all walked trees.
    pub walk: WalkStats,
}

impl RunReport {
    /// Number of failed units.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Decides, per text unit, whether to translate it and writes the result back.
pub struct ReplacementPolicy<'a, T: Translator + ?Sized> {
    translator: &'a T,
    language: Language,
    report: RunReport,
}

impl<'a, T: Translator + ?Sized> ReplacementPolicy<'a, T> {
    /// Create a policy translating into `language`.
    pub fn new(translator: &'a T, language: Language) -> Self {
        Self {
            translator,
            language,
            report: RunReport::default(),
        }
    }

    /// Finish and return the counters.
    pub fn into_report(self) -> RunReport {
        self.report
    }
}

impl<T: Translator + ?Sized> UnitVisitor for ReplacementPolicy<'_, T> {
    fn visit_unit(&mut self, unit: &mut TextUnit, origin: &UnitOrigin) {
        if unit.text().trim().is_empty() {
            log::debug!("{}: blank text, skipped", origin);
            self.report.skipped_empty += 1;
            return;
        }

        match self
            .translator
            .translate(unit.text(), self.language.display_name())
        {
            Ok(translated) => {
                log::debug!("{}: {:?} -> {:?}", origin, unit.text(), translated);
                unit.replace(translated);
                self.report.translated += 1;
            }
            Err(e) => {
                log::warn!("{}: translation failed, keeping original text: {}", origin, e);
                self.report.failed.push(FailedUnit {
                    origin: origin.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// What a run should cover.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslateOptions {
    /// Also translate speaker notes.
    pub include_notes: bool,
}

/// Translate every text unit of `document` in place, slide by slide.
///
/// Per-unit failures are recorded in the report and never abort the run.
pub fn translate_document<T: Translator + ?Sized>(
    document: &mut Document,
    translator: &T,
    language: Language,
    options: TranslateOptions,
) -> RunReport {
    let mut policy = ReplacementPolicy::new(translator, language);
    let mut walk = WalkStats::default();
    let total = document.slides.len();

    for slide in &mut document.slides {
        log::info!("Translating slide {}/{}", slide.number, total);
        walk.merge(walk_tree(&mut slide.shapes, slide.number, Scope::Slide, &mut policy));

        if options.include_notes {
            if let Some(notes) = slide.notes.as_mut() {
                walk.merge(walk_tree(notes, slide.number, Scope::Notes, &mut policy));
            }
        }
    }

    let mut report = policy.into_report();
    report.slides = total;
    report.walk = walk;
    report
}
