//! Output path derivation.

use crate::Language;
use std::path::{Path, PathBuf};

/// Derive the output path for a translated document.
///
/// The language code is inserted before the final extension, next to the
/// input: `talks/deck.pptx` + `ru` becomes `talks/deck-ru.pptx`.
pub fn output_path(input: &Path, language: Language) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let filename = match input.extension() {
        Some(ext) => format!("{}-{}.{}", stem, language.code(), ext.to_string_lossy()),
        None => format!("{}-{}", stem, language.code()),
    };

    match input.parent() {
        Some(parent) => parent.join(filename),
        None => PathBuf::from(filename),
    }
}
