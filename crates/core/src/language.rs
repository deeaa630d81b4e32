//! Supported target languages.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A target language the tool can translate into.
///
/// The code is what the operator types; the display name is what the
/// translation service is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Russian.
    Ru,
    /// Finnish.
    Fi,
    /// Estonian.
    Et,
    /// Swedish.
    Sv,
    /// English.
    En,
}

impl Language {
    /// Every supported language, in help-text order.
    pub const ALL: [Language; 5] = [
        Language::Ru,
        Language::Fi,
        Language::Et,
        Language::Sv,
        Language::En,
    ];

    /// Short code used on the command line and in output filenames.
    pub fn code(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::Fi => "fi",
            Language::Et => "et",
            Language::Sv => "sv",
            Language::En => "en",
        }
    }

    /// Name handed to the translation service.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Ru => "Russian",
            Language::Fi => "Finnish",
            Language::Et => "Estonian",
            Language::Sv => "Swedish",
            Language::En => "English",
        }
    }

    /// Comma-separated list of the supported codes.
    pub fn supported_codes() -> String {
        Self::ALL
            .iter()
            .map(|l| l.code())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| l.code() == code)
            .ok_or_else(|| Error::UnsupportedLanguage(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
