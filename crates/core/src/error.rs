//! Error types for slide deck translation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop a translation run.
///
/// Everything here is fatal for the run. Per-unit failures are reported
/// through [`TranslationError`] and never abort a traversal.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The requested target language is not one of the supported codes.
    #[error("Unsupported language code '{0}' (expected one of: {supported})", supported = crate::Language::supported_codes())]
    UnsupportedLanguage(String),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// A part the document needs is missing from the package.
    #[error("Missing document part: {0}")]
    MissingPart(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),
}

/// Why a single text unit could not be translated.
///
/// The replacement policy records these and keeps the original text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// The service could not be reached.
    #[error("translation service unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded the per-request timeout.
    #[error("translation request timed out")]
    Timeout,

    /// The service refused the request because of rate limiting.
    #[error("translation service rate limit exceeded: {0}")]
    RateLimited(String),

    /// The service rejected our credentials.
    #[error("translation service rejected credentials: {0}")]
    Unauthorized(String),

    /// The service answered with a non-success status.
    #[error("translation service error {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the service.
        message: String,
    },

    /// The response could not be understood.
    #[error("malformed translation response: {0}")]
    MalformedResponse(String),
}
