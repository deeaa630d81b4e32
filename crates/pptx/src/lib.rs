//! PPTX (Office Open XML) document I/O for slide deck translation.
//!
//! Loads a .pptx package into the core shape model and writes the
//! translated model back, touching only the text bodies that changed.

pub mod document;
pub mod package;
pub mod parser;
pub mod text;
pub mod xml;

pub use document::PptxDocument;
pub use parser::PptxParser;
