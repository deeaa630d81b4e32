//! Core shape-tree model, traversal and text replacement policy for
//! translating slide decks.

pub mod error;
pub mod language;
pub mod output;
pub mod policy;
pub mod types;
pub mod visitor;

pub use error::{Error, Result, TranslationError};
pub use language::Language;
pub use output::output_path;
pub use policy::{
    translate_document, FailedUnit, ReplacementPolicy, RunReport, TranslateOptions, Translator,
};
pub use types::{
    Container, Document, DocumentFormat, NodeId, Placeholder, Shape, ShapeTree, Slide, Table,
    TextUnit,
};
pub use visitor::{classify, walk_tree, Scope, ShapeKind, UnitOrigin, UnitVisitor, WalkStats};
