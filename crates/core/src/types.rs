//! Domain types for a slide deck's shape tree.

use serde::{Deserialize, Serialize};

/// A whole presentation, as loaded for one translation run.
#[derive(Debug, Clone)]
pub struct Document {
    /// Original filename (without path).
    pub filename: String,

    /// Format of the source file.
    pub format: DocumentFormat,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Document {
    /// Create an empty document with the given filename and format.
    pub fn new(filename: impl Into<String>, format: DocumentFormat) -> Self {
        Self {
            filename: filename.into(),
            format,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the document.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }
}

/// The container format of a presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Detected only so it can be rejected clearly.
    Ppt,
}

impl DocumentFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}

/// A single slide and, optionally, its speaker notes.
#[derive(Debug, Clone)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Shapes on the slide.
    pub shapes: ShapeTree,

    /// Shapes on the notes page, if the slide has one.
    pub notes: Option<ShapeTree>,
}

impl Slide {
    /// Create a slide with an empty shape tree.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: ShapeTree::new(),
            notes: None,
        }
    }
}

/// Index of a shape inside its [`ShapeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Arena of shapes with ordered roots.
///
/// Child links are ids, so a tree built from a malformed document may share
/// children between parents or even loop back to an ancestor. The visitor
/// copes with both.
#[derive(Debug, Clone, Default)]
pub struct ShapeTree {
    nodes: Vec<Shape>,
    roots: Vec<NodeId>,
}

impl ShapeTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a shape without attaching it anywhere.
    pub fn insert(&mut self, shape: Shape) -> NodeId {
        self.nodes.push(shape);
        NodeId(self.nodes.len() - 1)
    }

    /// Store a shape as the next top-level shape.
    pub fn add_root(&mut self, shape: Shape) -> NodeId {
        let id = self.insert(shape);
        self.roots.push(id);
        id
    }

    /// Store a shape as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, shape: Shape) -> NodeId {
        let id = self.insert(shape);
        self.link(parent, id);
        id
    }

    /// Append an existing node to `parent`'s children.
    ///
    /// Does nothing if `parent` does not exist.
    pub fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(child);
        }
    }

    /// Top-level shapes in slide order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Look up a shape.
    pub fn get(&self, id: NodeId) -> Option<&Shape> {
        self.nodes.get(id.0)
    }

    /// Look up a shape for mutation.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Shape> {
        self.nodes.get_mut(id.0)
    }

    /// Number of shapes stored, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no shapes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All shapes with their ids, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Shape)> {
        self.nodes.iter().enumerate().map(|(i, s)| (NodeId(i), s))
    }
}

/// A positioned element on a slide, described by what it can do.
///
/// A shape may expose several capabilities at once (a placeholder holding a
/// table, a group with its own text). [`crate::classify`] picks one kind.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    /// Name shown in the editor's selection pane; used for log labels.
    pub name: String,

    /// The shape's own text, if it has a text body.
    pub text: Option<TextUnit>,

    /// Table grid, for table frames.
    pub table: Option<Table>,

    /// Set for shapes that own child shapes.
    pub container: Option<Container>,

    /// Layout role, for placeholders.
    pub placeholder: Option<Placeholder>,

    /// Child shapes in visiting order.
    pub children: Vec<NodeId>,
}

impl Shape {
    /// A shape with a name and nothing else.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attach a text unit.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(TextUnit::new(text));
        self
    }

    /// Attach a table grid.
    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    /// Mark the shape as a container of children.
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Give the shape a placeholder role.
    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

/// What kind of child-owning shape this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Container {
    /// A group of shapes.
    Group,
    /// A structured diagram (SmartArt); children are its text nodes.
    Diagram,
}

/// Placeholder role inherited from the slide layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Placeholder {
    /// Role such as `title`, `body` or `subTitle`. `None` means the format's default.
    pub role: Option<String>,

    /// Layout index linking the placeholder to its layout counterpart.
    pub index: Option<u32>,
}

/// A fixed grid of cells, one text unit per cell.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Rows of cells, top to bottom.
    pub rows: Vec<Vec<TextUnit>>,
}

impl Table {
    /// Build a table from rows of cell text.
    pub fn from_rows<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(TextUnit::new).collect())
                .collect(),
        }
    }

    /// Cell at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Option<&TextUnit> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// The mutable text of a shape, table cell or diagram node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextUnit {
    text: String,
    modified: bool,
}

impl TextUnit {
    /// Wrap text as loaded from the document.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            modified: false,
        }
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether [`TextUnit::replace`] has been called.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Overwrite the text. Writers only re-emit modified units.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.modified = true;
    }
}
