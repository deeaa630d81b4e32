//! Shape-tree traversal.
//!
//! Every shape is classified once, by a fixed precedence order, and then
//! handled according to its kind:
//!
//! | precedence | capability               | kind                | handling                         |
//! |------------|--------------------------|---------------------|----------------------------------|
//! | 1          | table grid               | `Table`             | each cell once, no recursion     |
//! | 2          | child shapes             | `Group` / `Diagram` | own text, then children          |
//! | 3          | placeholder role         | `Placeholder`       | own text, then children          |
//! | 4          | text body                | `PlainText`         | own text                         |
//! | 5          | none of the above        | `Other`             | skipped                          |
//!
//! Children are re-classified with the same table, so a placeholder holding a
//! table or a group is handled correctly.

use crate::types::{Container, NodeId, Shape, ShapeTree, TextUnit};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// The handling strategy chosen for a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShapeKind {
    /// A table frame.
    Table,
    /// A group of shapes.
    Group,
    /// A structured diagram.
    Diagram,
    /// A layout placeholder.
    Placeholder,
    /// A shape with a text body and nothing else.
    PlainText,
    /// Pictures, connectors and anything unrecognized.
    Other,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Table => "table",
            ShapeKind::Group => "group",
            ShapeKind::Diagram => "diagram",
            ShapeKind::Placeholder => "placeholder",
            ShapeKind::PlainText => "text",
            ShapeKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Pick the handling strategy for a shape. The first matching capability wins.
pub fn classify(shape: &Shape) -> ShapeKind {
    if shape.table.is_some() {
        return ShapeKind::Table;
    }
    match shape.container {
        Some(Container::Diagram) => return ShapeKind::Diagram,
        Some(Container::Group) => return ShapeKind::Group,
        None if !shape.children.is_empty() => return ShapeKind::Group,
        None => {}
    }
    if shape.placeholder.is_some() {
        return ShapeKind::Placeholder;
    }
    if shape.text.is_some() {
        return ShapeKind::PlainText;
    }
    ShapeKind::Other
}

/// Which page of a slide a tree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scope {
    /// The slide itself.
    Slide,
    /// The speaker notes page.
    Notes,
}

/// Where a text unit sits in the document. Used for log and report labels only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOrigin {
    /// 1-based slide number.
    pub slide: usize,
    /// Slide or notes page.
    pub scope: Scope,
    /// Names of the shapes from the top-level shape down to the owner.
    pub path: Vec<String>,
    /// Kind of the owning shape.
    pub kind: ShapeKind,
    /// `(row, column)` for table cells.
    pub cell: Option<(usize, usize)>,
}

impl fmt::Display for UnitOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slide {}", self.slide)?;
        if self.scope == Scope::Notes {
            f.write_str(" notes")?;
        }
        write!(f, ": {} [{}]", self.path.join(" > "), self.kind)?;
        if let Some((row, col)) = self.cell {
            write!(f, " cell ({}, {})", row, col)?;
        }
        Ok(())
    }
}

/// Receives each text unit the traversal discovers.
pub trait UnitVisitor {
    /// Handle one text unit. Called at most once per unit per walk.
    fn visit_unit(&mut self, unit: &mut TextUnit, origin: &UnitOrigin);
}

/// Counters from one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Shapes classified.
    pub shapes: usize,
    /// Text units handed to the visitor.
    pub units: usize,
    /// Shapes of kind `Other`.
    pub skipped_shapes: usize,
    /// Back-references to an ancestor that were cut.
    pub cycles: usize,
    /// Second references to an already visited shape.
    pub duplicates: usize,
    /// Child ids that point outside the tree.
    pub dangling: usize,
}

impl WalkStats {
    /// Add another walk's counters to these.
    pub fn merge(&mut self, other: WalkStats) {
        self.shapes += other.shapes;
        self.units += other.units;
        self.skipped_shapes += other.skipped_shapes;
        self.cycles += other.cycles;
        self.duplicates += other.duplicates;
        self.dangling += other.dangling;
    }
}

/// Walk a shape tree depth-first and hand every text unit to `visitor`.
///
/// Each shape is visited at most once: a second reference to a visited shape
/// is ignored and a reference back to an ancestor is cut with a warning.
pub fn walk_tree<V: UnitVisitor + ?Sized>(
    tree: &mut ShapeTree,
    slide: usize,
    scope: Scope,
    visitor: &mut V,
) -> WalkStats {
    let roots = tree.roots().to_vec();
    let mut walker = Walker {
        tree,
        slide,
        scope,
        visited: HashSet::new(),
        ancestors: Vec::new(),
        path: Vec::new(),
        stats: WalkStats::default(),
    };

    for id in roots {
        walker.visit(id, visitor);
    }

    walker.stats
}

struct Walker<'a> {
    tree: &'a mut ShapeTree,
    slide: usize,
    scope: Scope,
    visited: HashSet<NodeId>,
    ancestors: Vec<NodeId>,
    path: Vec<String>,
    stats: WalkStats,
}

impl Walker<'_> {
    fn visit<V: UnitVisitor + ?Sized>(&mut self, id: NodeId, visitor: &mut V) {
        if self.ancestors.contains(&id) {
            log::warn!(
                "slide {}: shape {:?} refers back to its ancestor '{}', skipping branch",
                self.slide,
                id,
                self.path.join(" > ")
            );
            self.stats.cycles += 1;
            return;
        }
        if !self.visited.insert(id) {
            log::debug!("slide {}: shape {:?} already visited", self.slide, id);
            self.stats.duplicates += 1;
            return;
        }

        let Some(shape) = self.tree.get(id) else {
            log::warn!("slide {}: dangling shape reference {:?}", self.slide, id);
            self.stats.dangling += 1;
            return;
        };

        let kind = classify(shape);
        let name = if shape.name.is_empty() {
            format!("#{}", id.0)
        } else {
            shape.name.clone()
        };
        log::debug!("slide {}: '{}' classified as {}", self.slide, name, kind);

        self.stats.shapes += 1;
        self.path.push(name);

        match kind {
            ShapeKind::Table => self.visit_cells(id, visitor),
            ShapeKind::Group | ShapeKind::Diagram | ShapeKind::Placeholder => {
                self.visit_own_text(id, kind, visitor);
                self.visit_children(id, visitor);
            }
            ShapeKind::PlainText => self.visit_own_text(id, kind, visitor),
            ShapeKind::Other => self.stats.skipped_shapes += 1,
        }

        self.path.pop();
    }

    fn origin(&self, kind: ShapeKind, cell: Option<(usize, usize)>) -> UnitOrigin {
        UnitOrigin {
            slide: self.slide,
            scope: self.scope,
            path: self.path.clone(),
            kind,
            cell,
        }
    }

    fn visit_own_text<V: UnitVisitor + ?Sized>(
        &mut self,
        id: NodeId,
        kind: ShapeKind,
        visitor: &mut V,
    ) {
        let origin = self.origin(kind, None);
        if let Some(unit) = self.tree.get_mut(id).and_then(|s| s.text.as_mut()) {
            visitor.visit_unit(unit, &origin);
            self.stats.units += 1;
        }
    }

    fn visit_cells<V: UnitVisitor + ?Sized>(&mut self, id: NodeId, visitor: &mut V) {
        let mut origin = self.origin(ShapeKind::Table, None);
        let Some(table) = self.tree.get_mut(id).and_then(|s| s.table.as_mut()) else {
            return;
        };

        for (r, row) in table.rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                origin.cell = Some((r, c));
                visitor.visit_unit(cell, &origin);
                self.stats.units += 1;
            }
        }
    }

    fn visit_children<V: UnitVisitor + ?Sized>(&mut self, id: NodeId, visitor: &mut V) {
        let children = match self.tree.get(id) {
            Some(shape) => shape.children.clone(),
            None => return,
        };

        self.ancestors.push(id);
        for child in children {
            self.visit(child, visitor);
        }
        self.ancestors.pop();
    }
}
