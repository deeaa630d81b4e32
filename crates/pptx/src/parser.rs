//! PPTX loader: maps slide XML onto the core shape tree.

use crate::document::{Binding, PptxDocument, TextLocation, UnitKey};
use crate::package::{Package, Relationships};
use crate::text::body_text;
use crate::xml::{Element, XmlPart};
use deck_core::{
    Container, Document, DocumentFormat, Error, NodeId, Placeholder, Result, Scope, Shape,
    ShapeTree, Slide, Table, TextUnit,
};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const DIAGRAM_URI_SUFFIX: &str = "/diagram";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<PptxDocument> {
        let package = Package::from_reader(reader)?;
        let mut document = Document::new(filename, DocumentFormat::Pptx);
        let mut loaded = Loaded::default();

        let slide_order = self.get_slide_order(&package)?;
        log::debug!("Found {} slides", slide_order.len());

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&package, slide_path, idx, &mut loaded)?;
            document.add_slide(slide);
        }

        Ok(PptxDocument::new(
            package,
            document,
            loaded.parts,
            loaded.bindings,
            loaded.diagram_drawings,
        ))
    }

    /// Get the ordered list of slide part names.
    ///
    /// `p:sldIdLst` in presentation.xml is authoritative. Packages without one
    /// fall back to the slide relationships ordered by their number.
    fn get_slide_order(&self, package: &Package) -> Result<Vec<String>> {
        if !package.contains(PRESENTATION_PART) {
            return Err(Error::CorruptedFile(format!(
                "'{}' not found; not a presentation",
                PRESENTATION_PART
            )));
        }
        let presentation = package.read_xml(PRESENTATION_PART)?;
        let rels = package.relationships(PRESENTATION_PART)?;

        let mut slides = Vec::new();
        if let Some((_, list)) = presentation.root.child("sldIdLst") {
            for (_, sld_id) in list.children_named("sldId") {
                let Some(rel_id) = sld_id.prefixed_attr("id") else {
                    continue;
                };
                match rels.get(rel_id) {
                    Some(rel) => slides.push(rel.target.clone()),
                    None => log::warn!("Slide relationship '{}' is missing", rel_id),
                }
            }
        }

        if slides.is_empty() {
            let mut numbered: Vec<(String, Option<usize>)> = rels
                .by_type_suffix("/slide")
                .map(|r| (r.target.clone(), extract_slide_number(&r.target)))
                .collect();
            numbered.sort_by(|a, b| match (a.1, b.1) {
                (Some(na), Some(nb)) => na.cmp(&nb),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.0.cmp(&b.0),
            });
            slides = numbered.into_iter().map(|(path, _)| path).collect();
        }

        Ok(slides)
    }

    /// Parse a single slide and its notes page.
    fn parse_slide(
        &self,
        package: &Package,
        slide_path: &str,
        index: usize,
        loaded: &mut Loaded,
    ) -> Result<Slide> {
        let part = package.read_xml(slide_path)?;
        let rels = package.relationships(slide_path)?;
        let mut slide = Slide::new(index + 1);

        slide.shapes = loaded.build_tree(package, &part, slide_path, &rels, index, Scope::Slide);
        loaded.parts.insert(slide_path.to_string(), part);

        if let Some(notes_rel) = rels.by_type_suffix("/notesSlide").next() {
            let notes_path = notes_rel.target.clone();
            match package.read_xml(&notes_path) {
                Ok(notes_part) => {
                    let notes_rels = package.relationships(&notes_path)?;
                    let tree = loaded.build_tree(
                        package,
                        &notes_part,
                        &notes_path,
                        &notes_rels,
                        index,
                        Scope::Notes,
                    );
                    slide.notes = Some(tree);
                    loaded.parts.insert(notes_path, notes_part);
                }
                Err(e) => log::warn!("Slide {}: notes unreadable, skipping: {}", index + 1, e),
            }
        }

        Ok(slide)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything collected while loading, handed to [`PptxDocument`].
#[derive(Default)]
struct Loaded {
    parts: HashMap<String, XmlPart>,
    bindings: Vec<Binding>,
    /// Text bodies already tied to a unit; each body gets at most one.
    bound: HashSet<TextLocation>,
    diagram_drawings: HashMap<String, String>,
}

impl Loaded {
    fn build_tree(
        &mut self,
        package: &Package,
        part: &XmlPart,
        part_name: &str,
        rels: &Relationships,
        slide: usize,
        scope: Scope,
    ) -> ShapeTree {
        let mut builder = TreeBuilder {
            package,
            part_name,
            rels,
            slide,
            scope,
            tree: ShapeTree::new(),
            diagrams: HashMap::new(),
            loaded: self,
        };

        match part.root.find_path(&["cSld", "spTree"]) {
            Some((path, sp_tree)) => builder.add_shapes(sp_tree, &path, None),
            None => log::warn!("'{}' has no shape tree", part_name),
        }

        builder.tree
    }
}

/// Builds one shape tree from one slide or notes part.
struct TreeBuilder<'a> {
    package: &'a Package,
    part_name: &'a str,
    rels: &'a Relationships,
    slide: usize,
    scope: Scope,
    tree: ShapeTree,
    /// Diagram data part -> its point nodes, so a part referenced twice in
    /// this tree maps to the same nodes.
    diagrams: HashMap<String, Vec<NodeId>>,
    loaded: &'a mut Loaded,
}

impl TreeBuilder<'_> {
    fn add_shapes(&mut self, container: &Element, container_path: &[usize], parent: Option<NodeId>) {
        for (i, element) in container.elements() {
            let mut path = container_path.to_vec();
            path.push(i);

            match element.local_name() {
                "sp" => self.add_text_shape(element, path, parent),
                "grpSp" => self.add_group(element, path, parent),
                "graphicFrame" => self.add_graphic_frame(element, path, parent),
                "AlternateContent" => {
                    if let Some((ci, choice)) = element.child("Choice") {
                        path.push(ci);
                        self.add_shapes(choice, &path, parent);
                    }
                }
                "nvGrpSpPr" | "grpSpPr" | "extLst" => {}
                "pic" | "cxnSp" | "contentPart" => {
                    self.push(parent, shape_header(element));
                }
                other => {
                    log::debug!("Unrecognized shape element '{}' in '{}'", other, self.part_name);
                    self.push(parent, shape_header(element));
                }
            }
        }
    }

    fn push(&mut self, parent: Option<NodeId>, shape: Shape) -> NodeId {
        match parent {
            Some(p) => self.tree.add_child(p, shape),
            None => self.tree.add_root(shape),
        }
    }

    fn bind(&mut self, unit: UnitKey, part: &str, path: Vec<usize>) {
        let location = TextLocation {
            part: part.to_string(),
            path,
        };
        if !self.loaded.bound.insert(location.clone()) {
            log::debug!("Text body {:?} in '{}' is already bound", location.path, part);
            return;
        }
        self.loaded.bindings.push(Binding {
            slide: self.slide,
            scope: self.scope,
            unit,
            location,
        });
    }

    fn add_text_shape(&mut self, element: &Element, path: Vec<usize>, parent: Option<NodeId>) {
        let mut shape = shape_header(element);
        let body = element.child("txBody");
        if let Some((_, body)) = body {
            shape.text = Some(TextUnit::new(body_text(body)));
        }

        let id = self.push(parent, shape);
        if let Some((bi, _)) = body {
            let mut body_path = path;
            body_path.push(bi);
            let part = self.part_name;
            self.bind(UnitKey::Shape(id), part, body_path);
        }
    }

    fn add_group(&mut self, element: &Element, path: Vec<usize>, parent: Option<NodeId>) {
        let shape = shape_header(element).with_container(Container::Group);
        let id = self.push(parent, shape);
        self.add_shapes(element, &path, Some(id));
    }

    fn add_graphic_frame(&mut self, element: &Element, path: Vec<usize>, parent: Option<NodeId>) {
        let shape = shape_header(element);
        let Some((data_path, data)) = element.find_path(&["graphic", "graphicData"]) else {
            self.push(parent, shape);
            return;
        };
        let mut data_full = path;
        data_full.extend(data_path);

        if let Some((ti, table)) = data.child("tbl") {
            data_full.push(ti);
            self.add_table(shape, table, data_full, parent);
        } else if data.attr("uri").is_some_and(|u| u.ends_with(DIAGRAM_URI_SUFFIX)) {
            let id = self.push(parent, shape.with_container(Container::Diagram));
            match data.child("relIds").and_then(|(_, r)| r.attr("dm")) {
                Some(rel_id) => self.add_diagram_points(id, rel_id),
                None => log::warn!("Diagram in '{}' has no data relationship", self.part_name),
            }
        } else {
            log::debug!(
                "Graphic frame '{}' holds {}; skipped",
                shape.name,
                data.attr("uri").unwrap_or("unknown content")
            );
            self.push(parent, shape);
        }
    }

    fn add_table(&mut self, shape: Shape, table: &Element, path: Vec<usize>, parent: Option<NodeId>) {
        let mut grid = Table::default();
        let mut cells = Vec::new();

        for (r, (ri, row)) in table.children_named("tr").enumerate() {
            let mut units = Vec::new();
            for (c, (ci, cell)) in row.children_named("tc").enumerate() {
                match cell.child("txBody") {
                    Some((bi, body)) => {
                        units.push(TextUnit::new(body_text(body)));
                        let mut cell_path = path.clone();
                        cell_path.extend([ri, ci, bi]);
                        cells.push((r, c, cell_path));
                    }
                    None => units.push(TextUnit::default()),
                }
            }
            grid.rows.push(units);
        }

        let id = self.push(parent, shape.with_table(grid));
        let part = self.part_name;
        for (row, col, cell_path) in cells {
            self.bind(UnitKey::Cell { node: id, row, col }, part, cell_path);
        }
    }

    /// Attach the text-bearing points of a diagram's data part to `frame`.
    fn add_diagram_points(&mut self, frame: NodeId, rel_id: &str) {
        let Some(rel) = self.rels.get(rel_id) else {
            log::warn!("Diagram relationship '{}' missing in '{}'", rel_id, self.part_name);
            return;
        };
        let data_part = rel.target.clone();

        if let Some(ids) = self.diagrams.get(&data_part) {
            for id in ids.clone() {
                self.tree.link(frame, id);
            }
            return;
        }
        // Points belong to the first tree that loaded the part.
        if self.loaded.parts.contains_key(&data_part) {
            log::debug!(
                "Diagram data '{}' already loaded by another slide; not attached again",
                data_part
            );
            return;
        }

        let part = match self.package.read_xml(&data_part) {
            Ok(part) => part,
            Err(e) => {
                log::warn!("Diagram data '{}' unreadable, skipping: {}", data_part, e);
                return;
            }
        };

        let mut ids = Vec::new();
        if let Some((li, points)) = part.root.child("ptLst") {
            for (pi, point) in points.children_named("pt") {
                if matches!(point.attr("type"), Some("pres" | "parTrans" | "sibTrans")) {
                    continue;
                }
                let Some((ti, body)) = point.child("t") else {
                    continue;
                };
                let name = point.attr("modelId").unwrap_or("pt").to_string();
                let node = Shape::named(name).with_text(body_text(body));
                let id = self.tree.add_child(frame, node);
                self.bind(UnitKey::Shape(id), &data_part, vec![li, pi, ti]);
                ids.push(id);
            }
        }

        let drawing_rel = part
            .root
            .find_path(&["extLst", "ext", "dataModelExt"])
            .and_then(|(_, ext)| ext.attr("relId"))
            .and_then(|id| self.rels.get(id));
        if let Some(drawing) = drawing_rel {
            self.loaded
                .diagram_drawings
                .insert(data_part.clone(), drawing.target.clone());
        }

        self.diagrams.insert(data_part.clone(), ids);
        self.loaded.parts.insert(data_part, part);
    }
}

/// Name and placeholder role from a shape's non-visual properties.
fn shape_header(element: &Element) -> Shape {
    let non_visual = element
        .elements()
        .find(|(_, e)| e.local_name().starts_with("nv"))
        .map(|(_, e)| e);

    let name = non_visual
        .and_then(|nv| nv.child("cNvPr"))
        .and_then(|(_, c)| c.attr("name"))
        .unwrap_or_default();

    let mut shape = Shape::named(name);
    if let Some((_, ph)) = non_visual
        .and_then(|nv| nv.child("nvPr"))
        .and_then(|(_, nv_pr)| nv_pr.child("ph"))
    {
        shape.placeholder = Some(Placeholder {
            role: ph.attr("type").map(str::to_string),
            index: ph.attr("idx").and_then(|i| i.parse().ok()),
        });
    }
    shape
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
