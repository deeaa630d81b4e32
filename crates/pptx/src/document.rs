//! A loaded presentation: the core document plus what is needed to write it back.

use crate::package::Package;
use crate::parser::PptxParser;
use crate::text::{body_text, write_body};
use crate::xml::{Element, XmlPart};
use deck_core::{Document, Error, NodeId, Result, Scope, TextUnit};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;

/// Which text unit of a shape a binding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitKey {
    /// The shape's own text.
    Shape(NodeId),
    /// A table cell.
    Cell { node: NodeId, row: usize, col: usize },
}

/// Where a text body lives: part name and child-index path from the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TextLocation {
    pub part: String,
    pub path: Vec<usize>,
}

/// Ties one text unit of the model to its text body in the package.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    /// 0-based slide index.
    pub slide: usize,
    pub scope: Scope,
    pub unit: UnitKey,
    pub location: TextLocation,
}

/// A presentation opened from a `.pptx` package.
///
/// Mutate [`PptxDocument::document_mut`], then [`PptxDocument::save`] to a
/// new path. Only parts holding modified text units are re-serialized; every
/// other entry is written back byte for byte.
pub struct PptxDocument {
    package: Package,
    document: Document,
    parts: HashMap<String, XmlPart>,
    bindings: Vec<Binding>,
    /// Diagram data part -> diagram drawing part.
    diagram_drawings: HashMap<String, String>,
}

impl PptxDocument {
    pub(crate) fn new(
        package: Package,
        document: Document,
        parts: HashMap<String, XmlPart>,
        bindings: Vec<Binding>,
        diagram_drawings: HashMap<String, String>,
    ) -> Self {
        Self {
            package,
            document,
            parts,
            bindings,
            diagram_drawings,
        }
    }

    /// Open and parse a `.pptx` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        PptxParser::new().parse(BufReader::new(file), filename)
    }

    /// The loaded shape model.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The loaded shape model, for translation.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Write the presentation, with all modified text, to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the presentation, with all modified text, to a writer.
    pub fn write_to<W: Write + Seek>(&mut self, writer: W) -> Result<()> {
        let written = self.apply_changes()?;
        log::debug!("Rewrote {} text bodies", written);
        self.package.write_to(writer)
    }

    /// Push modified text units into their parts and re-serialize those parts.
    fn apply_changes(&mut self) -> Result<usize> {
        let mut dirty: BTreeSet<String> = BTreeSet::new();
        let mut diagram_changes: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut written = 0;

        for binding in &self.bindings {
            let Some(unit) = lookup_unit(&self.document, binding) else {
                log::warn!("Stale binding for {:?} on slide {}", binding.unit, binding.slide + 1);
                continue;
            };
            if !unit.is_modified() {
                continue;
            }

            let location = &binding.location;
            let body = self
                .parts
                .get_mut(&location.part)
                .and_then(|p| p.root.at_path_mut(&location.path))
                .ok_or_else(|| {
                    Error::CorruptedFile(format!("text body vanished from '{}'", location.part))
                })?;

            let original = body_text(body);
            write_body(body, unit.text());
            dirty.insert(location.part.clone());
            written += 1;

            if self.diagram_drawings.contains_key(&location.part) && !original.trim().is_empty() {
                diagram_changes
                    .entry(location.part.clone())
                    .or_default()
                    .insert(original, unit.text().to_string());
            }
        }

        for (data_part, changes) in diagram_changes {
            let Some(drawing_part) = self.diagram_drawings.get(&data_part).cloned() else {
                continue;
            };
            if self.sync_drawing(&drawing_part, &changes)? {
                dirty.insert(drawing_part);
            }
        }

        for name in dirty {
            if let Some(part) = self.parts.get(&name) {
                let bytes = part.to_bytes()?;
                self.package.replace(&name, bytes)?;
            }
        }

        Ok(written)
    }

    /// Mirror diagram point translations into the drawing cache, matching
    /// shapes by their original text. Returns whether anything changed.
    fn sync_drawing(&mut self, drawing_part: &str, changes: &HashMap<String, String>) -> Result<bool> {
        if !self.parts.contains_key(drawing_part) {
            match self.package.read_xml(drawing_part) {
                Ok(part) => {
                    self.parts.insert(drawing_part.to_string(), part);
                }
                Err(e) => {
                    log::warn!("Diagram drawing '{}' unreadable, not updated: {}", drawing_part, e);
                    return Ok(false);
                }
            }
        }
        let Some(part) = self.parts.get_mut(drawing_part) else {
            return Ok(false);
        };

        let mut changed = false;
        part.root.for_each_named_mut("txBody", &mut |body: &mut Element| {
            if let Some(translated) = changes.get(&body_text(body)) {
                write_body(body, translated);
                changed = true;
            }
        });
        Ok(changed)
    }
}

fn lookup_unit<'a>(document: &'a Document, binding: &Binding) -> Option<&'a TextUnit> {
    let slide = document.slides.get(binding.slide)?;
    let tree = match binding.scope {
        Scope::Slide => &slide.shapes,
        Scope::Notes => slide.notes.as_ref()?,
    };
    match binding.unit {
        UnitKey::Shape(id) => tree.get(id)?.text.as_ref(),
        UnitKey::Cell { node, row, col } => tree.get(node)?.table.as_ref()?.cell(row, col),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{
        classify, translate_document, walk_tree, Language, ShapeKind, TranslateOptions,
        TranslationError, Translator, UnitOrigin, UnitVisitor,
    };
    use std::cell::RefCell;
    use std::io::Cursor;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
    const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    const IMAGE: &[u8] = &[0x89, b'P', b'N', b'G', 0, 1, 2, 3];

    fn sp(id: u32, name: &str, placeholder: &str, body: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr/><p:nvPr>{placeholder}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>"#
        )
    }

    fn run(text: &str) -> String {
        format!(r#"<a:p><a:r><a:rPr lang="en-US" b="1"/><a:t>{text}</a:t></a:r></a:p>"#)
    }

    fn cell(text: &str) -> String {
        format!(
            r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{text}</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>"#
        )
    }

    fn slide(shapes: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld></p:sld>"#
        )
    }

    fn scenario_slide() -> String {
        let table = format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="3" name="Table 2"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblGrid/><a:tr h="370840">{}{}</a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
            cell("A"),
            cell("B")
        );
        let group = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="4" name="Group 3"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:grpSp><p:nvGrpSpPr><p:cNvPr id="5" name="Group 4"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}{}</p:grpSp></p:grpSp>"#,
            sp(6, "Title 5", r#"<p:ph type="title"/>"#, &run("World")),
            sp(7, "TextBox 6", "", "<a:p><a:endParaRPr lang=\"en-US\"/></a:p>")
        );
        let picture = r#"<p:pic><p:nvPicPr><p:cNvPr id="8" name="Picture 7"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill/><p:spPr/></p:pic>"#;
        let diagram = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="9" name="Diagram 8"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/diagram"><dgm:relIds xmlns:dgm="http://schemas.openxmlformats.org/drawingml/2006/diagram" r:dm="rId2" r:lo="rId3" r:qs="rId4" r:cs="rId5"/></a:graphicData></a:graphic></p:graphicFrame>"#;

        slide(&format!(
            "{}{}{}{}{}",
            sp(2, "TextBox 1", "", &run("Hello")),
            table,
            group,
            picture,
            diagram
        ))
    }

    const DIAGRAM_DATA: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<dgm:dataModel xmlns:dgm="http://schemas.openxmlformats.org/drawingml/2006/diagram" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><dgm:ptLst><dgm:pt modelId="{D0}" type="doc"><dgm:prSet/><dgm:spPr/><dgm:t><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></dgm:t></dgm:pt><dgm:pt modelId="{P1}"><dgm:prSet/><dgm:spPr/><dgm:t><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Plan</a:t></a:r></a:p></dgm:t></dgm:pt><dgm:pt modelId="{T1}" type="parTrans"><dgm:prSet/><dgm:spPr/><dgm:t><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></dgm:t></dgm:pt><dgm:pt modelId="{P2}"><dgm:prSet/><dgm:spPr/><dgm:t><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Build</a:t></a:r></a:p></dgm:t></dgm:pt><dgm:pt modelId="{R1}" type="pres"><dgm:prSet/><dgm:spPr/></dgm:pt></dgm:ptLst><dgm:cxnLst/><dgm:bg/><dgm:whole/><dgm:extLst><a:ext uri="http://schemas.microsoft.com/office/drawing/2008/diagram"><dsp:dataModelExt xmlns:dsp="http://schemas.microsoft.com/office/drawing/2008/diagram" relId="rId6" minVer="http://schemas.openxmlformats.org/drawingml/2006/diagram"/></a:ext></dgm:extLst></dgm:dataModel>"#;

    const DIAGRAM_DRAWING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<dsp:drawing xmlns:dsp="http://schemas.microsoft.com/office/drawing/2008/diagram" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><dsp:spTree><dsp:sp modelId="{S1}"><dsp:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="2400"/><a:t>Plan</a:t></a:r></a:p></dsp:txBody></dsp:sp><dsp:sp modelId="{S2}"><dsp:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="2400"/><a:t>Build</a:t></a:r></a:p></dsp:txBody></dsp:sp></dsp:spTree></dsp:drawing>"#;

    fn notes() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>{}</p:spTree></p:cSld></p:notes>"#,
            sp(3, "Notes Placeholder 2", r#"<p:ph type="body" idx="1"/>"#, &run("Remember"))
        )
    }

    fn rels(entries: &[(&str, &str, &str)]) -> String {
        let body: String = entries
            .iter()
            .map(|(id, kind, target)| {
                format!(r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"/>"#)
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
        )
    }

    /// Two slides; `sldIdLst` lists slide2.xml first.
    fn fixture() -> Vec<u8> {
        let files: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".into(), b"<Types/>".to_vec()),
            (
                "ppt/presentation.xml".into(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS}><p:sldIdLst><p:sldId id="256" r:id="rId3"/><p:sldId id="257" r:id="rId2"/></p:sldIdLst></p:presentation>"#
                )
                .into_bytes(),
            ),
            (
                "ppt/_rels/presentation.xml.rels".into(),
                rels(&[
                    ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
                    ("rId2", "slide", "slides/slide1.xml"),
                    ("rId3", "slide", "slides/slide2.xml"),
                ])
                .into_bytes(),
            ),
            ("ppt/slides/slide1.xml".into(), scenario_slide().into_bytes()),
            (
                "ppt/slides/_rels/slide1.xml.rels".into(),
                rels(&[
                    ("rId1", "notesSlide", "../notesSlides/notesSlide1.xml"),
                    ("rId2", "diagramData", "../diagrams/data1.xml"),
                    ("rId6", "diagramDrawing", "../diagrams/drawing1.xml"),
                    ("rId7", "image", "../media/image1.png"),
                ])
                .into_bytes(),
            ),
            (
                "ppt/slides/slide2.xml".into(),
                slide(&sp(2, "Title 1", r#"<p:ph type="ctrTitle"/>"#, &run("Intro"))).into_bytes(),
            ),
            ("ppt/diagrams/data1.xml".into(), DIAGRAM_DATA.as_bytes().to_vec()),
            ("ppt/diagrams/drawing1.xml".into(), DIAGRAM_DRAWING.as_bytes().to_vec()),
            ("ppt/notesSlides/notesSlide1.xml".into(), notes().into_bytes()),
            ("ppt/media/image1.png".into(), IMAGE.to_vec()),
        ];

        archive(files)
    }

    fn archive(files: Vec<(String, Vec<u8>)>) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in files {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(&data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    /// A deck whose slides are `slideN.xml` with the given content and rels,
    /// listed in order, plus any extra parts.
    fn deck(slides: &[(String, String)], extra: Vec<(String, Vec<u8>)>) -> Vec<u8> {
        let ids: String = (0..slides.len())
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 1))
            .collect();
        let targets: Vec<(String, String)> = (0..slides.len())
            .map(|i| (format!("rId{}", i + 1), format!("slides/slide{}.xml", i + 1)))
            .collect();
        let entries: Vec<(&str, &str, &str)> = targets
            .iter()
            .map(|(id, target)| (id.as_str(), "slide", target.as_str()))
            .collect();

        let mut files: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".into(), b"<Types/>".to_vec()),
            (
                "ppt/presentation.xml".into(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS}><p:sldIdLst>{ids}</p:sldIdLst></p:presentation>"#
                )
                .into_bytes(),
            ),
            ("ppt/_rels/presentation.xml.rels".into(), rels(&entries).into_bytes()),
        ];
        for (i, (content, slide_rels)) in slides.iter().enumerate() {
            files.push((format!("ppt/slides/slide{}.xml", i + 1), content.clone().into_bytes()));
            files.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                slide_rels.clone().into_bytes(),
            ));
        }
        files.extend(extra);
        archive(files)
    }

    fn load(bytes: Vec<u8>) -> PptxDocument {
        PptxParser::new().parse(Cursor::new(bytes), "deck.pptx").unwrap()
    }

    fn save(doc: &mut PptxDocument) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        doc.write_to(&mut out).unwrap();
        out.into_inner()
    }

    /// Collects unit texts without touching them.
    #[derive(Default)]
    struct Texts(Vec<(String, ShapeKind)>);

    impl UnitVisitor for Texts {
        fn visit_unit(&mut self, unit: &mut TextUnit, origin: &UnitOrigin) {
            self.0.push((unit.text().to_string(), origin.kind));
        }
    }

    fn texts(doc: &mut PptxDocument, slide: usize, scope: Scope) -> Vec<String> {
        let s = &mut doc.document_mut().slides[slide];
        let number = s.number;
        let tree = match scope {
            Scope::Slide => &mut s.shapes,
            Scope::Notes => s.notes.as_mut().unwrap(),
        };
        let mut collect = Texts::default();
        walk_tree(tree, number, scope, &mut collect);
        collect.0.into_iter().map(|(t, _)| t).collect()
    }

    struct Mock {
        calls: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl Mock {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_on,
            }
        }
    }

    impl Translator for Mock {
        fn translate(&self, text: &str, language: &str) -> std::result::Result<String, TranslationError> {
            self.calls.borrow_mut().push(text.to_string());
            if self.fail_on == Some(text) {
                return Err(TranslationError::Service {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(format!("{}:{}", language, text))
        }
    }

    #[test]
    fn test_loads_slides_in_presentation_order() {
        let mut doc = load(fixture());
        assert_eq!(doc.document().slides.len(), 2);
        assert_eq!(doc.document().filename, "deck.pptx");
        assert_eq!(texts(&mut doc, 0, Scope::Slide), vec!["Intro"]);
        assert_eq!(
            texts(&mut doc, 1, Scope::Slide),
            vec!["Hello", "A", "B", "World", "", "", "Plan", "Build"]
        );
        assert_eq!(texts(&mut doc, 1, Scope::Notes), vec!["Remember"]);
        assert!(doc.document().slides[0].notes.is_none());
    }

    #[test]
    fn test_shape_kinds() {
        let doc = load(fixture());
        let tree = &doc.document().slides[1].shapes;
        let kinds: Vec<(String, ShapeKind)> = tree
            .roots()
            .iter()
            .map(|id| {
                let shape = tree.get(*id).unwrap();
                (shape.name.clone(), classify(shape))
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("TextBox 1".to_string(), ShapeKind::PlainText),
                ("Table 2".to_string(), ShapeKind::Table),
                ("Group 3".to_string(), ShapeKind::Group),
                ("Picture 7".to_string(), ShapeKind::Other),
                ("Diagram 8".to_string(), ShapeKind::Diagram),
            ]
        );

        let (_, title) = tree.iter().find(|(_, s)| s.name == "Title 5").unwrap();
        assert_eq!(classify(title), ShapeKind::Placeholder);
        assert_eq!(title.placeholder.as_ref().unwrap().role.as_deref(), Some("title"));
    }

    #[test]
    fn test_translate_and_save_round_trip() {
        let mut doc = load(fixture());
        let translator = Mock::new(None);
        let report = translate_document(
            doc.document_mut(),
            &translator,
            Language::Fi,
            TranslateOptions::default(),
        );

        assert_eq!(
            *translator.calls.borrow(),
            vec!["Intro", "Hello", "A", "B", "World", "Plan", "Build"]
        );
        assert_eq!(report.translated, 7);
        assert_eq!(report.skipped_empty, 2);

        let bytes = save(&mut doc);
        let mut reloaded = load(bytes.clone());
        assert_eq!(texts(&mut reloaded, 0, Scope::Slide), vec!["Finnish:Intro"]);
        assert_eq!(
            texts(&mut reloaded, 1, Scope::Slide),
            vec![
                "Finnish:Hello",
                "Finnish:A",
                "Finnish:B",
                "Finnish:World",
                "",
                "",
                "Finnish:Plan",
                "Finnish:Build"
            ]
        );
        // Notes were not requested.
        assert_eq!(texts(&mut reloaded, 1, Scope::Notes), vec!["Remember"]);

        let package = Package::from_reader(Cursor::new(bytes)).unwrap();
        let slide_xml = package.read_string("ppt/slides/slide1.xml").unwrap();
        assert!(slide_xml.contains(r#"<a:rPr lang="en-US" b="1"/><a:t>Finnish:Hello</a:t>"#));
        assert!(slide_xml.starts_with("<?xml version=\"1.0\""));

        let drawing = package.read_string("ppt/diagrams/drawing1.xml").unwrap();
        assert!(drawing.contains(r#"<a:rPr lang="en-US" sz="2400"/><a:t>Finnish:Plan</a:t>"#));
        assert!(drawing.contains("Finnish:Build"));
        assert!(!drawing.contains(">Plan<"));

        assert_eq!(package.read("ppt/media/image1.png"), Some(IMAGE));
    }

    #[test]
    fn test_untouched_parts_are_byte_identical() {
        let original = fixture();
        let source = Package::from_reader(Cursor::new(original.clone())).unwrap();

        let mut doc = load(original);
        let translator = Mock::new(Some("Intro"));
        let report = translate_document(
            doc.document_mut(),
            &translator,
            Language::Ru,
            TranslateOptions::default(),
        );
        assert_eq!(report.failed_count(), 1);

        let output = Package::from_reader(Cursor::new(save(&mut doc))).unwrap();
        assert_eq!(
            output.read("ppt/slides/slide2.xml"),
            source.read("ppt/slides/slide2.xml")
        );
        assert_eq!(
            output.read("ppt/notesSlides/notesSlide1.xml"),
            source.read("ppt/notesSlides/notesSlide1.xml")
        );
        assert_ne!(
            output.read("ppt/slides/slide1.xml"),
            source.read("ppt/slides/slide1.xml")
        );
    }

    #[test]
    fn test_notes_translated_on_request() {
        let mut doc = load(fixture());
        let translator = Mock::new(None);
        translate_document(
            doc.document_mut(),
            &translator,
            Language::Et,
            TranslateOptions { include_notes: true },
        );
        assert_eq!(translator.calls.borrow().last().unwrap(), "Remember");

        let mut reloaded = load(save(&mut doc));
        assert_eq!(texts(&mut reloaded, 1, Scope::Notes), vec!["Estonian:Remember"]);
    }

    #[test]
    fn test_multiline_translation_becomes_paragraphs() {
        let mut doc = load(fixture());
        {
            let tree = &mut doc.document_mut().slides[0].shapes;
            let id = tree.roots()[0];
            tree.get_mut(id)
                .unwrap()
                .text
                .as_mut()
                .unwrap()
                .replace("Line one\nLine two");
        }
        let mut reloaded = load(save(&mut doc));
        assert_eq!(texts(&mut reloaded, 0, Scope::Slide), vec!["Line one\nLine two"]);
    }

    #[test]
    fn test_slide_number_field_is_kept() {
        let field = r#"<a:p><a:fld id="{B6F15528-21DE-4FAA-801E-634DDDAF4B2B}" type="slidenum"><a:rPr lang="en-US"/><a:t>3</a:t></a:fld><a:endParaRPr lang="en-US"/></a:p>"#;
        let content = slide(&format!(
            "{}{}",
            sp(2, "TextBox 1", "", &run("Hello")),
            sp(3, "Slide Number Placeholder 2", r#"<p:ph type="sldNum" sz="quarter" idx="12"/>"#, field)
        ));
        let bytes = deck(&[(content, rels(&[]))], Vec::new());

        let mut doc = load(bytes);
        let translator = Mock::new(None);
        let report = translate_document(
            doc.document_mut(),
            &translator,
            Language::Fi,
            TranslateOptions::default(),
        );
        assert_eq!(*translator.calls.borrow(), vec!["Hello"]);
        assert_eq!(report.skipped_empty, 1);

        let package = Package::from_reader(Cursor::new(save(&mut doc))).unwrap();
        let slide_xml = package.read_string("ppt/slides/slide1.xml").unwrap();
        assert!(slide_xml.contains(
            r#"<a:fld id="{B6F15528-21DE-4FAA-801E-634DDDAF4B2B}" type="slidenum"><a:rPr lang="en-US"/><a:t>3</a:t></a:fld>"#
        ));
        assert!(slide_xml.contains("Finnish:Hello"));
    }

    #[test]
    fn test_shared_diagram_data_translated_once() {
        let diagram = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="9" name="Diagram 8"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/diagram"><dgm:relIds xmlns:dgm="http://schemas.openxmlformats.org/drawingml/2006/diagram" r:dm="rId2" r:lo="rId3" r:qs="rId4" r:cs="rId5"/></a:graphicData></a:graphic></p:graphicFrame>"#;
        let slide_rels = rels(&[
            ("rId2", "diagramData", "../diagrams/data1.xml"),
            ("rId6", "diagramDrawing", "../diagrams/drawing1.xml"),
        ]);
        let bytes = deck(
            &[
                (slide(diagram), slide_rels.clone()),
                (slide(diagram), slide_rels),
            ],
            vec![
                ("ppt/diagrams/data1.xml".into(), DIAGRAM_DATA.as_bytes().to_vec()),
                ("ppt/diagrams/drawing1.xml".into(), DIAGRAM_DRAWING.as_bytes().to_vec()),
            ],
        );

        let mut doc = load(bytes);
        let translator = Mock::new(None);
        let report = translate_document(
            doc.document_mut(),
            &translator,
            Language::Sv,
            TranslateOptions::default(),
        );
        assert_eq!(*translator.calls.borrow(), vec!["Plan", "Build"]);
        assert_eq!(report.translated, 2);

        let bytes = save(&mut doc);
        let mut reloaded = load(bytes.clone());
        assert_eq!(
            texts(&mut reloaded, 0, Scope::Slide),
            vec!["", "Swedish:Plan", "Swedish:Build"]
        );
        assert!(texts(&mut reloaded, 1, Scope::Slide).is_empty());

        let package = Package::from_reader(Cursor::new(bytes)).unwrap();
        let drawing = package.read_string("ppt/diagrams/drawing1.xml").unwrap();
        assert!(drawing.contains("<a:t>Swedish:Plan</a:t>"));
        assert!(drawing.contains("<a:t>Swedish:Build</a:t>"));
    }

    #[test]
    fn test_rejects_archive_without_presentation() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", FileOptions::default()).unwrap();
        zip.write_all(b"<w:document/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = PptxParser::new()
            .parse(Cursor::new(bytes), "doc.docx")
            .err()
            .unwrap();
        assert!(matches!(err, Error::CorruptedFile(_)));
    }
}
