//! Reading and rewriting DrawingML text bodies.
//!
//! A body's text is its paragraphs joined with `\n`; inside a paragraph,
//! runs are concatenated and line breaks become `\u{0B}`. Fields (`a:fld`:
//! slide numbers, dates) are not text: they are left out of the body's text
//! and carried over unchanged when the body is rewritten.

use crate::xml::{Element, Node};

/// Line break inside a paragraph.
pub const LINE_BREAK: char = '\u{0B}';

/// Plain text of a text body (`p:txBody`, `a:txBody`, `dgm:t`, `dsp:txBody`).
pub fn body_text(body: &Element) -> String {
    body.children_named("p")
        .map(|(_, p)| paragraph_text(p))
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(paragraph: &Element) -> String {
    let mut out = String::new();
    for (_, child) in paragraph.elements() {
        match child.local_name() {
            "r" => {
                if let Some((_, t)) = child.child("t") {
                    out.push_str(&t.text());
                }
            }
            "br" => out.push(LINE_BREAK),
            _ => {}
        }
    }
    out
}

/// Replace the paragraphs of a text body with `text`.
///
/// Line `i` of the new text takes its paragraph properties, run properties
/// and end-of-paragraph properties from original paragraph `i`, or from the
/// last original paragraph when the new text has more lines. Fields of
/// original paragraph `i` go back into line `i`, ahead of the text if they
/// led the original runs and after it otherwise. Everything in the body that
/// is not a paragraph stays where it was.
pub fn write_body(body: &mut Element, text: &str) {
    let originals: Vec<Element> = body
        .children_named("p")
        .map(|(_, p)| p.clone())
        .collect();
    let prefix = originals
        .first()
        .and_then(|p| p.prefix())
        .unwrap_or("a")
        .to_string();
    let fallback_rpr = originals.iter().find_map(first_run_properties);

    let insert_at = body
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if e.local_name() == "p"))
        .unwrap_or(body.children.len());

    body.children.retain(|n| !is_paragraph(n));

    let paragraphs: Vec<Node> = text
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            let own = originals.get(i);
            let template = own.or_else(|| originals.last());
            Node::Element(build_paragraph(
                &prefix,
                template,
                own,
                fallback_rpr.as_ref(),
                line,
            ))
        })
        .collect();

    body.children.splice(insert_at..insert_at, paragraphs);
}

fn is_paragraph(node: &Node) -> bool {
    matches!(node, Node::Element(e) if e.local_name() == "p")
}

/// Run properties of the first run or field in a paragraph.
fn first_run_properties(paragraph: &Element) -> Option<Element> {
    paragraph
        .elements()
        .filter(|(_, e)| matches!(e.local_name(), "r" | "fld"))
        .find_map(|(_, e)| e.child("rPr").map(|(_, rpr)| rpr.clone()))
}

/// Fields of a paragraph, split into those before its first run and the rest.
fn fields(paragraph: &Element) -> (Vec<Element>, Vec<Element>) {
    let mut leading = Vec::new();
    let mut trailing = Vec::new();
    let mut seen_run = false;
    for (_, e) in paragraph.elements() {
        match e.local_name() {
            "r" => seen_run = true,
            "fld" if seen_run => trailing.push(e.clone()),
            "fld" => leading.push(e.clone()),
            _ => {}
        }
    }
    (leading, trailing)
}

fn build_paragraph(
    prefix: &str,
    template: Option<&Element>,
    own: Option<&Element>,
    fallback_rpr: Option<&Element>,
    line: &str,
) -> Element {
    let mut paragraph = Element::new(format!("{}:p", prefix));
    let (leading, trailing) = own.map(fields).unwrap_or_default();

    let rpr = template
        .and_then(first_run_properties)
        .or_else(|| fallback_rpr.cloned());

    if let Some((_, ppr)) = template.and_then(|t| t.child("pPr")) {
        paragraph.children.push(Node::Element(ppr.clone()));
    }
    paragraph.children.extend(leading.into_iter().map(Node::Element));

    for (j, segment) in line.split(LINE_BREAK).enumerate() {
        if j > 0 {
            let mut br = Element::new(format!("{}:br", prefix));
            if let Some(rpr) = &rpr {
                br.children.push(Node::Element(rpr.clone()));
            }
            paragraph.children.push(Node::Element(br));
        }
        if segment.is_empty() {
            continue;
        }

        let mut run = Element::new(format!("{}:r", prefix));
        if let Some(rpr) = &rpr {
            run.children.push(Node::Element(rpr.clone()));
        }
        let mut t = Element::new(format!("{}:t", prefix));
        t.children.push(Node::Text(segment.to_string()));
        run.children.push(Node::Element(t));
        paragraph.children.push(Node::Element(run));
    }
    paragraph.children.extend(trailing.into_iter().map(Node::Element));

    if let Some((_, end)) = template.and_then(|t| t.child("endParaRPr")) {
        paragraph.children.push(Node::Element(end.clone()));
    }

    paragraph
}
