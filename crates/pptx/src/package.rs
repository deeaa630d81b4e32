//! In-memory OOXML package: ZIP entries plus relationship lookup.

use crate::xml::XmlPart;
use deck_core::{Error, Result};
use std::collections::HashMap;
use std::io::{Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// A relationship entry from a .rels part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1").
    pub id: String,
    /// Relationship type URI.
    pub rel_type: String,
    /// Target resolved to a part name, or the raw target when external.
    pub target: String,
    /// Whether the target lives outside the package.
    pub external: bool,
}

/// Relationships of one part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    by_id: HashMap<String, Relationship>,
    order: Vec<String>,
}

impl Relationships {
    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Relationships whose type URI ends with `suffix` (e.g. `/slide`), in file order.
    pub fn by_type_suffix<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .filter(move |r| r.rel_type.ends_with(suffix))
    }

    fn add(&mut self, rel: Relationship) {
        if !self.by_id.contains_key(&rel.id) {
            self.order.push(rel.id.clone());
        }
        self.by_id.insert(rel.id.clone(), rel);
    }
}

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// Every entry of a presentation archive, held in archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<PackageEntry>,
}

impl Package {
    /// Read every entry of a ZIP archive into memory.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", file.name(), e)))?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self { entries })
    }

    /// Whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Raw bytes of a part.
    pub fn read(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// A part decoded as UTF-8 text.
    pub fn read_string(&self, name: &str) -> Result<String> {
        let bytes = self
            .read(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))?;
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::CorruptedFile(format!("'{}' is not valid UTF-8: {}", name, e)))
    }

    /// A part parsed as XML.
    pub fn read_xml(&self, name: &str) -> Result<XmlPart> {
        let content = self.read_string(name)?;
        XmlPart::parse(&content).map_err(|e| Error::XmlError(format!("'{}': {}", name, e)))
    }

    /// Overwrite the bytes of an existing part.
    pub fn replace(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))?;
        entry.data = data;
        Ok(())
    }

    /// Relationships of a part. A part without a .rels part has none.
    pub fn relationships(&self, part: &str) -> Result<Relationships> {
        let rels_path = rels_path_for(part);
        if !self.contains(&rels_path) {
            return Ok(Relationships::default());
        }

        let xml = self.read_xml(&rels_path)?;
        let mut rels = Relationships::default();
        for (_, e) in xml.root.children_named("Relationship") {
            let (Some(id), Some(rel_type), Some(target)) =
                (e.attr("Id"), e.attr("Type"), e.attr("Target"))
            else {
                log::warn!("Incomplete relationship in '{}'", rels_path);
                continue;
            };
            let external = e.attr("TargetMode") == Some("External");
            let target = if external {
                target.to_string()
            } else {
                resolve_target(part, target)
            };
            rels.add(Relationship {
                id: id.to_string(),
                rel_type: rel_type.to_string(),
                target,
                external,
            });
        }

        Ok(rels)
    }

    /// Write every entry, in the original order, to a new archive.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default().compression_method(method);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)
                    .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", entry.name, e)))?;
                continue;
            }

            zip.start_file(entry.name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", entry.name, e)))?;
            zip.write_all(&entry.data)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;
        Ok(())
    }
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the relationship.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
