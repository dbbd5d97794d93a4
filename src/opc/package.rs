/// Reading and writing OPC packages.
///
/// The package is held fully in memory: a map of partname to part blob plus
/// relationships, and the `[Content_Types].xml` map. Parts here are plain
/// byte blobs; interpretation is left to the PresentationML layer.
use crate::common::xml::escape_xml;
use crate::error::{Error, Result};
use crate::opc::constants::{content_type as ct, relationship_type as rt};
use crate::opc::packuri::PackURI;
use crate::opc::rel::Relationships;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use zip::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};

const CONTENT_TYPES_MEMBER: &str = "[Content_Types].xml";
const PKG_RELS_MEMBER: &str = "_rels/.rels";

/// The `[Content_Types].xml` map: extension defaults plus per-part overrides.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut types = Self::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let is_default = e.local_name().as_ref() == b"Default";
                    let is_override = e.local_name().as_ref() == b"Override";
                    if !is_default && !is_override {
                        continue;
                    }
                    let mut key = String::new();
                    let mut value = String::new();
                    for attr in e.attributes().flatten() {
                        let text = std::str::from_utf8(&attr.value)
                            .map_err(|e| Error::Xml(e.to_string()))?
                            .to_string();
                        match attr.key.as_ref() {
                            b"Extension" | b"PartName" => key = text,
                            b"ContentType" => value = text,
                            _ => {}
                        }
                    }
                    if is_default {
                        types.defaults.insert(key.to_ascii_lowercase(), value);
                    } else {
                        types.overrides.insert(key, value);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e.to_string())),
                _ => {}
            }
        }

        Ok(types)
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(512);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, ctype) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(ctype)
            ));
        }
        for (partname, ctype) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(ctype)
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    /// Resolve the content type for a part: override first, then the
    /// extension default.
    pub fn for_part(&self, partname: &PackURI) -> Option<&str> {
        self.overrides
            .get(partname.as_str())
            .or_else(|| self.defaults.get(&partname.ext().to_ascii_lowercase()))
            .map(String::as_str)
    }

    pub fn add_default(&mut self, ext: &str, ctype: &str) {
        self.defaults
            .entry(ext.to_ascii_lowercase())
            .or_insert_with(|| ctype.to_string());
    }

    pub fn add_override(&mut self, partname: &PackURI, ctype: &str) {
        self.overrides
            .insert(partname.as_str().to_string(), ctype.to_string());
    }

    pub fn remove_override(&mut self, partname: &PackURI) {
        self.overrides.remove(partname.as_str());
    }
}

/// A part: partname, binary content, and its relationships.
#[derive(Debug, Clone)]
pub struct Part {
    partname: PackURI,
    blob: Vec<u8>,
    rels: Relationships,
}

impl Part {
    pub fn new(partname: PackURI, blob: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri());
        Self {
            partname,
            blob,
            rels,
        }
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    #[inline]
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }
}

/// An OPC package held in memory.
#[derive(Debug, Clone)]
pub struct OpcPackage {
    content_types: ContentTypes,
    rels: Relationships,
    parts: BTreeMap<String, Part>,
}

impl OpcPackage {
    pub fn new() -> Self {
        Self {
            content_types: ContentTypes::default(),
            rels: Relationships::new("/"),
            parts: BTreeMap::new(),
        }
    }

    /// Read a package from serialized bytes (a ZIP archive).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        // First pass: pull every member into memory.
        let mut members: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;
            members.insert(file.name().to_string(), blob);
        }

        let ct_blob = members.remove(CONTENT_TYPES_MEMBER).ok_or_else(|| {
            Error::InvalidPackage("missing [Content_Types].xml".to_string())
        })?;
        let content_types = ContentTypes::from_xml(&ct_blob)?;

        let rels_blob = members
            .remove(PKG_RELS_MEMBER)
            .ok_or_else(|| Error::InvalidPackage("missing _rels/.rels".to_string()))?;
        let rels = Relationships::from_xml("/", &rels_blob)?;

        // Second pass: split rels members from regular parts, then attach.
        let mut parts: BTreeMap<String, Part> = BTreeMap::new();
        let mut part_rels: Vec<(String, Vec<u8>)> = Vec::new();
        for (member, blob) in members {
            if member.contains("_rels/") && member.ends_with(".rels") {
                part_rels.push((member, blob));
            } else {
                let partname = PackURI::new(format!("/{member}"))?;
                parts.insert(partname.as_str().to_string(), Part::new(partname, blob));
            }
        }
        for (member, blob) in part_rels {
            // "ppt/slides/_rels/slide1.xml.rels" -> "/ppt/slides/slide1.xml"
            let owner = format!("/{}", member.replace("_rels/", ""))
                .trim_end_matches(".rels")
                .to_string();
            if let Some(part) = parts.get_mut(&owner) {
                part.rels = Relationships::from_xml(part.partname.base_uri(), &blob)?;
            }
        }

        Ok(Self {
            content_types,
            rels,
            parts,
        })
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        writer.start_file(CONTENT_TYPES_MEMBER, options)?;
        writer.write_all(self.content_types.to_xml().as_bytes())?;

        writer.start_file(PKG_RELS_MEMBER, options)?;
        writer.write_all(self.rels.to_xml().as_bytes())?;

        for part in self.parts.values() {
            writer.start_file(part.partname().membername(), options)?;
            writer.write_all(part.blob())?;

            if !part.rels().is_empty() {
                let rels_uri = part.partname().rels_uri()?;
                writer.start_file(rels_uri.membername(), options)?;
                writer.write_all(part.rels().to_xml().as_bytes())?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Package-level relationships.
    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    #[inline]
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    #[inline]
    pub fn content_types_mut(&mut self) -> &mut ContentTypes {
        &mut self.content_types
    }

    pub fn get_part(&self, partname: &PackURI) -> Result<&Part> {
        self.parts
            .get(partname.as_str())
            .ok_or_else(|| Error::PartNotFound(partname.to_string()))
    }

    pub fn get_part_mut(&mut self, partname: &PackURI) -> Result<&mut Part> {
        self.parts
            .get_mut(partname.as_str())
            .ok_or_else(|| Error::PartNotFound(partname.to_string()))
    }

    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname.as_str())
    }

    pub fn add_part(&mut self, part: Part) {
        self.parts.insert(part.partname().as_str().to_string(), part);
    }

    pub fn remove_part(&mut self, partname: &PackURI) -> Option<Part> {
        self.parts.remove(partname.as_str())
    }

    pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    /// The main presentation part, located through the package-level
    /// officeDocument relationship.
    pub fn main_part(&self) -> Result<&Part> {
        let rel = self
            .rels
            .first_of_type(rt::OFFICE_DOCUMENT)
            .ok_or_else(|| Error::InvalidPackage("no officeDocument relationship".to_string()))?;
        let partname = self.rels.target_partname(rel.r_id())?;
        let part = self.get_part(&partname)?;

        let ctype = self.content_types.for_part(&partname).unwrap_or("");
        if ctype != ct::PML_PRESENTATION_MAIN && ctype != ct::PML_PRES_MACRO_MAIN {
            return Err(Error::InvalidPackage(format!(
                "main part has content type '{ctype}', not a presentation"
            )));
        }
        Ok(part)
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}
