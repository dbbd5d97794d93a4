/// Relationship objects for OPC packages.
///
/// Every part may carry a `.rels` file connecting it to other parts (or to
/// external URLs) via typed, rId-keyed relationships.
use crate::common::xml::escape_xml;
use crate::error::{Error, Result};
use crate::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone)]
pub struct Relationship {
    r_id: String,
    reltype: String,
    target_ref: String,
    is_external: bool,
}

impl Relationship {
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Target reference: a relative part reference for internal
    /// relationships, an absolute URL for external ones.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }
}

/// Collection of relationships from a single source part.
///
/// Stored in a BTreeMap so serialization order is deterministic.
#[derive(Debug, Clone)]
pub struct Relationships {
    /// Base URI for resolving relative references
    base_uri: String,
    rels: BTreeMap<String, Relationship>,
}

impl Relationships {
    pub fn new<S: Into<String>>(base_uri: S) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: BTreeMap::new(),
        }
    }

    /// Parse a `.rels` part.
    pub fn from_xml<S: Into<String>>(base_uri: S, xml: &[u8]) -> Result<Self> {
        let mut rels = Self::new(base_uri);
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut r_id = String::new();
                        let mut reltype = String::new();
                        let mut target = String::new();
                        let mut external = false;
                        for attr in e.attributes().flatten() {
                            let value = std::str::from_utf8(&attr.value)
                                .map_err(|e| Error::Xml(e.to_string()))?
                                .to_string();
                            match attr.key.as_ref() {
                                b"Id" => r_id = value,
                                b"Type" => reltype = value,
                                b"Target" => target = value,
                                b"TargetMode" => external = value == "External",
                                _ => {}
                            }
                        }
                        if !r_id.is_empty() {
                            rels.add_with_id(r_id, reltype, target, external);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e.to_string())),
                _ => {}
            }
        }

        Ok(rels)
    }

    /// Serialize back to `.rels` XML.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in self.rels.values() {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape_xml(&rel.r_id),
                escape_xml(&rel.reltype),
                escape_xml(&rel.target_ref),
            ));
            if rel.is_external {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }

    /// Add a relationship under a freshly allocated rId and return the rId.
    pub fn add(&mut self, reltype: &str, target_ref: &str) -> String {
        let r_id = self.next_rid();
        self.add_with_id(r_id.clone(), reltype.to_string(), target_ref.to_string(), false);
        r_id
    }

    pub fn add_with_id(
        &mut self,
        r_id: String,
        reltype: String,
        target_ref: String,
        is_external: bool,
    ) {
        self.rels.insert(
            r_id.clone(),
            Relationship {
                r_id,
                reltype,
                target_ref,
                is_external,
            },
        );
    }

    /// The lowest unused `rId{n}` identifier.
    pub fn next_rid(&self) -> String {
        for n in 1.. {
            let candidate = format!("rId{n}");
            if !self.rels.contains_key(&candidate) {
                return candidate;
            }
        }
        unreachable!()
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.values()
    }

    /// The first relationship of the given type, if any.
    pub fn first_of_type(&self, reltype: &str) -> Option<&Relationship> {
        self.rels.values().find(|r| r.reltype() == reltype)
    }

    /// Drop every relationship the predicate rejects.
    pub fn retain<F: FnMut(&Relationship) -> bool>(&mut self, mut keep: F) {
        self.rels.retain(|_, rel| keep(rel));
    }

    /// Resolve a relationship's target to an absolute partname.
    pub fn target_partname(&self, r_id: &str) -> Result<PackURI> {
        let rel = self
            .get(r_id)
            .ok_or_else(|| Error::InvalidPackage(format!("relationship {r_id} not found")))?;
        if rel.is_external() {
            return Err(Error::InvalidPackage(format!(
                "relationship {r_id} is external"
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, rel.target_ref())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }
}
