/// Byte-span extraction over slide XML.
///
/// Cloning a slide must keep every untouched shape byte-for-byte identical
/// to the source, so instead of parsing shapes into a tree and serializing
/// them back, the walker records the exact byte range each `p:spTree` child
/// occupies in the source blob. Rewritten shapes are spliced in by range;
/// everything else is copied verbatim.
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::ops::Range;

/// Kind of a `p:spTree` child element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeTag {
    /// `p:sp`
    Shape,
    /// `p:pic`
    Picture,
    /// `p:graphicFrame`
    GraphicFrame,
    /// `p:grpSp`
    Group,
    /// `p:cxnSp`
    Connector,
}

impl ShapeTag {
    fn from_local(local: &[u8]) -> Option<Self> {
        match local {
            b"sp" => Some(Self::Shape),
            b"pic" => Some(Self::Picture),
            b"graphicFrame" => Some(Self::GraphicFrame),
            b"grpSp" => Some(Self::Group),
            b"cxnSp" => Some(Self::Connector),
            _ => None,
        }
    }
}

/// One shape element and the byte range it occupies in the slide blob.
#[derive(Debug, Clone)]
pub struct ShapeSpan {
    pub tag: ShapeTag,
    pub range: Range<usize>,
}

/// Byte spans of all direct shape children of `p:spTree`, in document order.
pub fn shape_spans(xml: &[u8]) -> Result<Vec<ShapeSpan>> {
    // No text trimming: byte positions must stay exact.
    let mut reader = Reader::from_reader(xml);
    let mut spans = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"spTree" => {
                collect_children(&mut reader, &mut spans)?;
                break;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {}
        }
    }

    Ok(spans)
}

fn collect_children(reader: &mut Reader<&[u8]>, spans: &mut Vec<ShapeSpan>) -> Result<()> {
    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = ShapeTag::from_local(e.local_name().as_ref());
                reader
                    .read_to_end(e.name())
                    .map_err(|e| Error::Xml(e.to_string()))?;
                if let Some(tag) = tag {
                    let end = reader.buffer_position() as usize;
                    spans.push(ShapeSpan {
                        tag,
                        range: start..end,
                    });
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(tag) = ShapeTag::from_local(e.local_name().as_ref()) {
                    let end = reader.buffer_position() as usize;
                    spans.push(ShapeSpan {
                        tag,
                        range: start..end,
                    });
                }
            }
            // </p:spTree>
            Ok(Event::End(_)) => return Ok(()),
            Ok(Event::Eof) => return Err(Error::Xml("unclosed spTree".to_string())),
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {}
        }
    }
}

/// Byte range of the first element with the given local name, including its
/// start and end tags. Returns `None` when no such element exists.
pub fn element_span(xml: &[u8], local: &[u8]) -> Result<Option<Range<usize>>> {
    let mut reader = Reader::from_reader(xml);

    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == local => {
                reader
                    .read_to_end(e.name())
                    .map_err(|e| Error::Xml(e.to_string()))?;
                return Ok(Some(start..reader.buffer_position() as usize));
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == local => {
                return Ok(Some(start..reader.buffer_position() as usize));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {}
        }
    }
}
