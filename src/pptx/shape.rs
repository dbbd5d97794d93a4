/// Typed view over a single shape element.
///
/// Parses one `p:sp` or `p:pic` blob (as cut out by the walker) into the
/// fields the template model needs: placeholder reference, frame geometry,
/// text body insets, the first run's character properties and the visible
/// text. Everything else in the shape is left to the raw bytes.
use crate::common::units::Emu;
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesRef, BytesStart, Event};

/// The `p:ph` element: placeholder type and index as written in the XML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderRef {
    pub ph_type: Option<String>,
    pub idx: Option<u32>,
}

/// A run color, either explicit sRGB hex or a theme scheme reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunColor {
    Srgb(String),
    Scheme(String),
}

/// Parsed fields of one shape element.
#[derive(Debug, Clone, Default)]
pub struct ShapeXml {
    pub name: String,
    pub ph: Option<PlaceholderRef>,
    pub offset: Option<(Emu, Emu)>,
    pub extent: Option<(Emu, Emu)>,
    /// Left, top, right, bottom insets from `a:bodyPr`, where written.
    pub insets: [Option<Emu>; 4],
    pub has_text_body: bool,
    pub font_size_pt: Option<f32>,
    pub typeface: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub color: Option<RunColor>,
    pub align: Option<String>,
    /// Line spacing as a multiple, from `a:lnSpc`/`a:spcPct`.
    pub line_spacing: Option<f32>,
    pub paragraphs: Vec<String>,
    pub is_picture: bool,
}

impl ShapeXml {
    /// Parse a single shape element from its byte span.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        let mut shape = Self::default();

        // Only the first xfrm (frame geometry) and the first rPr (leading
        // run style) are taken; nested group or secondary runs are ignored.
        let mut seen_xfrm = false;
        let mut seen_rpr = false;
        let mut in_txbody = false;
        let mut in_first_rpr = false;
        let mut in_lnspc = false;
        let mut in_text = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    let local = e.local_name().as_ref().to_vec();
                    match local.as_slice() {
                        b"pic" => shape.is_picture = true,
                        b"cNvPr" if shape.name.is_empty() => {
                            if let Some(name) = attr(e, b"name")? {
                                shape.name = name;
                            }
                        }
                        b"ph" if shape.ph.is_none() => {
                            shape.ph = Some(PlaceholderRef {
                                ph_type: attr(e, b"type")?,
                                idx: attr(e, b"idx")?.and_then(|v| v.parse().ok()),
                            });
                        }
                        b"xfrm" if !seen_xfrm && !in_txbody => seen_xfrm = true,
                        b"off" if seen_xfrm && shape.offset.is_none() => {
                            shape.offset = emu_pair(e, b"x", b"y")?;
                        }
                        b"ext" if seen_xfrm && shape.extent.is_none() => {
                            shape.extent = emu_pair(e, b"cx", b"cy")?;
                        }
                        b"txBody" => {
                            in_txbody = true;
                            shape.has_text_body = true;
                        }
                        b"bodyPr" if in_txbody => {
                            shape.insets = [
                                emu_attr(e, b"lIns")?,
                                emu_attr(e, b"tIns")?,
                                emu_attr(e, b"rIns")?,
                                emu_attr(e, b"bIns")?,
                            ];
                        }
                        b"p" if in_txbody => shape.paragraphs.push(String::new()),
                        b"br" if in_txbody => {
                            if let Some(para) = shape.paragraphs.last_mut() {
                                para.push('\n');
                            }
                        }
                        b"pPr" if in_txbody && shape.align.is_none() => {
                            shape.align = attr(e, b"algn")?;
                        }
                        b"lnSpc" if in_txbody => in_lnspc = true,
                        b"spcPct" if in_lnspc && shape.line_spacing.is_none() => {
                            // val is in thousandths of a percent: 100000 = single.
                            shape.line_spacing = attr(e, b"val")?
                                .and_then(|v| v.parse::<i64>().ok())
                                .map(|v| v as f32 / 100_000.0);
                        }
                        b"rPr" if in_txbody && !seen_rpr => {
                            seen_rpr = true;
                            in_first_rpr = true;
                            if let Some(sz) = attr(e, b"sz")? {
                                if let Ok(hundredths) = sz.parse::<i32>() {
                                    shape.font_size_pt = Some(hundredths as f32 / 100.0);
                                }
                            }
                            if let Some(b) = attr(e, b"b")? {
                                shape.bold = Some(b == "1" || b == "true");
                            }
                            if let Some(i) = attr(e, b"i")? {
                                shape.italic = Some(i == "1" || i == "true");
                            }
                            if let Some(u) = attr(e, b"u")? {
                                shape.underline = Some(u != "none");
                            }
                        }
                        b"latin" if in_first_rpr && shape.typeface.is_none() => {
                            shape.typeface = attr(e, b"typeface")?;
                        }
                        b"srgbClr" if in_first_rpr && shape.color.is_none() => {
                            if let Some(val) = attr(e, b"val")? {
                                shape.color = Some(RunColor::Srgb(val));
                            }
                        }
                        b"schemeClr" if in_first_rpr && shape.color.is_none() => {
                            if let Some(val) = attr(e, b"val")? {
                                shape.color = Some(RunColor::Scheme(val));
                            }
                        }
                        b"t" if in_txbody => in_text = true,
                        _ => {}
                    }
                }
                Ok(Event::Text(e)) if in_text => {
                    let text = e.decode().map_err(|e| Error::Xml(e.to_string()))?;
                    if let Some(para) = shape.paragraphs.last_mut() {
                        para.push_str(&text);
                    }
                }
                // Entity references arrive as their own events, between the
                // surrounding text chunks.
                Ok(Event::GeneralRef(e)) if in_text => {
                    if let Some(para) = shape.paragraphs.last_mut() {
                        push_entity(para, &e)?;
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"txBody" => in_txbody = false,
                    b"rPr" => in_first_rpr = false,
                    b"lnSpc" => in_lnspc = false,
                    b"t" => in_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e.to_string())),
                _ => {}
            }
        }

        Ok(shape)
    }

    /// Visible text: paragraphs joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }
}

fn push_entity(out: &mut String, e: &BytesRef<'_>) -> Result<()> {
    if let Some(ch) = e
        .resolve_char_ref()
        .map_err(|e| Error::Xml(e.to_string()))?
    {
        out.push(ch);
        return Ok(());
    }
    let name = e.decode().map_err(|e| Error::Xml(e.to_string()))?;
    match name.as_ref() {
        "amp" => out.push('&'),
        "lt" => out.push('<'),
        "gt" => out.push('>'),
        "apos" => out.push('\''),
        "quot" => out.push('"'),
        // Unknown entity: keep the reference as written.
        other => {
            out.push('&');
            out.push_str(other);
            out.push(';');
        }
    }
    Ok(())
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key || attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn emu_attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<Emu>> {
    Ok(attr(e, key)?
        .and_then(|v| v.parse::<i64>().ok())
        .map(Emu))
}

fn emu_pair(e: &BytesStart<'_>, a: &[u8], b: &[u8]) -> Result<Option<(Emu, Emu)>> {
    match (emu_attr(e, a)?, emu_attr(e, b)?) {
        (Some(first), Some(second)) => Ok(Some((first, second))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SP: &[u8] = br#"<p:sp xmlns:p="x" xmlns:a="y">
        <p:nvSpPr><p:cNvPr id="4" name="Title 1"/><p:nvPr><p:ph type="title" idx="0"/></p:nvPr></p:nvSpPr>
        <p:spPr><a:xfrm><a:off x="838200" y="365125"/><a:ext cx="10515600" cy="1325563"/></a:xfrm></p:spPr>
        <p:txBody>
            <a:bodyPr lIns="91440" tIns="45720"/>
            <a:p><a:pPr/><a:r><a:rPr lang="en-US" sz="4400" b="1"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="Calibri"/></a:rPr><a:t>Quarterly &amp; Annual</a:t></a:r></a:p>
            <a:p><a:r><a:rPr sz="1800"/><a:t>Second</a:t></a:r></a:p>
        </p:txBody>
    </p:sp>"#;

    #[test]
    fn test_parse_placeholder_shape() {
        let shape = ShapeXml::parse(SP).unwrap();
        assert_eq!(shape.name, "Title 1");
        let ph = shape.ph.unwrap();
        assert_eq!(ph.ph_type.as_deref(), Some("title"));
        assert_eq!(ph.idx, Some(0));
        assert_eq!(shape.offset, Some((Emu(838200), Emu(365125))));
        assert_eq!(shape.extent, Some((Emu(10515600), Emu(1325563))));
        assert!(!shape.is_picture);
    }

    #[test]
    fn test_first_run_style_wins() {
        let shape = ShapeXml::parse(SP).unwrap();
        assert_eq!(shape.font_size_pt, Some(44.0));
        assert_eq!(shape.bold, Some(true));
        assert_eq!(shape.typeface.as_deref(), Some("Calibri"));
        assert_eq!(shape.color, Some(RunColor::Scheme("tx1".to_string())));
    }

    #[test]
    fn test_insets_and_text() {
        let shape = ShapeXml::parse(SP).unwrap();
        assert_eq!(shape.insets[0], Some(Emu(91440)));
        assert_eq!(shape.insets[1], Some(Emu(45720)));
        assert_eq!(shape.insets[2], None);
        assert_eq!(shape.text(), "Quarterly & Annual\nSecond");
    }

    #[test]
    fn test_alignment_and_spacing() {
        let sp = br#"<p:sp><p:txBody><a:p><a:pPr algn="ctr"><a:lnSpc><a:spcPct val="150000"/></a:lnSpc></a:pPr><a:r><a:rPr sz="2000" i="1" u="sng"/><a:t>x</a:t></a:r></a:p></p:txBody></p:sp>"#;
        let shape = ShapeXml::parse(sp).unwrap();
        assert_eq!(shape.align.as_deref(), Some("ctr"));
        assert_eq!(shape.line_spacing, Some(1.5));
        assert_eq!(shape.italic, Some(true));
        assert_eq!(shape.underline, Some(true));
    }

    #[test]
    fn test_picture_shape() {
        let pic = br#"<p:pic><p:nvPicPr><p:cNvPr id="5" name="Picture 2"/><p:nvPr><p:ph idx="3"/></p:nvPr></p:nvPicPr><p:spPr><a:xfrm><a:off x="1" y="2"/><a:ext cx="3" cy="4"/></a:xfrm></p:spPr></p:pic>"#;
        let shape = ShapeXml::parse(pic).unwrap();
        assert!(shape.is_picture);
        assert_eq!(shape.name, "Picture 2");
        assert_eq!(shape.ph.unwrap().idx, Some(3));
        assert!(!shape.has_text_body);
    }

    #[test]
    fn test_entity_references_in_text() {
        let sp = br#"<p:sp><p:txBody><a:p><a:r><a:t>a &amp; b &lt;c&gt; &#169; &#x2122;</a:t></a:r></a:p></p:txBody></p:sp>"#;
        let shape = ShapeXml::parse(sp).unwrap();
        assert_eq!(shape.text(), "a & b <c> \u{a9} \u{2122}");
    }

    #[test]
    fn test_plain_shape_without_placeholder() {
        let sp = br#"<p:sp><p:nvSpPr><p:cNvPr id="7" name="Rectangle 6"/></p:nvSpPr><p:txBody><a:p><a:r><a:t>static</a:t></a:r></a:p></p:txBody></p:sp>"#;
        let shape = ShapeXml::parse(sp).unwrap();
        assert!(shape.ph.is_none());
        assert_eq!(shape.text(), "static");
    }
}
