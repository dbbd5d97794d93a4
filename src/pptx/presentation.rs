/// The presentation part: slide ordering and slide size.
use crate::common::units::Emu;
use crate::error::{Error, Result};
use crate::opc::{PackURI, Relationships};
use crate::pptx::walker::element_span;
use quick_xml::Reader;
use quick_xml::events::Event;

/// Slide dimensions from `p:sldSz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideSize {
    pub cx: Emu,
    pub cy: Emu,
}

/// Slide partnames in presentation order, resolved through the
/// presentation part's relationships.
pub fn slide_order(pres_xml: &[u8], rels: &Relationships) -> Result<Vec<PackURI>> {
    let mut reader = Reader::from_reader(pres_xml);
    reader.config_mut().trim_text(true);
    let mut order = Vec::new();
    let mut in_list = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match e.local_name().as_ref() {
                    b"sldIdLst" => in_list = true,
                    b"sldId" if in_list => {
                        let r_id = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.local_name().as_ref() == b"id" && a.key.as_ref() != b"id")
                            .map(|a| String::from_utf8_lossy(&a.value).into_owned())
                            .ok_or_else(|| {
                                Error::InvalidPackage("sldId without r:id".to_string())
                            })?;
                        order.push(rels.target_partname(&r_id)?);
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"sldIdLst" => in_list = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {}
        }
    }

    Ok(order)
}

/// Slide size, where the presentation part declares one.
pub fn slide_size(pres_xml: &[u8]) -> Result<Option<SlideSize>> {
    let mut reader = Reader::from_reader(pres_xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"sldSz" =>
            {
                let mut cx = None;
                let mut cy = None;
                for attr in e.attributes().flatten() {
                    let value = std::str::from_utf8(&attr.value)
                        .map_err(|e| Error::Xml(e.to_string()))?
                        .parse::<i64>()
                        .ok();
                    match attr.key.as_ref() {
                        b"cx" => cx = value,
                        b"cy" => cy = value,
                        _ => {}
                    }
                }
                return Ok(match (cx, cy) {
                    (Some(cx), Some(cy)) => Some(SlideSize {
                        cx: Emu(cx),
                        cy: Emu(cy),
                    }),
                    _ => None,
                });
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {}
        }
    }
}

/// Rewrite `p:sldIdLst` to reference the given relationship ids, in order.
/// Everything outside the list is carried over byte-identical.
pub fn rewrite_slide_list(pres_xml: &[u8], r_ids: &[String]) -> Result<Vec<u8>> {
    let span = element_span(pres_xml, b"sldIdLst")?
        .ok_or_else(|| Error::InvalidPackage("presentation has no sldIdLst".to_string()))?;

    let mut list = String::from("<p:sldIdLst>");
    for (i, r_id) in r_ids.iter().enumerate() {
        // Slide ids must be unique and >= 256.
        list.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, r_id));
    }
    list.push_str("</p:sldIdLst>");

    let mut out = Vec::with_capacity(pres_xml.len() + list.len());
    out.extend_from_slice(&pres_xml[..span.start]);
    out.extend_from_slice(list.as_bytes());
    out.extend_from_slice(&pres_xml[span.end..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRES: &[u8] = br#"<p:presentation xmlns:p="x" xmlns:r="y"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#;

    fn pres_rels() -> Relationships {
        let mut rels = Relationships::new("/ppt/");
        use crate::opc::constants::relationship_type as rt;
        rels.add_with_id(
            "rId1".to_string(),
            rt::SLIDE_MASTER.to_string(),
            "slideMasters/slideMaster1.xml".to_string(),
            false,
        );
        rels.add_with_id(
            "rId2".to_string(),
            rt::SLIDE.to_string(),
            "slides/slide1.xml".to_string(),
            false,
        );
        rels.add_with_id(
            "rId3".to_string(),
            rt::SLIDE.to_string(),
            "slides/slide2.xml".to_string(),
            false,
        );
        rels
    }

    #[test]
    fn test_slide_order() {
        let order = slide_order(PRES, &pres_rels()).unwrap();
        let names: Vec<&str> = order.iter().map(|p| p.as_str()).collect();
        assert_eq!(
            names,
            ["/ppt/slides/slide1.xml", "/ppt/slides/slide2.xml"]
        );
    }

    #[test]
    fn test_slide_size() {
        let size = slide_size(PRES).unwrap().unwrap();
        assert_eq!(size.cx, Emu(12192000));
        assert_eq!(size.cy, Emu(6858000));
    }

    #[test]
    fn test_rewrite_slide_list() {
        let r_ids = vec!["rId9".to_string(), "rId10".to_string(), "rId11".to_string()];
        let out = rewrite_slide_list(PRES, &r_ids).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(r#"<p:sldId id="256" r:id="rId9"/>"#));
        assert!(text.contains(r#"<p:sldId id="258" r:id="rId11"/>"#));
        assert!(!text.contains("rId2\""));
        // Masters list and slide size survive untouched.
        assert!(text.contains("sldMasterIdLst"));
        assert!(text.contains(r#"<p:sldSz cx="12192000" cy="6858000"/>"#));
    }
}
