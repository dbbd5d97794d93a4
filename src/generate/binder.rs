/// Slide binding: clone a source slide and substitute placeholder content.
///
/// A bound slide is held as content (text per placeholder index, image
/// references) until the whole deck passes overflow enforcement; only then
/// is it materialized into slide XML. Materialization splices the source
/// slide's bytes: unaddressed shapes are copied verbatim, addressed text
/// placeholders get a rebuilt `p:txBody` that keeps the template's
/// `a:bodyPr`, `a:lstStyle`, first `a:pPr` and first `a:rPr` byte-for-byte,
/// and addressed image placeholders are swapped for a `p:pic` at the same
/// bounding box.
use crate::common::xml::escape_xml;
use crate::error::{Error, Result};
use crate::generate::spec::{self, AssignmentContent, SlideSpec};
use crate::pptx::walker::{element_span, shape_spans};
use crate::template::model::{Layout, Placeholder};
use std::collections::BTreeMap;

/// One generated slide, not yet serialized.
#[derive(Debug, Clone)]
pub struct GeneratedSlide {
    /// Index into the session's layout list.
    pub layout_index: usize,
    /// Placeholder index to bound text.
    pub texts: BTreeMap<usize, String>,
    /// Placeholder index to uploaded image index.
    pub images: BTreeMap<usize, usize>,
    /// Ordinal of the slide spec this slide descends from.
    pub origin: usize,
    /// 0 for the primary slide, 1.. for continuation slides.
    pub continuation: u32,
}

/// Validate a spec against its layout and bind its content.
pub fn bind(
    ordinal: usize,
    slide_spec: &SlideSpec,
    layouts: &[Layout],
    image_count: usize,
) -> Result<GeneratedSlide> {
    let (layout_index, layout) = layouts
        .iter()
        .enumerate()
        .find(|(_, l)| l.name == slide_spec.layout_name)
        .ok_or_else(|| Error::UnknownLayout {
            slide: ordinal,
            name: slide_spec.layout_name.clone(),
        })?;

    spec::validate(ordinal, slide_spec, layout, image_count)?;

    let mut texts = BTreeMap::new();
    let mut images = BTreeMap::new();
    for assignment in &slide_spec.assignments {
        match &assignment.content {
            AssignmentContent::Text { text } => {
                texts.insert(assignment.index, text.clone());
            }
            AssignmentContent::Image { image_index } => {
                images.insert(assignment.index, *image_index);
            }
        }
    }

    Ok(GeneratedSlide {
        layout_index,
        texts,
        images,
        origin: ordinal,
        continuation: 0,
    })
}

/// Render a bound slide into slide XML, splicing replacements into the
/// source slide's bytes. `image_rids` maps uploaded image indices to the
/// relationship ids registered on this slide part.
pub fn materialize(
    slide: &GeneratedSlide,
    layout: &Layout,
    source_xml: &[u8],
    image_rids: &BTreeMap<usize, String>,
) -> Result<Vec<u8>> {
    let spans = shape_spans(source_xml)?;
    let mut replacements: BTreeMap<usize, Vec<u8>> = BTreeMap::new();

    for (&index, text) in &slide.texts {
        let ph = resolve(layout, index)?;
        let span = spans.get(ph.shape_ordinal).ok_or_else(|| {
            Error::InvalidPackage(format!(
                "{}: shape {} missing from source slide",
                layout.name, ph.shape_ordinal
            ))
        })?;
        let rebuilt = rewrite_text_body(&source_xml[span.range.clone()], text)?;
        replacements.insert(ph.shape_ordinal, rebuilt);
    }

    for (&index, image_index) in &slide.images {
        let ph = resolve(layout, index)?;
        let r_id = image_rids.get(image_index).ok_or_else(|| {
            Error::InvalidPackage(format!("no relationship for image {image_index}"))
        })?;
        replacements.insert(ph.shape_ordinal, picture_xml(ph, r_id));
    }

    let mut out = Vec::with_capacity(source_xml.len());
    let mut cursor = 0;
    for (ordinal, span) in spans.iter().enumerate() {
        out.extend_from_slice(&source_xml[cursor..span.range.start]);
        match replacements.get(&ordinal) {
            Some(bytes) => out.extend_from_slice(bytes),
            None => out.extend_from_slice(&source_xml[span.range.clone()]),
        }
        cursor = span.range.end;
    }
    out.extend_from_slice(&source_xml[cursor..]);
    Ok(out)
}

fn resolve(layout: &Layout, index: usize) -> Result<&Placeholder> {
    layout.placeholder(index).ok_or_else(|| {
        Error::InvalidPackage(format!(
            "{}: bound index {index} has no placeholder",
            layout.name
        ))
    })
}

/// Rebuild a shape's `p:txBody` around replacement text. One `a:p` per
/// line; each paragraph carries the template's first `a:pPr` and each run
/// the template's first `a:rPr`, both verbatim.
fn rewrite_text_body(shape_xml: &[u8], text: &str) -> Result<Vec<u8>> {
    let tx_span = element_span(shape_xml, b"txBody")?.ok_or_else(|| {
        Error::InvalidPackage("text placeholder has no txBody".to_string())
    })?;
    let tx = &shape_xml[tx_span.clone()];

    let body_pr: &[u8] = match element_span(tx, b"bodyPr")? {
        Some(range) => &tx[range],
        None => b"<a:bodyPr/>",
    };
    let lst_style: &[u8] = match element_span(tx, b"lstStyle")? {
        Some(range) => &tx[range],
        None => b"",
    };
    let p_pr: &[u8] = match element_span(tx, b"pPr")? {
        Some(range) => &tx[range],
        None => b"",
    };
    let r_pr: &[u8] = match element_span(tx, b"rPr")? {
        Some(range) => &tx[range],
        None => b"",
    };

    let mut body: Vec<u8> = Vec::with_capacity(tx.len() + text.len());
    body.extend_from_slice(b"<p:txBody>");
    body.extend_from_slice(body_pr);
    body.extend_from_slice(lst_style);
    if text.is_empty() {
        body.extend_from_slice(b"<a:p>");
        body.extend_from_slice(p_pr);
        body.extend_from_slice(b"</a:p>");
    } else {
        for line in text.split('\n') {
            body.extend_from_slice(b"<a:p>");
            body.extend_from_slice(p_pr);
            if !line.is_empty() {
                body.extend_from_slice(b"<a:r>");
                body.extend_from_slice(r_pr);
                body.extend_from_slice(b"<a:t>");
                body.extend_from_slice(escape_xml(line).as_bytes());
                body.extend_from_slice(b"</a:t></a:r>");
            }
            body.extend_from_slice(b"</a:p>");
        }
    }
    body.extend_from_slice(b"</p:txBody>");

    let mut out = Vec::with_capacity(shape_xml.len() + body.len());
    out.extend_from_slice(&shape_xml[..tx_span.start]);
    out.extend_from_slice(&body);
    out.extend_from_slice(&shape_xml[tx_span.end..]);
    Ok(out)
}

/// A `p:pic` occupying the placeholder's exact bounding box.
fn picture_xml(ph: &Placeholder, r_id: &str) -> Vec<u8> {
    let mut ph_el = String::from("<p:ph");
    if let Some(ph_type) = &ph.native_ph_type {
        ph_el.push_str(&format!(r#" type="{}""#, escape_xml(ph_type)));
    }
    if let Some(idx) = ph.native_ph_idx {
        ph_el.push_str(&format!(r#" idx="{idx}""#));
    }
    ph_el.push_str("/>");

    format!(
        concat!(
            "<p:pic><p:nvPicPr>",
            r#"<p:cNvPr id="{id}" name="{name}"/>"#,
            r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>"#,
            "<p:nvPr>{ph}</p:nvPr></p:nvPicPr>",
            r#"<p:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            "<p:spPr><a:xfrm>",
            r#"<a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/>"#,
            r#"</a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
        ),
        id = 1000 + ph.index,
        name = escape_xml(&ph.name),
        ph = ph_el,
        rid = r_id,
        x = ph.geometry.left.raw(),
        y = ph.geometry.top.raw(),
        cx = ph.geometry.width.raw(),
        cy = ph.geometry.height.raw(),
    )
    .into_bytes()
}
