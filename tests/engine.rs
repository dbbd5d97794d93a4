//! End-to-end tests over an in-memory template package.

use deckforge::generate::spec::{AssignmentContent, PlaceholderAssignment, SlideSpec};
use deckforge::opc::OpcPackage;
use deckforge::pptx::{ShapeXml, shape_spans};
use deckforge::template::model::PlaceholderKind;
use deckforge::{Error, Session, opc::PackURI};
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const NS: &str = concat!(
    r#" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#,
    r#" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#,
    r#" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#,
);

fn rels(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
    )
}

/// Title plus one 40x3-character body box (20 pt font, zero insets,
/// 960x96 pt usable area).
fn slide1() -> String {
    format!(
        concat!(
            r#"<p:sld{ns}><p:cSld><p:spTree>"#,
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="838200" y="365125"/><a:ext cx="10515600" cy="1325563"/></a:xfrm></p:spPr>"#,
            r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:pPr algn="l"/><a:r><a:rPr lang="en-US"/><a:t>Old title</a:t></a:r></a:p></p:txBody></p:sp>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Content Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="0" y="2000000"/><a:ext cx="12192000" cy="1219200"/></a:xfrm></p:spPr>"#,
            r#"<p:txBody><a:bodyPr lIns="0" tIns="0" rIns="0" bIns="0"/><a:p><a:r><a:rPr lang="en-US" sz="2000"/><a:t>Old body</a:t></a:r></a:p></p:txBody></p:sp>"#,
            r#"</p:spTree></p:cSld></p:sld>"#,
        ),
        ns = NS
    )
}

/// Title plus a designated picture placeholder.
fn slide2() -> String {
    format!(
        concat!(
            r#"<p:sld{ns}><p:cSld><p:spTree>"#,
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="838200" y="365125"/><a:ext cx="10515600" cy="1325563"/></a:xfrm></p:spPr>"#,
            r#"<p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US"/><a:t>Old gallery</a:t></a:r></a:p></p:txBody></p:sp>"#,
            r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture Placeholder 2"/><p:cNvPicPr/><p:nvPr><p:ph type="pic" idx="1"/></p:nvPr></p:nvPicPr>"#,
            r#"<p:blipFill/><p:spPr><a:xfrm><a:off x="1000000" y="2000000"/><a:ext cx="6000000" cy="4000000"/></a:xfrm></p:spPr></p:pic>"#,
            r#"</p:spTree></p:cSld></p:sld>"#,
        ),
        ns = NS
    )
}

fn master() -> String {
    format!(
        concat!(
            r#"<p:sldMaster{ns}><p:cSld><p:spTree/></p:cSld><p:txStyles>"#,
            r#"<p:titleStyle><a:lvl1pPr><a:defRPr sz="4400"/></a:lvl1pPr></p:titleStyle>"#,
            r#"<p:bodyStyle><a:lvl1pPr><a:defRPr sz="1800"/></a:lvl1pPr></p:bodyStyle>"#,
            r#"</p:txStyles></p:sldMaster>"#,
        ),
        ns = NS
    )
}

const THEME: &str = concat!(
    r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:themeElements>"#,
    r#"<a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
    r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:accent1><a:srgbClr val="4472C4"/></a:accent1></a:clrScheme>"#,
    r#"<a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/></a:minorFont></a:fontScheme>"#,
    r#"</a:themeElements></a:theme>"#,
);

fn template() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let mut add = |name: &str, body: &str| {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    };

    add(
        "[Content_Types].xml",
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
            r#"<Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            r#"<Override PartName="/ppt/slides/slide2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#,
            r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            r#"</Types>"#,
        ),
    );
    add(
        "_rels/.rels",
        &rels(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>"#,
        ),
    );
    add(
        "ppt/presentation.xml",
        &format!(
            concat!(
                r#"<p:presentation{ns}>"#,
                r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
                r#"<p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst>"#,
                r#"<p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
            ),
            ns = NS
        ),
    );
    add(
        "ppt/_rels/presentation.xml.rels",
        &rels(concat!(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>"#,
            r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>"#,
        )),
    );
    add("ppt/slideMasters/slideMaster1.xml", &master());
    add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &rels(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>"#,
        ),
    );
    add("ppt/theme/theme1.xml", THEME);
    add("ppt/slides/slide1.xml", &slide1());
    add("ppt/slides/slide2.xml", &slide2());

    zip.finish().unwrap().into_inner()
}

fn text_spec(layout: &str, title: &str, body: &str) -> SlideSpec {
    SlideSpec {
        layout_name: layout.to_string(),
        assignments: vec![
            PlaceholderAssignment {
                index: 0,
                content: AssignmentContent::Text {
                    text: title.to_string(),
                },
            },
            PlaceholderAssignment {
                index: 1,
                content: AssignmentContent::Text {
                    text: body.to_string(),
                },
            },
        ],
    }
}

/// Visible text of a slide part's shapes, one entry per spTree child.
fn slide_texts(pkg: &OpcPackage, partname: &str) -> Vec<String> {
    let part = pkg.get_part(&PackURI::new(partname).unwrap()).unwrap();
    let xml = part.blob();
    shape_spans(xml)
        .unwrap()
        .iter()
        .map(|span| ShapeXml::parse(&xml[span.range.clone()]).unwrap().text())
        .collect()
}

#[test]
fn extraction_is_idempotent() {
    let bytes = template();
    let a = Session::from_bytes(&bytes).unwrap();
    let b = Session::from_bytes(&bytes).unwrap();
    assert_eq!(a.layouts().len(), b.layouts().len());
    for (la, lb) in a.layouts().iter().zip(b.layouts()) {
        assert_eq!(la.name, lb.name);
        assert_eq!(la.placeholders.len(), lb.placeholders.len());
        for (pa, pb) in la.placeholders.iter().zip(&lb.placeholders) {
            assert_eq!(pa.index, pb.index);
            assert_eq!(pa.kind, pb.kind);
            assert_eq!(pa.geometry, pb.geometry);
        }
    }
}

#[test]
fn extracted_model_matches_template() {
    let session = Session::from_bytes(&template()).unwrap();
    assert_eq!(session.layouts().len(), 2);

    let l1 = &session.layouts()[0];
    assert_eq!(l1.name, "slide 1");
    assert_eq!(l1.placeholders.len(), 2);
    assert!(l1.is_text_only());
    let title_style = l1.placeholders[0].text_style.as_ref().unwrap();
    // Size inherited through the master's title style, face from the theme.
    assert_eq!(title_style.font_size_pt, 44.0);
    assert_eq!(title_style.font_name, "Calibri Light");

    let l2 = &session.layouts()[1];
    assert_eq!(l2.placeholders[1].kind, PlaceholderKind::Image);

    assert_eq!(session.theme().body_font.name, "Calibri");
    assert_eq!(
        session.theme().color_scheme.get("accent1").map(String::as_str),
        Some("4472C4")
    );
}

#[test]
fn describe_exposes_capacity() {
    let session = Session::from_bytes(&template()).unwrap();
    let descriptions = session.describe_layouts();
    let body = &descriptions[0].placeholders[1];
    let capacity = body.capacity.as_ref().unwrap();
    assert_eq!(capacity.chars_per_line, 40);
    assert_eq!(capacity.lines_available, 3);
    assert_eq!(capacity.max_chars, 120);
    assert!(descriptions[0].placeholders[0].is_title);
}

#[test]
fn missing_assignment_skips_slide_with_reason() {
    let session = Session::from_bytes(&template()).unwrap();
    let spec = SlideSpec {
        layout_name: "slide 1".to_string(),
        assignments: vec![PlaceholderAssignment {
            index: 0,
            content: AssignmentContent::Text {
                text: "Only a title".to_string(),
            },
        }],
    };
    let generated = session.generate(&[spec]).unwrap();
    assert_eq!(generated.report.slides, 0);
    assert_eq!(generated.report.skipped.len(), 1);
    assert_eq!(generated.report.skipped[0].ordinal, 0);
    assert!(generated.report.skipped[0].reason.contains("unassigned"));
}

#[test]
fn long_body_splits_onto_continuations() {
    let session = Session::from_bytes(&template()).unwrap();
    // 34 words of 8 chars: well past the 120-char body capacity.
    let body = "abcdefgh ".repeat(34);
    let body = body.trim_end().to_string();

    let generated = session
        .generate(&[text_spec("slide 1", "Report", &body)])
        .unwrap();
    assert!(generated.report.continuations >= 1);
    assert_eq!(
        generated.report.slides,
        1 + generated.report.continuations
    );

    let out = OpcPackage::from_bytes(&generated.deck).unwrap();
    let mut rebuilt = String::new();
    for n in 1..=generated.report.slides {
        let texts = slide_texts(&out, &format!("/ppt/slides/slide{n}.xml"));
        if n == 1 {
            assert_eq!(texts[0], "Report");
        } else {
            assert_eq!(texts[0], "Report (cont.)");
        }
        rebuilt.push_str(&texts[1]);
    }
    // Lossless: the chain reconstructs the input exactly.
    assert_eq!(rebuilt, body);

    // The generated deck is itself a loadable template.
    let reload = Session::from_bytes(&generated.deck).unwrap();
    assert_eq!(reload.layouts().len(), generated.report.slides);
}

#[test]
fn headline_title_does_not_trigger_continuations() {
    // The 44 pt title box measures well under 25 characters; an ordinary
    // headline must still come through whole on a single slide.
    let session = Session::from_bytes(&template()).unwrap();
    let generated = session
        .generate(&[text_spec(
            "slide 1",
            "Quarterly Business Review",
            "fits easily",
        )])
        .unwrap();
    assert_eq!(generated.report.slides, 1);
    assert_eq!(generated.report.continuations, 0);
    let out = OpcPackage::from_bytes(&generated.deck).unwrap();
    let texts = slide_texts(&out, "/ppt/slides/slide1.xml");
    assert_eq!(texts[0], "Quarterly Business Review");
}

#[test]
fn image_substitution_adds_media() {
    let mut session = Session::from_bytes(&template()).unwrap();
    let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    let image_index = session.add_image("logo.png", png.clone()).unwrap();

    let spec = SlideSpec {
        layout_name: "slide 2".to_string(),
        assignments: vec![
            PlaceholderAssignment {
                index: 0,
                content: AssignmentContent::Text {
                    text: "Gallery".to_string(),
                },
            },
            PlaceholderAssignment {
                index: 1,
                content: AssignmentContent::Image { image_index },
            },
        ],
    };
    let generated = session.generate(&[spec]).unwrap();
    assert!(generated.report.skipped.is_empty());

    let out = OpcPackage::from_bytes(&generated.deck).unwrap();
    let media = out
        .get_part(&PackURI::new("/ppt/media/image1.png").unwrap())
        .unwrap();
    assert_eq!(media.blob(), png.as_slice());

    let slide = out
        .get_part(&PackURI::new("/ppt/slides/slide1.xml").unwrap())
        .unwrap();
    let xml = String::from_utf8(slide.blob().to_vec()).unwrap();
    assert!(xml.contains("r:embed="));
    assert!(xml.contains(r#"<a:off x="1000000" y="2000000"/>"#));
    assert_eq!(slide.rels().len(), 1);
}

#[test]
fn unknown_layout_reported_not_fatal() {
    let session = Session::from_bytes(&template()).unwrap();
    let generated = session
        .generate(&[
            SlideSpec {
                layout_name: "slide 99".to_string(),
                assignments: Vec::new(),
            },
            text_spec("slide 1", "Report", "fits easily"),
        ])
        .unwrap();
    assert_eq!(generated.report.slides, 1);
    assert_eq!(generated.report.skipped.len(), 1);
    assert!(generated.report.skipped[0].reason.contains("slide 99"));
}

#[test]
fn unreferenced_upload_rejects_generation() {
    let mut session = Session::from_bytes(&template()).unwrap();
    session.add_image("logo.png", vec![0x89]).unwrap();
    let err = session
        .generate(&[text_spec("slide 1", "Report", "fits easily")])
        .unwrap_err();
    assert!(matches!(err, Error::UnusedImages { ref indices } if indices == &[0]));
}

#[test]
fn feasibility_gate_blocks_images_without_slots() {
    let bytes = template();
    let mut session = Session::from_bytes(&bytes).unwrap();
    assert!(session.check_feasibility(true).is_ok());
    session.add_image("a.png", vec![1]).unwrap();
    // slide 2 has an image slot, so this mix is feasible.
    let census = session.check_feasibility(true).unwrap();
    assert_eq!(census.image_capable_layouts, 1);
    assert_eq!(census.text_only_layouts, 1);
}
