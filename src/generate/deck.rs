/// Output-deck assembly.
///
/// The generated package is the source package with only the slide surface
/// rewritten: masters, layouts, themes, and existing media are carried over
/// byte-identical so inherited rendering matches the template exactly. The
/// source's slide parts (and notes) are dropped and replaced by the
/// generated slides, and the presentation part's slide list is rebuilt to
/// reference them in order.
use crate::error::{Error, Result};
use crate::generate::binder::{self, GeneratedSlide};
use crate::opc::constants::{content_type as ct, relationship_type as rt};
use crate::opc::{OpcPackage, PackURI, Part};
use crate::pptx::presentation;
use crate::session::UploadedImage;
use crate::template::model::Layout;
use log::debug;
use memchr::memmem;
use std::collections::{BTreeMap, BTreeSet};

const SLIDES_BASE: &str = "/ppt/slides/";
const NOTES_BASE: &str = "/ppt/notesSlides/";
const MEDIA_BASE: &str = "/ppt/media/";

pub fn assemble(
    source: &OpcPackage,
    slides: &[GeneratedSlide],
    layouts: &[Layout],
    images: &[UploadedImage],
) -> Result<Vec<u8>> {
    let mut pkg = source.clone();
    let main_partname = pkg.main_part()?.partname().clone();

    drop_source_slides(&mut pkg);
    let media = add_media_parts(&mut pkg, slides, images)?;

    let mut slide_rids = Vec::with_capacity(slides.len());
    {
        let mut main_rels = pkg.get_part(&main_partname)?.rels().clone();
        main_rels.retain(|rel| rel.reltype() != rt::SLIDE && rel.reltype() != rt::NOTES_SLIDE);

        for (i, slide) in slides.iter().enumerate() {
            let partname = PackURI::new(format!("{SLIDES_BASE}slide{}.xml", i + 1))?;
            let part = build_slide_part(source, slide, layouts, &media, partname.clone())?;
            pkg.content_types_mut().add_override(&partname, ct::PML_SLIDE);
            pkg.add_part(part);
            slide_rids.push(main_rels.add(rt::SLIDE, &format!("slides/slide{}.xml", i + 1)));
        }

        let main = pkg.get_part_mut(&main_partname)?;
        let rewritten = presentation::rewrite_slide_list(main.blob(), &slide_rids)?;
        *main = Part::new(main_partname.clone(), rewritten);
        *main.rels_mut() = main_rels;
    }

    debug!(
        "assembled deck: {} slide(s), {} new media part(s)",
        slides.len(),
        media.len()
    );
    pkg.to_bytes()
}

/// Remove the source's slide and notes parts along with their content-type
/// overrides. Their rels go with the parts; shared media stays.
fn drop_source_slides(pkg: &mut OpcPackage) {
    let doomed: Vec<PackURI> = pkg
        .iter_parts()
        .map(|p| p.partname().clone())
        .filter(|p| p.as_str().starts_with(SLIDES_BASE) || p.as_str().starts_with(NOTES_BASE))
        .collect();
    for partname in doomed {
        pkg.remove_part(&partname);
        pkg.content_types_mut().remove_override(&partname);
    }
}

/// Add one media part per image actually referenced by the deck. Returns
/// uploaded image index to media partname.
fn add_media_parts(
    pkg: &mut OpcPackage,
    slides: &[GeneratedSlide],
    images: &[UploadedImage],
) -> Result<BTreeMap<usize, PackURI>> {
    let used: BTreeSet<usize> = slides
        .iter()
        .flat_map(|s| s.images.values().copied())
        .collect();

    let mut next = pkg
        .iter_parts()
        .filter(|p| p.partname().as_str().starts_with(MEDIA_BASE))
        .filter_map(|p| p.partname().idx())
        .max()
        .unwrap_or(0)
        + 1;

    let mut media = BTreeMap::new();
    for image_index in used {
        let image = images.get(image_index).ok_or_else(|| {
            Error::InvalidPackage(format!("bound image {image_index} was never uploaded"))
        })?;
        let mime = ct::for_image_ext(&image.ext)
            .ok_or_else(|| Error::UnsupportedImageType(image.ext.clone()))?;
        let partname = PackURI::new(format!("{MEDIA_BASE}image{next}.{}", image.ext))?;
        pkg.content_types_mut().add_default(&image.ext, mime);
        pkg.add_part(Part::new(partname.clone(), image.bytes.clone()));
        media.insert(image_index, partname);
        next += 1;
    }
    Ok(media)
}

fn build_slide_part(
    source: &OpcPackage,
    slide: &GeneratedSlide,
    layouts: &[Layout],
    media: &BTreeMap<usize, PackURI>,
    partname: PackURI,
) -> Result<Part> {
    let layout = &layouts[slide.layout_index];
    let source_part = source.get_part(&layout.slide_part)?;

    let mut rels = source_part.rels().clone();
    rels.retain(|rel| rel.reltype() != rt::NOTES_SLIDE);

    let mut image_rids = BTreeMap::new();
    for image_index in slide.images.values() {
        let media_part = media.get(image_index).ok_or_else(|| {
            Error::InvalidPackage(format!("no media part for image {image_index}"))
        })?;
        let target = format!("../media/{}", media_part.filename());
        image_rids.insert(*image_index, rels.add(rt::IMAGE, &target));
    }

    let xml = binder::materialize(slide, layout, source_part.blob(), &image_rids)?;

    // Image relationships of replaced pictures are no longer referenced;
    // drop any whose rId does not occur in the rewritten XML.
    rels.retain(|rel| {
        rel.reltype() != rt::IMAGE
            || memmem::find(&xml, format!("\"{}\"", rel.r_id()).as_bytes()).is_some()
    });

    let mut part = Part::new(partname, xml);
    *part.rels_mut() = rels;
    Ok(part)
}
