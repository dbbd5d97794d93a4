/// The template extractor.
///
/// Walks every slide of an uploaded package and turns it into a `Layout`.
/// Classification is rigid: a `p:pic` carrying a `p:ph` is an image
/// placeholder, a `p:pic` without one is static decoration, a `p:sp` with a
/// text body is a text placeholder, and everything else is static. Any
/// placeholder the extractor cannot fully measure or style is a hard
/// failure, because downstream capacity math is undefined on partial data.
use crate::common::units::Emu;
use crate::error::{Error, Result};
use crate::opc::constants::relationship_type as rt;
use crate::opc::{OpcPackage, Part};
use crate::pptx::presentation::{self, SlideSize};
use crate::pptx::shape::{RunColor, ShapeXml};
use crate::pptx::theme::{MasterTextStyles, ThemeScheme};
use crate::pptx::walker::{ShapeTag, shape_spans};
use crate::template::model::{
    FontSpec, Geometry, Layout, Margins, Placeholder, PlaceholderKind, StaticShape, TextStyle,
    Theme,
};
use crate::template::role;
use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Fallback sizes when the master's txStyles carry none.
const DEFAULT_TITLE_SIZE_PT: f32 = 44.0;
const DEFAULT_BODY_SIZE_PT: f32 = 18.0;

/// 16:9 default when the presentation part declares no `p:sldSz`.
const DEFAULT_SLIDE_SIZE: SlideSize = SlideSize {
    cx: Emu(12_192_000),
    cy: Emu(6_858_000),
};

/// Everything extraction recovers from one uploaded template.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub layouts: Vec<Layout>,
    pub theme: Theme,
    pub slide_size: SlideSize,
}

/// Extract layouts and theme from a parsed package. Never mutates the
/// source.
pub fn extract(pkg: &OpcPackage) -> Result<Extraction> {
    let main = pkg.main_part()?;
    let slide_size = match presentation::slide_size(main.blob())? {
        Some(size) => size,
        None => {
            warn!("presentation declares no slide size, assuming 16:9 defaults");
            DEFAULT_SLIDE_SIZE
        }
    };

    let theme = extract_theme(pkg, main)?;

    let order = presentation::slide_order(main.blob(), main.rels())?;
    if order.is_empty() {
        return Err(Error::IncompleteTemplate(
            "presentation contains no slides".to_string(),
        ));
    }

    let mut layouts = Vec::with_capacity(order.len());
    for (index, partname) in order.iter().enumerate() {
        let part = pkg.get_part(partname)?;
        let layout = extract_layout(index, part, &theme, slide_size)?;
        debug!(
            "extracted layout '{}': {} placeholder(s), {} static shape(s)",
            layout.name,
            layout.placeholders.len(),
            layout.static_shapes.len()
        );
        layouts.push(layout);
    }

    Ok(Extraction {
        layouts,
        theme,
        slide_size,
    })
}

fn extract_theme(pkg: &OpcPackage, main: &Part) -> Result<Theme> {
    let master_rel = main.rels().first_of_type(rt::SLIDE_MASTER).ok_or_else(|| {
        Error::IncompleteTemplate("presentation references no slide master".to_string())
    })?;
    let master = pkg.get_part(&main.rels().target_partname(master_rel.r_id())?)?;

    let theme_rel = master.rels().first_of_type(rt::THEME).ok_or_else(|| {
        Error::IncompleteTemplate("slide master references no theme".to_string())
    })?;
    let theme_part = pkg.get_part(&master.rels().target_partname(theme_rel.r_id())?)?;

    let scheme = ThemeScheme::parse(theme_part.blob())?;
    let styles = MasterTextStyles::parse(master.blob())?;

    let major = scheme
        .major_font
        .ok_or_else(|| Error::IncompleteTemplate("theme declares no major font".to_string()))?;
    let minor = scheme
        .minor_font
        .ok_or_else(|| Error::IncompleteTemplate("theme declares no minor font".to_string()))?;
    if scheme.colors.is_empty() {
        return Err(Error::IncompleteTemplate(
            "theme has an empty color scheme".to_string(),
        ));
    }

    Ok(Theme {
        title_font: FontSpec {
            name: major,
            size_pt: styles.title_size_pt.unwrap_or(DEFAULT_TITLE_SIZE_PT),
        },
        body_font: FontSpec {
            name: minor,
            size_pt: styles.body_size_pt.unwrap_or(DEFAULT_BODY_SIZE_PT),
        },
        color_scheme: scheme.colors,
    })
}

fn extract_layout(
    index: usize,
    part: &Part,
    theme: &Theme,
    slide_size: SlideSize,
) -> Result<Layout> {
    let xml = part.blob();
    let name = format!("slide {}", index + 1);
    let spans = shape_spans(xml)?;

    let mut placeholders = Vec::new();
    let mut static_shapes = Vec::new();

    for (ordinal, span) in spans.iter().enumerate() {
        let shape = ShapeXml::parse(&xml[span.range.clone()])?;
        let kind = match span.tag {
            ShapeTag::Picture if shape.ph.is_some() => Some(PlaceholderKind::Image),
            ShapeTag::Shape if shape.has_text_body => Some(PlaceholderKind::Text),
            _ => None,
        };

        let Some(kind) = kind else {
            static_shapes.push(StaticShape {
                shape_ordinal: ordinal,
                name: shape.name,
            });
            continue;
        };

        let geometry = require_geometry(&shape, &name)?;
        let text_style = match kind {
            PlaceholderKind::Text => Some(resolve_text_style(&shape, geometry, theme, slide_size)),
            PlaceholderKind::Image => None,
        };
        let (native_ph_type, native_ph_idx) = match &shape.ph {
            Some(ph) => (ph.ph_type.clone(), ph.idx),
            None => (None, None),
        };

        placeholders.push(Placeholder {
            index: placeholders.len(),
            kind,
            name: shape.name,
            geometry,
            text_style,
            shape_ordinal: ordinal,
            native_ph_type,
            native_ph_idx,
        });
    }

    Ok(Layout {
        name,
        label: slide_label(xml)?,
        source_index: index,
        slide_part: part.partname().clone(),
        placeholders,
        static_shapes,
    })
}

fn require_geometry(shape: &ShapeXml, layout_name: &str) -> Result<Geometry> {
    match (shape.offset, shape.extent) {
        (Some((left, top)), Some((width, height))) => Ok(Geometry {
            left,
            top,
            width,
            height,
        }),
        _ => Err(Error::IncompleteTemplate(format!(
            "{layout_name}: shape '{}' has no measurable frame geometry",
            shape.name
        ))),
    }
}

fn resolve_text_style(
    shape: &ShapeXml,
    geometry: Geometry,
    theme: &Theme,
    slide_size: SlideSize,
) -> TextStyle {
    let ph_type = shape.ph.as_ref().and_then(|ph| ph.ph_type.as_deref());
    let role = role::classify(ph_type, &shape.name, geometry.top, slide_size.cy);
    let inherited = theme.font_for(role);

    let font_name = match shape.typeface.as_deref() {
        // Theme font references resolve through the font scheme.
        Some("+mj-lt") => theme.title_font.name.clone(),
        Some("+mn-lt") => theme.body_font.name.clone(),
        Some(explicit) => explicit.to_string(),
        None => inherited.name.clone(),
    };

    let color = match &shape.color {
        Some(RunColor::Srgb(hex)) => Some(hex.clone()),
        Some(RunColor::Scheme(slot)) => theme.resolve_color(slot).map(str::to_string),
        None => None,
    };

    TextStyle {
        font_name,
        font_size_pt: shape.font_size_pt.unwrap_or(inherited.size_pt),
        bold: shape.bold.unwrap_or(false),
        italic: shape.italic.unwrap_or(false),
        underline: shape.underline.unwrap_or(false),
        color,
        align: shape.align.clone(),
        line_spacing: shape.line_spacing.unwrap_or(1.0),
        margins: Margins::from_insets(shape.insets),
        role,
    }
}

/// The slide's own `p:cSld` name attribute, when present and non-empty.
fn slide_label(xml: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"cSld" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"name" {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| Error::Xml(e.to_string()))?;
                        if !value.is_empty() {
                            return Ok(Some(value.into_owned()));
                        }
                    }
                }
                return Ok(None);
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {}
        }
    }
}
