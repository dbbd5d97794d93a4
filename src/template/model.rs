/// The extracted template model.
///
/// A `Layout` is one rigid slide template: ordered placeholders addressed by
/// discovery index, static decoration carried verbatim on every clone, and a
/// handle back to the source slide part it is cloned from.
use crate::common::units::Emu;
use crate::opc::PackURI;
use crate::template::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What a placeholder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    Text,
    Image,
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// Fully populated frame geometry. Extraction rejects shapes it cannot
/// measure, so width and height are never absent here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
}

impl Geometry {
    pub fn area(&self) -> i64 {
        self.width.raw().max(0).saturating_mul(self.height.raw().max(0))
    }
}

/// Text-frame insets. OOXML defaults apply where the source omits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub left: Emu,
    pub top: Emu,
    pub right: Emu,
    pub bottom: Emu,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: Emu(91_440),
            top: Emu(45_720),
            right: Emu(91_440),
            bottom: Emu(45_720),
        }
    }
}

impl Margins {
    /// Build from `a:bodyPr` insets in l, t, r, b order, defaulting the
    /// missing sides.
    pub fn from_insets(insets: [Option<Emu>; 4]) -> Self {
        let defaults = Self::default();
        Self {
            left: insets[0].unwrap_or(defaults.left),
            top: insets[1].unwrap_or(defaults.top),
            right: insets[2].unwrap_or(defaults.right),
            bottom: insets[3].unwrap_or(defaults.bottom),
        }
    }
}

/// Resolved character and paragraph style for a text placeholder. Sizes are
/// always concrete: master inheritance is resolved at extraction time.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_name: String,
    pub font_size_pt: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Resolved sRGB hex, where the run declared a color.
    pub color: Option<String>,
    pub align: Option<String>,
    pub line_spacing: f32,
    pub margins: Margins,
    pub role: Role,
}

/// One fillable region of a layout.
#[derive(Debug, Clone)]
pub struct Placeholder {
    /// Discovery-order index; the contract surface exposed to callers.
    pub index: usize,
    pub kind: PlaceholderKind,
    pub name: String,
    pub geometry: Geometry,
    /// Present iff `kind == Text`.
    pub text_style: Option<TextStyle>,
    /// Position of the backing shape among the source slide's spTree
    /// children, used to locate it when cloning.
    pub shape_ordinal: usize,
    /// Native `p:ph` attributes, re-emitted on substituted picture shapes.
    pub native_ph_type: Option<String>,
    pub native_ph_idx: Option<u32>,
}

/// A decorative shape carried over byte-identical on every clone.
#[derive(Debug, Clone)]
pub struct StaticShape {
    pub shape_ordinal: usize,
    pub name: String,
}

/// Per-document theme defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub name: String,
    pub size_pt: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub title_font: FontSpec,
    pub body_font: FontSpec,
    /// Scheme slot name to sRGB hex.
    pub color_scheme: BTreeMap<String, String>,
}

impl Theme {
    pub fn font_for(&self, role: Role) -> &FontSpec {
        match role {
            Role::Title => &self.title_font,
            Role::Body => &self.body_font,
        }
    }

    /// Resolve a scheme color reference to sRGB hex. The tx/bg aliases map
    /// onto the dk/lt slots per the PresentationML color mapping defaults.
    pub fn resolve_color(&self, scheme_name: &str) -> Option<&str> {
        let slot = match scheme_name {
            "tx1" => "dk1",
            "bg1" => "lt1",
            "tx2" => "dk2",
            "bg2" => "lt2",
            other => other,
        };
        self.color_scheme.get(slot).map(String::as_str)
    }
}

/// One rigid slide template.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Display identifier, `"slide N"` with a 1-based source ordinal.
    pub name: String,
    /// The source slide's own `p:cSld` name, when it carries one.
    pub label: Option<String>,
    /// 0-based ordinal of the originating slide.
    pub source_index: usize,
    /// Partname of the source slide this layout is cloned from.
    pub slide_part: PackURI,
    pub placeholders: Vec<Placeholder>,
    pub static_shapes: Vec<StaticShape>,
}

impl Layout {
    pub fn placeholder(&self, index: usize) -> Option<&Placeholder> {
        self.placeholders.get(index)
    }

    pub fn text_placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.placeholders
            .iter()
            .filter(|p| p.kind == PlaceholderKind::Text)
    }

    pub fn image_placeholder_count(&self) -> usize {
        self.placeholders
            .iter()
            .filter(|p| p.kind == PlaceholderKind::Image)
            .count()
    }

    pub fn is_text_only(&self) -> bool {
        self.image_placeholder_count() == 0 && !self.placeholders.is_empty()
    }

    /// The first title-role text placeholder, if any.
    pub fn title_placeholder(&self) -> Option<&Placeholder> {
        self.text_placeholders()
            .find(|p| p.text_style.as_ref().is_some_and(|s| s.role == Role::Title))
    }

    /// Non-title text placeholders, in index order.
    pub fn content_placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.text_placeholders()
            .filter(|p| p.text_style.as_ref().is_none_or(|s| s.role != Role::Title))
    }

    /// Fraction of the slide area not covered by placeholders. Lower means
    /// the layout is denser with content boxes.
    pub fn negative_space_ratio(&self, slide_area: i64) -> f64 {
        if slide_area <= 0 {
            return 1.0;
        }
        let covered: i64 = self
            .placeholders
            .iter()
            .map(|p| p.geometry.area())
            .fold(0, i64::saturating_add);
        (1.0 - covered as f64 / slide_area as f64).max(0.0)
    }
}
