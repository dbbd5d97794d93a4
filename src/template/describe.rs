/// Planner-facing layout descriptions.
///
/// The content-organization service never sees raw geometry; it gets a
/// serializable summary per layout: index and kind of every placeholder, a
/// coarse size class, and a character-capacity hint for text boxes. This is
/// the whole contract surface toward that collaborator.
use crate::capacity;
use crate::pptx::presentation::SlideSize;
use crate::template::model::{Layout, Placeholder, PlaceholderKind};
use crate::template::role::Role;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    fn from_area_ratio(ratio: f64) -> Self {
        if ratio < 0.10 {
            Self::Small
        } else if ratio < 0.35 {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CapacityHint {
    pub chars_per_line: usize,
    pub lines_available: usize,
    pub max_chars: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceholderDescription {
    pub index: usize,
    pub kind: PlaceholderKind,
    pub size_class: SizeClass,
    pub is_title: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityHint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutDescription {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub placeholders: Vec<PlaceholderDescription>,
}

pub fn describe(layouts: &[Layout], slide_size: SlideSize) -> Vec<LayoutDescription> {
    let slide_area = slide_size.cx.raw().saturating_mul(slide_size.cy.raw());
    layouts
        .iter()
        .map(|layout| LayoutDescription {
            name: layout.name.clone(),
            label: layout.label.clone(),
            placeholders: layout
                .placeholders
                .iter()
                .map(|ph| describe_placeholder(ph, slide_area))
                .collect(),
        })
        .collect()
}

fn describe_placeholder(ph: &Placeholder, slide_area: i64) -> PlaceholderDescription {
    let ratio = if slide_area > 0 {
        ph.geometry.area() as f64 / slide_area as f64
    } else {
        0.0
    };
    let capacity = ph.text_style.as_ref().map(|style| {
        let cap = capacity::estimate(
            &ph.geometry,
            style.font_size_pt,
            style.line_spacing,
            &style.margins,
        );
        CapacityHint {
            chars_per_line: cap.chars_per_line,
            lines_available: cap.lines_available,
            max_chars: cap.max_chars(),
        }
    });
    PlaceholderDescription {
        index: ph.index,
        kind: ph.kind,
        size_class: SizeClass::from_area_ratio(ratio),
        is_title: ph
            .text_style
            .as_ref()
            .is_some_and(|s| s.role == Role::Title),
        capacity,
    }
}
