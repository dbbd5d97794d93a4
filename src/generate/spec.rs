/// Slide specifications and their validation.
///
/// A spec is what the content-organization service sends back: a layout
/// name and one assignment per placeholder index. Validation is strict and
/// complete before any cloning happens; a half-filled slide is worse than a
/// rejected one.
use crate::error::{Error, Result};
use crate::template::model::{Layout, PlaceholderKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideSpec {
    pub layout_name: String,
    #[serde(default)]
    pub assignments: Vec<PlaceholderAssignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderAssignment {
    pub index: usize,
    #[serde(flatten)]
    pub content: AssignmentContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssignmentContent {
    Text { text: String },
    Image { image_index: usize },
}

impl AssignmentContent {
    pub fn kind(&self) -> PlaceholderKind {
        match self {
            Self::Text { .. } => PlaceholderKind::Text,
            Self::Image { .. } => PlaceholderKind::Image,
        }
    }
}

/// Validate one spec against its layout and the uploaded image count.
/// `ordinal` is the 0-based position of the spec in the request, reported
/// in every error.
pub fn validate(
    ordinal: usize,
    spec: &SlideSpec,
    layout: &Layout,
    image_count: usize,
) -> Result<()> {
    let mut covered = BTreeSet::new();

    for assignment in &spec.assignments {
        let placeholder = layout.placeholder(assignment.index).ok_or_else(|| {
            Error::UnknownPlaceholderIndex {
                slide: ordinal,
                layout: layout.name.clone(),
                index: assignment.index,
            }
        })?;

        let got = assignment.content.kind();
        if got != placeholder.kind {
            return Err(Error::PlaceholderTypeMismatch {
                slide: ordinal,
                index: assignment.index,
                expected: placeholder.kind,
                got,
            });
        }

        if !covered.insert(assignment.index) {
            return Err(Error::DuplicateAssignment {
                slide: ordinal,
                index: assignment.index,
            });
        }

        if let AssignmentContent::Image { image_index } = assignment.content {
            if image_index >= image_count {
                return Err(Error::ImageIndexOutOfRange {
                    slide: ordinal,
                    index: image_index,
                    available: image_count,
                });
            }
        }
    }

    let missing: Vec<usize> = layout
        .placeholders
        .iter()
        .map(|p| p.index)
        .filter(|index| !covered.contains(index))
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingPlaceholderAssignment {
            slide: ordinal,
            layout: layout.name.clone(),
            missing,
        });
    }

    Ok(())
}
