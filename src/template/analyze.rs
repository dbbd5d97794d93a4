/// Layout census and the content-feasibility gate.
///
/// Before any generation is attempted the session can answer whether the
/// uploaded content is satisfiable at all by the extracted layouts. An
/// upload of three images against a template with no image slots should be
/// a structured error here, not a per-slide surprise later.
use crate::error::{Error, Result};
use crate::template::model::Layout;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LayoutCensus {
    pub total_layouts: usize,
    pub text_only_layouts: usize,
    pub image_capable_layouts: usize,
    /// Largest number of image slots on any single layout.
    pub max_images_per_slide: usize,
    pub total_text_boxes: usize,
}

pub fn census(layouts: &[Layout]) -> LayoutCensus {
    LayoutCensus {
        total_layouts: layouts.len(),
        text_only_layouts: layouts.iter().filter(|l| l.is_text_only()).count(),
        image_capable_layouts: layouts
            .iter()
            .filter(|l| l.image_placeholder_count() > 0)
            .count(),
        max_images_per_slide: layouts
            .iter()
            .map(Layout::image_placeholder_count)
            .max()
            .unwrap_or(0),
        total_text_boxes: layouts.iter().map(|l| l.text_placeholders().count()).sum(),
    }
}

/// Check that the given content mix can be placed at all. Layouts are
/// reusable across slides, so only categorical gaps are infeasible, not
/// totals.
pub fn check_feasibility(layouts: &[Layout], image_count: usize, has_text: bool) -> Result<LayoutCensus> {
    let summary = census(layouts);
    if summary.total_layouts == 0 {
        return Err(Error::InfeasibleContent(
            "template yielded no layouts".to_string(),
        ));
    }
    if image_count > 0 && summary.image_capable_layouts == 0 {
        return Err(Error::InfeasibleContent(format!(
            "{image_count} image(s) uploaded but no layout has an image placeholder"
        )));
    }
    if has_text && summary.total_text_boxes == 0 {
        return Err(Error::InfeasibleContent(
            "text content supplied but no layout has a text placeholder".to_string(),
        ));
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::units::Emu;
    use crate::opc::PackURI;
    use crate::template::model::{Geometry, Placeholder, PlaceholderKind};

    fn layout_with(kinds: &[PlaceholderKind]) -> Layout {
        Layout {
            name: "slide 1".to_string(),
            label: None,
            source_index: 0,
            slide_part: PackURI::new("/ppt/slides/slide1.xml").unwrap(),
            placeholders: kinds
                .iter()
                .enumerate()
                .map(|(index, &kind)| Placeholder {
                    index,
                    kind,
                    name: format!("Shape {index}"),
                    geometry: Geometry {
                        left: Emu(0),
                        top: Emu(0),
                        width: Emu(1),
                        height: Emu(1),
                    },
                    text_style: None,
                    shape_ordinal: index,
                    native_ph_type: None,
                    native_ph_idx: None,
                })
                .collect(),
            static_shapes: Vec::new(),
        }
    }

    #[test]
    fn test_census_counts() {
        let layouts = vec![
            layout_with(&[PlaceholderKind::Text, PlaceholderKind::Text]),
            layout_with(&[PlaceholderKind::Text, PlaceholderKind::Image, PlaceholderKind::Image]),
        ];
        let c = census(&layouts);
        assert_eq!(c.total_layouts, 2);
        assert_eq!(c.text_only_layouts, 1);
        assert_eq!(c.image_capable_layouts, 1);
        assert_eq!(c.max_images_per_slide, 2);
        assert_eq!(c.total_text_boxes, 3);
    }

    #[test]
    fn test_images_without_image_layouts_rejected() {
        let layouts = vec![layout_with(&[PlaceholderKind::Text])];
        let err = check_feasibility(&layouts, 2, true).unwrap_err();
        assert!(matches!(err, Error::InfeasibleContent(_)));
    }

    #[test]
    fn test_feasible_mix_passes() {
        let layouts = vec![layout_with(&[PlaceholderKind::Text, PlaceholderKind::Image])];
        // Layout reuse makes three images placeable with one slot per slide.
        assert!(check_feasibility(&layouts, 3, true).is_ok());
    }
}
