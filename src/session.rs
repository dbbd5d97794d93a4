/// The session: one uploaded template and its derived state.
///
/// All per-upload state lives here and is passed by reference into every
/// operation; there is no process-wide current template. Loading a new
/// template means building a new session. The image store is an ordered
/// list addressed by insertion index and is only ever replaced wholesale.
use crate::error::{Error, Result};
use crate::generate::binder::GeneratedSlide;
use crate::generate::spec::{AssignmentContent, SlideSpec};
use crate::generate::{binder, deck, overflow};
use crate::opc::OpcPackage;
use crate::opc::constants::content_type as ct;
use crate::pptx::presentation::SlideSize;
use crate::template::describe::LayoutDescription;
use crate::template::model::{Layout, Theme};
use crate::template::{analyze, describe, extractor};
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeSet;

/// One uploaded image, addressed by its position in the store.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub name: String,
    pub ext: String,
    pub bytes: Vec<u8>,
}

/// Per-slide binding failure, reported rather than aborting the batch.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSlide {
    pub ordinal: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub slides: usize,
    pub continuations: usize,
    pub skipped: Vec<SkippedSlide>,
}

/// A generated deck plus its report.
#[derive(Debug, Clone)]
pub struct Generated {
    pub deck: Vec<u8>,
    pub report: GenerationReport,
}

pub struct Session {
    package: OpcPackage,
    layouts: Vec<Layout>,
    theme: Theme,
    slide_size: SlideSize,
    images: Vec<UploadedImage>,
}

impl Session {
    /// Load a template from package bytes and extract its layouts. Fails
    /// fast on incomplete style information; no generation is possible on a
    /// template that did not fully extract.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let package = OpcPackage::from_bytes(data)?;
        let extraction = extractor::extract(&package)?;
        debug!(
            "template loaded: {} layout(s), title font '{}', body font '{}'",
            extraction.layouts.len(),
            extraction.theme.title_font.name,
            extraction.theme.body_font.name
        );
        Ok(Self {
            package,
            layouts: extraction.layouts,
            theme: extraction.theme,
            slide_size: extraction.slide_size,
            images: Vec::new(),
        })
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn slide_size(&self) -> SlideSize {
        self.slide_size
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    /// Add an image to the store; returns its stable `image_index`. The
    /// extension decides the media content type.
    pub fn add_image(&mut self, name: &str, bytes: Vec<u8>) -> Result<usize> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if ct::for_image_ext(&ext).is_none() {
            return Err(Error::UnsupportedImageType(ext));
        }
        self.images.push(UploadedImage {
            name: name.to_string(),
            ext,
            bytes,
        });
        Ok(self.images.len() - 1)
    }

    /// Drop the whole image store. Indices restart at zero.
    pub fn clear_images(&mut self) {
        self.images = Vec::new();
    }

    /// Planner-facing layout descriptions.
    pub fn describe_layouts(&self) -> Vec<LayoutDescription> {
        describe::describe(&self.layouts, self.slide_size)
    }

    /// Whether the current content mix is placeable at all.
    pub fn check_feasibility(&self, has_text: bool) -> Result<analyze::LayoutCensus> {
        analyze::check_feasibility(&self.layouts, self.images.len(), has_text)
    }

    /// Every uploaded image must be referenced somewhere in the batch;
    /// an unreferenced one would silently vanish from the output.
    fn check_image_coverage(&self, specs: &[SlideSpec]) -> Result<()> {
        let referenced: BTreeSet<usize> = specs
            .iter()
            .flat_map(|spec| spec.assignments.iter())
            .filter_map(|a| match a.content {
                AssignmentContent::Image { image_index } => Some(image_index),
                AssignmentContent::Text { .. } => None,
            })
            .collect();
        let unused: Vec<usize> =
            (0..self.images.len()).filter(|i| !referenced.contains(i)).collect();
        if unused.is_empty() {
            Ok(())
        } else {
            Err(Error::UnusedImages { indices: unused })
        }
    }

    /// Generate a deck from slide specifications. Invalid specs are skipped
    /// per-slide and reported; an unresolvable overflow or an uploaded
    /// image no slide references aborts the whole generation.
    pub fn generate(&self, specs: &[SlideSpec]) -> Result<Generated> {
        self.check_image_coverage(specs)?;

        let mut bound: Vec<GeneratedSlide> = Vec::with_capacity(specs.len());
        let mut skipped = Vec::new();

        for (ordinal, spec) in specs.iter().enumerate() {
            match binder::bind(ordinal, spec, &self.layouts, self.images.len()) {
                Ok(slide) => bound.push(slide),
                Err(err) => {
                    warn!("slide {ordinal} rejected: {err}");
                    skipped.push(SkippedSlide {
                        ordinal,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let slide_area = self
            .slide_size
            .cx
            .raw()
            .saturating_mul(self.slide_size.cy.raw());
        let slides = overflow::enforce(bound, &self.layouts, slide_area)?;
        let continuations = slides.iter().filter(|s| s.continuation > 0).count();

        let bytes = deck::assemble(&self.package, &slides, &self.layouts, &self.images)?;
        Ok(Generated {
            deck: bytes,
            report: GenerationReport {
                slides: slides.len(),
                continuations,
                skipped,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_image_validates_extension() {
        let mut session = Session {
            package: OpcPackage::new(),
            layouts: Vec::new(),
            theme: Theme {
                title_font: crate::template::model::FontSpec {
                    name: "A".to_string(),
                    size_pt: 44.0,
                },
                body_font: crate::template::model::FontSpec {
                    name: "B".to_string(),
                    size_pt: 18.0,
                },
                color_scheme: Default::default(),
            },
            slide_size: SlideSize {
                cx: crate::common::units::Emu(1),
                cy: crate::common::units::Emu(1),
            },
            images: Vec::new(),
        };

        assert_eq!(session.add_image("photo.PNG", vec![1, 2]).unwrap(), 0);
        assert_eq!(session.add_image("chart.jpeg", vec![3]).unwrap(), 1);
        assert!(matches!(
            session.add_image("notes.txt", vec![4]),
            Err(Error::UnsupportedImageType(_))
        ));
        assert_eq!(session.images()[0].ext, "png");

        session.clear_images();
        assert!(session.images().is_empty());
        assert_eq!(session.add_image("again.gif", vec![5]).unwrap(), 0);
    }
}
