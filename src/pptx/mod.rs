//! PresentationML part parsing.
//!
//! Slides, layouts and masters are kept as raw XML byte blobs at the OPC
//! layer. This module reads the pieces the engine needs out of those blobs:
//! exact byte spans of shape elements (so shapes can be carried over or
//! rewritten without re-serializing untouched XML), typed views of single
//! shapes, theme font and color schemes, and the presentation part's slide
//! list.

pub mod presentation;
pub mod shape;
pub mod theme;
pub mod walker;

pub use presentation::{SlideSize, slide_order, slide_size};
pub use shape::{PlaceholderRef, RunColor, ShapeXml};
pub use theme::{MasterTextStyles, ThemeScheme};
pub use walker::{ShapeSpan, ShapeTag, element_span, shape_spans};
