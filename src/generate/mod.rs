//! Deck generation: spec validation, slide binding, overflow enforcement,
//! and output-package assembly.

pub mod binder;
pub mod deck;
pub mod overflow;
pub mod spec;

pub use binder::{GeneratedSlide, bind};
pub use overflow::{OverflowReport, enforce};
pub use spec::{AssignmentContent, PlaceholderAssignment, SlideSpec};
