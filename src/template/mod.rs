//! Template model and extraction.

pub mod analyze;
pub mod describe;
pub mod extractor;
pub mod model;
pub mod role;

pub use analyze::{LayoutCensus, census, check_feasibility};
pub use describe::{CapacityHint, LayoutDescription, PlaceholderDescription, SizeClass};
pub use extractor::{Extraction, extract};
pub use model::{
    FontSpec, Geometry, Layout, Margins, Placeholder, PlaceholderKind, StaticShape, TextStyle,
    Theme,
};
pub use role::Role;
