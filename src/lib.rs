//! deckforge: rigid slide templates from uploaded presentations.
//!
//! The engine extracts every slide of an uploaded `.pptx` package into a
//! [`Layout`](template::Layout): ordered placeholders with full geometry and
//! resolved style, static decoration, and the document theme. New decks are
//! generated by cloning those source slides and substituting caller content
//! by placeholder index; a deterministic overflow pass word-wraps every text
//! box against a pessimistic capacity model and splits anything that does
//! not fit onto continuation slides, so no generated slide ever overflows
//! and no supplied text is ever dropped.
//!
//! ```no_run
//! use deckforge::{Session, SlideSpec};
//!
//! # fn run(template: &[u8], specs: &[SlideSpec]) -> deckforge::Result<()> {
//! let mut session = Session::from_bytes(template)?;
//! session.add_image("logo.png", std::fs::read("logo.png")?)?;
//! let descriptions = session.describe_layouts();
//! // ... hand `descriptions` to the content planner, get specs back ...
//! let generated = session.generate(specs)?;
//! std::fs::write("out.pptx", generated.deck)?;
//! # Ok(())
//! # }
//! ```

pub mod capacity;
pub mod common;
pub mod error;
pub mod generate;
pub mod opc;
pub mod pptx;
pub mod session;
pub mod template;

pub use error::{Error, Result};
pub use generate::overflow::OverflowReport;
pub use generate::spec::{AssignmentContent, PlaceholderAssignment, SlideSpec};
pub use session::{Generated, GenerationReport, Session, SkippedSlide, UploadedImage};
pub use template::describe::LayoutDescription;
pub use template::model::{Layout, Placeholder, PlaceholderKind, Theme};
