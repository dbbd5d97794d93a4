/// Error taxonomy for the whole engine.
///
/// Extraction failures are fatal for the template; spec-validation failures
/// identify the offending slide and index so the caller can repair exactly
/// one slide specification; an exceeded overflow bound carries the full
/// measurement report rather than a summary string.
use crate::generate::overflow::OverflowReport;
use crate::template::model::PlaceholderKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Extraction could not recover required geometry, font, or color data.
    #[error("incomplete template: {0}")]
    IncompleteTemplate(String),

    #[error("slide {slide}: unknown layout '{name}'")]
    UnknownLayout { slide: usize, name: String },

    #[error("slide {slide}: layout '{layout}' has no placeholder index {index}")]
    UnknownPlaceholderIndex {
        slide: usize,
        layout: String,
        index: usize,
    },

    #[error("slide {slide}: placeholder {index} expects {expected} content, got {got}")]
    PlaceholderTypeMismatch {
        slide: usize,
        index: usize,
        expected: PlaceholderKind,
        got: PlaceholderKind,
    },

    #[error("slide {slide}: layout '{layout}' placeholder(s) {missing:?} left unassigned")]
    MissingPlaceholderAssignment {
        slide: usize,
        layout: String,
        missing: Vec<usize>,
    },

    #[error("slide {slide}: placeholder {index} assigned more than once")]
    DuplicateAssignment { slide: usize, index: usize },

    #[error("slide {slide}: image index {index} out of range ({available} uploaded)")]
    ImageIndexOutOfRange {
        slide: usize,
        index: usize,
        available: usize,
    },

    /// Uploaded images exist that no slide specification references.
    #[error("uploaded image(s) {indices:?} are not referenced by any slide")]
    UnusedImages { indices: Vec<usize> },

    /// The continuation-splitting loop hit its bound before all text fit.
    #[error("overflow could not be resolved: {report}")]
    OverflowBoundExceeded { report: Box<OverflowReport> },

    /// Carry-over text exists but no layout qualifies as a continuation
    /// target.
    #[error("no text-only layout with a content box is available for continuation slides")]
    NoContinuationLayout,

    /// The uploaded content mix cannot be placed by any extracted layout.
    #[error("infeasible content: {0}")]
    InfeasibleContent(String),

    #[error("unsupported image type '{0}'")]
    UnsupportedImageType(String),

    #[error("package part not found: {0}")]
    PartNotFound(String),

    #[error("invalid package: {0}")]
    InvalidPackage(String),

    #[error("malformed XML: {0}")]
    Xml(String),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}
