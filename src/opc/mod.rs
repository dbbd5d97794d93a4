//! Minimal Open Packaging Conventions (OPC) layer.
//!
//! A .pptx file is a ZIP archive of parts plus relationship files and a
//! content-type map. This module reads such a package into memory, gives
//! access to parts and their relationships, and serializes a package back
//! to bytes.

pub mod constants;
pub mod package;
pub mod packuri;
pub mod rel;

pub use package::{ContentTypes, OpcPackage, Part};
pub use packuri::PackURI;
pub use rel::{Relationship, Relationships};
