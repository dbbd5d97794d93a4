//! Shared primitives: document length units and XML text escaping.

pub mod units;
pub mod xml;
