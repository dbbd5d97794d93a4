/// Shape role classification.
///
/// A text region is either a title-like label or body content. The decision
/// is a priority chain of pure functions: the document's own semantic
/// placeholder type wins, then shape naming conventions, then vertical
/// position as a last resort. Position alone must never override an explicit
/// semantic marker.
use crate::common::units::Emu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Title,
    Body,
}

/// Explicit `p:ph` type attribute.
pub fn from_ph_type(ph_type: Option<&str>) -> Option<Role> {
    match ph_type? {
        "title" | "ctrTitle" => Some(Role::Title),
        "subTitle" | "body" | "ftr" | "hdr" => Some(Role::Body),
        _ => None,
    }
}

/// Shape-name convention, e.g. "Title 1" or "Content Placeholder 2".
pub fn from_shape_name(name: &str) -> Option<Role> {
    let lower = name.to_ascii_lowercase();
    if lower.contains("subtitle") {
        return Some(Role::Body);
    }
    if lower.contains("title") || lower.contains("heading") {
        return Some(Role::Title);
    }
    if lower.contains("body") || lower.contains("content") || lower.contains("text") {
        return Some(Role::Body);
    }
    None
}

/// Vertical-position fallback: a box starting in the top quartile of the
/// slide reads as a title.
pub fn from_position(top: Emu, slide_height: Emu) -> Option<Role> {
    if slide_height.raw() <= 0 {
        return None;
    }
    if top.raw() * 4 < slide_height.raw() {
        Some(Role::Title)
    } else {
        Some(Role::Body)
    }
}

/// Full chain. Falls back to `Body` when nothing matches.
pub fn classify(ph_type: Option<&str>, name: &str, top: Emu, slide_height: Emu) -> Role {
    from_ph_type(ph_type)
        .or_else(|| from_shape_name(name))
        .or_else(|| from_position(top, slide_height))
        .unwrap_or(Role::Body)
}
