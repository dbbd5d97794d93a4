/// The capacity estimator.
///
/// Pure geometry-to-characters arithmetic. The multipliers deliberately
/// overestimate glyph width and line height so the estimate never reports
/// more capacity than the rendered box actually has: a box flagged as
/// overflowing while it still had slack is acceptable, the reverse is not.
use crate::template::model::{Geometry, Margins};

/// Average glyph width as a multiple of the font size.
pub const K_WIDTH: f64 = 1.2;
/// Line height as a multiple of the font size at single spacing.
pub const K_HEIGHT: f64 = 1.6;

/// Estimated text capacity of one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub chars_per_line: usize,
    pub lines_available: usize,
}

impl Capacity {
    pub fn max_chars(&self) -> usize {
        self.chars_per_line.saturating_mul(self.lines_available)
    }

    pub fn is_zero(&self) -> bool {
        self.chars_per_line == 0 || self.lines_available == 0
    }
}

/// Estimate how much text fits in a box. Degenerate inputs (zero or
/// negative usable extent, non-positive font size) yield zero capacity,
/// never a negative value.
pub fn estimate(
    geometry: &Geometry,
    font_size_pt: f32,
    line_spacing: f32,
    margins: &Margins,
) -> Capacity {
    if font_size_pt <= 0.0 {
        return Capacity {
            chars_per_line: 0,
            lines_available: 0,
        };
    }

    let usable_width_pt =
        (geometry.width - margins.left - margins.right).to_points().max(0.0);
    let usable_height_pt =
        (geometry.height - margins.top - margins.bottom).to_points().max(0.0);

    let char_width = font_size_pt as f64 * K_WIDTH;
    let line_height = font_size_pt as f64 * line_spacing.max(1.0) as f64 * K_HEIGHT;

    Capacity {
        chars_per_line: (usable_width_pt / char_width).floor() as usize,
        lines_available: (usable_height_pt / line_height).floor() as usize,
    }
}
