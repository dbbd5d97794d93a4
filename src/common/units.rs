//! Document length units.
//!
//! OOXML geometry is expressed in English Metric Units (EMU). Capacity
//! estimation works in typographic points, so conversions between the two
//! live here.

use serde::{Deserialize, Serialize};

/// EMUs per typographic point (914400 / 72).
pub const EMU_PER_POINT: i64 = 12_700;

/// EMUs per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// A length in English Metric Units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Emu(pub i64);

impl Emu {
    /// Convert to typographic points.
    #[inline]
    pub fn to_points(self) -> f64 {
        self.0 as f64 / EMU_PER_POINT as f64
    }

    /// Construct from typographic points.
    #[inline]
    pub fn from_points(pt: f64) -> Self {
        Emu((pt * EMU_PER_POINT as f64).round() as i64)
    }

    /// Construct from inches.
    #[inline]
    pub fn from_inches(inches: f64) -> Self {
        Emu((inches * EMU_PER_INCH as f64).round() as i64)
    }

    /// The raw EMU value.
    #[inline]
    pub fn raw(self) -> i64 {
        self.0
    }
}

impl std::ops::Add for Emu {
    type Output = Emu;

    fn add(self, rhs: Emu) -> Emu {
        Emu(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Emu {
    type Output = Emu;

    fn sub(self, rhs: Emu) -> Emu {
        Emu(self.0 - rhs.0)
    }
}
