//! Page capacity: the vertical space usable on one printed page.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CSS pixels per millimetre at the CSS reference resolution of 96 px per inch.
const PX_PER_MM: f32 = 96.0 / 25.4;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapacityError {
    #[error("page capacity must be a finite positive length, got {0}")]
    NotPositive(f32),

    #[error("page margins ({margins_mm}mm) leave no room on a {paper_mm}mm page")]
    MarginsExceedPaper { margins_mm: f32, paper_mm: f32 },
}

// ────────────────────────────────────────────────────────────────────────────
// Page capacity
// ────────────────────────────────────────────────────────────────────────────

/// Maximum vertical space per page, in CSS pixels. Always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct PageCapacity(f32);

impl PageCapacity {
    pub fn new(px: f32) -> Result<Self, CapacityError> {
        if px.is_finite() && px > 0.0 {
            Ok(Self(px))
        } else {
            Err(CapacityError::NotPositive(px))
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

/// A4 content area with 20mm top and bottom margins (~971px).
impl Default for PageCapacity {
    fn default() -> Self {
        Self(PageGeometry::A4.content_height_px())
    }
}

impl TryFrom<f32> for PageCapacity {
    type Error = CapacityError;

    fn try_from(px: f32) -> Result<Self, Self::Error> {
        Self::new(px)
    }
}

impl From<PageCapacity> for f32 {
    fn from(capacity: PageCapacity) -> f32 {
        capacity.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Paper geometry
// ────────────────────────────────────────────────────────────────────────────

/// Physical page height and vertical margins, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub paper_height_mm: f32,
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        paper_height_mm: 297.0,
        margin_top_mm: 20.0,
        margin_bottom_mm: 20.0,
    };

    /// A4 paper with custom vertical margins.
    pub fn a4_with_margins(margin_top_mm: f32, margin_bottom_mm: f32) -> Self {
        Self {
            margin_top_mm,
            margin_bottom_mm,
            ..Self::A4
        }
    }

    fn content_height_px(&self) -> f32 {
        (self.paper_height_mm - self.margin_top_mm - self.margin_bottom_mm) * PX_PER_MM
    }

    pub fn capacity(&self) -> Result<PageCapacity, CapacityError> {
        let margins_mm = self.margin_top_mm + self.margin_bottom_mm;
        if margins_mm >= self.paper_height_mm {
            return Err(CapacityError::MarginsExceedPaper {
                margins_mm,
                paper_mm: self.paper_height_mm,
            });
        }
        PageCapacity::new(self.content_height_px())
    }
}
