//! Canvas parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FloorPlanError, FloorPlanResult};

/// Canvas layout for a floor plan image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FloorPlanParams {
    /// Canvas width in pixels. Default: 800.
    pub width: u32,

    /// Canvas height in pixels. Default: 800.
    pub height: u32,

    /// Blank border on every side, in pixels. Default: 50.
    pub margin: u32,

    /// Radius of the disc drawn per point. 0 draws single pixels. Default: 0.
    pub dot_radius: u32,
}

impl Default for FloorPlanParams {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            margin: 50,
            dot_radius: 0,
        }
    }
}

impl FloorPlanParams {
    /// Creates parameters for a `width` x `height` canvas with default margin
    /// and dot radius.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Sets the margin.
    #[must_use]
    pub const fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// Sets the dot radius.
    #[must_use]
    pub const fn with_dot_radius(mut self, radius: u32) -> Self {
        self.dot_radius = radius;
        self
    }

    /// Drawable width and height inside the margins.
    ///
    /// # Errors
    ///
    /// Returns [`FloorPlanError::InvalidCanvas`] unless both sides exceed
    /// twice the margin.
    pub fn drawable_area(&self) -> FloorPlanResult<(u32, u32)> {
        let border = u64::from(self.margin) * 2;
        if u64::from(self.width) <= border || u64::from(self.height) <= border {
            return Err(FloorPlanError::InvalidCanvas {
                width: self.width,
                height: self.height,
                margin: self.margin,
            });
        }
        // Both sides exceed 2 * margin, so the doubled margin fits in u32.
        let border = self.margin * 2;
        Ok((self.width - border, self.height - border))
    }

    /// Checks that the canvas has a drawable area.
    ///
    /// # Errors
    ///
    /// Returns [`FloorPlanError::InvalidCanvas`] if it does not.
    pub fn validate(&self) -> FloorPlanResult<()> {
        self.drawable_area().map(|_| ())
    }
}
