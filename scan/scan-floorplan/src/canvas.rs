//! Fixed-size floor plan canvas.

use image::{Rgb, RgbImage};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// A rendered floor plan: black dots on a white canvas.
///
/// Produced by [`rasterize`](crate::rasterize) and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorPlanImage {
    pixels: RgbImage,
}

impl FloorPlanImage {
    /// Blank white canvas.
    pub(crate) fn blank(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbImage::from_pixel(width, height, BACKGROUND),
        }
    }

    /// Fills a disc of `radius` around `(cx, cy)`, clipped to the canvas.
    pub(crate) fn fill_disc(&mut self, cx: i64, cy: i64, radius: u32) {
        let r = i64::from(radius);
        let r2 = r * r;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let (Ok(x), Ok(y)) = (u32::try_from(cx + dx), u32::try_from(cy + dy)) else {
                    continue;
                };
                if x < self.width() && y < self.height() {
                    self.pixels.put_pixel(x, y, INK);
                }
            }
        }
    }

    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Whether the pixel at `(x, y)` has been drawn. Out-of-range pixels are
    /// never drawn.
    #[must_use]
    pub fn is_marked(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel_checked(x, y).is_some_and(|p| *p == INK)
    }

    /// Number of drawn pixels.
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.pixels.pixels().filter(|p| **p == INK).count()
    }

    /// The underlying RGB buffer.
    #[must_use]
    pub const fn as_rgb_image(&self) -> &RgbImage {
        &self.pixels
    }

    /// Consumes the plan, returning the RGB buffer.
    #[must_use]
    pub fn into_rgb_image(self) -> RgbImage {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_is_white() {
        let image = FloorPlanImage::blank(4, 3);
        assert_eq!((image.width(), image.height()), (4, 3));
        assert_eq!(image.marked_count(), 0);
        assert_eq!(*image.as_rgb_image().get_pixel(3, 2), BACKGROUND);
    }

    #[test]
    fn zero_radius_draws_one_pixel() {
        let mut image = FloorPlanImage::blank(10, 10);
        image.fill_disc(5, 5, 0);
        assert_eq!(image.marked_count(), 1);
        assert!(image.is_marked(5, 5));
    }

    #[test]
    fn disc_is_clipped_at_edges() {
        let mut image = FloorPlanImage::blank(10, 10);
        image.fill_disc(0, 0, 2);
        // Quarter of a radius-2 disc: (0..=2, 0..=2) minus (2,1), (1,2), (2,2)
        assert_eq!(image.marked_count(), 6);
        assert!(!image.is_marked(2, 2));
        assert!(!image.is_marked(20, 20));
    }
}
