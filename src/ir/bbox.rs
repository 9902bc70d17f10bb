//! Axis-aligned boxes in COCO's `[x, y, width, height]` layout.

use super::coord::{Coord, Normalized, Pixel};

/// A box anchored at its top-left corner with an extent.
///
/// Construction does not require a positive extent; degenerate boxes are
/// still converted so the label file reflects the source data.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYWH<TSpace> {
    pub origin: Coord<TSpace>,
    pub width: f64,
    pub height: f64,
}

impl<TSpace> BBoxXYWH<TSpace> {
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Coord::new(x, y),
            width,
            height,
        }
    }

    /// Builds a box from a COCO `bbox` array. Anything but four values is rejected.
    pub fn from_coco_slice(values: &[f64]) -> Option<Self> {
        match values {
            [x, y, w, h] => Some(Self::from_xywh(*x, *y, *w, *h)),
            _ => None,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.origin.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.origin.y
    }

    /// Center point, `(x + w/2, y + h/2)`.
    #[inline]
    pub fn center(&self) -> Coord<TSpace> {
        Coord::new(
            self.origin.x + self.width / 2.0,
            self.origin.y + self.height / 2.0,
        )
    }
}

impl BBoxXYWH<Pixel> {
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYWH<Normalized> {
        BBoxXYWH {
            origin: self.origin.normalize(image_width, image_height),
            width: self.width / image_width,
            height: self.height / image_height,
        }
    }
}

impl BBoxXYWH<Normalized> {
    /// YOLO detection tuple `(cx, cy, w, h)`.
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        let center = self.center();
        (center.x, center.y, self.width, self.height)
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYWH")
            .field("x", &self.origin.x)
            .field("y", &self.origin.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
