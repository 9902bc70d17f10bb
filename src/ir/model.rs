//! In-memory model of a parsed COCO document.
//!
//! Only the fields the conversion needs are kept. Everything is read once
//! at load time and treated as immutable afterwards.

use super::bbox::BBoxXYWH;
use super::coord::{Coord, Pixel};
use super::ids::{AnnotationId, CategoryId, ImageId};

/// A parsed COCO document, lists kept in source order.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub images: Vec<Image>,
    /// Order is authoritative: it defines each category's class index.
    pub categories: Vec<Category>,
    pub annotations: Vec<Annotation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub id: ImageId,
    /// Path relative to the image source directory.
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn new(
        id: impl Into<ImageId>,
        file_name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub supercategory: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: None,
        }
    }
}

/// One closed outline in pixel space.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Polygon {
    pub points: Vec<Coord<Pixel>>,
}

impl Polygon {
    /// Pairs up a flat `[x0, y0, x1, y1, ...]` list. A dangling odd value is dropped.
    pub fn from_flat(values: &[f64]) -> Self {
        let points = values
            .chunks_exact(2)
            .map(|pair| Coord::new(pair[0], pair[1]))
            .collect();
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Instance mask as found in the `segmentation` field.
#[derive(Clone, Debug, PartialEq)]
pub enum Segmentation {
    /// One or more polygons that together outline a single instance.
    Polygons(Vec<Polygon>),
    /// Run-length encoded mask. Recognised but never converted.
    Rle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub image_id: ImageId,
    pub category_id: CategoryId,
    pub bbox: Option<BBoxXYWH<Pixel>>,
    pub segmentation: Option<Segmentation>,
    pub iscrowd: bool,
}

impl Annotation {
    /// Creates an annotation with no geometry attached.
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox: None,
            segmentation: None,
            iscrowd: false,
        }
    }

    pub fn with_bbox(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bbox = Some(BBoxXYWH::from_xywh(x, y, width, height));
        self
    }

    pub fn with_polygons(mut self, polygons: Vec<Vec<f64>>) -> Self {
        let polygons = polygons.iter().map(|p| Polygon::from_flat(p)).collect();
        self.segmentation = Some(Segmentation::Polygons(polygons));
        self
    }

    pub fn with_rle(mut self) -> Self {
        self.segmentation = Some(Segmentation::Rle);
        self
    }

    pub fn crowd(mut self) -> Self {
        self.iscrowd = true;
        self
    }

    /// Polygons usable for a segmentation label, if any.
    ///
    /// Crowd annotations, RLE masks and polygon lists with no points yield `None`.
    pub fn usable_polygons(&self) -> Option<&[Polygon]> {
        if self.iscrowd {
            return None;
        }
        match &self.segmentation {
            Some(Segmentation::Polygons(polygons)) if polygons.iter().any(|p| !p.is_empty()) => {
                Some(polygons)
            }
            _ => None,
        }
    }
}
