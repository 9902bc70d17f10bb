//! Typed model of COCO input and YOLO output.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: newtype ids keep image, category and annotation ids
//!    apart, and a space marker keeps pixel and normalized coordinates
//!    from being mixed.
//!
//! 2. **Source Order**: lists keep the order of the COCO document. Category
//!    order in particular decides the YOLO class index.
//!
//! 3. **Permissive Construction**: geometry is stored as found (negative
//!    or out-of-frame values included). Consistency checks live in
//!    [`crate::index`].
//!
//! # Example
//!
//! ```
//! use coco2yolo::ir::{Annotation, Category, Dataset, Image};
//!
//! let dataset = Dataset {
//!     images: vec![Image::new(1u64, "image.jpg", 640, 480)],
//!     categories: vec![Category::new(1u64, "person")],
//!     annotations: vec![Annotation::new(1u64, 1u64, 1u64).with_bbox(10.0, 20.0, 90.0, 60.0)],
//! };
//! assert_eq!(dataset.annotations.len(), 1);
//! ```

mod bbox;
mod coord;
mod ids;
pub mod io_coco_json;
pub mod io_yolo;
mod model;

pub use bbox::BBoxXYWH;
pub use coord::{Coord, Normalized, Pixel};
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{Annotation, Category, Dataset, Image, Polygon, Segmentation};
