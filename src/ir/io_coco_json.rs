//! COCO JSON reader.
//!
//! Parses a whole COCO document into the in-memory [`Dataset`]. Only the
//! keys needed for YOLO conversion are read: `images`, `categories` and
//! `annotations` are required, everything else (`info`, `licenses`,
//! `area`, `score`, keypoints) is ignored.
//!
//! # Geometry
//!
//! - `bbox` is `[x, y, width, height]` with `(x, y)` the top-left corner.
//!   Arrays that do not hold exactly four numbers are treated as absent.
//! - `segmentation` is either a list of flat polygons or an RLE object.
//!   RLE masks are kept only as a marker and never converted.
//! - `iscrowd` may be written as `0`/`1` or as a boolean.
//!
//! The document is loaded into memory in full, so usable dataset size is
//! bounded by available memory.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

use super::model::{Annotation, Category, Dataset, Image, Polygon, Segmentation};
use super::{AnnotationId, BBoxXYWH, CategoryId, ImageId};
use crate::error::Coco2YoloError;

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

#[derive(Debug, Deserialize)]
struct CocoDataset {
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    file_name: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
    #[serde(default)]
    supercategory: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,

    #[serde(default)]
    bbox: Option<Vec<f64>>,

    #[serde(default)]
    segmentation: Option<CocoSegmentation>,

    #[serde(default, deserialize_with = "deserialize_iscrowd")]
    iscrowd: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CocoSegmentation {
    Polygons(Vec<Vec<f64>>),
    /// RLE (`{"size": [h, w], "counts": ...}`) or any other non-polygon shape.
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CrowdFlag {
    Bool(bool),
    Int(u64),
}

fn deserialize_iscrowd<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<CrowdFlag>::deserialize(deserializer)? {
        Some(CrowdFlag::Bool(flag)) => flag,
        Some(CrowdFlag::Int(value)) => value != 0,
        None => false,
    })
}

// ============================================================================
// Public API
// ============================================================================

/// Reads a dataset from a COCO JSON file.
///
/// # Errors
/// Returns [`Coco2YoloError::Io`] if the file cannot be opened and
/// [`Coco2YoloError::CocoJsonParse`] if it is not valid JSON or lacks a
/// required key.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use coco2yolo::ir::io_coco_json::read_coco_json;
///
/// let dataset = read_coco_json(Path::new("annotations.json"))?;
/// println!("{} images", dataset.images.len());
/// # Ok::<(), coco2yolo::Coco2YoloError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<Dataset, Coco2YoloError> {
    let file = File::open(path).map_err(Coco2YoloError::Io)?;
    let reader = BufReader::new(file);

    let coco: CocoDataset =
        serde_json::from_reader(reader).map_err(|source| Coco2YoloError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(coco_to_dataset(coco))
}

/// Reads a dataset from a COCO JSON string.
pub fn from_coco_str(json: &str) -> Result<Dataset, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_str(json)?;
    Ok(coco_to_dataset(coco))
}

/// Reads a dataset from raw COCO JSON bytes.
pub fn from_coco_slice(bytes: &[u8]) -> Result<Dataset, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_slice(bytes)?;
    Ok(coco_to_dataset(coco))
}

// ============================================================================
// Conversion: COCO -> Dataset
// ============================================================================

fn coco_to_dataset(coco: CocoDataset) -> Dataset {
    let images = coco
        .images
        .into_iter()
        .map(|img| Image::new(img.id, img.file_name, img.width, img.height))
        .collect();

    let categories = coco
        .categories
        .into_iter()
        .map(|cat| Category {
            id: CategoryId::new(cat.id),
            name: cat.name,
            supercategory: cat.supercategory,
        })
        .collect();

    let annotations = coco
        .annotations
        .into_iter()
        .map(|ann| Annotation {
            id: AnnotationId::new(ann.id),
            image_id: ImageId::new(ann.image_id),
            category_id: CategoryId::new(ann.category_id),
            bbox: ann
                .bbox
                .as_deref()
                .and_then(BBoxXYWH::from_coco_slice),
            segmentation: ann.segmentation.map(convert_segmentation),
            iscrowd: ann.iscrowd,
        })
        .collect();

    Dataset {
        images,
        categories,
        annotations,
    }
}

fn convert_segmentation(segmentation: CocoSegmentation) -> Segmentation {
    match segmentation {
        CocoSegmentation::Polygons(polygons) => Segmentation::Polygons(
            polygons
                .iter()
                .map(|flat| Polygon::from_flat(flat))
                .collect(),
        ),
        CocoSegmentation::Other(_) => Segmentation::Rle,
    }
}

/// Fuzz-only entrypoint for COCO parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_coco(bytes: &[u8]) -> Result<(), serde_json::Error> {
    let _ = from_coco_slice(bytes)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
