use std::path::PathBuf;
use thiserror::Error;

use crate::ir::{AnnotationId, CategoryId, ImageId};

/// The main error type for coco2yolo operations.
#[derive(Debug, Error)]
pub enum Coco2YoloError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid COCO structure: {0}")]
    Schema(#[from] SchemaError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write manifest {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to transfer image {from} -> {to}: {source}")]
    Transfer {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Conversion incomplete: {missing} missing image(s), {skipped} skipped annotation(s), {unwritten} image(s) not written"
    )]
    IncompleteConversion {
        missing: usize,
        skipped: usize,
        unwritten: usize,
    },

    #[error("Failed to render JSON report: {0}")]
    ReportRender(#[source] serde_json::Error),
}

/// Malformed or inconsistent COCO content. Always fatal, raised before any output exists.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("category list is empty")]
    EmptyCategories,

    #[error("category id {0} appears more than once")]
    DuplicateCategoryId(CategoryId),

    #[error("image id {0} appears more than once")]
    DuplicateImageId(ImageId),

    #[error("annotation {annotation} references unknown image {image}")]
    UnknownImage {
        annotation: AnnotationId,
        image: ImageId,
    },

    #[error("annotation {annotation} references unknown category {category}")]
    UnknownCategory {
        annotation: AnnotationId,
        category: CategoryId,
    },
}

/// Invalid caller-supplied parameters or unusable image metadata.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error(
        "split ratios train={train}, val={val}, test={test} must each lie in [0, 1] and sum to 1.0 (got {sum})"
    )]
    InvalidSplitRatios {
        train: f64,
        val: f64,
        test: f64,
        sum: f64,
    },

    #[error("image {image} has zero dimension ({width}x{height})")]
    ZeroImageDimension { image: ImageId, width: u32, height: u32 },
}
