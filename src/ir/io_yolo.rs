//! Ultralytics-style YOLO label and manifest writer.
//!
//! Each image gets one `.txt` label file holding one line per instance:
//!
//! - detection: `class cx cy w h`
//! - segmentation: `class x1 y1 x2 y2 ...` (even number of values)
//!
//! All values are fractions of the image size, written with six decimals.
//! The dataset root carries a `data.yaml` manifest listing the split image
//! directories and the class names in class-index order.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{BBoxXYWH, Coord, Normalized};
use crate::error::Coco2YoloError;

pub const LABEL_EXTENSION: &str = "txt";
pub const MANIFEST_FILE_NAME: &str = "data.yaml";

/// One line of a YOLO label file.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelLine {
    Box {
        class_index: usize,
        bbox: BBoxXYWH<Normalized>,
    },
    Polygon {
        class_index: usize,
        points: Vec<Coord<Normalized>>,
    },
}

impl LabelLine {
    pub fn class_index(&self) -> usize {
        match self {
            LabelLine::Box { class_index, .. } | LabelLine::Polygon { class_index, .. } => {
                *class_index
            }
        }
    }
}

impl fmt::Display for LabelLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelLine::Box { class_index, bbox } => {
                let (cx, cy, w, h) = bbox.to_cxcywh();
                write!(f, "{} {:.6} {:.6} {:.6} {:.6}", class_index, cx, cy, w, h)
            }
            LabelLine::Polygon {
                class_index,
                points,
            } => {
                write!(f, "{}", class_index)?;
                for point in points {
                    write!(f, " {:.6} {:.6}", point.x, point.y)?;
                }
                Ok(())
            }
        }
    }
}

/// Where an image's `file_name` lands below a split's `images/` and `labels/`.
///
/// Relative names keep their subdirectories. Absolute names keep only their
/// final component. Names with a `..` component, or with nothing left once
/// `.` components are dropped, return `None` since they would escape the
/// split directory.
pub fn output_relative_path(image_file_name: &str) -> Option<PathBuf> {
    let path = Path::new(image_file_name);
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }
    if path.has_root() || matches!(path.components().next(), Some(Component::Prefix(_))) {
        return path.file_name().map(PathBuf::from);
    }

    let relative: PathBuf = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    (!relative.as_os_str().is_empty()).then_some(relative)
}

/// Label file path for an image: its in-tree relative path with a `.txt` extension.
pub fn label_path_for(labels_dir: &Path, image_rel_path: &Path) -> PathBuf {
    labels_dir.join(image_rel_path.with_extension(LABEL_EXTENSION))
}

/// Renders label lines into file contents, one line each, newline-terminated.
pub fn render_label_file(lines: &[LabelLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.to_string());
        out.push('\n');
    }
    out
}

/// Writes a label file in a single call, replacing any previous content.
///
/// An empty `lines` slice still produces an (empty) file.
pub fn write_label_file(path: &Path, lines: &[LabelLine]) -> Result<(), Coco2YoloError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(Coco2YoloError::Io)?;
    }
    fs::write(path, render_label_file(lines)).map_err(Coco2YoloError::Io)
}

/// Contents of `data.yaml`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub train: String,
    pub val: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    pub nc: usize,
    pub names: Vec<String>,
}

impl Manifest {
    pub fn read(path: &Path) -> Result<Self, Coco2YoloError> {
        let data = fs::read_to_string(path).map_err(Coco2YoloError::Io)?;
        serde_yaml::from_str(&data).map_err(|source| Coco2YoloError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Serializes the manifest to `<output_root>/data.yaml` and returns its path.
pub fn write_data_yaml(output_root: &Path, manifest: &Manifest) -> Result<PathBuf, Coco2YoloError> {
    let path = output_root.join(MANIFEST_FILE_NAME);
    let yaml = serde_yaml::to_string(manifest).map_err(|source| Coco2YoloError::ManifestWrite {
        path: path.clone(),
        source,
    })?;
    fs::create_dir_all(output_root).map_err(Coco2YoloError::Io)?;
    fs::write(&path, yaml).map_err(Coco2YoloError::Io)?;
    Ok(path)
}
