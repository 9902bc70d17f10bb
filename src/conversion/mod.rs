//! Dataset materialization: COCO document in, YOLO split directories out.
//!
//! [`convert`] reads the document, builds the lookup tables, partitions the
//! annotated images and only then starts touching the output directory.
//! Schema and ratio problems therefore never leave a half-written dataset.
//!
//! Per image the materializer either produces both the image and its label
//! file or neither. Missing sources, failed transfers, file names that would
//! leave the split directory and label names already taken within the split
//! are recorded in the [`ConversionSummary`] and the run carries on with the
//! next image.

pub mod report;

pub use report::{
    ConversionIssue, ConversionIssueCode, ConversionSummary, SplitPlan, SplitPlanEntry,
};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Coco2YoloError, ConfigError, SchemaError};
use crate::index::CocoIndex;
use crate::ir::io_coco_json::read_coco_json;
use crate::ir::io_yolo::{self, LabelLine, Manifest};
use crate::ir::Image;
use crate::normalize::{geometry_source, normalize_annotation, GeometrySource};
use crate::split::{partition_image_ids, Split, SplitAssignment, SplitRatios};

pub const DEFAULT_SEED: u64 = 42;
pub const IMAGES_DIR: &str = "images";
pub const LABELS_DIR: &str = "labels";

/// How source images reach `<split>/images/`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransferMode {
    #[default]
    Copy,
    /// Hard link, falling back to a copy when linking is not possible.
    HardLink,
}

/// Everything a conversion run needs.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    pub coco_json: PathBuf,
    pub image_dir: PathBuf,
    pub output_dir: PathBuf,
    pub ratios: SplitRatios,
    pub seed: u64,
    pub transfer: TransferMode,
    pub show_progress: bool,
}

impl ConvertOptions {
    /// Options with an 80/20 train/valid split, seed 42, copying, no progress bars.
    pub fn new(
        coco_json: impl Into<PathBuf>,
        image_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            coco_json: coco_json.into(),
            image_dir: image_dir.into(),
            output_dir: output_dir.into(),
            ratios: default_ratios(),
            seed: DEFAULT_SEED,
            transfer: TransferMode::Copy,
            show_progress: false,
        }
    }

    pub fn with_ratios(mut self, ratios: SplitRatios) -> Self {
        self.ratios = ratios;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_transfer(mut self, transfer: TransferMode) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

fn default_ratios() -> SplitRatios {
    SplitRatios::new(0.8, 0.2, 0.0).unwrap_or_else(|_| SplitRatios::train_only())
}

/// Converts a COCO document into a split YOLO dataset under `options.output_dir`.
///
/// # Errors
/// Parse and schema errors are returned before any output exists. IO errors
/// while writing labels or the manifest abort the run.
pub fn convert(options: &ConvertOptions) -> Result<ConversionSummary, Coco2YoloError> {
    log::info!("reading {}", options.coco_json.display());
    let dataset = read_coco_json(&options.coco_json)?;
    let index = CocoIndex::build(dataset)?;
    let assignment = partition_image_ids(
        index.annotations.annotated_image_ids(),
        options.ratios,
        options.seed,
    );
    log::info!(
        "split {} annotated images (seed {}): train={} valid={} test={}",
        assignment.total(),
        options.seed,
        assignment.train.len(),
        assignment.valid.len(),
        assignment.test.len()
    );

    materialize(&index, &assignment, options)
}

/// Writes every non-empty split and the manifest for an existing assignment.
pub fn materialize(
    index: &CocoIndex,
    assignment: &SplitAssignment,
    options: &ConvertOptions,
) -> Result<ConversionSummary, Coco2YoloError> {
    let mut summary = ConversionSummary::new(options.output_dir.clone(), options.seed);
    for split in Split::ALL {
        summary.set_split_count(split, assignment.group(split).len());
    }

    for (split, ids) in assignment.non_empty() {
        let mut target = SplitTarget::create(&options.output_dir, split)?;
        let progress = split_progress_bar(ids.len() as u64, split, options.show_progress);
        let missing_before = summary.missing_count();

        for id in ids {
            let Some(image) = index.images.get(*id) else {
                log::warn!("image {} vanished from the registry; skipping", id);
                progress.inc(1);
                continue;
            };
            materialize_image(index, image, &mut target, options, &mut summary)?;
            progress.inc(1);
        }

        progress.finish_and_clear();
        log::info!(
            "{}: {} image(s), {} missing",
            split,
            ids.len(),
            summary.missing_count() - missing_before
        );
    }

    let manifest = build_manifest(index, assignment);
    let manifest_path = io_yolo::write_data_yaml(&options.output_dir, &manifest)?;
    log::info!("wrote {}", manifest_path.display());
    summary.manifest_path = Some(manifest_path);

    if !summary.is_complete() {
        log::warn!(
            "{} missing image(s), {} skipped annotation(s), {} image(s) not written",
            summary.missing_count(),
            summary.skipped_annotation_count(),
            summary.unwritten_image_count()
        );
    }

    Ok(summary)
}

/// Output directories of one split plus the label files written into it.
struct SplitTarget {
    split: Split,
    images_dir: PathBuf,
    labels_dir: PathBuf,
    claimed_labels: HashSet<PathBuf>,
}

impl SplitTarget {
    fn create(output_dir: &Path, split: Split) -> Result<Self, Coco2YoloError> {
        let images_dir = output_dir.join(split.dir_name()).join(IMAGES_DIR);
        let labels_dir = output_dir.join(split.dir_name()).join(LABELS_DIR);
        fs::create_dir_all(&images_dir)?;
        fs::create_dir_all(&labels_dir)?;
        Ok(Self {
            split,
            images_dir,
            labels_dir,
            claimed_labels: HashSet::new(),
        })
    }
}

fn materialize_image(
    index: &CocoIndex,
    image: &Image,
    target: &mut SplitTarget,
    options: &ConvertOptions,
    summary: &mut ConversionSummary,
) -> Result<(), Coco2YoloError> {
    let split = target.split;
    let image_id = image.id.as_u64();

    let Some(relative) = io_yolo::output_relative_path(&image.file_name) else {
        log::warn!("image {}: unsafe file name '{}'", image.id, image.file_name);
        summary.record_unwritten(
            ConversionIssueCode::UnsafeFileName,
            split,
            image_id,
            format!(
                "image {} ('{}'): file name escapes the split directory",
                image.id, image.file_name
            ),
        );
        return Ok(());
    };

    let label_path = io_yolo::label_path_for(&target.labels_dir, &relative);
    if target.claimed_labels.contains(&label_path) {
        log::warn!(
            "image {} ('{}'): label {} already written in {}",
            image.id,
            image.file_name,
            label_path.display(),
            split
        );
        summary.record_unwritten(
            ConversionIssueCode::LabelCollision,
            split,
            image_id,
            format!(
                "image {} ('{}'): label {} already written for another image",
                image.id,
                image.file_name,
                label_path.display()
            ),
        );
        return Ok(());
    }

    let source = options.image_dir.join(&image.file_name);
    if !source.is_file() {
        log::warn!("missing image {}", source.display());
        summary.record_missing(split, image_id, &image.file_name);
        return Ok(());
    }

    let destination = target.images_dir.join(&relative);
    match transfer_image(&source, &destination, options.transfer) {
        Ok(TransferOutcome::AlreadyPresent) => summary.already_present_count += 1,
        Ok(TransferOutcome::Copied) | Ok(TransferOutcome::Linked) => summary.copied_count += 1,
        Err(err) => {
            log::warn!("{}", err);
            summary.record_unwritten(
                ConversionIssueCode::TransferFailed,
                split,
                image_id,
                err.to_string(),
            );
            return Ok(());
        }
    }

    let lines = label_lines_for(index, image, split, summary)?;
    io_yolo::write_label_file(&label_path, &lines)?;
    target.claimed_labels.insert(label_path);
    summary.labels_written += 1;
    summary.label_lines += lines.len();
    Ok(())
}

/// Converts the annotations of one image, recording the ones that yield nothing.
fn label_lines_for(
    index: &CocoIndex,
    image: &Image,
    split: Split,
    summary: &mut ConversionSummary,
) -> Result<Vec<LabelLine>, Coco2YoloError> {
    let mut lines = Vec::new();
    for annotation in index.annotations.for_image(image.id) {
        let class_index = index
            .class_index_of(annotation)
            .ok_or(SchemaError::UnknownCategory {
                annotation: annotation.id,
                category: annotation.category_id,
            })?;
        match normalize_annotation(annotation, image, class_index) {
            Ok(Some(line)) => lines.push(line),
            Ok(None) => {
                log::warn!(
                    "annotation {} on image {} has no polygon or bbox; skipped",
                    annotation.id,
                    image.id
                );
                summary.add(ConversionIssue::skipped_annotation(
                    ConversionIssueCode::NoGeometry,
                    split,
                    image.id.as_u64(),
                    annotation.id.as_u64(),
                    format!(
                        "annotation {} on image {} has no geometry",
                        annotation.id, image.id
                    ),
                ));
            }
            Err(err @ ConfigError::ZeroImageDimension { .. }) => {
                log::warn!("annotation {} skipped: {}", annotation.id, err);
                summary.add(ConversionIssue::skipped_annotation(
                    ConversionIssueCode::ZeroDimension,
                    split,
                    image.id.as_u64(),
                    annotation.id.as_u64(),
                    format!("annotation {}: {}", annotation.id, err),
                ));
            }
            Err(err @ ConfigError::InvalidSplitRatios { .. }) => return Err(err.into()),
        }
    }
    Ok(lines)
}

/// What happened to one image file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    Copied,
    Linked,
    AlreadyPresent,
}

/// Places `source` at `destination` unless something is already there.
pub fn transfer_image(
    source: &Path,
    destination: &Path,
    mode: TransferMode,
) -> Result<TransferOutcome, Coco2YoloError> {
    if destination.exists() {
        log::debug!("{} already present", destination.display());
        return Ok(TransferOutcome::AlreadyPresent);
    }

    let transfer_error = |source_err: std::io::Error| Coco2YoloError::Transfer {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: source_err,
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(transfer_error)?;
    }

    if mode == TransferMode::HardLink {
        match fs::hard_link(source, destination) {
            Ok(()) => {
                log::debug!("linked {} -> {}", source.display(), destination.display());
                return Ok(TransferOutcome::Linked);
            }
            Err(err) => {
                log::debug!(
                    "hard link {} failed ({}); copying instead",
                    destination.display(),
                    err
                );
            }
        }
    }

    fs::copy(source, destination).map_err(transfer_error)?;
    log::debug!("copied {} -> {}", source.display(), destination.display());
    Ok(TransferOutcome::Copied)
}

/// Manifest paths are relative to the output root.
pub fn build_manifest(index: &CocoIndex, assignment: &SplitAssignment) -> Manifest {
    let images_path = |split: Split| format!("{}/{}", split.dir_name(), IMAGES_DIR);
    let val = if assignment.valid.is_empty() {
        images_path(Split::Train)
    } else {
        images_path(Split::Valid)
    };

    Manifest {
        train: images_path(Split::Train),
        val,
        test: (!assignment.test.is_empty()).then(|| images_path(Split::Test)),
        nc: index.categories.len(),
        names: index.categories.names(),
    }
}

/// Reads, indexes and partitions without writing anything.
pub fn plan(
    coco_json: &Path,
    ratios: SplitRatios,
    seed: u64,
) -> Result<SplitPlan, Coco2YoloError> {
    let dataset = read_coco_json(coco_json)?;
    let index = CocoIndex::build(dataset)?;
    let assignment = partition_image_ids(index.annotations.annotated_image_ids(), ratios, seed);
    Ok(plan_from_index(&index, &assignment, seed))
}

pub fn plan_from_index(index: &CocoIndex, assignment: &SplitAssignment, seed: u64) -> SplitPlan {
    let splits = Split::ALL
        .into_iter()
        .map(|split| {
            let mut entry = SplitPlanEntry {
                split: Some(split),
                ..Default::default()
            };
            for id in assignment.group(split) {
                entry.images += 1;
                for annotation in index.annotations.for_image(*id) {
                    entry.annotations += 1;
                    match geometry_source(annotation) {
                        Some(GeometrySource::Polygon) => entry.polygon_annotations += 1,
                        Some(GeometrySource::BBox) => entry.bbox_annotations += 1,
                        None => entry.no_geometry_annotations += 1,
                    }
                }
            }
            entry
        })
        .collect();

    SplitPlan {
        seed,
        class_count: index.categories.len(),
        class_names: index.categories.names(),
        splits,
        unannotated_images: index.images.len() - index.annotations.annotated_image_ids().len(),
    }
}

fn split_progress_bar(len: u64, split: Split, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::with_template(&format!(
        "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
        split
    ))
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    bar.set_style(style);
    bar
}
