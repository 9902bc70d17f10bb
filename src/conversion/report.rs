//! Conversion summary and split plan reports.
//!
//! A finished run never hides a partial result: every missing image and
//! every annotation that produced no label line is recorded here as an
//! issue, and the text rendering shows a bounded preview of both.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::split::Split;

/// How many missing file names / skipped annotations the text report lists.
pub const PREVIEW_LIMIT: usize = 10;

/// Outcome of [`convert`](super::convert).
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionSummary {
    pub output_dir: PathBuf,
    pub seed: u64,
    /// Images assigned to each split.
    pub train_count: usize,
    pub val_count: usize,
    pub test_count: usize,
    /// Images copied or linked during this run.
    pub copied_count: usize,
    /// Images already present at the destination and left untouched.
    pub already_present_count: usize,
    pub labels_written: usize,
    pub label_lines: usize,
    pub missing_file_names: Vec<String>,
    pub manifest_path: Option<PathBuf>,
    pub issues: Vec<ConversionIssue>,
}

impl ConversionSummary {
    pub fn new(output_dir: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            seed,
            ..Default::default()
        }
    }

    pub fn set_split_count(&mut self, split: Split, count: usize) {
        match split {
            Split::Train => self.train_count = count,
            Split::Valid => self.val_count = count,
            Split::Test => self.test_count = count,
        }
    }

    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    /// Records an image that exists but was not placed in the output.
    pub fn record_unwritten(
        &mut self,
        code: ConversionIssueCode,
        split: Split,
        image_id: u64,
        message: impl Into<String>,
    ) {
        self.add(ConversionIssue {
            code,
            split: Some(split),
            image_id: Some(image_id),
            annotation_id: None,
            message: message.into(),
        });
    }

    /// Records a source image that could not be found.
    pub fn record_missing(&mut self, split: Split, image_id: u64, file_name: &str) {
        self.missing_file_names.push(file_name.to_string());
        self.add(ConversionIssue {
            code: ConversionIssueCode::MissingAsset,
            split: Some(split),
            image_id: Some(image_id),
            annotation_id: None,
            message: format!("image file '{}' not found", file_name),
        });
    }

    pub fn assigned_total(&self) -> usize {
        self.train_count + self.val_count + self.test_count
    }

    pub fn missing_count(&self) -> usize {
        self.missing_file_names.len()
    }

    pub fn count(&self, code: ConversionIssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }

    /// Annotations that contributed no label line.
    pub fn skipped_annotations(&self) -> impl Iterator<Item = &ConversionIssue> {
        self.issues.iter().filter(|i| i.code.is_skipped_annotation())
    }

    pub fn skipped_annotation_count(&self) -> usize {
        self.skipped_annotations().count()
    }

    /// Images found on disk but left out of the output.
    pub fn unwritten_images(&self) -> impl Iterator<Item = &ConversionIssue> {
        self.issues.iter().filter(|i| i.code.is_unwritten_image())
    }

    pub fn unwritten_image_count(&self) -> usize {
        self.unwritten_images().count()
    }

    /// True when every assigned image was written and every annotation converted.
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Output: {}", self.output_dir.display())?;
        writeln!(
            f,
            "  split (seed {}): train={} valid={} test={}",
            self.seed, self.train_count, self.val_count, self.test_count
        )?;
        writeln!(
            f,
            "  images: {} copied, {} already present, {} missing",
            self.copied_count,
            self.already_present_count,
            self.missing_count()
        )?;
        writeln!(
            f,
            "  labels: {} file(s), {} line(s)",
            self.labels_written, self.label_lines
        )?;
        if let Some(path) = &self.manifest_path {
            writeln!(f, "  manifest: {}", path.display())?;
        }

        if !self.missing_file_names.is_empty() {
            writeln!(f)?;
            writeln!(f, "Missing images ({}):", self.missing_count())?;
            for name in self.missing_file_names.iter().take(PREVIEW_LIMIT) {
                writeln!(f, "  - {}", name)?;
            }
            if self.missing_count() > PREVIEW_LIMIT {
                writeln!(f, "  ... and {} more", self.missing_count() - PREVIEW_LIMIT)?;
            }
        }

        let skipped = self.skipped_annotation_count();
        if skipped > 0 {
            writeln!(f)?;
            writeln!(f, "Skipped annotations ({}):", skipped)?;
            for issue in self.skipped_annotations().take(PREVIEW_LIMIT) {
                writeln!(f, "  - {}", issue.message)?;
            }
            if skipped > PREVIEW_LIMIT {
                writeln!(f, "  ... and {} more", skipped - PREVIEW_LIMIT)?;
            }
        }

        let unwritten = self.unwritten_image_count();
        if unwritten > 0 {
            writeln!(f)?;
            writeln!(f, "Images not written ({}):", unwritten)?;
            for issue in self.unwritten_images().take(PREVIEW_LIMIT) {
                writeln!(f, "  - {}", issue.message)?;
            }
            if unwritten > PREVIEW_LIMIT {
                writeln!(f, "  ... and {} more", unwritten - PREVIEW_LIMIT)?;
            }
        }

        Ok(())
    }
}

/// A single non-fatal problem met during materialization.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversionIssue {
    pub code: ConversionIssueCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<Split>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_id: Option<u64>,
    pub message: String,
}

impl ConversionIssue {
    pub fn skipped_annotation(
        code: ConversionIssueCode,
        split: Split,
        image_id: u64,
        annotation_id: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            split: Some(split),
            image_id: Some(image_id),
            annotation_id: Some(annotation_id),
            message: message.into(),
        }
    }
}

/// Stable codes for conversion issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ConversionIssueCode {
    /// Source image file not found; neither image nor label was written.
    MissingAsset,
    /// Annotation had no usable polygon and no bbox.
    NoGeometry,
    /// Owning image has a zero width or height.
    ZeroDimension,
    /// Copying or linking the image failed; neither image nor label was written.
    TransferFailed,
    /// `file_name` would place files outside the split directory.
    UnsafeFileName,
    /// Another image of the same split already claimed this label file.
    LabelCollision,
}

impl ConversionIssueCode {
    pub fn is_skipped_annotation(&self) -> bool {
        matches!(
            self,
            ConversionIssueCode::NoGeometry | ConversionIssueCode::ZeroDimension
        )
    }

    pub fn is_unwritten_image(&self) -> bool {
        matches!(
            self,
            ConversionIssueCode::TransferFailed
                | ConversionIssueCode::UnsafeFileName
                | ConversionIssueCode::LabelCollision
        )
    }
}

/// Per-split preview produced without touching the filesystem.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SplitPlan {
    pub seed: u64,
    pub class_count: usize,
    pub class_names: Vec<String>,
    pub splits: Vec<SplitPlanEntry>,
    /// Images in the document with no annotation; never emitted.
    pub unannotated_images: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SplitPlanEntry {
    pub split: Option<Split>,
    pub images: usize,
    pub annotations: usize,
    pub polygon_annotations: usize,
    pub bbox_annotations: usize,
    pub no_geometry_annotations: usize,
}

impl SplitPlan {
    pub fn entry(&self, split: Split) -> Option<&SplitPlanEntry> {
        self.splits.iter().find(|e| e.split == Some(split))
    }
}

impl fmt::Display for SplitPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Classes ({}): {}", self.class_count, self.class_names.join(", "))?;
        writeln!(f, "Seed: {}", self.seed)?;
        for entry in &self.splits {
            let name = entry.split.map(|s| s.dir_name()).unwrap_or("?");
            writeln!(
                f,
                "  {:<5} {} image(s), {} annotation(s) [polygon={}, bbox={}, none={}]",
                name,
                entry.images,
                entry.annotations,
                entry.polygon_annotations,
                entry.bbox_annotations,
                entry.no_geometry_annotations
            )?;
        }
        if self.unannotated_images > 0 {
            writeln!(
                f,
                "  {} image(s) without annotations will not be emitted",
                self.unannotated_images
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_images_are_listed_with_bounded_preview() {
        let mut summary = ConversionSummary::new("out", 42);
        for i in 0..(PREVIEW_LIMIT as u64 + 3) {
            summary.record_missing(Split::Train, i, &format!("img_{i}.jpg"));
        }

        let text = summary.to_string();
        assert!(text.contains("Missing images (13)"));
        assert!(text.contains("img_0.jpg"));
        assert!(!text.contains("img_12.jpg"));
        assert!(text.contains("... and 3 more"));
        assert!(!summary.is_complete());
    }

    #[test]
    fn skipped_annotation_codes() {
        assert!(ConversionIssueCode::NoGeometry.is_skipped_annotation());
        assert!(ConversionIssueCode::ZeroDimension.is_skipped_annotation());
        assert!(!ConversionIssueCode::MissingAsset.is_skipped_annotation());
        assert!(!ConversionIssueCode::TransferFailed.is_skipped_annotation());
        assert!(ConversionIssueCode::UnsafeFileName.is_unwritten_image());
        assert!(ConversionIssueCode::LabelCollision.is_unwritten_image());
        assert!(!ConversionIssueCode::MissingAsset.is_unwritten_image());
    }

    #[test]
    fn unwritten_images_are_listed() {
        let mut summary = ConversionSummary::new("out", 1);
        summary.record_unwritten(
            ConversionIssueCode::LabelCollision,
            Split::Train,
            2,
            "image 2 (a.png): label a.txt already written for another image",
        );

        let text = summary.to_string();
        assert!(text.contains("Images not written (1):"));
        assert!(text.contains("a.png"));
        assert_eq!(summary.unwritten_image_count(), 1);
        assert_eq!(summary.skipped_annotation_count(), 0);
        assert!(!summary.is_complete());
    }

    #[test]
    fn summary_serializes_counts_and_issues() {
        let mut summary = ConversionSummary::new("out", 7);
        summary.set_split_count(Split::Train, 3);
        summary.set_split_count(Split::Valid, 1);
        summary.add(ConversionIssue::skipped_annotation(
            ConversionIssueCode::NoGeometry,
            Split::Valid,
            4,
            11,
            "annotation 11 on image 4 has no geometry",
        ));

        let json = serde_json::to_value(&summary).expect("serialize summary");
        assert_eq!(json["train_count"], 3);
        assert_eq!(json["val_count"], 1);
        assert_eq!(json["issues"][0]["code"], "NoGeometry");
        assert_eq!(json["issues"][0]["split"], "valid");
        assert_eq!(summary.assigned_total(), 4);
        assert_eq!(summary.skipped_annotation_count(), 1);
    }
}
