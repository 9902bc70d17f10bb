//! Geometry normalization: one COCO annotation to one YOLO label line.
//!
//! Segmentation wins over the bounding box. Polygons are used when the
//! annotation is not a crowd region and carries at least one point; every
//! polygon of the instance lands on the same line. Otherwise the bbox is
//! converted to center format. Annotations with neither produce no line.
//!
//! Output is not clamped to `[0, 1]`.

use crate::error::ConfigError;
use crate::ir::io_yolo::LabelLine;
use crate::ir::{Annotation, Image};

/// Which geometry a label line was produced from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometrySource {
    Polygon,
    BBox,
}

/// Converts one annotation for an image of `image.width` x `image.height`.
///
/// Returns `Ok(None)` when the annotation has no usable geometry; callers
/// record that and move on.
///
/// # Errors
/// [`ConfigError::ZeroImageDimension`] when either dimension is zero, so
/// no `NaN`/`inf` value can reach a label file.
pub fn normalize_annotation(
    annotation: &Annotation,
    image: &Image,
    class_index: usize,
) -> Result<Option<LabelLine>, ConfigError> {
    if image.width == 0 || image.height == 0 {
        return Err(ConfigError::ZeroImageDimension {
            image: image.id,
            width: image.width,
            height: image.height,
        });
    }

    let width = image.width as f64;
    let height = image.height as f64;

    if let Some(polygons) = annotation.usable_polygons() {
        let points = polygons
            .iter()
            .flat_map(|polygon| polygon.points.iter())
            .map(|point| point.normalize(width, height))
            .collect();
        return Ok(Some(LabelLine::Polygon {
            class_index,
            points,
        }));
    }

    Ok(annotation.bbox.map(|bbox| LabelLine::Box {
        class_index,
        bbox: bbox.to_normalized(width, height),
    }))
}

/// Geometry that [`normalize_annotation`] would pick, without converting.
pub fn geometry_source(annotation: &Annotation) -> Option<GeometrySource> {
    if annotation.usable_polygons().is_some() {
        Some(GeometrySource::Polygon)
    } else if annotation.bbox.is_some() {
        Some(GeometrySource::BBox)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ImageId;

    fn numbers(line: &LabelLine) -> Vec<f64> {
        line.to_string()
            .split_whitespace()
            .map(|tok| tok.parse::<f64>().expect("numeric token"))
            .collect()
    }

    #[test]
    fn full_image_box_normalizes_to_unit_center() {
        let image = Image::new(1u64, "a.jpg", 640, 480);
        let ann = Annotation::new(1u64, 1u64, 1u64).with_bbox(0.0, 0.0, 640.0, 480.0);

        let line = normalize_annotation(&ann, &image, 3)
            .expect("valid image")
            .expect("bbox present");
        assert_eq!(numbers(&line), vec![3.0, 0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn full_image_quad_normalizes_to_unit_square() {
        let image = Image::new(1u64, "a.jpg", 200, 100);
        let ann = Annotation::new(1u64, 1u64, 1u64).with_polygons(vec![vec![
            0.0, 0.0, 200.0, 0.0, 200.0, 100.0, 0.0, 100.0,
        ]]);

        let line = normalize_annotation(&ann, &image, 0)
            .expect("valid image")
            .expect("polygon present");
        assert_eq!(
            numbers(&line),
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn multi_part_polygons_share_one_line() {
        let image = Image::new(1u64, "a.jpg", 10, 10);
        let ann = Annotation::new(1u64, 1u64, 1u64).with_polygons(vec![
            vec![0.0, 0.0, 5.0, 0.0, 5.0, 5.0],
            vec![6.0, 6.0, 10.0, 6.0, 10.0, 10.0],
        ]);

        let line = normalize_annotation(&ann, &image, 1)
            .expect("valid image")
            .expect("polygon present");
        match &line {
            LabelLine::Polygon { points, .. } => assert_eq!(points.len(), 6),
            other => panic!("expected polygon line, got {:?}", other),
        }
        assert_eq!(numbers(&line).len(), 13);
    }

    #[test]
    fn crowd_annotation_falls_back_to_bbox() {
        let image = Image::new(1u64, "a.jpg", 100, 100);
        let ann = Annotation::new(1u64, 1u64, 1u64)
            .with_polygons(vec![vec![0.0, 0.0, 100.0, 0.0, 100.0, 100.0]])
            .with_bbox(0.0, 0.0, 50.0, 50.0)
            .crowd();

        assert_eq!(geometry_source(&ann), Some(GeometrySource::BBox));
        let line = normalize_annotation(&ann, &image, 0)
            .expect("valid image")
            .expect("bbox present");
        assert!(matches!(line, LabelLine::Box { .. }));
        assert_eq!(numbers(&line), vec![0.0, 0.25, 0.25, 0.5, 0.5]);
    }

    #[test]
    fn rle_without_bbox_yields_no_line() {
        let image = Image::new(1u64, "a.jpg", 100, 100);
        let ann = Annotation::new(1u64, 1u64, 1u64).with_rle();

        assert_eq!(geometry_source(&ann), None);
        assert_eq!(normalize_annotation(&ann, &image, 0), Ok(None));
    }

    #[test]
    fn zero_dimension_is_a_config_error() {
        let image = Image::new(5u64, "a.jpg", 0, 100);
        let ann = Annotation::new(1u64, 5u64, 1u64).with_bbox(0.0, 0.0, 1.0, 1.0);

        let err = normalize_annotation(&ann, &image, 0).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ZeroImageDimension {
                image: ImageId(5),
                width: 0,
                height: 100,
            }
        );
    }

    #[test]
    fn out_of_frame_values_pass_through() {
        let image = Image::new(1u64, "a.jpg", 100, 100);
        let ann = Annotation::new(1u64, 1u64, 1u64).with_bbox(-10.0, 90.0, 20.0, 20.0);

        let line = normalize_annotation(&ann, &image, 0)
            .expect("valid image")
            .expect("bbox present");
        let values = numbers(&line);
        assert!((values[1] - 0.0).abs() < 1e-9);
        assert!(values[2] > 0.99);
        assert!(values[2] + values[4] / 2.0 > 1.0);
    }
}
