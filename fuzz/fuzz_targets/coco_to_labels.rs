//! Fuzz target for the in-memory half of a conversion: parse, index,
//! partition and normalize every annotation. Nothing touches the disk.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_to_labels

#![no_main]

use coco2yolo::index::CocoIndex;
use coco2yolo::ir::io_coco_json::from_coco_slice;
use coco2yolo::normalize::normalize_annotation;
use coco2yolo::split::{partition_image_ids, SplitRatios};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(dataset) = from_coco_slice(data) else {
        return;
    };
    let Ok(index) = CocoIndex::build(dataset) else {
        return;
    };
    let Ok(ratios) = SplitRatios::new(0.7, 0.2, 0.1) else {
        return;
    };

    let assignment = partition_image_ids(index.annotations.annotated_image_ids(), ratios, 0);
    assert_eq!(
        assignment.total(),
        index.annotations.annotated_image_ids().len()
    );

    for id in index.annotations.annotated_image_ids() {
        let Some(image) = index.images.get(*id) else {
            continue;
        };
        for annotation in index.annotations.for_image(*id) {
            if let Some(class_index) = index.class_index_of(annotation) {
                if let Ok(Some(line)) = normalize_annotation(annotation, image, class_index) {
                    let _ = line.to_string();
                }
            }
        }
    }
});
