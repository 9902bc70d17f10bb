//! Criterion microbenches for the in-memory conversion stages.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure:
//! - COCO JSON parsing (from_coco_str, from_coco_slice)
//! - index construction (CocoIndex::build)
//! - geometry normalization and label rendering
//! - seeded split partitioning

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::hint::black_box;

use coco2yolo::index::CocoIndex;
use coco2yolo::ir::io_coco_json::{from_coco_slice, from_coco_str};
use coco2yolo::ir::io_yolo::render_label_file;
use coco2yolo::ir::ImageId;
use coco2yolo::normalize::normalize_annotation;
use coco2yolo::split::{partition_image_ids, SplitRatios};

const IMAGE_COUNT: u64 = 500;
const ANNOTATIONS_PER_IMAGE: u64 = 8;

/// Synthetic document: half box-only annotations, half 12-point polygons.
fn coco_fixture() -> String {
    let images: Vec<_> = (1..=IMAGE_COUNT)
        .map(|id| {
            serde_json::json!({
                "id": id,
                "file_name": format!("{id:06}.jpg"),
                "width": 640,
                "height": 480
            })
        })
        .collect();

    let mut annotations = Vec::new();
    for image_id in 1..=IMAGE_COUNT {
        for k in 0..ANNOTATIONS_PER_IMAGE {
            let id = image_id * ANNOTATIONS_PER_IMAGE + k;
            let x = (k * 40) as f64;
            let mut ann = serde_json::json!({
                "id": id,
                "image_id": image_id,
                "category_id": k % 4 + 1,
                "bbox": [x, 20.0, 60.0, 80.0],
                "iscrowd": 0
            });
            if k % 2 == 0 {
                let ring: Vec<f64> = (0..6)
                    .flat_map(|p| [x + (p * 10) as f64, 20.0 + ((p * 37) % 80) as f64])
                    .collect();
                ann["segmentation"] = serde_json::json!([ring]);
            }
            annotations.push(ann);
        }
    }

    serde_json::json!({
        "images": images,
        "annotations": annotations,
        "categories": [
            {"id": 1, "name": "person"},
            {"id": 2, "name": "car"},
            {"id": 3, "name": "dog"},
            {"id": 4, "name": "cat"}
        ]
    })
    .to_string()
}

fn bench_coco_parse(c: &mut Criterion) {
    let fixture = coco_fixture();
    let mut group = c.benchmark_group("coco_parse");
    group.throughput(Throughput::Bytes(fixture.len() as u64));

    group.bench_function("from_coco_str", |b| {
        b.iter(|| {
            let ds = from_coco_str(black_box(&fixture)).unwrap();
            black_box(ds)
        })
    });

    group.bench_function("from_coco_slice", |b| {
        b.iter(|| {
            let ds = from_coco_slice(black_box(fixture.as_bytes())).unwrap();
            black_box(ds)
        })
    });

    group.finish();
}

fn bench_index_build(c: &mut Criterion) {
    let dataset = from_coco_str(&coco_fixture()).expect("parse fixture");
    let mut group = c.benchmark_group("index");
    group.throughput(Throughput::Elements(dataset.annotations.len() as u64));

    group.bench_function("CocoIndex::build", |b| {
        b.iter_batched(
            || dataset.clone(),
            |ds| black_box(CocoIndex::build(ds).unwrap()),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

/// Normalizes and renders every label file of the fixture.
fn bench_normalize(c: &mut Criterion) {
    let index = CocoIndex::build(from_coco_str(&coco_fixture()).expect("parse fixture"))
        .expect("index fixture");
    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Elements(index.annotations.annotation_count() as u64));

    group.bench_function("label_files", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            for id in index.annotations.annotated_image_ids() {
                let image = index.images.get(*id).unwrap();
                let lines: Vec<_> = index
                    .annotations
                    .for_image(*id)
                    .iter()
                    .filter_map(|ann| {
                        let class_index = index.class_index_of(ann)?;
                        normalize_annotation(ann, image, class_index).ok().flatten()
                    })
                    .collect();
                bytes += render_label_file(&lines).len();
            }
            black_box(bytes)
        })
    });

    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let ids: Vec<ImageId> = (1..=10_000).map(ImageId::new).collect();
    let ratios = SplitRatios::new(0.7, 0.2, 0.1).unwrap();
    let mut group = c.benchmark_group("split");
    group.throughput(Throughput::Elements(ids.len() as u64));

    group.bench_function("partition_image_ids", |b| {
        b.iter(|| black_box(partition_image_ids(black_box(&ids), ratios, 42)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_coco_parse,
    bench_index_build,
    bench_normalize,
    bench_partition,
);
criterion_main!(benches);
