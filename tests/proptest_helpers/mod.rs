#![allow(dead_code)]

use coco2yolo::ir::ImageId;
use coco2yolo::split::SplitRatios;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Ratios on a 1% grid: two cut points over `[0, 100]`.
pub fn arb_ratios() -> impl Strategy<Value = SplitRatios> {
    (0u32..=100, 0u32..=100).prop_map(|(a, b)| {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let train = low as f64 / 100.0;
        let val = (high - low) as f64 / 100.0;
        let test = (100 - high) as f64 / 100.0;
        SplitRatios::new(train, val, test).expect("grid ratios sum to one")
    })
}

/// Distinct image ids in arbitrary order.
pub fn arb_image_ids(max_len: usize) -> impl Strategy<Value = Vec<ImageId>> {
    prop::collection::hash_set(1u64..100_000, 0..=max_len)
        .prop_map(|set| set.into_iter().map(ImageId::new).collect::<Vec<_>>())
        .prop_shuffle()
}

/// Image size plus a pixel box that lies fully inside it.
pub fn arb_box_in_image() -> impl Strategy<Value = (u32, u32, [f64; 4])> {
    (1u32..=4096, 1u32..=4096)
        .prop_flat_map(|(w, h)| {
            let wf = w as f64;
            let hf = h as f64;
            (
                Just(w),
                Just(h),
                0.0..=wf,
                0.0..=hf,
                0.0f64..=1.0,
                0.0f64..=1.0,
            )
        })
        .prop_map(|(w, h, x, y, fw, fh)| {
            let bw = (w as f64 - x) * fw;
            let bh = (h as f64 - y) * fh;
            (w, h, [x, y, bw, bh])
        })
}
