//! Fuzz target for COCO JSON parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse
//!
//! Or with a corpus:
//!   cargo +nightly fuzz run coco_json_parse fuzz/corpus/coco_json_parse/

#![no_main]

use coco2yolo::ir::io_coco_json::fuzz_parse_coco;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 10MB cap keeps libFuzzer away from OOM.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_parse_coco(data);
});
