#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// A COCO document with `image_count` 8x8 images named `img_<id>.bmp`,
/// two categories and one full-image box per image.
pub fn boxes_document(image_count: u64) -> Value {
    let images: Vec<Value> = (1..=image_count)
        .map(|id| json!({"id": id, "file_name": format!("img_{id}.bmp"), "width": 8, "height": 8}))
        .collect();
    let annotations: Vec<Value> = (1..=image_count)
        .map(|id| {
            json!({
                "id": id,
                "image_id": id,
                "category_id": if id % 2 == 0 { 2 } else { 1 },
                "bbox": [0.0, 0.0, 8.0, 8.0],
                "iscrowd": 0
            })
        })
        .collect();

    json!({
        "images": images,
        "annotations": annotations,
        "categories": [
            {"id": 1, "name": "cat", "supercategory": "animal"},
            {"id": 2, "name": "dog", "supercategory": "animal"}
        ]
    })
}

pub fn write_json(path: &Path, document: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let text = serde_json::to_string_pretty(document).expect("serialize document");
    fs::write(path, text).expect("write json file");
}

/// Writes an 8x8 bitmap for every image listed in `document`.
pub fn write_images_for(document: &Value, image_dir: &Path) {
    for image in document["images"].as_array().expect("images array") {
        let file_name = image["file_name"].as_str().expect("file_name");
        write_bmp(&image_dir.join(file_name), 8, 8);
    }
}

/// Sorted file names directly under `dir`; empty when `dir` does not exist.
pub fn file_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| {
            entry
                .expect("read dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

pub fn split_dir(root: &Path, split: &str, kind: &str) -> PathBuf {
    root.join(split).join(kind)
}
