#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// A minimal uncompressed 24-bit BMP; enough for header-based size probes.
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

const EMPTY_FEATURES: &str = r#"{"type": "FeatureCollection", "features": []}"#;

/// Writes `<stem>.bmp` and `<stem>_labels.geojson` under `dir`.
pub fn write_sample(dir: &Path, stem: &str, width: u32, height: u32) {
    write_bmp(&dir.join(format!("{stem}.bmp")), width, height);
    fs::write(dir.join(format!("{stem}_labels.geojson")), EMPTY_FEATURES)
        .expect("write label file");
}

/// Writes a manifest listing `(stem, split)` samples written by
/// [`write_sample`]. An empty split leaves the column blank.
pub fn write_manifest(dir: &Path, samples: &[(&str, &str)]) -> std::path::PathBuf {
    let mut csv = String::from("image,label,split\n");
    for (stem, split) in samples {
        csv.push_str(&format!("{stem}.bmp,{stem}_labels.geojson,{split}\n"));
    }
    let path = dir.join("pairs.csv");
    fs::write(&path, csv).expect("write manifest");
    path
}
