//! Pair manifests.
//!
//! A manifest is a CSV file listing one sample per row:
//!
//! ```text
//! image,label,split,xmin,ymin,xmax,ymax
//! RGB_img205.tif,buildings_img205.geojson,train,,,,
//! RGB_img25.tif,buildings_img25.geojson,test,0,0,650,650
//! ```
//!
//! `split` and the four bbox columns are optional. A row that fills all four
//! bbox columns bypasses the bbox provider; rows with an empty split can be
//! assigned with [`assign_splits`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use tracing::debug;

use crate::error::CatalogError;
use crate::factory::PairInput;
use crate::model::{BBox, Split};

/// A single manifest row as written on disk.
#[derive(Debug, Deserialize)]
struct ManifestRow {
    image: String,
    label: String,
    #[serde(default)]
    split: Option<String>,
    #[serde(default)]
    xmin: Option<f64>,
    #[serde(default)]
    ymin: Option<f64>,
    #[serde(default)]
    xmax: Option<f64>,
    #[serde(default)]
    ymax: Option<f64>,
}

/// Reads a manifest file.
///
/// # Errors
/// Returns [`CatalogError::ManifestParse`] for malformed CSV and
/// [`CatalogError::ManifestInvalid`] for rows with empty references, an
/// unknown split, or a partial bbox.
pub fn read_manifest(path: &Path) -> Result<Vec<PairInput>, CatalogError> {
    let file = File::open(path).map_err(CatalogError::Io)?;
    parse_manifest(BufReader::new(file), path)
}

/// Reads a manifest from a string.
///
/// Useful for testing without file I/O.
pub fn from_manifest_str(csv_str: &str) -> Result<Vec<PairInput>, CatalogError> {
    from_manifest_slice(csv_str.as_bytes())
}

/// Reads a manifest from raw bytes.
pub fn from_manifest_slice(bytes: &[u8]) -> Result<Vec<PairInput>, CatalogError> {
    parse_manifest(bytes, Path::new("<bytes>"))
}

fn parse_manifest<R: Read>(reader: R, path: &Path) -> Result<Vec<PairInput>, CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut pairs = Vec::new();

    for (index, result) in csv_reader.deserialize().enumerate() {
        let row: ManifestRow = result.map_err(|source| CatalogError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;
        // Header is line 1.
        pairs.push(row_to_pair(row, index + 2, path)?);
    }

    debug!(rows = pairs.len(), path = %path.display(), "read manifest");
    Ok(pairs)
}

fn row_to_pair(row: ManifestRow, line: usize, path: &Path) -> Result<PairInput, CatalogError> {
    let invalid = |message: String| CatalogError::ManifestInvalid {
        path: path.to_path_buf(),
        message: format!("line {}: {}", line, message),
    };

    if row.image.is_empty() || row.label.is_empty() {
        return Err(invalid("image and label references are required".to_string()));
    }

    let mut pair = PairInput::new(row.image, row.label);

    if let Some(split) = row.split.as_deref().filter(|s| !s.is_empty()) {
        pair = pair.with_split(split.parse::<Split>().map_err(invalid)?);
    }

    match (row.xmin, row.ymin, row.xmax, row.ymax) {
        (Some(xmin), Some(ymin), Some(xmax), Some(ymax)) => {
            let bbox = BBox::from_xyxy(xmin, ymin, xmax, ymax);
            if !bbox.is_ordered() {
                return Err(invalid(format!("bbox {} has min greater than max", bbox)));
            }
            pair = pair.with_bbox(bbox);
        }
        (None, None, None, None) => {}
        _ => {
            return Err(invalid(
                "bbox needs all of xmin, ymin, xmax, ymax or none".to_string(),
            ))
        }
    }

    Ok(pair)
}

/// Assigns a split to every pair that has none.
///
/// Unassigned pairs are shuffled and the first `round(n * test_fraction)`
/// become test pairs, the rest train pairs. With a seed the assignment is
/// reproducible. Pairs that already carry a split are left alone.
///
/// # Errors
/// Returns [`CatalogError::InvalidSplitParams`] if `test_fraction` is not
/// within `[0, 1]`.
pub fn assign_splits(
    pairs: &mut [PairInput],
    test_fraction: f64,
    seed: Option<u64>,
) -> Result<(), CatalogError> {
    if !(0.0..=1.0).contains(&test_fraction) {
        return Err(CatalogError::InvalidSplitParams {
            message: format!("test fraction must be within [0, 1], got {}", test_fraction),
        });
    }

    let mut unassigned: Vec<usize> = pairs
        .iter()
        .enumerate()
        .filter(|(_, pair)| pair.split.is_none())
        .map(|(index, _)| index)
        .collect();

    if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        unassigned.shuffle(&mut rng);
    } else {
        let mut rng = rand::rng();
        unassigned.shuffle(&mut rng);
    }

    let test_count = (unassigned.len() as f64 * test_fraction).round() as usize;
    for (position, index) in unassigned.into_iter().enumerate() {
        pairs[index].split = Some(if position < test_count {
            Split::Test
        } else {
            Split::Train
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_manifest_has_no_split_or_bbox() {
        let pairs = from_manifest_str("image,label\na.tif,a.geojson\n").unwrap();
        assert_eq!(pairs, vec![PairInput::new("a.tif", "a.geojson")]);
    }

    #[test]
    fn full_row_carries_split_and_bbox() {
        let csv = "image,label,split,xmin,ymin,xmax,ymax\n\
                   a.tif,a.geojson,train,,,,\n\
                   b.tif, b.geojson ,Testing,0,0,650,650\n";
        let pairs = from_manifest_str(csv).unwrap();
        assert_eq!(pairs[0].split, Some(Split::Train));
        assert_eq!(pairs[0].bbox, None);
        assert_eq!(pairs[1].label_ref, "b.geojson");
        assert_eq!(pairs[1].split, Some(Split::Test));
        assert_eq!(pairs[1].bbox, Some(BBox::from_xyxy(0.0, 0.0, 650.0, 650.0)));
    }

    #[test]
    fn partial_bbox_is_invalid() {
        let csv = "image,label,xmin,ymin,xmax,ymax\na.tif,a.geojson,0,0,,\n";
        let err = from_manifest_str(csv).unwrap_err();
        assert!(
            matches!(err, CatalogError::ManifestInvalid { ref message, .. } if message.starts_with("line 2"))
        );
    }

    #[test]
    fn unknown_split_is_invalid() {
        let err = from_manifest_str("image,label,split\na.tif,a.geojson,holdout\n").unwrap_err();
        assert!(matches!(err, CatalogError::ManifestInvalid { .. }));
    }

    #[test]
    fn missing_label_column_is_parse_error() {
        let err = from_manifest_str("image\na.tif\n").unwrap_err();
        assert!(matches!(err, CatalogError::ManifestParse { .. }));
    }

    fn unassigned(n: usize) -> Vec<PairInput> {
        (0..n)
            .map(|i| PairInput::new(format!("{i}.tif"), format!("{i}.geojson")))
            .collect()
    }

    #[test]
    fn seeded_assignment_is_reproducible() {
        let mut a = unassigned(10);
        let mut b = unassigned(10);
        assign_splits(&mut a, 0.3, Some(7)).unwrap();
        assign_splits(&mut b, 0.3, Some(7)).unwrap();
        assert_eq!(a, b);

        let tests = a.iter().filter(|p| p.split == Some(Split::Test)).count();
        assert_eq!(tests, 3);
        assert!(a.iter().all(|p| p.split.is_some()));
    }

    #[test]
    fn assigned_pairs_are_left_alone() {
        let mut pairs = unassigned(4);
        pairs[0].split = Some(Split::Train);
        assign_splits(&mut pairs, 1.0, Some(1)).unwrap();
        assert_eq!(pairs[0].split, Some(Split::Train));
        assert!(pairs[1..].iter().all(|p| p.split == Some(Split::Test)));
    }

    #[test]
    fn fraction_out_of_range_is_rejected() {
        let mut pairs = unassigned(2);
        assert!(matches!(
            assign_splits(&mut pairs, 1.5, None),
            Err(CatalogError::InvalidSplitParams { .. })
        ));
        assert!(assign_splits(&mut pairs, f64::NAN, None).is_err());
    }
}
