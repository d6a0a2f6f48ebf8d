#![allow(dead_code)]

use std::collections::BTreeSet;

use mlstac::factory::{PairInput, StaticBBoxProvider};
use mlstac::model::{BBox, Split};
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

/// A generated sample: stem, bounds and optional split.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleCase {
    pub stem: String,
    pub bbox: BBox,
    pub split: Option<Split>,
}

impl SampleCase {
    pub fn image_ref(&self) -> String {
        format!("{}.tif", self.stem)
    }

    pub fn label_ref(&self) -> String {
        format!("{}_labels.geojson", self.stem)
    }

    pub fn input(&self) -> PairInput {
        let input = PairInput::new(self.image_ref(), self.label_ref());
        match self.split {
            Some(split) => input.with_split(split),
            None => input,
        }
    }
}

pub fn arb_bbox() -> impl Strategy<Value = BBox> {
    (-180.0f64..180.0, -90.0f64..90.0, 0.0f64..10.0, 0.0f64..10.0)
        .prop_map(|(x, y, w, h)| BBox::from_xyxy(x, y, x + w, y + h))
}

pub fn arb_split() -> impl Strategy<Value = Option<Split>> {
    prop_oneof![
        Just(None),
        Just(Some(Split::Train)),
        Just(Some(Split::Test)),
    ]
}

/// Samples with pairwise distinct stems. Stems never shadow the split
/// sub-catalog names.
pub fn arb_samples(max: usize) -> impl Strategy<Value = Vec<SampleCase>> {
    prop::collection::vec(("[a-z][a-z0-9_]{0,7}", arb_bbox(), arb_split()), 0..=max).prop_map(
        |raw| {
            let mut seen = BTreeSet::new();
            raw.into_iter()
                .filter(|(stem, _, _)| stem != "train" && stem != "test")
                .filter(|(stem, _, _)| seen.insert(stem.clone()))
                .map(|(stem, bbox, split)| SampleCase { stem, bbox, split })
                .collect()
        },
    )
}

/// A provider answering for every sample's image reference.
pub fn provider_for(samples: &[SampleCase]) -> StaticBBoxProvider {
    samples.iter().map(|s| (s.image_ref(), s.bbox)).collect()
}
