//! Collection extents and the aggregation that computes them.
//!
//! An [`Extent`] starts as a placeholder (unbounded spatially, open-ended in
//! time) and is recomputed from the items under a collection when the
//! catalog is finalized. Aggregation is a pure function of its inputs: the
//! "current time" used for open-ended intervals is passed in as an anchor,
//! so recomputing over the same items always yields the same extent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bbox::BBox;
use super::geometry::Geometry;
use super::node::ItemData;

/// Spatial and temporal envelope of a collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
}

impl Extent {
    /// The placeholder extent a collection carries until it is finalized.
    pub fn placeholder(anchor: DateTime<Utc>) -> Self {
        Self {
            spatial: SpatialExtent::unbounded(),
            temporal: TemporalExtent::open_from(anchor),
        }
    }
}

/// Spatial envelope. `None` is the unbounded sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpatialExtent {
    pub bbox: Option<BBox>,
}

impl SpatialExtent {
    /// The sentinel used before any item is known.
    pub fn unbounded() -> Self {
        Self { bbox: None }
    }

    pub fn bounded(bbox: BBox) -> Self {
        Self { bbox: Some(bbox) }
    }

    pub fn is_unbounded(&self) -> bool {
        self.bbox.is_none()
    }

    /// Returns true if the envelope covers `bbox`. The unbounded sentinel
    /// covers nothing, since it has not been computed yet.
    pub fn covers(&self, bbox: &BBox) -> bool {
        self.bbox.is_some_and(|own| own.contains(bbox))
    }
}

/// Temporal envelope: `[start, end]`, either side may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TemporalExtent {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TemporalExtent {
    /// An interval starting at `anchor` with no end.
    pub fn open_from(anchor: DateTime<Utc>) -> Self {
        Self {
            start: Some(anchor),
            end: None,
        }
    }
}

/// Computes the minimal box enclosing every geometry.
///
/// Geometries without positions are ignored. No input (or no positions)
/// yields the unbounded sentinel.
pub fn aggregate_spatial<'a, I>(geometries: I) -> SpatialExtent
where
    I: IntoIterator<Item = &'a Geometry>,
{
    let bbox = geometries
        .into_iter()
        .filter_map(Geometry::bounds)
        .reduce(|acc, b| acc.union(&b));
    SpatialExtent { bbox }
}

/// Computes the min/max timestamp. With no timestamps at all the interval
/// is open-ended, anchored at `anchor`.
pub fn aggregate_temporal<I>(datetimes: I, anchor: DateTime<Utc>) -> TemporalExtent
where
    I: IntoIterator<Item = Option<DateTime<Utc>>>,
{
    let mut bounds: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    for dt in datetimes.into_iter().flatten() {
        bounds = Some(match bounds {
            None => (dt, dt),
            Some((lo, hi)) => (lo.min(dt), hi.max(dt)),
        });
    }

    match bounds {
        Some((start, end)) => TemporalExtent {
            start: Some(start),
            end: Some(end),
        },
        None => TemporalExtent::open_from(anchor),
    }
}

/// Computes the full extent of a set of items.
///
/// Each item contributes the union of its geometry bounds and its declared
/// bbox, so the result is never narrower than either.
pub fn aggregate<'a, I>(items: I, anchor: DateTime<Utc>) -> Extent
where
    I: IntoIterator<Item = &'a ItemData>,
{
    let mut bbox: Option<BBox> = None;
    let mut datetimes = Vec::new();

    for item in items {
        let footprint = item.footprint();
        bbox = Some(match bbox {
            None => footprint,
            Some(acc) => acc.union(&footprint),
        });
        datetimes.push(item.datetime);
    }

    Extent {
        spatial: SpatialExtent { bbox },
        temporal: aggregate_temporal(datetimes, anchor),
    }
}

// ============================================================================
// STAC wire shape
// ============================================================================

#[derive(Serialize, Deserialize)]
struct SpatialDoc {
    bbox: Vec<BBox>,
}

/// Written in place of the unbounded sentinel, since a collection's spatial
/// extent must hold at least one box.
pub const WORLD_BBOX: [f64; 4] = [-180.0, -90.0, 180.0, 90.0];

impl Serialize for SpatialExtent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let [xmin, ymin, xmax, ymax] = WORLD_BBOX;
        SpatialDoc {
            bbox: vec![self
                .bbox
                .unwrap_or_else(|| BBox::from_xyxy(xmin, ymin, xmax, ymax))],
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SpatialExtent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The first box is the overall envelope; any further ones are sub-regions.
        // An empty list is read as unbounded.
        let doc = SpatialDoc::deserialize(deserializer)?;
        Ok(SpatialExtent {
            bbox: doc.bbox.into_iter().next(),
        })
    }
}

#[derive(Serialize, Deserialize)]
struct TemporalDoc {
    interval: Vec<[Option<DateTime<Utc>>; 2]>,
}

impl Serialize for TemporalExtent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TemporalDoc {
            interval: vec![[self.start, self.end]],
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TemporalExtent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = TemporalDoc::deserialize(deserializer)?;
        let [start, end] = doc.interval.into_iter().next().unwrap_or([None, None]);
        Ok(TemporalExtent { start, end })
    }
}
