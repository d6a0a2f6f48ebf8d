//! GeoJSON geometries carried by items.

use serde::{Deserialize, Serialize};

use super::bbox::BBox;

/// A GeoJSON position: `[x, y]` (any trailing elevation is dropped on read).
pub type Position = [f64; 2];

/// The subset of GeoJSON geometry types a sample footprint can take.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        #[serde(with = "position")]
        coordinates: Position,
    },
    Polygon {
        #[serde(with = "rings")]
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        #[serde(with = "polygons")]
        coordinates: Vec<Vec<Vec<Position>>>,
    },
}

impl Geometry {
    /// The closed rectangular polygon covering `bbox`, counter-clockwise
    /// from the lower-left corner.
    pub fn from_bbox(bbox: &BBox) -> Self {
        let ring = vec![
            [bbox.xmin, bbox.ymin],
            [bbox.xmax, bbox.ymin],
            [bbox.xmax, bbox.ymax],
            [bbox.xmin, bbox.ymax],
            [bbox.xmin, bbox.ymin],
        ];
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    /// Iterates over every position in the geometry.
    pub fn positions(&self) -> Box<dyn Iterator<Item = &Position> + '_> {
        match self {
            Geometry::Point { coordinates } => Box::new(std::iter::once(coordinates)),
            Geometry::Polygon { coordinates } => Box::new(coordinates.iter().flatten()),
            Geometry::MultiPolygon { coordinates } => {
                Box::new(coordinates.iter().flatten().flatten())
            }
        }
    }

    /// The axis-aligned bounds of the geometry, or `None` if it has no
    /// positions.
    pub fn bounds(&self) -> Option<BBox> {
        let mut positions = self.positions();
        let first = positions.next()?;
        let mut bounds = BBox::point(first[0], first[1]);
        for p in positions {
            bounds.expand_to(p[0], p[1]);
        }
        Some(bounds)
    }
}

// GeoJSON allows 3D positions; the catalog only tracks two axes.
mod position {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Position;

    pub fn serialize<S: Serializer>(p: &Position, s: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(p, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Position, D::Error> {
        let raw = Vec::<f64>::deserialize(d)?;
        to_position(&raw).ok_or_else(|| serde::de::Error::custom("position needs 2 or 3 numbers"))
    }

    pub(super) fn to_position(raw: &[f64]) -> Option<Position> {
        match *raw {
            [x, y] | [x, y, _] => Some([x, y]),
            _ => None,
        }
    }
}

mod rings {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::position::to_position;
    use super::Position;

    pub fn serialize<S: Serializer>(r: &Vec<Vec<Position>>, s: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(r, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<Position>>, D::Error> {
        let raw = Vec::<Vec<Vec<f64>>>::deserialize(d)?;
        convert(raw).ok_or_else(|| serde::de::Error::custom("position needs 2 or 3 numbers"))
    }

    pub(super) fn convert(raw: Vec<Vec<Vec<f64>>>) -> Option<Vec<Vec<Position>>> {
        raw.iter()
            .map(|ring| ring.iter().map(|p| to_position(p)).collect())
            .collect()
    }
}

mod polygons {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Position;

    pub fn serialize<S: Serializer>(
        p: &Vec<Vec<Vec<Position>>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(p, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Vec<Vec<Vec<Position>>>, D::Error> {
        let raw = Vec::<Vec<Vec<Vec<f64>>>>::deserialize(d)?;
        raw.into_iter()
            .map(super::rings::convert)
            .collect::<Option<_>>()
            .ok_or_else(|| serde::de::Error::custom("position needs 2 or 3 numbers"))
    }
}
