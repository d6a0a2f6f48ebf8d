//! Axis-aligned bounding boxes in the catalog's coordinate reference.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box (xmin, ymin, xmax, ymax).
///
/// Serializes as the four-element array STAC uses for `bbox`. Like the rest
/// of the model this type does NOT enforce `min <= max`; callers that need
/// a well-formed box should check [`BBox::is_ordered`].
#[derive(Clone, Copy, PartialEq)]
pub struct BBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BBox {
    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Creates a bounding box from a STAC-style slice.
    ///
    /// Accepts 4 values (2D) or 6 values (3D, elevation is dropped).
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match *values {
            [xmin, ymin, xmax, ymax] => Some(Self::from_xyxy(xmin, ymin, xmax, ymax)),
            [xmin, ymin, _, xmax, ymax, _] => Some(Self::from_xyxy(xmin, ymin, xmax, ymax)),
            _ => None,
        }
    }

    /// A degenerate box covering a single point.
    #[inline]
    pub fn point(x: f64, y: f64) -> Self {
        Self::from_xyxy(x, y, x, y)
    }

    /// Returns the coordinates as `[xmin, ymin, xmax, ymax]`.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }

    /// Returns the width of the bounding box.
    ///
    /// May be negative if the box is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Returns the height of the bounding box.
    ///
    /// May be negative if the box is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }

    /// Returns true if the box is properly ordered (min <= max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }

    /// The smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::from_xyxy(
            self.xmin.min(other.xmin),
            self.ymin.min(other.ymin),
            self.xmax.max(other.xmax),
            self.ymax.max(other.ymax),
        )
    }

    /// Returns true if `other` lies entirely within `self` (edges inclusive).
    pub fn contains(&self, other: &BBox) -> bool {
        self.xmin <= other.xmin
            && self.ymin <= other.ymin
            && self.xmax >= other.xmax
            && self.ymax >= other.ymax
    }

    /// Extends the box to cover the point `(x, y)`.
    pub fn expand_to(&mut self, x: f64, y: f64) {
        self.xmin = self.xmin.min(x);
        self.ymin = self.ymin.min(y);
        self.xmax = self.xmax.max(x);
        self.ymax = self.ymax.max(y);
    }
}

impl std::fmt::Debug for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBox")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

impl std::fmt::Display for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

// STAC writes bboxes as bare arrays rather than objects.
impl Serialize for BBox {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BBox {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        BBox::from_slice(&values).ok_or_else(|| {
            serde::de::Error::invalid_length(values.len(), &"a bbox of 4 or 6 numbers")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_xyxy() {
        let bbox = BBox::from_xyxy(10.0, 20.0, 100.0, 80.0);
        assert_eq!(bbox.xmin, 10.0);
        assert_eq!(bbox.ymin, 20.0);
        assert_eq!(bbox.xmax, 100.0);
        assert_eq!(bbox.ymax, 80.0);
    }

    #[test]
    fn test_bbox_dimensions() {
        let bbox = BBox::from_xyxy(10.0, 20.0, 100.0, 80.0);
        assert_eq!(bbox.width(), 90.0);
        assert_eq!(bbox.height(), 60.0);
    }

    #[test]
    fn test_bbox_ordering() {
        assert!(BBox::from_xyxy(10.0, 20.0, 100.0, 80.0).is_ordered());
        assert!(!BBox::from_xyxy(100.0, 80.0, 10.0, 20.0).is_ordered());
    }

    #[test]
    fn test_union_contains_both_inputs() {
        let a = BBox::from_xyxy(0.0, 0.0, 1.0, 1.0);
        let b = BBox::from_xyxy(2.0, 2.0, 3.0, 3.0);
        let u = a.union(&b);
        assert_eq!(u, BBox::from_xyxy(0.0, 0.0, 3.0, 3.0));
        assert!(u.contains(&a));
        assert!(u.contains(&b));
        assert!(!a.contains(&u));
    }

    #[test]
    fn test_from_slice_accepts_3d() {
        let bbox = BBox::from_slice(&[1.0, 2.0, -5.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(bbox, BBox::from_xyxy(1.0, 2.0, 3.0, 4.0));
        assert!(BBox::from_slice(&[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_serializes_as_array() {
        let bbox = BBox::from_xyxy(0.5, 1.0, 2.0, 3.5);
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[0.5,1.0,2.0,3.5]");

        let restored: BBox = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, bbox);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let result: Result<BBox, _> = serde_json::from_str("[1.0, 2.0]");
        assert!(result.is_err());
    }
}
