//! STAC 1.0.0 document shapes.
//!
//! These types mirror the JSON documents on disk. They hold locations as
//! plain strings; turning them into catalog nodes (and back) happens in
//! [`super::to_documents`] and [`super::read_catalog`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Asset, BBox, Extent, Geometry, MediaType, Properties, Relation};

/// STAC specification version written into every document.
pub const STAC_VERSION: &str = "1.0.0";

/// Any STAC document, discriminated by its `type` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StacDocument {
    Catalog(CatalogDocument),
    Collection(CollectionDocument),
    #[serde(rename = "Feature")]
    Item(ItemDocument),
}

impl StacDocument {
    pub fn id(&self) -> &str {
        match self {
            StacDocument::Catalog(doc) => &doc.id,
            StacDocument::Collection(doc) => &doc.id,
            StacDocument::Item(doc) => &doc.id,
        }
    }

    pub fn links(&self) -> &[LinkDocument] {
        match self {
            StacDocument::Catalog(doc) => &doc.links,
            StacDocument::Collection(doc) => &doc.links,
            StacDocument::Item(doc) => &doc.links,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            StacDocument::Catalog(_) => "catalog",
            StacDocument::Collection(_) => "collection",
            StacDocument::Item(_) => "item",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub stac_version: String,
    #[serde(default)]
    pub stac_extensions: Vec<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub links: Vec<LinkDocument>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub stac_version: String,
    #[serde(default)]
    pub stac_extensions: Vec<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_license")]
    pub license: String,
    pub extent: Extent,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(default)]
    pub links: Vec<LinkDocument>,
}

fn default_license() -> String {
    "proprietary".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub stac_version: String,
    #[serde(default)]
    pub stac_extensions: Vec<String>,
    pub id: String,
    pub geometry: Geometry,
    pub bbox: BBox,
    pub properties: ItemProperties,
    #[serde(default)]
    pub links: Vec<LinkDocument>,
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
    /// Id of the collection the item belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

/// Item properties: the required `datetime` plus free-form entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemProperties {
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub other: Properties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkDocument {
    pub rel: Relation,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl LinkDocument {
    pub fn new(rel: Relation, href: impl Into<String>, media_type: Option<MediaType>) -> Self {
        Self {
            rel,
            href: href.into(),
            media_type,
            title: None,
        }
    }
}

/// Parses a document from a JSON string.
pub fn from_json_str(json: &str) -> Result<StacDocument, serde_json::Error> {
    serde_json::from_str(json)
}

/// Renders a document as pretty-printed JSON.
pub fn to_json_string(document: &StacDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_item_with_extra_properties() {
        let json = r#"{
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": "img205",
            "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
            "bbox": [1.0, 2.0, 1.0, 2.0],
            "properties": {"datetime": "2020-01-01T00:00:00Z", "label:tasks": ["segmentation"]},
            "links": [{"rel": "source", "href": "../img/img.json", "type": "application/json"}],
            "assets": {"labels": {"href": "labels.geojson", "type": "application/geo+json"}}
        }"#;

        let doc = from_json_str(json).unwrap();
        let StacDocument::Item(item) = &doc else {
            panic!("expected an item, got {}", doc.kind_name());
        };
        assert_eq!(item.id, "img205");
        assert!(item.properties.datetime.is_some());
        assert_eq!(item.properties.other["label:tasks"][0], "segmentation");
        assert_eq!(item.links[0].rel, Relation::Source);
        assert_eq!(item.links[0].media_type, Some(MediaType::Json));
        assert_eq!(item.assets["labels"].media_type, Some(MediaType::GeoJson));
    }

    #[test]
    fn catalog_type_tag_is_written() {
        let doc = StacDocument::Catalog(CatalogDocument {
            stac_version: STAC_VERSION.to_string(),
            stac_extensions: Vec::new(),
            id: "root".into(),
            title: None,
            description: "Root".into(),
            links: vec![LinkDocument::new(Relation::Child, "./image/collection.json", None)],
        });
        let json = to_json_string(&doc).unwrap();
        assert!(json.contains("\"type\": \"Catalog\""));
        assert!(json.contains("\"rel\": \"child\""));
        assert!(!json.contains("\"title\""));
    }

    #[test]
    fn null_datetime_is_kept() {
        let properties = ItemProperties {
            datetime: None,
            title: None,
            other: Properties::new(),
        };
        let json = serde_json::to_string(&properties).unwrap();
        assert_eq!(json, r#"{"datetime":null}"#);
    }

    #[test]
    fn rejects_unknown_type() {
        let json = r#"{"type": "FeatureCollection", "id": "x"}"#;
        assert!(from_json_str(json).is_err());
    }
}
