//! Catalog configuration files.
//!
//! Every field is optional; an empty file yields [`CatalogConfig::default`].
//!
//! ```yaml
//! catalog:
//!   id: tiny-spacenet
//!   description: Tiny SpaceNet Subset
//!   splits: true
//! assets:
//!   base_uri: s3://spacenet-dataset/AOI_2_Vegas
//! label:
//!   type: vector
//!   tasks: [segmentation]
//!   classes:
//!     - classes: [building, background]
//!   description: Building Polygons
//! ml:
//!   id: tiny-spacenet-split
//!   description: ML Data training catalog from SpaceNet
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::builder::{CatalogOptions, CollectionOptions};
use crate::error::CatalogError;
use crate::factory::{AssetTemplate, PairFactory};
use crate::model::{LabelSemantics, MediaType};
use crate::split::MlCatalogOptions;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub catalog: CatalogSection,
    pub image_collection: CollectionSection,
    pub label_collection: CollectionSection,
    pub assets: AssetsSection,
    pub label: LabelSemantics,
    /// Record `derived_from` links between image and label items.
    pub reciprocal_links: bool,
    pub ml: MlSection,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogSection::default(),
            image_collection: CollectionSection {
                id: "image".to_string(),
                description: "Image Chip Collection".to_string(),
                title: None,
            },
            label_collection: CollectionSection {
                id: "label".to_string(),
                description: "Labels Collection".to_string(),
                title: None,
            },
            assets: AssetsSection::default(),
            label: LabelSemantics {
                tasks: vec!["segmentation".to_string()],
                ..Default::default()
            },
            reciprocal_links: false,
            ml: MlSection::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSection {
    pub id: String,
    pub description: String,
    pub title: Option<String>,
    /// Create train/test sub-catalogs.
    pub splits: bool,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            id: "catalog".to_string(),
            description: "Image and label catalog".to_string(),
            title: None,
            splits: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionSection {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsSection {
    /// Base URI asset hrefs are joined onto.
    pub base_uri: Option<String>,
    pub image: AssetSection,
    pub label: AssetSection,
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            base_uri: None,
            image: AssetTemplate::image().into(),
            label: AssetTemplate::labels().into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetSection {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl From<AssetTemplate> for AssetSection {
    fn from(template: AssetTemplate) -> Self {
        Self {
            key: template.key,
            title: template.title,
            media_type: template.media_type,
            roles: template.roles,
        }
    }
}

impl From<AssetSection> for AssetTemplate {
    fn from(section: AssetSection) -> Self {
        Self {
            key: section.key,
            title: section.title,
            media_type: section.media_type,
            roles: section.roles,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MlSection {
    pub id: String,
    pub description: String,
    pub title: Option<String>,
}

impl Default for MlSection {
    fn default() -> Self {
        Self {
            id: "ml-catalog".to_string(),
            description: "ML training catalog".to_string(),
            title: None,
        }
    }
}

impl CatalogConfig {
    /// Builder options for a catalog rooted at `href`.
    pub fn catalog_options(&self, href: impl Into<String>) -> CatalogOptions {
        let mut options = CatalogOptions::new(&self.catalog.id, &self.catalog.description, href);
        options.title = self.catalog.title.clone();
        options.with_splits = self.catalog.splits;
        options.image_collection = self.image_collection.clone().into();
        options.label_collection = self.label_collection.clone().into();
        options
    }

    /// The pair factory described by the `assets`, `label` and
    /// `reciprocal_links` entries.
    pub fn pair_factory(&self) -> PairFactory {
        let mut factory =
            PairFactory::new(self.label.clone()).with_reciprocal_links(self.reciprocal_links);
        factory.image_asset = self.assets.image.clone().into();
        factory.label_asset = self.assets.label.clone().into();
        if let Some(base) = &self.assets.base_uri {
            factory = factory.with_asset_base_uri(base);
        }
        factory
    }

    /// Options for the derived ML catalog rooted at `href`.
    pub fn ml_options(&self, href: impl Into<String>) -> MlCatalogOptions {
        let mut options = MlCatalogOptions::new(&self.ml.id, &self.ml.description, href)
            .with_label(self.label.clone());
        options.title = self.ml.title.clone();
        options.image_asset_key = self.assets.image.key.clone();
        options.label_asset_key = self.assets.label.key.clone();
        options
    }
}

impl From<CollectionSection> for CollectionOptions {
    fn from(section: CollectionSection) -> Self {
        Self {
            id: section.id,
            description: section.description,
            title: section.title,
        }
    }
}

/// Reads a YAML configuration file.
pub fn load_config(path: &Path) -> Result<CatalogConfig, CatalogError> {
    let data = fs::read_to_string(path).map_err(CatalogError::Io)?;
    parse_config(&data, path)
}

/// Parses configuration from a YAML string.
pub fn from_yaml_str(yaml: &str) -> Result<CatalogConfig, CatalogError> {
    parse_config(yaml, Path::new("<string>"))
}

fn parse_config(data: &str, path: &Path) -> Result<CatalogConfig, CatalogError> {
    if data.trim().is_empty() {
        return Ok(CatalogConfig::default());
    }
    serde_yaml::from_str(data).map_err(|source| CatalogError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}
