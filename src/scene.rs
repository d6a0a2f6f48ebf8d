//! Training-pipeline view of an ML catalog.
//!
//! A training pipeline reads the `train` and `test` collections of a
//! finished ML catalog and turns each item into a scene: one raster source
//! (the image asset) and one vector label source (the labels asset).
//! Channel order is the caller's choice; it is never stored in the catalog.

use serde::Serialize;

use crate::catalog::{href, Catalog};
use crate::error::CatalogError;
use crate::model::{LabelSemantics, NodeId, Split};
use crate::split::{IMAGE_ASSET_KEY, LABEL_ASSET_KEY};

/// How scenes are derived from catalog items.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneOptions {
    pub channel_order: Vec<usize>,
    /// Class names used when the train collection declares none.
    pub fallback_classes: Vec<String>,
    pub image_asset_key: String,
    pub label_asset_key: String,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            channel_order: vec![0, 1, 2],
            fallback_classes: Vec::new(),
            image_asset_key: IMAGE_ASSET_KEY.to_string(),
            label_asset_key: LABEL_ASSET_KEY.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RasterSourceConfig {
    pub uris: Vec<String>,
    pub channel_order: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VectorLabelSourceConfig {
    pub uri: String,
    /// Class assigned to features without a class property.
    pub default_class_id: usize,
    /// Class assigned to pixels outside every feature, if the class list
    /// has a `background` entry.
    pub background_class_id: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneConfig {
    pub id: String,
    pub raster_source: RasterSourceConfig,
    pub label_source: VectorLabelSourceConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassConfig {
    pub names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetConfig {
    pub class_config: ClassConfig,
    pub train_scenes: Vec<SceneConfig>,
    pub validation_scenes: Vec<SceneConfig>,
}

/// Maps an ML catalog's `train` and `test` collections to scenes.
///
/// Relative asset hrefs are resolved against the item's own location.
///
/// # Errors
/// - [`CatalogError::MissingChild`] if the root has no `train` or `test`
///   child
/// - [`CatalogError::MissingAsset`] if an item lacks the image or labels
///   asset
pub fn read_dataset_config(
    catalog: &Catalog,
    options: &SceneOptions,
) -> Result<DatasetConfig, CatalogError> {
    let train = split_collection(catalog, Split::Train)?;
    let test = split_collection(catalog, Split::Test)?;

    let names = catalog
        .node(train)
        .as_collection()
        .and_then(|collection| LabelSemantics::from_properties(&collection.properties))
        .map(|semantics| semantics.class_names())
        .filter(|names| !names.is_empty())
        .unwrap_or_else(|| options.fallback_classes.clone());
    let background_class_id = names.iter().position(|name| name == "background");

    let scenes = |collection: NodeId| -> Result<Vec<SceneConfig>, CatalogError> {
        catalog
            .items_under(collection)
            .into_iter()
            .map(|item| make_scene(catalog, item, options, background_class_id))
            .collect()
    };

    Ok(DatasetConfig {
        train_scenes: scenes(train)?,
        validation_scenes: scenes(test)?,
        class_config: ClassConfig { names },
    })
}

fn split_collection(catalog: &Catalog, split: Split) -> Result<NodeId, CatalogError> {
    let root = catalog.root();
    catalog
        .find_child(root, split.as_str())
        .ok_or_else(|| CatalogError::MissingChild {
            parent: catalog.node(root).id.clone(),
            id: split.as_str().to_string(),
        })
}

/// Builds the scene for one item.
pub fn make_scene(
    catalog: &Catalog,
    item: NodeId,
    options: &SceneOptions,
    background_class_id: Option<usize>,
) -> Result<SceneConfig, CatalogError> {
    let node = catalog.node(item);
    let data = catalog.item(item)?;
    let asset_uri = |key: &str| {
        data.assets
            .get(key)
            .map(|asset| href::resolve_relative(&node.href, &asset.href))
            .ok_or_else(|| CatalogError::MissingAsset {
                item_id: node.id.clone(),
                key: key.to_string(),
            })
    };

    Ok(SceneConfig {
        id: node.id.clone(),
        raster_source: RasterSourceConfig {
            uris: vec![asset_uri(&options.image_asset_key)?],
            channel_order: options.channel_order.clone(),
        },
        label_source: VectorLabelSourceConfig {
            uri: asset_uri(&options.label_asset_key)?,
            default_class_id: 0,
            background_class_id,
        },
    })
}
