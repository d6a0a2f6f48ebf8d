use std::path::PathBuf;
use thiserror::Error;

/// The main error type for mlstac operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data unavailable for '{image_ref}': {source}")]
    DataUnavailable {
        image_ref: String,
        #[source]
        source: BBoxError,
    },

    #[error("Item '{item_id}' is missing required asset '{key}'")]
    MissingAsset { item_id: String, key: String },

    #[error("Duplicate id '{id}' under '{parent}'")]
    DuplicateId { parent: String, id: String },

    #[error("Invalid node id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    #[error("Node '{id}' is a {kind}, not a container")]
    NotAContainer { id: String, kind: &'static str },

    #[error("Node '{id}' is a {kind}, not an item")]
    NotAnItem { id: String, kind: &'static str },

    #[error("Catalog '{parent}' has no child '{id}'")]
    MissingChild { parent: String, id: String },

    #[error("Failed to parse STAC document {path}: {source}")]
    StacParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write STAC document {path}: {source}")]
    StacWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid STAC document {path}: {message}")]
    StacInvalid { path: PathBuf, message: String },

    #[error("Failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid manifest {path}: {message}")]
    ManifestInvalid { path: PathBuf, message: String },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid split parameters: {message}")]
    InvalidSplitParams { message: String },

    #[error("{skipped} pair(s) were skipped (strict mode)")]
    StrictFailed { skipped: usize },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Failure at the bbox-provider boundary.
#[derive(Debug, Error)]
pub enum BBoxError {
    #[error("image {path} could not be read: {source}")]
    ImageUnreadable {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("no bounds known for '{image_ref}'")]
    NotFound { image_ref: String },

    #[error("bounds for '{image_ref}' are not finite")]
    NotFinite { image_ref: String },
}
