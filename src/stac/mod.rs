//! STAC persistence.
//!
//! A [`Catalog`] is rendered as one JSON document per node. Every link in a
//! rendered document is relative to the document itself and no `self` links
//! are written, so an output tree can be moved or copied as a whole.

mod document;
mod io;

pub use document::{
    from_json_str, to_json_string, CatalogDocument, CollectionDocument, ItemDocument,
    ItemProperties, LinkDocument, StacDocument, STAC_VERSION,
};
pub use io::{read_catalog, write_catalog};

use crate::catalog::{href, Catalog};
use crate::model::{MediaType, Node, NodeId, NodeKind, Relation};

/// Renders every node of `catalog` as `(href, document)`, in pre-order.
pub fn to_documents(catalog: &Catalog) -> Vec<(String, StacDocument)> {
    catalog
        .walk()
        .into_iter()
        .map(|(_, id)| (catalog.node(id).href.clone(), node_document(catalog, id)))
        .collect()
}

/// Renders a single node.
pub fn node_document(catalog: &Catalog, id: NodeId) -> StacDocument {
    let node = catalog.node(id);
    let links = document_links(catalog, id);

    match &node.kind {
        NodeKind::Catalog => StacDocument::Catalog(CatalogDocument {
            stac_version: STAC_VERSION.to_string(),
            stac_extensions: node.extensions.clone(),
            id: node.id.clone(),
            title: node.title.clone(),
            description: node.description.clone().unwrap_or_default(),
            links,
        }),
        NodeKind::Collection(collection) => StacDocument::Collection(CollectionDocument {
            stac_version: STAC_VERSION.to_string(),
            stac_extensions: node.extensions.clone(),
            id: node.id.clone(),
            title: node.title.clone(),
            description: node.description.clone().unwrap_or_default(),
            license: collection.license.clone(),
            extent: collection.extent.clone(),
            properties: collection.properties.clone(),
            links,
        }),
        NodeKind::Item(item) => StacDocument::Item(ItemDocument {
            stac_version: STAC_VERSION.to_string(),
            stac_extensions: node.extensions.clone(),
            id: node.id.clone(),
            geometry: item.geometry.clone(),
            bbox: item.bbox,
            properties: ItemProperties {
                datetime: item.datetime,
                title: node.title.clone(),
                other: item.properties.clone(),
            },
            links,
            assets: item.assets.clone(),
            collection: catalog
                .collection_of(id)
                .map(|collection| catalog.node(collection).id.clone()),
        }),
    }
}

fn document_links(catalog: &Catalog, id: NodeId) -> Vec<LinkDocument> {
    let node = catalog.node(id);
    let relative = |target: &str| href::relative_href(&node.href, target);
    let json = || Some(MediaType::Json);
    let mut links = Vec::new();

    let root = catalog.root();
    if id != root {
        links.push(LinkDocument::new(
            Relation::Root,
            relative(&catalog.node(root).href),
            json(),
        ));
    }
    if let Some(parent) = catalog.parent(id) {
        links.push(LinkDocument::new(
            Relation::Parent,
            relative(&catalog.node(parent).href),
            json(),
        ));
    }
    if node.as_item().is_some() {
        if let Some(collection) = catalog.collection_of(id) {
            links.push(LinkDocument::new(
                Relation::Collection,
                relative(&catalog.node(collection).href),
                json(),
            ));
        }
    }

    for child in catalog.children(id) {
        let child_node = catalog.node(*child);
        let rel = if child_node.is_container() {
            Relation::Child
        } else {
            Relation::Item
        };
        let mut link = LinkDocument::new(rel, relative(&child_node.href), json());
        link.title = child_node.title.clone();
        links.push(link);
    }

    for link in catalog.links(id) {
        links.push(LinkDocument {
            rel: link.rel.clone(),
            href: relative(catalog.link_href(link)),
            media_type: link.media_type.clone(),
            title: link.title.clone(),
        });
    }

    links
}

/// Fuzz-only entrypoint: parses a document and converts it to a node.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_document(input: &[u8]) -> Result<(), serde_json::Error> {
    let document: StacDocument = serde_json::from_slice(input)?;
    let _ = document_node(document);
    Ok(())
}

/// Builds a detached node from a parsed document. Links are not followed.
pub fn document_node(document: StacDocument) -> Node {
    match document {
        StacDocument::Catalog(doc) => {
            let mut node = Node::catalog(doc.id, doc.description);
            node.title = doc.title;
            node.extensions = doc.stac_extensions;
            node
        }
        StacDocument::Collection(doc) => {
            let mut node = Node::collection(doc.id, doc.description, doc.extent);
            node.title = doc.title;
            node.extensions = doc.stac_extensions;
            if let Some(collection) = node.as_collection_mut() {
                collection.license = doc.license;
                collection.properties = doc.properties;
            }
            node
        }
        StacDocument::Item(doc) => {
            let mut node = Node::item(doc.id, doc.bbox, doc.properties.datetime);
            node.title = doc.properties.title;
            node.extensions = doc.stac_extensions;
            if let Some(item) = node.as_item_mut() {
                item.geometry = doc.geometry;
                item.properties = doc.properties.other;
                item.assets = doc.assets;
            }
            node
        }
    }
}
