//! Reading and writing catalog trees on disk.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::document::StacDocument;
use super::{document_node, to_documents};
use crate::catalog::{href, Catalog};
use crate::error::CatalogError;
use crate::model::{Link, LinkTarget, MediaType, NodeId, Relation};

/// Writes every document of `catalog` beneath `out_dir`.
///
/// The root document lands at `out_dir/<root file name>` and every other
/// document at its location relative to the root. Returns the written paths
/// in pre-order.
///
/// # Errors
/// Returns [`CatalogError::StacInvalid`] if a node lies outside the root's
/// directory, or an I/O or serialization error.
pub fn write_catalog(catalog: &Catalog, out_dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let root_href = &catalog.node(catalog.root()).href;
    let mut written = Vec::with_capacity(catalog.len());

    for (location, document) in to_documents(catalog) {
        let relative = href::relative_href(root_href, &location);
        let Some(relative) = relative.strip_prefix("./") else {
            return Err(CatalogError::StacInvalid {
                path: PathBuf::from(location),
                message: "document lies outside the root catalog's directory".to_string(),
            });
        };

        let path = out_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_document(&path, &document)?;
        debug!(path = %path.display(), kind = document.kind_name(), "wrote document");
        written.push(path);
    }

    info!(
        documents = written.len(),
        out_dir = %out_dir.display(),
        "saved catalog"
    );
    Ok(written)
}

fn write_document(path: &Path, document: &StacDocument) -> Result<(), CatalogError> {
    let file = File::create(path).map_err(CatalogError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, document).map_err(|source| {
        CatalogError::StacWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn read_document(path: &Path) -> Result<StacDocument, CatalogError> {
    let file = File::open(path).map_err(CatalogError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| CatalogError::StacParse {
        path: path.to_path_buf(),
        source,
    })
}

fn path_href(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// A typed link waiting for every node to be loaded.
struct PendingLink {
    from: NodeId,
    rel: Relation,
    href: String,
    media_type: Option<MediaType>,
    title: Option<String>,
}

/// Loads a catalog tree from its root document.
///
/// `child` and `item` links are followed breadth-first. Typed links
/// (`source`, `derived_from`, ...) are re-attached afterwards; those whose
/// target was loaded point at the node, the rest keep their resolved href.
/// Node locations are the paths the documents were read from.
///
/// # Errors
/// - [`CatalogError::StacInvalid`] if the root is an item or a child link
///   points at a remote location
/// - [`CatalogError::StacParse`] / [`CatalogError::Io`] for unreadable
///   documents
/// - [`CatalogError::DuplicateId`] if two siblings share an id
pub fn read_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let root_doc = read_document(path)?;
    if matches!(root_doc, StacDocument::Item(_)) {
        return Err(CatalogError::StacInvalid {
            path: path.to_path_buf(),
            message: "root document is an item".to_string(),
        });
    }

    let root_href = href::normalize(&path_href(path));
    let root_links = root_doc.links().to_vec();
    let mut catalog = Catalog::new(document_node(root_doc), root_href.clone())?;

    let mut visited = HashSet::from([root_href.clone()]);
    let mut queue = VecDeque::from([(catalog.root(), root_href, root_links)]);
    let mut pending = Vec::new();

    while let Some((parent, parent_href, links)) = queue.pop_front() {
        for link in links {
            let target = href::resolve_relative(&parent_href, &link.href);
            match link.rel {
                Relation::Child | Relation::Item => {
                    if href::has_scheme(&target) {
                        return Err(CatalogError::StacInvalid {
                            path: PathBuf::from(&parent_href),
                            message: format!("cannot follow remote link '{}'", target),
                        });
                    }
                    if !visited.insert(target.clone()) {
                        warn!(href = %target, "document linked more than once, skipping");
                        continue;
                    }

                    let document = read_document(Path::new(&target))?;
                    let child_links = document.links().to_vec();
                    let child = catalog.attach_at(parent, document_node(document), target.clone())?;
                    queue.push_back((child, target, child_links));
                }
                rel if rel.is_structural() => {}
                rel => pending.push(PendingLink {
                    from: parent,
                    rel,
                    href: target,
                    media_type: link.media_type,
                    title: link.title,
                }),
            }
        }
    }

    let by_href: HashMap<String, NodeId> = catalog
        .ids()
        .map(|id| (catalog.node(id).href.clone(), id))
        .collect();
    for link in pending {
        let target = match by_href.get(&link.href) {
            Some(node) => LinkTarget::Node(*node),
            None => LinkTarget::Href(link.href),
        };
        let mut resolved = Link::new(link.rel, target, link.media_type);
        resolved.title = link.title;
        catalog.links_mut(link.from).push(resolved);
    }

    info!(nodes = catalog.len(), path = %path.display(), "loaded catalog");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reading_missing_root_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_catalog(&dir.path().join("catalog.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }

    #[test]
    fn item_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("item.json");
        fs::write(
            &path,
            r#"{"type": "Feature", "stac_version": "1.0.0", "id": "a",
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
                "bbox": [0.0, 0.0, 0.0, 0.0], "properties": {"datetime": null}}"#,
        )
        .unwrap();
        let err = read_catalog(&path).unwrap_err();
        assert!(matches!(err, CatalogError::StacInvalid { .. }));
    }

    #[test]
    fn malformed_document_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_catalog(&path).unwrap_err();
        match err {
            CatalogError::StacParse { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
