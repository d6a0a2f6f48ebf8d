//! Node location resolution.
//!
//! Locations are `/`-separated strings: local paths (absolute or relative)
//! or URIs. Every container node lives at
//! `<parent dir>/<id>/<index file>` and every item at
//! `<parent dir>/<id>/<id>.json`, so distinct sibling ids always resolve to
//! distinct locations.

use crate::error::CatalogError;

/// Index document name for catalogs.
pub const CATALOG_FILE: &str = "catalog.json";

/// Index document name for collections.
pub const COLLECTION_FILE: &str = "collection.json";

/// Joins `child_id` onto a directory-style parent location.
pub fn resolve(parent_location: &str, child_id: &str) -> String {
    let base = parent_location.trim_end_matches('/');
    if base.is_empty() {
        if parent_location.starts_with('/') {
            format!("/{}", child_id)
        } else {
            child_id.to_string()
        }
    } else {
        format!("{}/{}", base, child_id)
    }
}

/// Location of a container's index document.
pub fn container_href(parent_dir: &str, child_id: &str, index_file: &str) -> String {
    resolve(&resolve(parent_dir, child_id), index_file)
}

/// Location of an item document.
pub fn item_href(parent_dir: &str, item_id: &str) -> String {
    resolve(&resolve(parent_dir, item_id), &format!("{}.json", item_id))
}

/// Directory portion of a document location (`""` for a bare file name).
pub fn parent_dir(href: &str) -> &str {
    match href.rfind('/') {
        Some(0) => "/",
        Some(idx) => &href[..idx],
        None => "",
    }
}

/// Returns true for locations carrying a URI scheme (`s3://`, `https://`).
pub fn has_scheme(href: &str) -> bool {
    href.find("://").is_some_and(|idx| {
        idx > 0 && href[..idx].chars().all(|c| c.is_ascii_alphanumeric() || "+.-".contains(c))
    })
}

fn is_absolute(href: &str) -> bool {
    href.starts_with('/') || has_scheme(href)
}

/// Joins a file reference onto an optional base URI. References that are
/// already absolute are returned unchanged.
pub fn join_uri(base: Option<&str>, file_ref: &str) -> String {
    match base {
        Some(base) if !base.is_empty() && !is_absolute(file_ref) => resolve(base, file_ref),
        _ => file_ref.to_string(),
    }
}

/// Collapses `.` and `..` segments.
pub fn normalize(href: &str) -> String {
    if has_scheme(href) {
        return href.to_string();
    }

    let absolute = href.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Resolves a link `href` found in the document at `base_href`.
pub fn resolve_relative(base_href: &str, href: &str) -> String {
    if is_absolute(href) {
        normalize(href)
    } else {
        normalize(&resolve(parent_dir(base_href), href))
    }
}

/// Expresses `to_href` relative to the document at `from_href`.
///
/// Locations that cannot be related (different schemes, one absolute and
/// one relative) are returned unchanged. A relative source that climbs
/// above the shared prefix with `..` gets the target anchored at the
/// working directory instead.
pub fn relative_href(from_href: &str, to_href: &str) -> String {
    if has_scheme(from_href) || has_scheme(to_href) || is_absolute(from_href) != is_absolute(to_href)
    {
        return to_href.to_string();
    }

    let from_dir = normalize(parent_dir(from_href));
    let to = normalize(to_href);

    let from_segments: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to_segments: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let common = from_segments
        .iter()
        .zip(&to_segments)
        .take_while(|(a, b)| a == b)
        .count();

    if from_segments[common..].contains(&"..") {
        return anchor_at_working_dir(&to);
    }

    let ups = from_segments.len() - common;
    let rest = to_segments[common..].join("/");
    if ups == 0 {
        format!("./{}", rest)
    } else {
        format!("{}{}", "../".repeat(ups), rest)
    }
}

fn anchor_at_working_dir(href: &str) -> String {
    match std::env::current_dir() {
        Ok(dir) => normalize(&resolve(&dir.to_string_lossy(), href)),
        Err(_) => href.to_string(),
    }
}

/// Checks that `id` can be used as a path segment without colliding with
/// another sibling's location.
pub fn validate_id(id: &str) -> Result<(), CatalogError> {
    let reason = if id.is_empty() {
        Some("id must not be empty")
    } else if id == "." || id == ".." {
        Some("id must not be a relative path segment")
    } else if id.contains('/') || id.contains('\\') {
        Some("id must not contain path separators")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CatalogError::InvalidId {
            id: id.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
