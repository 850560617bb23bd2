//! Manifest construction: the canonical walk over a source directory.
//!
//! The manifest is a nested JSON mapping keyed by entry name. A node is
//! either a directory (a nested mapping under a `files` key), a symlink
//! (a `link` field holding the raw target text), or a regular file
//! (`size` plus a string-encoded `offset`, with `executable: true` when the
//! owner-execute bit was set on the source).
//!
//! Offsets are assigned from a running body cursor threaded through the
//! recursion as a plain value; each level returns its node map, its flat
//! records, and the advanced cursor. Sibling names are sorted byte-wise
//! ascending, so the manifest and the archive are deterministic for a given
//! source tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{ArchiveError, Result};
use crate::filter::PathFilter;
use crate::fsx;

/// Classification of one archived entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    RegularFile,
    ExecutableFile,
    SymbolicLink,
    EmptyDirectory,
}

/// A flattened, path-qualified description of one archived entry.
///
/// `size` and `offset` are only trustworthy together, and only for the two
/// file kinds; links and empty directories carry zeroes for both.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Slash-separated path relative to the archive root.
    pub path: String,
    /// Byte length of the content; 0 for links and empty directories.
    pub size: u64,
    /// Byte offset of the content within the body region.
    pub offset: u64,
    pub kind: EntryKind,
    /// Literal link target, stored verbatim — never resolved or validated.
    pub link_target: Option<String>,
}

/// Serialized form of one manifest node.
///
/// `offset` goes on the wire as a decimal string rather than a JSON number.
/// This is a fixed wire contract: readers with 53-bit number precision would
/// corrupt offsets in large archives.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ManifestNode {
    Directory {
        files: BTreeMap<String, ManifestNode>,
    },
    Link {
        link: String,
    },
    File {
        size: u64,
        offset: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        executable: Option<bool>,
    },
}

/// Result of a pack-side manifest build.
pub struct BuiltManifest {
    /// The manifest JSON text, exactly as it will be written to the archive.
    pub text: String,
    /// Flat records in traversal order; body bytes are written in this order.
    pub records: Vec<FileRecord>,
    /// Total size of the body region in bytes.
    pub body_size: u64,
}

/// Walk `root` and build the manifest text plus the flat record list, with
/// every file offset already assigned relative to the start of the body
/// region.
///
/// Any unreadable directory or unreadable entry metadata aborts the whole
/// build; partial manifests are never produced.
pub fn build_manifest(root: &Path, filter: &PathFilter) -> Result<BuiltManifest> {
    let (files, records, body_size) = build_dir(root, "", filter, 0)?;
    let text = serde_json::to_string(&ManifestNode::Directory { files })?;
    Ok(BuiltManifest {
        text,
        records,
        body_size,
    })
}

fn build_dir(
    dir: &Path,
    rel_prefix: &str,
    filter: &PathFilter,
    mut cursor: u64,
) -> Result<(BTreeMap<String, ManifestNode>, Vec<FileRecord>, u64)> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ArchiveError::io(dir, e))? {
        let entry = entry.map_err(|e| ArchiveError::io(dir, e))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort_unstable();

    let mut nodes = BTreeMap::new();
    let mut records = Vec::new();

    for name in names {
        let full = dir.join(&name);
        let rel = if rel_prefix.is_empty() {
            name.clone()
        } else {
            format!("{rel_prefix}/{name}")
        };

        // Classify without following symlinks.
        let meta = fs::symlink_metadata(&full).map_err(|e| ArchiveError::io(&full, e))?;

        if meta.file_type().is_symlink() {
            if filter.should_exclude_file(&rel) {
                continue;
            }
            let target = fs::read_link(&full)
                .map_err(|e| ArchiveError::io(&full, e))?
                .to_string_lossy()
                .into_owned();
            nodes.insert(
                name,
                ManifestNode::Link {
                    link: target.clone(),
                },
            );
            records.push(FileRecord {
                path: rel,
                size: 0,
                offset: 0,
                kind: EntryKind::SymbolicLink,
                link_target: Some(target),
            });
        } else if meta.is_dir() {
            if filter.should_exclude_dir(&rel) {
                continue;
            }
            let (child_nodes, child_records, next) = build_dir(&full, &rel, filter, cursor)?;
            cursor = next;
            if child_records.is_empty() {
                records.push(FileRecord {
                    path: rel,
                    size: 0,
                    offset: 0,
                    kind: EntryKind::EmptyDirectory,
                    link_target: None,
                });
            }
            records.extend(child_records);
            nodes.insert(name, ManifestNode::Directory { files: child_nodes });
        } else {
            if filter.should_exclude_file(&rel) {
                continue;
            }
            let size = meta.len();
            let kind = if fsx::is_executable(&meta) {
                EntryKind::ExecutableFile
            } else {
                EntryKind::RegularFile
            };
            nodes.insert(
                name,
                ManifestNode::File {
                    size,
                    offset: cursor.to_string(),
                    executable: (kind == EntryKind::ExecutableFile).then_some(true),
                },
            );
            records.push(FileRecord {
                path: rel,
                size,
                offset: cursor,
                kind,
                link_target: None,
            });
            cursor += size;
        }
    }

    Ok((nodes, records, cursor))
}
