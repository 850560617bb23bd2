//! Archive reading: header validation, manifest parsing, and the three
//! extraction modes (list, extract-all, extract-single).
//!
//! The manifest is parsed exactly once per invocation; every body read seeks
//! relative to the fixed header size computed at open time, which is why the
//! header must validate before any content is touched.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::fsx;
use crate::header::{Header, PREAMBLE_LEN};
use crate::manifest::{EntryKind, FileRecord};
use crate::pack::COPY_BUF_SIZE;

/// An opened archive: a validated header plus the flat records parsed out of
/// its manifest.
pub struct Archive {
    file: File,
    body_start: u64,
    records: Vec<FileRecord>,
}

impl Archive {
    /// Open `path`, validate its preamble, and parse the manifest.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;

        let mut preamble = [0u8; PREAMBLE_LEN];
        file.read_exact(&mut preamble)
            .map_err(|_| ArchiveError::Truncated("shorter than the 16-byte header".into()))?;
        let header = Header::decode(&preamble)?;

        let mut stored = vec![0u8; header.stored_len as usize];
        file.read_exact(&mut stored).map_err(|_| {
            ArchiveError::Truncated(format!(
                "header promises a {}-byte manifest",
                header.stored_len
            ))
        })?;
        // Trailing bytes past manifest_len are alignment padding.
        let manifest = std::str::from_utf8(&stored[..header.manifest_len as usize])
            .map_err(|e| ArchiveError::MalformedManifest(format!("manifest is not UTF-8: {e}")))?;

        let records = parse_manifest(manifest)?;
        debug!(
            records = records.len(),
            body_start = header.body_start(),
            "archive opened"
        );

        Ok(Self {
            file,
            body_start: header.body_start(),
            records,
        })
    }

    /// The flat records in manifest traversal order.
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Every record's fully-qualified path, in manifest traversal order.
    pub fn entry_paths(&self) -> Vec<String> {
        self.records.iter().map(|r| r.path.clone()).collect()
    }

    /// Reconstruct the whole tree under `dest`.
    ///
    /// An existing destination is acceptable only when it is empty; anything
    /// else fails before a single byte is written.
    pub fn unpack_all(&mut self, dest: &Path) -> Result<()> {
        match fs::read_dir(dest) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    return Err(ArchiveError::DestinationNotEmpty(dest.to_path_buf()));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(dest).map_err(|e| ArchiveError::io(dest, e))?;
            }
            Err(e) => return Err(ArchiveError::io(dest, e)),
        }

        for i in 0..self.records.len() {
            let record = self.records[i].clone();
            let target = join_sanitized(dest, &record.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
            }
            self.materialize(&record, &target)?;
        }
        debug!(records = self.records.len(), dest = %dest.display(), "archive unpacked");
        Ok(())
    }

    /// Extract the one record whose path matches `entry_path` exactly,
    /// writing it under its basename inside `out_dir`.
    pub fn unpack_single(&mut self, entry_path: &str, out_dir: &Path) -> Result<PathBuf> {
        let record = self
            .records
            .iter()
            .find(|r| r.path == entry_path)
            .cloned()
            .ok_or_else(|| ArchiveError::EntryNotFound(entry_path.to_string()))?;

        let basename = record.path.rsplit('/').next().unwrap_or(&record.path);
        let target = out_dir.join(basename);
        self.materialize(&record, &target)?;
        Ok(target)
    }

    /// Write one record to `target`: a link-like entry, an empty directory,
    /// or `size` bytes streamed out of the body region.
    fn materialize(&mut self, record: &FileRecord, target: &Path) -> Result<()> {
        match record.kind {
            EntryKind::SymbolicLink => {
                let link = record.link_target.as_deref().unwrap_or_default();
                fsx::create_link_entry(link, target).map_err(|e| ArchiveError::io(target, e))
            }
            EntryKind::EmptyDirectory => {
                fs::create_dir_all(target).map_err(|e| ArchiveError::io(target, e))
            }
            EntryKind::RegularFile | EntryKind::ExecutableFile => {
                self.file
                    .seek(SeekFrom::Start(self.body_start + record.offset))
                    .map_err(|e| ArchiveError::io(target, e))?;
                let mut out = File::create(target).map_err(|e| ArchiveError::io(target, e))?;

                let mut buf = vec![0u8; COPY_BUF_SIZE];
                let mut remaining = record.size;
                while remaining > 0 {
                    let want = remaining.min(COPY_BUF_SIZE as u64) as usize;
                    self.file.read_exact(&mut buf[..want]).map_err(|_| {
                        ArchiveError::Truncated(format!(
                            "body ends {remaining} bytes short of '{}'",
                            record.path
                        ))
                    })?;
                    out.write_all(&buf[..want])
                        .map_err(|e| ArchiveError::io(target, e))?;
                    remaining -= want as u64;
                }

                if record.kind == EntryKind::ExecutableFile {
                    fsx::set_executable(target).map_err(|e| ArchiveError::io(target, e))?;
                }
                Ok(())
            }
        }
    }
}

/// List every entry path in an archive without writing anything.
pub fn list_entries(archive_path: &Path) -> Result<Vec<String>> {
    Ok(Archive::open(archive_path)?.entry_paths())
}

/// Reconstruct an archive's whole tree under `dest`.
pub fn unpack_all(archive_path: &Path, dest: &Path) -> Result<()> {
    Archive::open(archive_path)?.unpack_all(dest)
}

/// Extract a single entry by exact path into `out_dir`, returning the path of
/// the file that was written.
pub fn unpack_single(archive_path: &Path, entry_path: &str, out_dir: &Path) -> Result<PathBuf> {
    Archive::open(archive_path)?.unpack_single(entry_path, out_dir)
}

/// Parse the manifest JSON into the flat record list.
///
/// Leaves that carry neither a `link`, nor a `directory` marker, nor a valid
/// `size` + string `offset` pair are skipped rather than failing the parse.
/// That leniency is deliberate and bounded to individual leaves; a manifest
/// that does not parse, or lacks the top-level `files` object, is fatal.
pub fn parse_manifest(text: &str) -> Result<Vec<FileRecord>> {
    let root: Value =
        serde_json::from_str(text).map_err(|e| ArchiveError::MalformedManifest(e.to_string()))?;
    let files = root
        .get("files")
        .and_then(Value::as_object)
        .ok_or_else(|| ArchiveError::MalformedManifest("top-level `files` object missing".into()))?;

    let mut records = Vec::new();
    collect_records(files, "", &mut records);
    Ok(records)
}

/// Walk one directory level and return the number of direct members seen.
/// A nested `files` object with zero members is what marks an empty
/// directory on read.
fn collect_records(
    members: &serde_json::Map<String, Value>,
    prefix: &str,
    records: &mut Vec<FileRecord>,
) -> usize {
    let mut n = 0;
    for (name, value) in members {
        n += 1;
        let Some(node) = value.as_object() else {
            continue;
        };
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        if let Some(files) = node.get("files").and_then(Value::as_object) {
            if collect_records(files, &path, records) == 0 {
                records.push(empty_dir(path));
            }
            continue;
        }

        if let Some(target) = node.get("link").and_then(Value::as_str) {
            records.push(FileRecord {
                path,
                size: 0,
                offset: 0,
                kind: EntryKind::SymbolicLink,
                link_target: Some(target.to_string()),
            });
            continue;
        }

        // Explicit marker for manifests authored without a nested `files` map.
        if node.contains_key("directory") {
            records.push(empty_dir(path));
            continue;
        }

        let size = node.get("size").and_then(Value::as_u64);
        let offset = node
            .get("offset")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u64>().ok());
        let (Some(size), Some(offset)) = (size, offset) else {
            continue;
        };

        let executable = node.get("executable").and_then(Value::as_bool) == Some(true);
        records.push(FileRecord {
            path,
            size,
            offset,
            kind: if executable {
                EntryKind::ExecutableFile
            } else {
                EntryKind::RegularFile
            },
            link_target: None,
        });
    }
    n
}

fn empty_dir(path: String) -> FileRecord {
    FileRecord {
        path,
        size: 0,
        offset: 0,
        kind: EntryKind::EmptyDirectory,
        link_target: None,
    }
}

/// Join an archive-relative slash path onto `base`, dropping `.`, empty, and
/// `..` segments so a hostile manifest cannot escape the destination.
fn join_sanitized(base: &Path, rel: &str) -> PathBuf {
    let mut out = base.to_path_buf();
    for segment in rel.split('/') {
        match segment {
            "" | "." | ".." => continue,
            s => out.push(s),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_files_links_and_markers() {
        let manifest = r#"{"files":{
            "bin":{"files":{"run":{"size":3,"offset":"0","executable":true}}},
            "empty":{"files":{}},
            "legacy":{"directory":true},
            "link":{"link":"bin/run"},
            "readme":{"size":5,"offset":"3"}
        }}"#;

        let records = parse_manifest(manifest).unwrap();
        let paths: Vec<_> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["bin/run", "empty", "legacy", "link", "readme"]);

        assert_eq!(records[0].kind, EntryKind::ExecutableFile);
        assert_eq!(records[1].kind, EntryKind::EmptyDirectory);
        assert_eq!(records[2].kind, EntryKind::EmptyDirectory);
        assert_eq!(records[3].kind, EntryKind::SymbolicLink);
        assert_eq!(records[3].link_target.as_deref(), Some("bin/run"));
        assert_eq!(records[4].kind, EntryKind::RegularFile);
        assert_eq!(records[4].size, 5);
        assert_eq!(records[4].offset, 3);
    }

    #[test]
    fn malformed_leaves_are_skipped_not_fatal() {
        // Missing offset, numeric offset, and a non-object member: all
        // skipped, the valid sibling survives.
        let manifest = r#"{"files":{
            "no_offset":{"size":4},
            "numeric_offset":{"size":4,"offset":7},
            "not_an_object":true,
            "good":{"size":1,"offset":"0"}
        }}"#;

        let records = parse_manifest(manifest).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "good");
    }

    #[test]
    fn skipped_leaves_still_count_as_directory_members() {
        // A directory whose only child is malformed is not inferred empty.
        let manifest = r#"{"files":{"d":{"files":{"broken":{"size":1}}}}}"#;
        let records = parse_manifest(manifest).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn missing_files_key_is_malformed() {
        let err = parse_manifest(r#"{"entries":{}}"#).unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedManifest(_)));

        let err = parse_manifest("not json at all").unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedManifest(_)));
    }

    #[test]
    fn sanitized_join_never_escapes_the_destination() {
        let base = Path::new("/tmp/out");
        assert_eq!(
            join_sanitized(base, "../../etc/passwd"),
            PathBuf::from("/tmp/out/etc/passwd")
        );
        assert_eq!(join_sanitized(base, "a/./b"), PathBuf::from("/tmp/out/a/b"));
        assert_eq!(join_sanitized(base, "a//b"), PathBuf::from("/tmp/out/a/b"));
    }
}
