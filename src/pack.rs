//! One-pass archive writing: header, manifest text, then file bodies.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::filter::PathFilter;
use crate::header::Header;
use crate::manifest::{self, EntryKind, FileRecord};

/// Fixed buffer for streaming file contents, so memory use stays bounded
/// independent of archive size.
pub(crate) const COPY_BUF_SIZE: usize = 512 * 1024;

/// Options for a pack operation, handed down from the CLI layer.
#[derive(Debug, Default)]
pub struct PackOptions {
    /// Skip hidden files; hidden directories are not descended into.
    pub exclude_hidden: bool,
    /// Regex excluding files by relative path.
    pub file_exclude_pattern: Option<String>,
    /// Regex excluding directories (and everything below them) by relative path.
    pub dir_exclude_pattern: Option<String>,
}

/// Pack the tree under `source_dir` into a fresh archive at `dest`.
///
/// The manifest is fully materialized in memory before any bytes hit the
/// destination. A failure mid-write aborts immediately and leaves `dest`
/// truncated; cleanup is the caller's responsibility.
pub fn pack(source_dir: &Path, dest: &Path, options: &PackOptions) -> Result<()> {
    let filter = PathFilter::new(
        options.exclude_hidden,
        options.file_exclude_pattern.as_deref(),
        options.dir_exclude_pattern.as_deref(),
    )?;

    let built = manifest::build_manifest(source_dir, &filter)?;
    debug!(
        records = built.records.len(),
        manifest_len = built.text.len(),
        body_size = built.body_size,
        "manifest built"
    );

    write_archive(dest, source_dir, &built.text, &built.records)
}

/// Serialize header + manifest + concatenated bodies to `dest`.
///
/// Bodies are written in record order; symbolic links and empty directories
/// contribute no bytes.
pub fn write_archive(
    dest: &Path,
    source_root: &Path,
    manifest_text: &str,
    records: &[FileRecord],
) -> Result<()> {
    let out = File::create(dest).map_err(|e| ArchiveError::io(dest, e))?;
    let mut writer = BufWriter::with_capacity(COPY_BUF_SIZE, out);

    let preamble = Header::encode(manifest_text.len() as u32);
    writer
        .write_all(&preamble)
        .map_err(|e| ArchiveError::io(dest, e))?;
    writer
        .write_all(manifest_text.as_bytes())
        .map_err(|e| ArchiveError::io(dest, e))?;

    for record in records {
        match record.kind {
            EntryKind::RegularFile | EntryKind::ExecutableFile => {
                copy_body(&mut writer, source_root, record, dest)?;
            }
            EntryKind::SymbolicLink | EntryKind::EmptyDirectory => {}
        }
    }

    writer.flush().map_err(|e| ArchiveError::io(dest, e))?;
    debug!(dest = %dest.display(), "archive written");
    Ok(())
}

/// Stream exactly `record.size` bytes of one source file into the archive
/// through the bounded buffer.
fn copy_body(
    writer: &mut impl Write,
    source_root: &Path,
    record: &FileRecord,
    dest: &Path,
) -> Result<()> {
    let src_path = source_root.join(&record.path);
    let mut src = File::open(&src_path).map_err(|e| ArchiveError::io(&src_path, e))?;

    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut remaining = record.size;
    while remaining > 0 {
        let want = remaining.min(COPY_BUF_SIZE as u64) as usize;
        let n = src
            .read(&mut buf[..want])
            .map_err(|e| ArchiveError::io(&src_path, e))?;
        if n == 0 {
            // The file shrank between stat and read; the recorded offsets
            // would no longer line up with the body.
            return Err(ArchiveError::io(
                &src_path,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("file shrank while packing, {remaining} bytes missing"),
                ),
            ));
        }
        writer
            .write_all(&buf[..n])
            .map_err(|e| ArchiveError::io(dest, e))?;
        remaining -= n as u64;
    }
    Ok(())
}
