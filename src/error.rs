use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `asarpack` crate.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{path}': {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The 16-byte preamble failed its sentinel or redundant size checks.
    #[error("corrupt archive header: {0}")]
    CorruptHeader(String),

    /// The archive holds fewer bytes than the header or a record promises.
    #[error("truncated archive: {0}")]
    Truncated(String),

    /// The manifest is not valid JSON, or its top-level `files` object is missing.
    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    /// Extract-all refuses to write into a directory that already has entries.
    #[error("destination directory is not empty: {}", .0.display())]
    DestinationNotEmpty(PathBuf),

    /// Extract-single found no record matching the requested path.
    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),

    /// An exclusion pattern failed to compile.
    #[error("invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl ArchiveError {
    /// Attach the offending path to a raw I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ArchiveError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        ArchiveError::MalformedManifest(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
