//! # asarpack Core Library
//!
//! This crate packs a directory tree into a single `.asar`-style container —
//! a 16-byte header, a JSON manifest describing the tree and its byte
//! offsets, and the concatenated raw file bodies — and reconstructs the tree
//! again from it.
//!
//! It is designed to be used by the `asarpack` command-line application, but
//! the public API can also be used programmatically to create, inspect, and
//! extract archives.
//!
//! ## Key Modules
//!
//! - [`manifest`]: canonical directory traversal and manifest construction.
//! - [`header`]: the fixed preamble with its redundant size fields.
//! - [`pack`]: one-pass archive writing.
//! - [`extract`]: manifest parsing plus the list / extract-all /
//!   extract-single operations.
//! - [`filter`]: pack-time exclusion rules.

pub mod cli;
pub mod error;
pub mod extract;
pub mod filter;
pub mod header;
pub mod manifest;
pub mod pack;

// Cross-platform filesystem capabilities (symlinks, execute bits)
pub mod fsx;

pub use error::{ArchiveError, Result};
