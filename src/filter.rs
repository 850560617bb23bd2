//! Pack-time exclusion rules.
//!
//! Three independent rules decide what never makes it into an archive: a
//! hidden-name rule gated by an option, a pattern for files, and a pattern
//! for directories. Patterns are matched against the archive-relative slash
//! path of an entry, not just its basename, and are compiled once before any
//! traversal starts.

use regex::Regex;

use crate::error::{ArchiveError, Result};

#[derive(Debug, Default)]
pub struct PathFilter {
    exclude_hidden: bool,
    file_rule: Option<Regex>,
    dir_rule: Option<Regex>,
}

impl PathFilter {
    /// Compile the optional patterns up front. A pattern that fails to
    /// compile is a configuration error, reported before anything is walked.
    pub fn new(
        exclude_hidden: bool,
        file_pattern: Option<&str>,
        dir_pattern: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            exclude_hidden,
            file_rule: compile(file_pattern)?,
            dir_rule: compile(dir_pattern)?,
        })
    }

    /// Hidden means a leading-dot name.
    pub fn is_hidden(&self, name: &str) -> bool {
        name.starts_with('.')
    }

    /// True when the file at `rel_path` must be omitted from both the
    /// manifest and the body region.
    pub fn should_exclude_file(&self, rel_path: &str) -> bool {
        self.excluded_as_hidden(rel_path)
            || self
                .file_rule
                .as_ref()
                .map_or(false, |re| re.is_match(rel_path))
    }

    /// True when the directory at `rel_path` must be skipped entirely: no
    /// descent, no manifest node for it or anything below it.
    pub fn should_exclude_dir(&self, rel_path: &str) -> bool {
        self.excluded_as_hidden(rel_path)
            || self
                .dir_rule
                .as_ref()
                .map_or(false, |re| re.is_match(rel_path))
    }

    fn excluded_as_hidden(&self, rel_path: &str) -> bool {
        if !self.exclude_hidden {
            return false;
        }
        let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
        self.is_hidden(name)
    }
}

fn compile(pattern: Option<&str>) -> Result<Option<Regex>> {
    match pattern {
        Some(p) => Regex::new(p)
            .map(Some)
            .map_err(|source| ArchiveError::InvalidPattern {
                pattern: p.to_string(),
                source,
            }),
        None => Ok(None),
    }
}
