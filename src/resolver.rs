//! Fileset resolution.
//! Maps a [`FilesetRule`] onto the files it selects in the template tree.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::descriptor::FilesetRule;
use crate::error::{Error, Result};

/// A template file selected by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Absolute (or resource-root based) source path.
    pub source: PathBuf,
    /// Path relative to the template root, which is also the destination
    /// path relative to the generated project root.
    pub relative: PathBuf,
}

/// Compiled include/exclude patterns of one rule.
#[derive(Debug)]
pub struct FilesetMatcher {
    includes: Option<GlobSet>,
    excludes: GlobSet,
}

fn compile_glob(pattern: &str) -> std::result::Result<Glob, globset::Error> {
    // `*` stays within one path segment, `**` crosses them.
    GlobBuilder::new(pattern).literal_separator(true).build()
}

fn build_set(patterns: &[String]) -> std::result::Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern)?);
    }
    builder.build()
}

impl FilesetMatcher {
    pub fn new(rule: &FilesetRule) -> std::result::Result<Self, globset::Error> {
        let includes = if rule.includes.is_empty() {
            None
        } else {
            Some(build_set(&rule.includes)?)
        };
        Ok(Self { includes, excludes: build_set(&rule.excludes)? })
    }

    /// `path` is relative to the rule's directory and uses `/` separators.
    pub fn is_match(&self, path: &str) -> bool {
        let included = self.includes.as_ref().is_none_or(|set| set.is_match(path));
        included && !self.excludes.is_match(path)
    }
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lists the files `rule` selects below `resource_root`, sorted by path.
///
/// Symbolic links are followed, so a linked file is selected like a regular
/// one and a linked directory is descended into.
///
/// # Arguments
/// * `resource_root` - The template tree the rule directories are relative to
/// * `rule` - The fileSet rule to resolve
///
/// # Returns
/// * `Result<Vec<ResolvedFile>>` - The selected files, or an empty list when
///   the rule directory does not exist
///
/// # Errors
/// * `Error::InvalidRule` - An include or exclude pattern is not a valid glob
/// * `Error::IoError` - The tree cannot be walked, including link cycles
pub fn resolve_fileset<P: AsRef<Path>>(resource_root: P, rule: &FilesetRule) -> Result<Vec<ResolvedFile>> {
    let resource_root = resource_root.as_ref();
    let rule_root = resource_root.join(&rule.directory);

    if !rule_root.is_dir() {
        debug!("Fileset directory '{}' is absent from the template", rule.directory);
        return Ok(Vec::new());
    }

    let matcher = FilesetMatcher::new(rule).map_err(|e| Error::InvalidRule {
        index: None,
        reason: format!("invalid pattern in fileSet '{}': {e}", rule.directory),
    })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&rule_root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::IoError(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let within_rule = entry
            .path()
            .strip_prefix(&rule_root)
            .map_err(|e| Error::IoError(std::io::Error::other(e)))?;
        let candidate = to_slash_path(within_rule);

        if matcher.is_match(&candidate) {
            debug!("Fileset '{}' selects '{}'", rule.directory, candidate);
            files.push(ResolvedFile {
                source: entry.path().to_path_buf(),
                relative: Path::new(&rule.directory).join(within_rule),
            });
        }
    }
    Ok(files)
}
