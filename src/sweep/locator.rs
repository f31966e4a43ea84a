//! Run discovery
//!
//! Enumerates candidate run directories directly under a sweep root and
//! pairs each with its parsed identifier. Enumeration order is
//! lexicographic by directory name, so every downstream ordering rule
//! (first-seen tie-breaks, last-wins grid cells) is reproducible across
//! platforms and repeated invocations.

use std::path::{Path, PathBuf};

use tracing::info;

use super::ident::RunIdent;
use crate::config::SweepLayout;
use crate::{Error, Result};

/// One located run: its directory and the identifier parsed from the name.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRun {
    name: String,
    dir: PathBuf,
    ident: RunIdent,
}

impl SweepRun {
    /// The run's directory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The run directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The hyperparameter tuple parsed from the name.
    #[must_use]
    pub const fn ident(&self) -> &RunIdent {
        &self.ident
    }
}

/// List candidate run directories under the sweep root.
///
/// A candidate is a directory entry whose name starts with the layout's
/// run prefix. Non-directories and non-UTF-8 names are ignored. The
/// result is sorted lexicographically by name; an empty result is not an
/// error.
///
/// # Errors
///
/// Returns [`Error::SweepRootNotFound`] when the root itself is missing,
/// or an IO error if the directory cannot be read.
pub fn candidate_dirs(layout: &SweepLayout) -> Result<Vec<PathBuf>> {
    let root = &layout.sweep_root;
    if !root.is_dir() {
        return Err(Error::SweepRootNotFound(root.clone()));
    }

    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.starts_with(&layout.run_prefix) {
            dirs.push(entry.path());
        }
    }
    dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(dirs)
}

/// Locate runs and parse their identifiers.
///
/// Directories whose names do not fit the identifier grammar are skipped
/// with a one-line log naming the directory and the reason; they never
/// fail the sweep.
///
/// # Errors
///
/// Propagates [`candidate_dirs`] errors.
pub fn parsed_runs(layout: &SweepLayout) -> Result<Vec<SweepRun>> {
    let mut runs = Vec::new();
    for dir in candidate_dirs(layout)? {
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match RunIdent::parse(name) {
            Ok(ident) => runs.push(SweepRun {
                name: name.to_string(),
                dir: dir.clone(),
                ident,
            }),
            Err(reject) => {
                info!(run = name, reason = %reject, "skipping directory");
            }
        }
    }
    Ok(runs)
}

/// Select a run's most recent checkpoint.
///
/// Checkpoints follow the `step_<N>` naming convention; "most recent" is
/// the lexicographically last matching entry, mirroring how the sweep
/// writes them. Returns `None` when the run has no checkpoints.
///
/// # Errors
///
/// Returns an IO error if the run directory cannot be read.
pub fn latest_checkpoint(run_dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    let mut names: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(run_dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(prefix) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names.pop().map(|name| run_dir.join(name)))
}
