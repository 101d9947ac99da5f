//! Applies fixes proposed by rule checks
//!
//! Each fix is checked against the current on-disk state before anything is
//! written. A fix whose preconditions no longer hold fails closed: nothing is
//! changed and the finding stays.
//!
//! When several fixes touch one model they must be applied in the order given
//! by [`order_fixes`]: text rewrites from the end of each file backwards, then
//! file renames, then the package directory rename.

use crate::diagnostic::{Fix, FixAction};
use crate::model::ModelDescriptor;
use log::{debug, info, warn};
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Why a fix was refused or could not be written
#[derive(Debug, Error)]
pub enum FixError {
    #[error("{} lies outside {}", target.display(), allowed.display())]
    OutsideModel { target: PathBuf, allowed: PathBuf },

    #[error("{} no longer exists", .0.display())]
    SourceMissing(PathBuf),

    #[error("{} already exists", .0.display())]
    DestinationExists(PathBuf),

    #[error("{} changed on disk: expected '{expected}' at {start}..{end}", file.display())]
    Conflict {
        file: PathBuf,
        start: usize,
        end: usize,
        expected: String,
    },

    #[error("cannot update {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FixError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of applying one fix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "lowercase")]
pub enum FixOutcome {
    Applied,
    Skipped(String),
    Failed(String),
}

impl FixOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FixOutcome::Applied)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FixOutcome::Failed(_))
    }
}

impl fmt::Display for FixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixOutcome::Applied => write!(f, "applied"),
            FixOutcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            FixOutcome::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Auto-fixer that applies fixes to files
pub struct Fixer {
    /// Dry run mode (check preconditions, don't write changes)
    dry_run: bool,
}

impl Fixer {
    /// Create a new fixer
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Apply one fix proposed for `model`
    pub fn apply(&self, model: &ModelDescriptor, fix: &Fix) -> FixOutcome {
        let result = match &fix.action {
            FixAction::Rename { from, to } => self.rename(model, from, to),
            FixAction::ReplaceSpan {
                file,
                start,
                end,
                expected,
                replacement,
            } => self.replace_span(model, file, *start, *end, expected, replacement),
        };

        match result {
            Ok(outcome) => {
                debug!("{}: {}", fix.description, outcome);
                outcome
            }
            Err(e) => {
                warn!("Fix '{}' refused: {}", fix.description, e);
                FixOutcome::Failed(e.to_string())
            }
        }
    }

    fn rename(
        &self,
        model: &ModelDescriptor,
        from: &Path,
        to: &Path,
    ) -> Result<FixOutcome, FixError> {
        // The package itself may only move within its parent directory
        let allowed = if from == model.root_path {
            model
                .root_path
                .parent()
                .unwrap_or(&model.root_path)
                .to_path_buf()
        } else {
            model.root_path.clone()
        };
        for path in [from, to] {
            if !is_within(path, &allowed) || path == allowed {
                return Err(FixError::OutsideModel {
                    target: path.to_path_buf(),
                    allowed,
                });
            }
        }

        if fs::symlink_metadata(from).is_err() {
            return Err(FixError::SourceMissing(from.to_path_buf()));
        }
        if entry_exists(to)? {
            return Err(FixError::DestinationExists(to.to_path_buf()));
        }

        if self.dry_run {
            return Ok(FixOutcome::Skipped("dry run".to_string()));
        }

        fs::rename(from, to).map_err(|e| FixError::io(from, e))?;
        info!("Renamed {} -> {}", from.display(), to.display());
        Ok(FixOutcome::Applied)
    }

    fn replace_span(
        &self,
        model: &ModelDescriptor,
        file: &Path,
        start: usize,
        end: usize,
        expected: &str,
        replacement: &str,
    ) -> Result<FixOutcome, FixError> {
        if !is_within(file, &model.root_path) {
            return Err(FixError::OutsideModel {
                target: file.to_path_buf(),
                allowed: model.root_path.clone(),
            });
        }

        let content = match fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FixError::SourceMissing(file.to_path_buf()))
            }
            Err(e) => return Err(FixError::io(file, e)),
        };

        if content.get(start..end) != Some(expected) {
            let already = start
                .checked_add(replacement.len())
                .and_then(|stop| content.get(start..stop))
                == Some(replacement);
            if already {
                return Ok(FixOutcome::Skipped("already applied".to_string()));
            }
            return Err(FixError::Conflict {
                file: file.to_path_buf(),
                start,
                end,
                expected: expected.to_string(),
            });
        }

        if self.dry_run {
            return Ok(FixOutcome::Skipped("dry run".to_string()));
        }

        let mut updated = String::with_capacity(content.len() + replacement.len());
        updated.push_str(&content[..start]);
        updated.push_str(replacement);
        updated.push_str(&content[end..]);
        fs::write(file, updated).map_err(|e| FixError::io(file, e))?;
        info!(
            "Rewrote {} bytes {}..{} of {}",
            expected.len(),
            start,
            end,
            file.display()
        );
        Ok(FixOutcome::Applied)
    }
}

/// Order fixes so that earlier ones cannot invalidate later ones
///
/// Span rewrites come first, grouped by file and from the highest offset down;
/// then renames inside the package, deepest path first; the package rename is
/// always last.
pub fn order_fixes<'a>(model: &ModelDescriptor, fixes: &[&'a Fix]) -> Vec<&'a Fix> {
    let mut ordered = fixes.to_vec();
    ordered.sort_by_key(|fix| match &fix.action {
        FixAction::ReplaceSpan { file, start, .. } => {
            (0, file.clone(), Reverse(*start))
        }
        FixAction::Rename { from, .. } if from == &model.root_path => {
            (2, PathBuf::new(), Reverse(0))
        }
        FixAction::Rename { from, .. } => {
            (1, PathBuf::new(), Reverse(from.components().count()))
        }
    });
    ordered
}

/// Lexical containment: `path` is below `root` and has no `..` components
fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
        && !path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
}

/// Whether a directory entry with exactly this name exists
///
/// Compares listed names so that a case-only rename is not mistaken for a
/// collision on case-insensitive filesystems.
fn entry_exists(path: &Path) -> Result<bool, FixError> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Ok(false);
    };
    let listing = match fs::read_dir(parent) {
        Ok(listing) => listing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(FixError::io(parent, e)),
    };
    for entry in listing {
        let entry = entry.map_err(|e| FixError::io(parent, e))?;
        if entry.file_name() == name {
            return Ok(true);
        }
    }
    Ok(false)
}
