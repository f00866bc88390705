//! Tree assembler.
//!
//! Mirrors a template directory into the project, rendering `.tera` files,
//! copying everything else byte-for-byte, and dropping variant files the
//! configuration does not select. Every path it creates is recorded in the
//! caller's [`RollbackLedger`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{
    ApplicationError,
    ports::{Filesystem, TemplateSource},
    services::{RollbackLedger, TemplateRenderer},
};
use crate::domain::{ProjectConfig, TemplateFileName, TemplateId};
use crate::error::ForgeResult;

/// Subtrees of the base tree that are only copied by their own feature step.
pub const GATED_SUBTREES: &[&str] = &["base/docker", "base/tests"];

/// Counters for one `copy_directory` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopySummary {
    pub files_written: usize,
    pub dirs_created: usize,
    pub skipped: usize,
}

impl std::ops::AddAssign for CopySummary {
    fn add_assign(&mut self, rhs: Self) {
        self.files_written += rhs.files_written;
        self.dirs_created += rhs.dirs_created;
        self.skipped += rhs.skipped;
    }
}

/// Copies template directories into a project tree.
pub struct TreeAssembler {
    source: Arc<dyn TemplateSource>,
    fs: Arc<dyn Filesystem>,
    renderer: TemplateRenderer,
    gated: Vec<TemplateId>,
}

impl TreeAssembler {
    pub fn new(
        source: Arc<dyn TemplateSource>,
        fs: Arc<dyn Filesystem>,
        renderer: TemplateRenderer,
    ) -> Self {
        let gated = GATED_SUBTREES
            .iter()
            .filter_map(|id| TemplateId::new(*id).ok())
            .collect();
        Self {
            source,
            fs,
            renderer,
            gated,
        }
    }

    /// Recursively mirror `source_id` into `target`.
    ///
    /// Missing ancestors of `target` are created and tracked. Existing
    /// directories are reused and not tracked; files are tracked only when
    /// they did not exist before the write.
    ///
    /// # Errors
    ///
    /// - `TemplateDirectoryNotFound` if `source_id` is not a template directory
    /// - Any rendering or filesystem error; work done so far stays tracked
    #[instrument(skip_all, fields(source = %source_id, target = %target.display()))]
    pub fn copy_directory(
        &self,
        source_id: &TemplateId,
        target: &Path,
        config: &ProjectConfig,
        ledger: &mut RollbackLedger,
    ) -> ForgeResult<CopySummary> {
        if !self.source.is_dir(source_id) {
            return Err(ApplicationError::TemplateDirectoryNotFound {
                id: source_id.to_string(),
            }
            .into());
        }

        let mut summary = CopySummary {
            dirs_created: create_tracked_dirs(self.fs.as_ref(), target, ledger)?,
            ..CopySummary::default()
        };
        self.copy_entries(source_id, target, config, ledger, &mut summary)?;

        debug!(
            files = summary.files_written,
            dirs = summary.dirs_created,
            skipped = summary.skipped,
            "Directory copied"
        );
        Ok(summary)
    }

    fn copy_entries(
        &self,
        dir: &TemplateId,
        target: &Path,
        config: &ProjectConfig,
        ledger: &mut RollbackLedger,
        summary: &mut CopySummary,
    ) -> ForgeResult<()> {
        let mut entries = self.source.list(dir)?;
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        for entry in entries {
            if entry.is_dir() {
                if self.gated.contains(&entry.id) {
                    debug!(dir = %entry.id, "Skipping feature-gated subtree");
                    summary.skipped += 1;
                    continue;
                }

                let dest = target.join(entry.id.file_name());
                if !self.fs.is_dir(&dest) {
                    self.fs.create_dir(&dest)?;
                    ledger.track_dir(&dest);
                    summary.dirs_created += 1;
                }
                self.copy_entries(&entry.id, &dest, config, ledger, summary)?;
                continue;
            }

            let name = TemplateFileName::parse(entry.id.file_name());
            if !name.is_selected_by(config) {
                debug!(template = %entry.id, "Skipping unselected variant");
                summary.skipped += 1;
                continue;
            }

            let dest = target.join(name.output_name());
            let content = if name.is_rendered() {
                self.renderer.render(&entry.id, config)?.into_bytes()
            } else {
                self.source.read(&entry.id)?
            };

            write_tracked(self.fs.as_ref(), &dest, &content, ledger)?;
            debug!(template = %entry.id, dest = %dest.display(), "Wrote file");
            summary.files_written += 1;
        }

        Ok(())
    }
}

/// Create `path` and any missing ancestors one level at a time, tracking
/// each directory created. Returns how many were created.
pub(crate) fn create_tracked_dirs(
    fs: &dyn Filesystem,
    path: &Path,
    ledger: &mut RollbackLedger,
) -> ForgeResult<usize> {
    let mut missing: Vec<PathBuf> = Vec::new();
    let mut cursor = Some(path);
    while let Some(dir) = cursor {
        if dir.as_os_str().is_empty() || fs.is_dir(dir) {
            break;
        }
        missing.push(dir.to_path_buf());
        cursor = dir.parent();
    }

    for dir in missing.iter().rev() {
        fs.create_dir(dir)?;
        ledger.track_dir(dir);
    }
    Ok(missing.len())
}

/// Write `content` to `path`, tracking it if it is new.
pub(crate) fn write_tracked(
    fs: &dyn Filesystem,
    path: &Path,
    content: &[u8],
    ledger: &mut RollbackLedger,
) -> ForgeResult<()> {
    let existed = fs.exists(path);
    fs.write_file(path, content)?;
    if !existed {
        ledger.track_file(path);
    }
    Ok(())
}

impl std::fmt::Debug for TreeAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeAssembler")
            .field("source", &self.source.describe())
            .field("gated", &self.gated)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gated_subtrees_are_valid_identities() {
        for id in GATED_SUBTREES {
            assert!(TemplateId::new(*id).is_ok(), "{id}");
        }
    }

    #[test]
    fn summaries_add_up() {
        let mut total = CopySummary {
            files_written: 2,
            dirs_created: 1,
            skipped: 0,
        };
        total += CopySummary {
            files_written: 3,
            dirs_created: 0,
            skipped: 4,
        };
        assert_eq!(
            total,
            CopySummary {
                files_written: 5,
                dirs_created: 1,
                skipped: 4,
            }
        );
    }
}
