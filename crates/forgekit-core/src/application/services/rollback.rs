//! Rollback ledger.
//!
//! Records every file and directory a generation attempt creates so a
//! failed attempt can be undone. Removal is best-effort and never recursive:
//! a directory that still has children after its tracked contents are gone
//! is left in place and reported.
//!
//! ## Lifecycle
//!
//! ```text
//! NoCheckpoint ──checkpoint()──▶ Checkpointed ──reset()────▶ Committed
//!                                     │
//!                                     └──────rollback()──▶ RolledBack
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ports::Filesystem};

/// Everything one generation attempt created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub project_root: PathBuf,
    pub created_files: Vec<PathBuf>,
    pub created_dirs: Vec<PathBuf>,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            created_files: Vec::new(),
            created_dirs: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.created_files.len() + self.created_dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of undoing one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// No checkpoint was open.
    NothingToRollBack,

    /// Every tracked path is gone.
    FullyRolledBack { removed: usize },

    /// Some paths could not be removed.
    PartiallyRolledBack {
        removed: usize,
        remaining: Vec<PathBuf>,
        causes: Vec<String>,
    },
}

impl RollbackOutcome {
    /// Number of paths actually removed.
    pub fn removed(&self) -> usize {
        match self {
            Self::NothingToRollBack => 0,
            Self::FullyRolledBack { removed } | Self::PartiallyRolledBack { removed, .. } => {
                *removed
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::PartiallyRolledBack { .. })
    }

    /// Turn a partial rollback into [`ApplicationError::RollbackPartialFailure`].
    pub fn into_result(self) -> Result<usize, ApplicationError> {
        match self {
            Self::NothingToRollBack => Ok(0),
            Self::FullyRolledBack { removed } => Ok(removed),
            Self::PartiallyRolledBack {
                remaining, causes, ..
            } => Err(ApplicationError::RollbackPartialFailure { remaining, causes }),
        }
    }
}

/// Stack of checkpoints, one per generation attempt.
///
/// Tracking calls made while no checkpoint is open are ignored.
pub struct RollbackLedger {
    fs: Arc<dyn Filesystem>,
    entries: Vec<LedgerEntry>,
}

impl RollbackLedger {
    pub fn new(fs: Arc<dyn Filesystem>) -> Self {
        Self {
            fs,
            entries: Vec::new(),
        }
    }

    /// Open a new checkpoint for `project_root`.
    pub fn checkpoint(&mut self, project_root: impl Into<PathBuf>) {
        let entry = LedgerEntry::new(project_root.into());
        debug!(root = %entry.project_root.display(), "Checkpoint opened");
        self.entries.push(entry);
    }

    pub fn track_file(&mut self, path: impl Into<PathBuf>) {
        if let Some(entry) = self.entries.last_mut() {
            entry.created_files.push(path.into());
        }
    }

    pub fn track_dir(&mut self, path: impl Into<PathBuf>) {
        if let Some(entry) = self.entries.last_mut() {
            entry.created_dirs.push(path.into());
        }
    }

    /// The open checkpoint, if any.
    pub fn current(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    /// Number of open checkpoints.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Commit: discard the most recent checkpoint without touching the disk.
    pub fn reset(&mut self) {
        if let Some(entry) = self.entries.pop() {
            debug!(
                root = %entry.project_root.display(),
                tracked = entry.len(),
                "Checkpoint committed"
            );
        }
    }

    /// Undo the most recent checkpoint.
    #[instrument(skip_all, fields(depth = self.entries.len()))]
    pub fn rollback(&mut self) -> RollbackOutcome {
        let Some(entry) = self.entries.pop() else {
            return RollbackOutcome::NothingToRollBack;
        };

        let mut removed = 0;
        let mut remaining = Vec::new();
        let mut causes = Vec::new();

        for file in &entry.created_files {
            if !self.fs.exists(file) {
                continue;
            }
            match self.fs.remove_file(file) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "Rollback could not remove file");
                    remaining.push(file.clone());
                    causes.push(e.to_string());
                }
            }
        }

        // Reverse creation order: children before parents, and the project
        // root before any ancestors created for it.
        let mut root_handled = false;
        for dir in entry.created_dirs.iter().rev() {
            if dir == &entry.project_root {
                self.remove_root(&entry, &mut removed, &mut remaining, &mut causes);
                root_handled = true;
                continue;
            }
            if !self.fs.is_dir(dir) {
                continue;
            }
            match self.fs.remove_dir(dir) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Rollback could not remove directory");
                    remaining.push(dir.clone());
                    causes.push(e.to_string());
                }
            }
        }

        if !root_handled {
            self.remove_root(&entry, &mut removed, &mut remaining, &mut causes);
        }

        if remaining.is_empty() {
            info!(removed, "Rolled back");
            RollbackOutcome::FullyRolledBack { removed }
        } else {
            warn!(removed, remaining = remaining.len(), "Partial rollback");
            RollbackOutcome::PartiallyRolledBack {
                removed,
                remaining,
                causes,
            }
        }
    }

    /// Undo every open checkpoint, most recent first.
    pub fn rollback_all(&mut self) -> Vec<RollbackOutcome> {
        let mut outcomes = Vec::with_capacity(self.entries.len());
        while !self.entries.is_empty() {
            outcomes.push(self.rollback());
        }
        outcomes
    }

    fn remove_root(
        &self,
        entry: &LedgerEntry,
        removed: &mut usize,
        remaining: &mut Vec<PathBuf>,
        causes: &mut Vec<String>,
    ) {
        let root = entry.project_root.as_path();
        if !self.fs.is_dir(root) {
            return;
        }

        let tracked = entry.created_dirs.iter().any(|d| d == root);

        if !self.is_empty_dir(root) {
            if tracked {
                remaining.push(root.to_path_buf());
                causes.push(format!("{}: directory not empty", root.display()));
            }
            return;
        }

        match self.fs.remove_dir(root) {
            Ok(()) => *removed += 1,
            Err(e) => {
                warn!(path = %root.display(), error = %e, "Rollback could not remove project root");
                remaining.push(root.to_path_buf());
                causes.push(e.to_string());
            }
        }
    }

    // Shallow check: only direct children count.
    fn is_empty_dir(&self, path: &Path) -> bool {
        self.fs
            .list_dir(path)
            .map(|children| children.is_empty())
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for RollbackLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollbackLedger")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeResult;
    use mockall::mock;
    use mockall::predicate::eq;
    use std::time::SystemTime;

    mock! {
        pub Fs {}
        impl Filesystem for Fs {
            fn create_dir(&self, path: &Path) -> ForgeResult<()>;
            fn create_dir_all(&self, path: &Path) -> ForgeResult<()>;
            fn write_file(&self, path: &Path, content: &[u8]) -> ForgeResult<()>;
            fn read_file(&self, path: &Path) -> ForgeResult<Vec<u8>>;
            fn remove_file(&self, path: &Path) -> ForgeResult<()>;
            fn remove_dir(&self, path: &Path) -> ForgeResult<()>;
            fn exists(&self, path: &Path) -> bool;
            fn is_dir(&self, path: &Path) -> bool;
            fn list_dir(&self, path: &Path) -> ForgeResult<Vec<PathBuf>>;
            fn file_size(&self, path: &Path) -> ForgeResult<u64>;
            fn modified(&self, path: &Path) -> ForgeResult<SystemTime>;
        }
    }

    fn denied(path: &Path) -> crate::error::ForgeError {
        ApplicationError::filesystem(
            path,
            "remove",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        )
        .into()
    }

    #[test]
    fn rollback_without_checkpoint_is_noop() {
        let mut ledger = RollbackLedger::new(Arc::new(MockFs::new()));
        ledger.track_file("/ignored");
        assert_eq!(ledger.rollback(), RollbackOutcome::NothingToRollBack);
        assert_eq!(ledger.depth(), 0);
    }

    #[test]
    fn reset_discards_without_filesystem_calls() {
        // A mock with no expectations panics on any call.
        let mut ledger = RollbackLedger::new(Arc::new(MockFs::new()));
        ledger.checkpoint("/app");
        ledger.track_dir("/app");
        ledger.track_file("/app/a.txt");
        assert_eq!(ledger.current().map(LedgerEntry::len), Some(2));

        ledger.reset();
        assert_eq!(ledger.depth(), 0);
        assert!(ledger.current().is_none());
    }

    #[test]
    fn failures_are_collected_and_removal_continues() {
        let mut fs = MockFs::new();
        fs.expect_exists().return_const(true);
        fs.expect_remove_file()
            .with(eq(Path::new("/app/locked.txt")))
            .returning(|p| Err(denied(p)));
        fs.expect_remove_file()
            .with(eq(Path::new("/app/src/main.ts")))
            .returning(|_| Ok(()));
        fs.expect_is_dir().return_const(true);
        fs.expect_remove_dir()
            .with(eq(Path::new("/app/src")))
            .times(1)
            .returning(|_| Ok(()));
        fs.expect_list_dir()
            .with(eq(Path::new("/app")))
            .returning(|_| Ok(vec![PathBuf::from("/app/locked.txt")]));

        let mut ledger = RollbackLedger::new(Arc::new(fs));
        ledger.checkpoint("/app");
        ledger.track_dir("/app");
        ledger.track_file("/app/locked.txt");
        ledger.track_dir("/app/src");
        ledger.track_file("/app/src/main.ts");

        let outcome = ledger.rollback();
        let RollbackOutcome::PartiallyRolledBack {
            removed,
            remaining,
            causes,
        } = outcome.clone()
        else {
            panic!("expected partial rollback, got {outcome:?}");
        };
        assert_eq!(removed, 2);
        assert_eq!(
            remaining,
            vec![PathBuf::from("/app/locked.txt"), PathBuf::from("/app")]
        );
        assert_eq!(causes.len(), 2);
        assert!(matches!(
            outcome.into_result(),
            Err(ApplicationError::RollbackPartialFailure { .. })
        ));
    }

    #[test]
    fn untracked_non_empty_root_is_left_silently() {
        let mut fs = MockFs::new();
        fs.expect_exists().return_const(false);
        fs.expect_is_dir().return_const(true);
        fs.expect_list_dir()
            .returning(|_| Ok(vec![PathBuf::from("/app/user-file")]));

        let mut ledger = RollbackLedger::new(Arc::new(fs));
        ledger.checkpoint("/app");
        ledger.track_file("/app/gone.txt");

        assert_eq!(
            ledger.rollback(),
            RollbackOutcome::FullyRolledBack { removed: 0 }
        );
    }

    #[test]
    fn rollback_all_unwinds_every_checkpoint() {
        let mut fs = MockFs::new();
        fs.expect_is_dir().return_const(false);

        let mut ledger = RollbackLedger::new(Arc::new(fs));
        ledger.checkpoint("/one");
        ledger.checkpoint("/two");
        let outcomes = ledger.rollback_all();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(RollbackOutcome::is_complete));
        assert_eq!(ledger.depth(), 0);
    }
}
