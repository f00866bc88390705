//! In-memory filesystem adapter for testing.
//!
//! Mirrors the `std::fs` semantics the core relies on: `create_dir` needs an
//! existing parent, `remove_dir` refuses non-empty directories, `write_file`
//! needs an existing parent directory. Any operation on a specific path can
//! be made to fail with [`MemoryFilesystem::fail_on`].

use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::SystemTime,
};

use forgekit_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{ForgeError, ForgeResult},
};

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    CreateDir,
    Write,
    Read,
    RemoveFile,
    RemoveDir,
    List,
}

#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    modified: SystemTime,
}

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, MemoryFile>,
    directories: BTreeSet<PathBuf>,
    faults: Vec<(PathBuf, FsOp)>,
}

impl MemoryFilesystemInner {
    fn is_dir(&self, path: &Path) -> bool {
        is_root(path) || self.directories.contains(path)
    }

    fn parent_exists(&self, path: &Path) -> bool {
        match path.parent() {
            None => true,
            Some(parent) => self.is_dir(parent),
        }
    }

    fn children(&self, path: &Path) -> Vec<PathBuf> {
        let is_child = |p: &&PathBuf| p.parent() == Some(path);
        let mut out: Vec<PathBuf> = self
            .directories
            .iter()
            .filter(is_child)
            .chain(self.files.keys().filter(is_child))
            .cloned()
            .collect();
        out.sort();
        out
    }

    fn check_fault(&self, path: &Path, op: FsOp) -> io::Result<()> {
        if self.faults.iter().any(|(p, o)| p == path && *o == op) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "injected failure",
            ));
        }
        Ok(())
    }
}

// `/` and the empty relative base always exist.
fn is_root(path: &Path) -> bool {
    path.parent().is_none() || path.as_os_str().is_empty()
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `op` on exactly `path` fail with `PermissionDenied`.
    #[doc(hidden)]
    pub fn fail_on(&self, path: impl Into<PathBuf>, op: FsOp) {
        if let Ok(mut inner) = self.inner.write() {
            inner.faults.push((path.into(), op));
        }
    }

    /// Remove all injected failures.
    pub fn clear_faults(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.faults.clear();
        }
    }

    /// Read a file's content as UTF-8 (testing helper).
    pub fn file_string(&self, path: impl AsRef<Path>) -> Option<String> {
        let inner = self.inner.read().ok()?;
        let file = inner.files.get(path.as_ref())?;
        String::from_utf8(file.content.clone()).ok()
    }

    /// All file paths, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All file paths under `root`, sorted.
    pub fn files_under(&self, root: impl AsRef<Path>) -> Vec<PathBuf> {
        let root = root.as_ref();
        self.files()
            .into_iter()
            .filter(|p| p.starts_with(root))
            .collect()
    }

    /// All directory paths, sorted.
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.directories.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Backdate (or postdate) a file. Returns `false` if it does not exist.
    pub fn set_modified(&self, path: impl AsRef<Path>, time: SystemTime) -> bool {
        let Ok(mut inner) = self.inner.write() else {
            return false;
        };
        match inner.files.get_mut(path.as_ref()) {
            Some(file) => {
                file.modified = time;
                true
            }
            None => false,
        }
    }

    fn read_inner(&self) -> ForgeResult<std::sync::RwLockReadGuard<'_, MemoryFilesystemInner>> {
        self.inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }

    fn write_inner(&self) -> ForgeResult<std::sync::RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        self.inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }
}

fn io_error(path: &Path, operation: &'static str, kind: io::ErrorKind) -> ForgeError {
    ApplicationError::filesystem(path, operation, io::Error::from(kind)).into()
}

fn fault(path: &Path, operation: &'static str, e: io::Error) -> ForgeError {
    ApplicationError::filesystem(path, operation, e).into()
}

impl Filesystem for MemoryFilesystem {
    fn create_dir(&self, path: &Path) -> ForgeResult<()> {
        const OP: &str = "create directory";
        let mut inner = self.write_inner()?;
        inner
            .check_fault(path, FsOp::CreateDir)
            .map_err(|e| fault(path, OP, e))?;

        if inner.is_dir(path) || inner.files.contains_key(path) {
            return Err(io_error(path, OP, io::ErrorKind::AlreadyExists));
        }
        if !inner.parent_exists(path) {
            return Err(io_error(path, OP, io::ErrorKind::NotFound));
        }
        inner.directories.insert(path.to_path_buf());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> ForgeResult<()> {
        const OP: &str = "create directory";
        let mut inner = self.write_inner()?;
        inner
            .check_fault(path, FsOp::CreateDir)
            .map_err(|e| fault(path, OP, e))?;

        for ancestor in path.ancestors() {
            if is_root(ancestor) {
                continue;
            }
            if inner.files.contains_key(ancestor) {
                return Err(io_error(ancestor, OP, io::ErrorKind::AlreadyExists));
            }
            inner.directories.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> ForgeResult<()> {
        const OP: &str = "write file";
        let mut inner = self.write_inner()?;
        inner
            .check_fault(path, FsOp::Write)
            .map_err(|e| fault(path, OP, e))?;

        if inner.is_dir(path) {
            return Err(io_error(path, OP, io::ErrorKind::IsADirectory));
        }
        if !inner.parent_exists(path) {
            return Err(io_error(path, OP, io::ErrorKind::NotFound));
        }
        inner.files.insert(
            path.to_path_buf(),
            MemoryFile {
                content: content.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn read_file(&self, path: &Path) -> ForgeResult<Vec<u8>> {
        const OP: &str = "read file";
        let inner = self.read_inner()?;
        inner
            .check_fault(path, FsOp::Read)
            .map_err(|e| fault(path, OP, e))?;

        inner
            .files
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| io_error(path, OP, io::ErrorKind::NotFound))
    }

    fn remove_file(&self, path: &Path) -> ForgeResult<()> {
        const OP: &str = "remove file";
        let mut inner = self.write_inner()?;
        inner
            .check_fault(path, FsOp::RemoveFile)
            .map_err(|e| fault(path, OP, e))?;

        inner
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io_error(path, OP, io::ErrorKind::NotFound))
    }

    fn remove_dir(&self, path: &Path) -> ForgeResult<()> {
        const OP: &str = "remove directory";
        let mut inner = self.write_inner()?;
        inner
            .check_fault(path, FsOp::RemoveDir)
            .map_err(|e| fault(path, OP, e))?;

        if !inner.directories.contains(path) {
            return Err(io_error(path, OP, io::ErrorKind::NotFound));
        }
        if !inner.children(path).is_empty() {
            return Err(io_error(path, OP, io::ErrorKind::DirectoryNotEmpty));
        }
        inner.directories.remove(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| inner.is_dir(path) || inner.files.contains_key(path))
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| inner.is_dir(path))
            .unwrap_or(false)
    }

    fn list_dir(&self, path: &Path) -> ForgeResult<Vec<PathBuf>> {
        const OP: &str = "list directory";
        let inner = self.read_inner()?;
        inner
            .check_fault(path, FsOp::List)
            .map_err(|e| fault(path, OP, e))?;

        if !inner.is_dir(path) {
            return Err(io_error(path, OP, io::ErrorKind::NotFound));
        }
        Ok(inner.children(path))
    }

    fn file_size(&self, path: &Path) -> ForgeResult<u64> {
        let inner = self.read_inner()?;
        inner
            .files
            .get(path)
            .map(|f| f.content.len() as u64)
            .ok_or_else(|| io_error(path, "get metadata", io::ErrorKind::NotFound))
    }

    fn modified(&self, path: &Path) -> ForgeResult<SystemTime> {
        let inner = self.read_inner()?;
        inner
            .files
            .get(path)
            .map(|f| f.modified)
            .ok_or_else(|| io_error(path, "get metadata", io::ErrorKind::NotFound))
    }
}
