//! Local filesystem adapter using std::fs.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use forgekit_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{ForgeError, ForgeResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir(&self, path: &Path) -> ForgeResult<()> {
        std::fs::create_dir(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn create_dir_all(&self, path: &Path) -> ForgeResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> ForgeResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn read_file(&self, path: &Path) -> ForgeResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn remove_file(&self, path: &Path) -> ForgeResult<()> {
        std::fs::remove_file(path).map_err(|e| map_io_error(path, e, "remove file"))
    }

    fn remove_dir(&self, path: &Path) -> ForgeResult<()> {
        std::fs::remove_dir(path).map_err(|e| map_io_error(path, e, "remove directory"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, path: &Path) -> ForgeResult<Vec<PathBuf>> {
        let read_dir = std::fs::read_dir(path).map_err(|e| map_io_error(path, e, "list directory"))?;

        let mut children = read_dir
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|e| map_io_error(path, e, "list directory"))?;
        children.sort();
        Ok(children)
    }

    fn file_size(&self, path: &Path) -> ForgeResult<u64> {
        std::fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| map_io_error(path, e, "get metadata"))
    }

    fn modified(&self, path: &Path) -> ForgeResult<SystemTime> {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| map_io_error(path, e, "get metadata"))
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &'static str) -> ForgeError {
    ApplicationError::filesystem(path, operation, e).into()
}
