//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `forgekit-adapters` crate provides implementations.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::domain::{RenderContext, TemplateEntry, TemplateId};
use crate::error::ForgeResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `forgekit_adapters::filesystem::LocalFilesystem` (production)
/// - `forgekit_adapters::filesystem::MemoryFilesystem` (testing)
///
/// The cache, assembler, merger and rollback ledger are written purely
/// against this trait.
pub trait Filesystem: Send + Sync {
    /// Create a single directory. The parent must exist.
    fn create_dir(&self, path: &Path) -> ForgeResult<()>;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> ForgeResult<()>;

    /// Write bytes to a file, replacing any previous content.
    fn write_file(&self, path: &Path, content: &[u8]) -> ForgeResult<()>;

    /// Read a file's bytes.
    fn read_file(&self, path: &Path) -> ForgeResult<Vec<u8>>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> ForgeResult<()>;

    /// Remove an empty directory. Never recursive.
    fn remove_dir(&self, path: &Path) -> ForgeResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Direct children of a directory, sorted by path.
    fn list_dir(&self, path: &Path) -> ForgeResult<Vec<PathBuf>>;

    /// Size of a file in bytes.
    fn file_size(&self, path: &Path) -> ForgeResult<u64>;

    /// Last modification time.
    fn modified(&self, path: &Path) -> ForgeResult<SystemTime>;
}

/// Port for the read-only template tree.
///
/// Implemented by:
/// - `forgekit_adapters::template_source::DirectoryTemplateSource` (user trees on disk)
/// - `forgekit_adapters::template_source::MemoryTemplateSource` (built-ins and tests)
pub trait TemplateSource: Send + Sync {
    /// Whether `id` names a template *file*.
    fn exists(&self, id: &TemplateId) -> bool;

    /// Whether `id` names a template *directory*.
    fn is_dir(&self, id: &TemplateId) -> bool;

    /// Raw bytes of a template file.
    ///
    /// Fails with `TemplateNotFound` when `id` is not a file.
    fn read(&self, id: &TemplateId) -> ForgeResult<Vec<u8>>;

    /// Direct children of a template directory, sorted by name.
    ///
    /// Fails with `TemplateDirectoryNotFound` when `id` is not a directory.
    fn list(&self, id: &TemplateId) -> ForgeResult<Vec<TemplateEntry>>;

    /// Short human-readable origin, for logs and `forgekit list`.
    fn describe(&self) -> String;
}

/// Port for template expansion.
///
/// Implemented by:
/// - `forgekit_adapters::engine::TeraEngine`
pub trait TemplateEngine: Send + Sync {
    /// Expand `source` against `context`. `name` is used in diagnostics only.
    fn render(&self, name: &str, source: &str, context: &RenderContext) -> ForgeResult<String>;
}

/// Captured result of an external program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Port for running external programs (install, client generation, build).
///
/// Implemented by:
/// - `forgekit_adapters::command::SystemCommandRunner`
///
/// Only the CLI's post-generation steps use this; the generation pipeline
/// never runs external programs.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `cwd` and wait for it.
    ///
    /// A non-zero exit is reported through [`CommandOutput::status`], not as
    /// an error; errors mean the program could not be started.
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> ForgeResult<CommandOutput>;
}
