//! Template tree read from a directory on disk.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use forgekit_core::{
    application::{ApplicationError, ports::TemplateSource},
    domain::{TemplateEntry, TemplateId},
    error::{ForgeError, ForgeResult},
};

/// Reads templates from `root`, mapping each `/`-separated identity segment
/// onto one path component.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateSource {
    root: PathBuf,
}

impl DirectoryTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, id: &TemplateId) -> PathBuf {
        id.segments().fold(self.root.clone(), |acc, seg| acc.join(seg))
    }
}

impl TemplateSource for DirectoryTemplateSource {
    fn exists(&self, id: &TemplateId) -> bool {
        self.path_of(id).is_file()
    }

    fn is_dir(&self, id: &TemplateId) -> bool {
        self.path_of(id).is_dir()
    }

    fn read(&self, id: &TemplateId) -> ForgeResult<Vec<u8>> {
        let path = self.path_of(id);
        if path.is_dir() {
            return Err(ApplicationError::TemplateNotFound { id: id.to_string() }.into());
        }
        std::fs::read(&path).map_err(|e| -> ForgeError {
            match e.kind() {
                io::ErrorKind::NotFound => {
                    ApplicationError::TemplateNotFound { id: id.to_string() }.into()
                }
                _ => ApplicationError::filesystem(&path, "read template", e).into(),
            }
        })
    }

    fn list(&self, id: &TemplateId) -> ForgeResult<Vec<TemplateEntry>> {
        let dir = self.path_of(id);
        if !dir.is_dir() {
            return Err(ApplicationError::TemplateDirectoryNotFound { id: id.to_string() }.into());
        }

        let mut entries = Vec::new();
        for walk_entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let walk_entry = walk_entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                let io = e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("directory loop"));
                ApplicationError::filesystem(&path, "list templates", io)
            })?;

            let Some(name) = walk_entry.file_name().to_str() else {
                warn!(path = %walk_entry.path().display(), "Skipping non-UTF-8 template name");
                continue;
            };
            let child = id.join(name)?;

            if walk_entry.path().is_dir() {
                entries.push(TemplateEntry::directory(child));
            } else {
                entries.push(TemplateEntry::file(child));
            }
        }

        debug!(dir = %id, count = entries.len(), "Listed template directory");
        Ok(entries)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
