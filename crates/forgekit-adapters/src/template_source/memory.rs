//! In-memory template tree.
//!
//! Holds the embedded built-in templates, and gives tests a tree they can
//! edit between renders. Directories are implied by the files beneath them.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, RwLock},
};

use forgekit_core::{
    application::{ApplicationError, ports::TemplateSource},
    domain::{TemplateEntry, TemplateId},
    error::ForgeResult,
};

use crate::builtin_templates;

/// Thread-safe in-memory template tree.
///
/// Clones share the same tree, so a test can keep a handle and mutate
/// templates after handing the source to a generator.
#[derive(Debug, Clone)]
pub struct MemoryTemplateSource {
    inner: Arc<RwLock<Tree>>,
}

#[derive(Debug, Default)]
struct Tree {
    label: String,
    files: BTreeMap<TemplateId, Vec<u8>>,
    dirs: BTreeSet<TemplateId>,
    vanishing: BTreeSet<TemplateId>,
}

impl Tree {
    fn add_ancestors(&mut self, id: &TemplateId) {
        let mut cursor = id.parent();
        while let Some(dir) = cursor {
            cursor = dir.parent();
            self.dirs.insert(dir);
        }
    }
}

impl MemoryTemplateSource {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::with_label("memory")
    }

    fn with_label(label: &str) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Tree {
                label: label.to_string(),
                ..Tree::default()
            })),
        }
    }

    /// Build a tree from `(identity, content)` pairs.
    pub fn from_files<I, P, C>(files: I) -> ForgeResult<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<Vec<u8>>,
    {
        let source = Self::new();
        for (path, content) in files {
            source.insert(path.as_ref(), content)?;
        }
        Ok(source)
    }

    /// The templates shipped with forgekit.
    pub fn builtin() -> ForgeResult<Self> {
        let source = Self::with_label("built-in");
        for (path, content) in builtin_templates::BUILTIN_FILES {
            source.insert(path, *content)?;
        }
        Ok(source)
    }

    /// Add or replace a template file.
    pub fn insert(&self, path: &str, content: impl Into<Vec<u8>>) -> ForgeResult<()> {
        let id = TemplateId::new(path)?;
        let mut tree = self.write_tree()?;
        tree.add_ancestors(&id);
        tree.files.insert(id, content.into());
        Ok(())
    }

    /// Remove a template file. Returns whether it existed.
    pub fn remove(&self, path: &str) -> ForgeResult<bool> {
        let id = TemplateId::new(path)?;
        Ok(self.write_tree()?.files.remove(&id).is_some())
    }

    /// Register a directory that reports as existing but cannot be listed,
    /// as if it were deleted between the check and the walk.
    #[doc(hidden)]
    pub fn insert_vanishing_dir(&self, path: &str) -> ForgeResult<()> {
        let id = TemplateId::new(path)?;
        let mut tree = self.write_tree()?;
        tree.add_ancestors(&id);
        tree.vanishing.insert(id);
        Ok(())
    }

    /// Number of template files.
    pub fn len(&self) -> usize {
        self.inner.read().map(|t| t.files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every template file identity, sorted.
    pub fn ids(&self) -> Vec<TemplateId> {
        self.inner
            .read()
            .map(|t| t.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn write_tree(&self) -> ForgeResult<std::sync::RwLockWriteGuard<'_, Tree>> {
        self.inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }

    fn read_tree(&self) -> ForgeResult<std::sync::RwLockReadGuard<'_, Tree>> {
        self.inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }
}

impl Default for MemoryTemplateSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateSource for MemoryTemplateSource {
    fn exists(&self, id: &TemplateId) -> bool {
        self.inner
            .read()
            .map(|t| t.files.contains_key(id))
            .unwrap_or(false)
    }

    fn is_dir(&self, id: &TemplateId) -> bool {
        self.inner
            .read()
            .map(|t| t.dirs.contains(id) || t.vanishing.contains(id))
            .unwrap_or(false)
    }

    fn read(&self, id: &TemplateId) -> ForgeResult<Vec<u8>> {
        self.read_tree()?
            .files
            .get(id)
            .cloned()
            .ok_or_else(|| ApplicationError::TemplateNotFound { id: id.to_string() }.into())
    }

    fn list(&self, id: &TemplateId) -> ForgeResult<Vec<TemplateEntry>> {
        let tree = self.read_tree()?;
        if tree.vanishing.contains(id) || !tree.dirs.contains(id) {
            return Err(ApplicationError::TemplateDirectoryNotFound { id: id.to_string() }.into());
        }

        let is_child = |child: &&TemplateId| child.parent().as_ref() == Some(id);
        let mut entries: Vec<TemplateEntry> = tree
            .dirs
            .iter()
            .chain(tree.vanishing.iter())
            .filter(is_child)
            .cloned()
            .map(TemplateEntry::directory)
            .chain(
                tree.files
                    .keys()
                    .filter(is_child)
                    .cloned()
                    .map(TemplateEntry::file),
            )
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries.dedup();
        Ok(entries)
    }

    fn describe(&self) -> String {
        self.inner
            .read()
            .map(|t| t.label.clone())
            .unwrap_or_else(|_| "memory".to_string())
    }
}
