//! Manifest merger.
//!
//! Combines the base `package.json` template with an ORM's additions
//! fragment. Keys only in the additions are appended, keys in both take the
//! additions value, keys only in the base are kept. Object sections present
//! on both sides (`dependencies`, `scripts`, ...) are merged entry by entry,
//! so an overlapping dependency replaces only that dependency.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::application::{
    ApplicationError,
    ports::{Filesystem, TemplateSource},
    services::{
        RollbackLedger, TemplateRenderer,
        assembler::{create_tracked_dirs, write_tracked},
    },
};
use crate::domain::{ProjectConfig, TemplateId};
use crate::error::{ForgeError, ForgeResult};

/// What `merge` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The additions template does not exist; nothing was written.
    Skipped,
    /// The merged manifest was written.
    Merged { added: usize, overwritten: usize },
}

impl MergeOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// Merge `additions` into `base`.
///
/// Returns `(added, overwritten)`, counted per leaf: an entry inside a
/// merged section counts once, as does a replaced top-level value.
pub fn merge_documents(
    base: &mut Map<String, Value>,
    additions: Map<String, Value>,
) -> (usize, usize) {
    let mut added = 0;
    let mut overwritten = 0;

    for (key, value) in additions {
        match base.get_mut(&key) {
            Some(Value::Object(section)) if value.is_object() => {
                if let Value::Object(entries) = value {
                    for (name, entry) in entries {
                        if section.insert(name, entry).is_some() {
                            overwritten += 1;
                        } else {
                            added += 1;
                        }
                    }
                }
            }
            Some(slot) => {
                *slot = value;
                overwritten += 1;
            }
            None => {
                base.insert(key, value);
                added += 1;
            }
        }
    }

    (added, overwritten)
}

/// Renders, merges and writes `package.json`.
pub struct ManifestMerger {
    source: Arc<dyn TemplateSource>,
    fs: Arc<dyn Filesystem>,
    renderer: TemplateRenderer,
}

impl ManifestMerger {
    pub fn new(
        source: Arc<dyn TemplateSource>,
        fs: Arc<dyn Filesystem>,
        renderer: TemplateRenderer,
    ) -> Self {
        Self {
            source,
            fs,
            renderer,
        }
    }

    /// Merge `additions_id` over `base_id` and write the result to `target`.
    ///
    /// # Errors
    ///
    /// - `TemplateNotFound` if the base template is missing
    /// - `MalformedManifest` if either side does not render to a JSON object
    /// - Filesystem errors from the write
    #[instrument(skip_all, fields(base = %base_id, additions = %additions_id))]
    pub fn merge(
        &self,
        base_id: &TemplateId,
        additions_id: &TemplateId,
        target: &Path,
        config: &ProjectConfig,
        ledger: &mut RollbackLedger,
    ) -> ForgeResult<MergeOutcome> {
        if !self.source.exists(additions_id) {
            info!("No manifest additions for this configuration");
            return Ok(MergeOutcome::Skipped);
        }

        let mut base = self.load(base_id, config)?;
        let additions = self.load(additions_id, config)?;
        let (added, overwritten) = merge_documents(&mut base, additions);

        let mut json = serde_json::to_string_pretty(&Value::Object(base)).map_err(|e| {
            ForgeError::Internal {
                message: format!("manifest serialization failed: {e}"),
            }
        })?;
        json.push('\n');

        if let Some(parent) = target.parent() {
            create_tracked_dirs(self.fs.as_ref(), parent, ledger)?;
        }
        write_tracked(self.fs.as_ref(), target, json.as_bytes(), ledger)?;

        info!(added, overwritten, target = %target.display(), "Manifest merged");
        Ok(MergeOutcome::Merged { added, overwritten })
    }

    fn load(&self, id: &TemplateId, config: &ProjectConfig) -> ForgeResult<Map<String, Value>> {
        let text = self.renderer.render(id, config)?;
        let malformed = |reason: String| ApplicationError::MalformedManifest {
            template: id.to_string(),
            reason,
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(malformed(format!(
                "top level must be an object, found {}",
                json_kind(&other)
            ))
            .into()),
            Err(e) => Err(malformed(e.to_string()).into()),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl std::fmt::Debug for ManifestMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestMerger")
            .field("source", &self.source.describe())
            .finish_non_exhaustive()
    }
}
