//! Project generator - main application orchestrator.
//!
//! Runs the generation steps in order against a fresh rollback ledger:
//!
//! 1. `copy-base`: `base/` into the project root
//! 2. `copy-orm`: `orm/<orm>/` into the project root, when present
//! 3. `merge-manifest`: `base/package.json.tera` + `manifests/<orm>.package.json.tera`
//! 4. `docker`: `base/docker/` into the project root, when enabled
//! 5. `testing`: `base/tests/` into `tests/`, when enabled
//! 6. `ci`: `ci/` into the project root
//! 7. `docs`: `docs/` into the project root
//!
//! The first failing step stops the pipeline and everything created so far
//! is rolled back.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::application::{
    ApplicationError,
    ports::{Filesystem, TemplateEngine, TemplateSource},
    services::{
        ContentCache, CopySummary, ManifestMerger, MergeOutcome, RollbackLedger,
        TemplateRenderer, TreeAssembler,
    },
};
use crate::domain::{ProjectConfig, TemplateId};
use crate::error::{ForgeError, ForgeResult, GenerationFailure};

// ── Steps ────────────────────────────────────────────────────────────────

/// One named stage of the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationStep {
    CopyBase,
    CopyOrm,
    MergeManifest,
    Docker,
    Testing,
    Ci,
    Docs,
}

impl GenerationStep {
    pub const ALL: [Self; 7] = [
        Self::CopyBase,
        Self::CopyOrm,
        Self::MergeManifest,
        Self::Docker,
        Self::Testing,
        Self::Ci,
        Self::Docs,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CopyBase => "copy-base",
            Self::CopyOrm => "copy-orm",
            Self::MergeManifest => "merge-manifest",
            Self::Docker => "docker",
            Self::Testing => "testing",
            Self::Ci => "ci",
            Self::Docs => "docs",
        }
    }
}

impl fmt::Display for GenerationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Completed,
    /// Disabled by the configuration or absent from the template tree.
    Skipped,
}

/// Per-step line of a [`GenerationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: GenerationStep,
    pub status: StepStatus,
    pub files_written: usize,
    pub dirs_created: usize,
}

/// What a successful generation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub project_root: PathBuf,
    pub steps: Vec<StepReport>,
    pub files_written: usize,
    pub dirs_created: usize,
    pub variants_skipped: usize,
    pub manifest_merged: bool,
}

impl GenerationReport {
    fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            steps: Vec::new(),
            files_written: 0,
            dirs_created: 0,
            variants_skipped: 0,
            manifest_merged: false,
        }
    }

    fn record(&mut self, step: GenerationStep, summary: Option<CopySummary>) {
        let status = if summary.is_some() {
            StepStatus::Completed
        } else {
            StepStatus::Skipped
        };
        let summary = summary.unwrap_or_default();
        self.files_written += summary.files_written;
        self.dirs_created += summary.dirs_created;
        self.variants_skipped += summary.skipped;
        self.steps.push(StepReport {
            step,
            status,
            files_written: summary.files_written,
            dirs_created: summary.dirs_created,
        });
    }

    /// Steps that actually ran.
    pub fn completed_steps(&self) -> impl Iterator<Item = GenerationStep> + '_ {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .map(|s| s.step)
    }
}

/// A step with the template paths it reads and the project path it writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    pub step: GenerationStep,
    pub enabled: bool,
    pub sources: Vec<String>,
    pub target: PathBuf,
}

// ── Generator ────────────────────────────────────────────────────────────

/// Generates a project tree for one configuration at a time.
///
/// Holds no per-request state: every `generate` call gets its own ledger.
pub struct ProjectGenerator {
    source: Arc<dyn TemplateSource>,
    fs: Arc<dyn Filesystem>,
    assembler: TreeAssembler,
    merger: ManifestMerger,
    overwrite: bool,
}

impl ProjectGenerator {
    /// Create a generator over the given adapters.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let generator = ProjectGenerator::new(
    ///     source, // Arc<dyn TemplateSource>
    ///     fs,     // Arc<dyn Filesystem>
    ///     engine, // Arc<dyn TemplateEngine>
    ///     Some(cache),
    /// );
    /// ```
    pub fn new(
        source: Arc<dyn TemplateSource>,
        fs: Arc<dyn Filesystem>,
        engine: Arc<dyn TemplateEngine>,
        cache: Option<Arc<ContentCache>>,
    ) -> Self {
        let renderer = TemplateRenderer::new(Arc::clone(&source), engine, cache);
        Self {
            assembler: TreeAssembler::new(Arc::clone(&source), Arc::clone(&fs), renderer.clone()),
            merger: ManifestMerger::new(Arc::clone(&source), Arc::clone(&fs), renderer),
            source,
            fs,
            overwrite: false,
        }
    }

    /// Allow generating into an existing non-empty directory.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Describe what `generate` would do, without touching the filesystem.
    pub fn plan(&self, project_path: &Path, config: &ProjectConfig) -> Vec<PlannedStep> {
        let orm = config.orm().as_str();
        let planned = |step, enabled, sources: &[String], target: PathBuf| PlannedStep {
            step,
            enabled,
            sources: sources.to_vec(),
            target,
        };

        let orm_dir = format!("orm/{orm}");
        let orm_present = TemplateId::new(orm_dir.as_str())
            .map(|id| self.source.is_dir(&id))
            .unwrap_or(false);

        vec![
            planned(GenerationStep::CopyBase, true, &["base".into()], project_path.to_path_buf()),
            planned(GenerationStep::CopyOrm, orm_present, &[orm_dir], project_path.to_path_buf()),
            planned(
                GenerationStep::MergeManifest,
                true,
                &["base/package.json.tera".into(), manifest_additions_path(orm)],
                project_path.join("package.json"),
            ),
            planned(
                GenerationStep::Docker,
                config.docker(),
                &["base/docker".into()],
                project_path.to_path_buf(),
            ),
            planned(
                GenerationStep::Testing,
                config.testing(),
                &["base/tests".into()],
                project_path.join("tests"),
            ),
            planned(GenerationStep::Ci, true, &["ci".into()], project_path.to_path_buf()),
            planned(GenerationStep::Docs, true, &["docs".into()], project_path.to_path_buf()),
        ]
    }

    /// Generate the project for `config` at `project_path`.
    ///
    /// # Errors
    ///
    /// - `Domain` if the configuration is invalid (nothing is touched)
    /// - `ProjectExists` if the target is a non-empty directory and
    ///   overwrite is off (nothing is touched)
    /// - `GenerationFailed` wrapping the first step error, after rollback
    #[instrument(
        skip_all,
        fields(project = %config.project_name(), path = %project_path.display())
    )]
    pub fn generate(
        &self,
        project_path: &Path,
        config: &ProjectConfig,
    ) -> ForgeResult<GenerationReport> {
        info!(%config, "Generating project");

        config.validate()?;
        self.check_target(project_path)?;

        let mut ledger = RollbackLedger::new(Arc::clone(&self.fs));
        ledger.checkpoint(project_path);

        let mut report = GenerationReport::new(project_path.to_path_buf());

        for step in GenerationStep::ALL {
            match self.run_step(step, project_path, config, &mut ledger, &mut report) {
                Ok(()) => {}
                Err(error) => {
                    error!(%step, %error, "Generation step failed, rolling back");
                    let rollback = ledger.rollback();
                    if !rollback.is_complete() {
                        warn!(?rollback, "Rollback left files behind");
                    }
                    return Err(ForgeError::GenerationFailed(Box::new(GenerationFailure {
                        step,
                        error,
                        rollback,
                    })));
                }
            }
        }

        ledger.reset();
        info!(
            files = report.files_written,
            dirs = report.dirs_created,
            "Project generated"
        );
        Ok(report)
    }

    fn check_target(&self, project_path: &Path) -> ForgeResult<()> {
        if !self.fs.exists(project_path) {
            return Ok(());
        }
        if !self.fs.is_dir(project_path) {
            return Err(ApplicationError::ProjectExists {
                path: project_path.to_path_buf(),
            }
            .into());
        }
        if self.overwrite || self.fs.list_dir(project_path)?.is_empty() {
            return Ok(());
        }
        Err(ApplicationError::ProjectExists {
            path: project_path.to_path_buf(),
        }
        .into())
    }

    fn run_step(
        &self,
        step: GenerationStep,
        root: &Path,
        config: &ProjectConfig,
        ledger: &mut RollbackLedger,
        report: &mut GenerationReport,
    ) -> ForgeResult<()> {
        let summary = match step {
            GenerationStep::CopyBase => Some(self.copy(&id("base")?, root, config, ledger)?),
            GenerationStep::CopyOrm => {
                let orm_dir = id(&format!("orm/{}", config.orm()))?;
                if self.source.is_dir(&orm_dir) {
                    Some(self.copy(&orm_dir, root, config, ledger)?)
                } else {
                    info!(orm = %config.orm(), "No ORM-specific templates");
                    None
                }
            }
            GenerationStep::MergeManifest => {
                let outcome = self.merger.merge(
                    &id("base/package.json.tera")?,
                    &id(&manifest_additions_path(config.orm().as_str()))?,
                    &root.join("package.json"),
                    config,
                    ledger,
                )?;
                report.manifest_merged = outcome.is_merged();
                match outcome {
                    MergeOutcome::Merged { .. } => Some(CopySummary {
                        files_written: 1,
                        ..CopySummary::default()
                    }),
                    MergeOutcome::Skipped => None,
                }
            }
            GenerationStep::Docker if config.docker() => {
                Some(self.copy(&id("base/docker")?, root, config, ledger)?)
            }
            GenerationStep::Testing if config.testing() => {
                Some(self.copy(&id("base/tests")?, &root.join("tests"), config, ledger)?)
            }
            GenerationStep::Docker | GenerationStep::Testing => None,
            GenerationStep::Ci => Some(self.copy(&id("ci")?, root, config, ledger)?),
            GenerationStep::Docs => Some(self.copy(&id("docs")?, root, config, ledger)?),
        };

        match &summary {
            Some(s) => info!(%step, files = s.files_written, "Step completed"),
            None => info!(%step, "Step skipped"),
        }
        report.record(step, summary);
        Ok(())
    }

    fn copy(
        &self,
        source: &TemplateId,
        target: &Path,
        config: &ProjectConfig,
        ledger: &mut RollbackLedger,
    ) -> ForgeResult<CopySummary> {
        self.assembler.copy_directory(source, target, config, ledger)
    }
}

fn manifest_additions_path(orm: &str) -> String {
    format!("manifests/{orm}.package.json.tera")
}

fn id(path: &str) -> ForgeResult<TemplateId> {
    TemplateId::new(path).map_err(ForgeError::from)
}

impl fmt::Debug for ProjectGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectGenerator")
            .field("source", &self.source.describe())
            .field("overwrite", &self.overwrite)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_are_kebab_case() {
        let names: Vec<&str> = GenerationStep::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            ["copy-base", "copy-orm", "merge-manifest", "docker", "testing", "ci", "docs"]
        );
        assert_eq!(
            serde_json::to_value(GenerationStep::MergeManifest).unwrap(),
            "merge-manifest"
        );
    }

    #[test]
    fn report_tallies_completed_and_skipped_steps() {
        let mut report = GenerationReport::new(PathBuf::from("/app"));
        report.record(
            GenerationStep::CopyBase,
            Some(CopySummary {
                files_written: 4,
                dirs_created: 2,
                skipped: 1,
            }),
        );
        report.record(GenerationStep::Docker, None);

        assert_eq!(report.files_written, 4);
        assert_eq!(report.dirs_created, 2);
        assert_eq!(report.variants_skipped, 1);
        assert_eq!(
            report.completed_steps().collect::<Vec<_>>(),
            [GenerationStep::CopyBase]
        );
        assert_eq!(report.steps[1].status, StepStatus::Skipped);
    }

    #[test]
    fn additions_path_is_per_orm() {
        assert_eq!(
            manifest_additions_path("drizzle"),
            "manifests/drizzle.package.json.tera"
        );
    }
}
