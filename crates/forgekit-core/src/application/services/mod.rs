//! Application services - the generation pipeline.
//!
//! Services coordinate the domain layer and ports. Each is an explicit
//! instance; nothing here is process-global.

pub mod assembler;
pub mod content_cache;
pub mod generator;
pub mod manifest_merger;
pub mod renderer;
pub mod rollback;

pub use assembler::{CopySummary, GATED_SUBTREES, TreeAssembler};
pub use content_cache::{CacheEntry, CacheStats, ContentCache, cache_key};
pub use generator::{
    GenerationReport, GenerationStep, PlannedStep, ProjectGenerator, StepReport, StepStatus,
};
pub use manifest_merger::{ManifestMerger, MergeOutcome, merge_documents};
pub use renderer::TemplateRenderer;
pub use rollback::{LedgerEntry, RollbackLedger, RollbackOutcome};
