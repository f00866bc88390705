//! Application layer for forgekit.
//!
//! This layer contains:
//! - **Services**: the generation pipeline (cache, renderer, assembler,
//!   manifest merger, rollback ledger, generator)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    CacheEntry, CacheStats, ContentCache, CopySummary, GenerationReport, GenerationStep,
    LedgerEntry, ManifestMerger, MergeOutcome, PlannedStep, ProjectGenerator, RollbackLedger,
    RollbackOutcome, StepReport, StepStatus, TemplateRenderer, TreeAssembler,
};

pub use ports::{CommandOutput, CommandRunner, Filesystem, TemplateEngine, TemplateSource};

pub use error::ApplicationError;
