//! Forgekit Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the forgekit
//! project generator, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          forgekit-cli (CLI)             │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (ProjectGenerator, TreeAssembler,      │
//! │   ManifestMerger, ContentCache, ...)    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │ (Filesystem, TemplateSource, Engine)    │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    forgekit-adapters (Infrastructure)   │
//! │ (LocalFilesystem, TeraEngine, etc)      │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (ProjectConfig, TemplateId, variants)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use forgekit_core::prelude::*;
//!
//! # fn run(
//! #     source: Arc<dyn TemplateSource>,
//! #     fs: Arc<dyn Filesystem>,
//! #     engine: Arc<dyn TemplateEngine>,
//! # ) -> ForgeResult<()> {
//! let config = ProjectConfig::builder()
//!     .name("sample-api")
//!     .orm(Orm::Prisma)
//!     .database(Database::Postgresql)
//!     .build()?;
//!
//! let generator = ProjectGenerator::new(source, fs, engine, None);
//! let report = generator.generate(Path::new("./sample-api"), &config)?;
//! println!("{} files written", report.files_written);
//! # Ok(())
//! # }
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ContentCache, GenerationReport, GenerationStep, ManifestMerger, MergeOutcome,
        ProjectGenerator, RollbackLedger, RollbackOutcome, TemplateRenderer, TreeAssembler,
        ports::{CommandOutput, CommandRunner, Filesystem, TemplateEngine, TemplateSource},
    };
    pub use crate::domain::{
        Database, Orm, PackageManager, ProjectConfig, ProjectConfigBuilder, RenderContext,
        TemplateEntry, TemplateId,
    };
    pub use crate::error::{ForgeError, ForgeResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
