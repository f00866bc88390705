//! Infrastructure adapters for forgekit.
//!
//! This crate implements the ports defined in `forgekit-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod builtin_templates;
pub mod command;
pub mod engine;
pub mod filesystem;
pub mod template_source;

// Re-export commonly used adapters
pub use builtin_templates::{TemplateOrigin, resolve_source};
pub use command::SystemCommandRunner;
pub use engine::TeraEngine;
pub use filesystem::{FsOp, LocalFilesystem, MemoryFilesystem};
pub use template_source::{DirectoryTemplateSource, MemoryTemplateSource};
