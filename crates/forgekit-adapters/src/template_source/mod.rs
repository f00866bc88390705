//! Template source adapters.
//!
//! - [`DirectoryTemplateSource`]: a template tree on disk (`--templates`)
//! - [`MemoryTemplateSource`]: an in-memory tree (built-ins and tests)

mod directory;
mod memory;

pub use directory::DirectoryTemplateSource;
pub use memory::MemoryTemplateSource;
