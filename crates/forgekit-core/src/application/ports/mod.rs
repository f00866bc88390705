//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `forgekit-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `TemplateSource`: Read-only template tree
//!   - `TemplateEngine`: Template expansion
//!   - `CommandRunner`: External programs (post-generation only)

pub mod output;

pub use output::{CommandOutput, CommandRunner, Filesystem, TemplateEngine, TemplateSource};
