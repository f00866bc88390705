//! Core domain layer for forgekit.
//!
//! This module contains pure logic with no I/O. Filesystem access, template
//! storage and rendering are reached through ports defined in the
//! application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: domain logic is synchronous
//! - **No I/O**: no filesystem, network, or process calls
//! - **No tracing**: observability belongs to the application and CLI layers
//! - **Immutable records**: `ProjectConfig` is built once and never mutated

pub mod capabilities;
pub mod digest;
pub mod entities;
pub mod error;
pub mod value_objects;

mod validation;

pub use entities::{
    HasName, NoName, ProjectConfig, ProjectConfigBuilder, RenderContext, TEMPLATE_SUFFIX,
    TemplateEntry, TemplateEntryKind, TemplateFileName, TemplateId, VariantAxis, VariantTag,
};

pub use error::{DomainError, ErrorCategory};

pub use value_objects::{Database, Orm, PackageManager};

pub use digest::sha256_hex;
pub use validation::{DomainValidator, MAX_PROJECT_NAME_LEN};
