pub mod project_config;
pub mod render_context;
pub mod template;

pub use project_config::{HasName, NoName, ProjectConfig, ProjectConfigBuilder};
pub use render_context::{RenderContext, to_pascal_case, to_snake_case};
pub use template::{
    TEMPLATE_SUFFIX, TemplateEntry, TemplateEntryKind, TemplateFileName, TemplateId,
    VariantAxis, VariantTag,
};
