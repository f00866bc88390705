//! Tera-backed template engine.

use std::error::Error as _;

use tera::{Context, Tera};
use tracing::{instrument, trace};

use forgekit_core::{
    application::{ApplicationError, ports::TemplateEngine},
    domain::RenderContext,
    error::ForgeResult,
};

/// Renders templates with [Tera](https://keats.github.io/tera/).
///
/// Every call parses the template afresh into a throwaway `Tera` instance,
/// so the engine holds no state and templates never see each other.
/// Autoescaping is off: the output is source code, not HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraEngine;

impl TeraEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for TeraEngine {
    #[instrument(skip_all, fields(template = name))]
    fn render(&self, name: &str, source: &str, context: &RenderContext) -> ForgeResult<String> {
        let failed = |e: tera::Error| ApplicationError::RenderingFailed {
            template: name.to_string(),
            reason: format_tera_error(&e),
        };

        let ctx = Context::from_serialize(context).map_err(failed)?;

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(name, source).map_err(failed)?;
        let rendered = tera.render(name, &ctx).map_err(failed)?;

        trace!(bytes = rendered.len(), "Rendered");
        Ok(rendered)
    }
}

/// Flatten Tera's error chain into one message.
///
/// Tera's top-level message is usually just "Failed to render"; the useful
/// part (line, column, missing variable) sits further down the chain.
fn format_tera_error(error: &tera::Error) -> String {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(err) = current {
        let msg = err.to_string();
        if !messages.contains(&msg) {
            messages.push(msg);
        }
        current = err.source();
    }
    messages.join("\n  → ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgekit_core::domain::{Database, Orm, ProjectConfig};
    use forgekit_core::error::ForgeError;

    fn context() -> RenderContext {
        let config = ProjectConfig::builder()
            .name("orders-api")
            .orm(Orm::Drizzle)
            .database(Database::Sqlite)
            .build()
            .unwrap();
        RenderContext::from_config(&config).with_year(2026)
    }

    #[test]
    fn renders_variables_and_conditionals() {
        let out = TeraEngine
            .render(
                "t",
                "{{ project_name_pascal }} {% if is_sql %}sql{% else %}doc{% endif %} {{ year }}",
                &context(),
            )
            .unwrap();
        assert_eq!(out, "OrdersApi sql 2026");
    }

    #[test]
    fn output_is_not_html_escaped() {
        let out = TeraEngine
            .render("t", "<{{ orm }}> & \"{{ database }}\"", &context())
            .unwrap();
        assert_eq!(out, "<drizzle> & \"sqlite\"");
    }

    #[test]
    fn syntax_errors_name_the_template() {
        let err = TeraEngine
            .render("base/src/index.ts.tera", "{% if %}", &context())
            .unwrap_err();
        match err {
            ForgeError::Application(ApplicationError::RenderingFailed { template, reason }) => {
                assert_eq!(template, "base/src/index.ts.tera");
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn undefined_variables_fail() {
        let err = TeraEngine
            .render("docs/README.md.tera", "{{ nope }}", &context())
            .unwrap_err();
        let ForgeError::Application(ApplicationError::RenderingFailed { reason, .. }) = err else {
            panic!("expected RenderingFailed");
        };
        assert!(reason.contains("nope"), "{reason}");
    }

    #[test]
    fn every_builtin_template_renders() {
        use forgekit_core::domain::TEMPLATE_SUFFIX;

        for (path, content) in crate::builtin_templates::BUILTIN_FILES {
            if path.ends_with(TEMPLATE_SUFFIX) {
                TeraEngine
                    .render(path, content, &context())
                    .unwrap_or_else(|e| panic!("{path}: {e}"));
            }
        }
    }
}
