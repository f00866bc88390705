//! Template renderer.
//!
//! Turns one template file into text for one configuration, going through
//! the content cache when one is attached.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{
    ApplicationError,
    ports::{TemplateEngine, TemplateSource},
    services::ContentCache,
};
use crate::domain::{ProjectConfig, RenderContext, TemplateId, sha256_hex};
use crate::error::ForgeResult;

/// Renders template files against a [`ProjectConfig`].
#[derive(Clone)]
pub struct TemplateRenderer {
    source: Arc<dyn TemplateSource>,
    engine: Arc<dyn TemplateEngine>,
    cache: Option<Arc<ContentCache>>,
}

impl TemplateRenderer {
    pub fn new(
        source: Arc<dyn TemplateSource>,
        engine: Arc<dyn TemplateEngine>,
        cache: Option<Arc<ContentCache>>,
    ) -> Self {
        Self {
            source,
            engine,
            cache,
        }
    }

    pub fn cache(&self) -> Option<&Arc<ContentCache>> {
        self.cache.as_ref()
    }

    /// Render `id` for `config`.
    ///
    /// # Errors
    ///
    /// - `TemplateNotFound` if `id` is not a template file
    /// - `RenderingFailed` if the bytes are not UTF-8 or the engine rejects them
    #[instrument(skip_all, fields(template = %id))]
    pub fn render(&self, id: &TemplateId, config: &ProjectConfig) -> ForgeResult<String> {
        if !self.source.exists(id) {
            return Err(ApplicationError::TemplateNotFound { id: id.to_string() }.into());
        }

        let context = RenderContext::from_config(config);
        if let Some(content) = self.cache.as_ref().and_then(|c| c.get(id, &context)) {
            return Ok(content);
        }

        // Hash the bytes actually rendered; the template may change underneath.
        let bytes = self.source.read(id)?;
        let template_hash = sha256_hex(&bytes);
        let text = String::from_utf8(bytes).map_err(|e| ApplicationError::RenderingFailed {
            template: id.to_string(),
            reason: format!("template is not valid UTF-8: {e}"),
        })?;

        let rendered = self.engine.render(id.as_str(), &text, &context)?;
        debug!(bytes = rendered.len(), "Rendered");

        if let Some(cache) = &self.cache {
            cache.put(id, &context, &template_hash, &rendered);
        }

        Ok(rendered)
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("source", &self.source.describe())
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TemplateEntry;
    use mockall::mock;

    mock! {
        pub Source {}
        impl TemplateSource for Source {
            fn exists(&self, id: &TemplateId) -> bool;
            fn is_dir(&self, id: &TemplateId) -> bool;
            fn read(&self, id: &TemplateId) -> ForgeResult<Vec<u8>>;
            fn list(&self, id: &TemplateId) -> ForgeResult<Vec<TemplateEntry>>;
            fn describe(&self) -> String;
        }
    }

    mock! {
        pub Engine {}
        impl TemplateEngine for Engine {
            fn render(&self, name: &str, source: &str, context: &RenderContext) -> ForgeResult<String>;
        }
    }

    fn config() -> ProjectConfig {
        ProjectConfig::builder().name("demo-api").build().unwrap()
    }

    fn id(s: &str) -> TemplateId {
        TemplateId::new(s).unwrap()
    }

    #[test]
    fn missing_template_is_not_found() {
        let mut source = MockSource::new();
        source.expect_exists().return_const(false);
        let renderer = TemplateRenderer::new(Arc::new(source), Arc::new(MockEngine::new()), None);

        let err = renderer.render(&id("base/nope.tera"), &config()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ForgeError::Application(ApplicationError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn passes_name_source_and_context_to_engine() {
        let mut source = MockSource::new();
        source.expect_exists().return_const(true);
        source
            .expect_read()
            .returning(|_| Ok(b"hello {{ project_name }}".to_vec()));

        let mut engine = MockEngine::new();
        engine
            .expect_render()
            .withf(|name, src, ctx| {
                name == "docs/README.md.tera"
                    && src == "hello {{ project_name }}"
                    && ctx.project_name == "demo-api"
            })
            .times(1)
            .returning(|_, _, ctx| Ok(format!("hello {}", ctx.project_name)));

        let renderer = TemplateRenderer::new(Arc::new(source), Arc::new(engine), None);
        let out = renderer.render(&id("docs/README.md.tera"), &config()).unwrap();
        assert_eq!(out, "hello demo-api");
    }

    #[test]
    fn non_utf8_template_fails_to_render() {
        let mut source = MockSource::new();
        source.expect_exists().return_const(true);
        source.expect_read().returning(|_| Ok(vec![0xff, 0xfe, 0x00]));

        let renderer = TemplateRenderer::new(Arc::new(source), Arc::new(MockEngine::new()), None);
        let err = renderer.render(&id("base/bin.tera"), &config()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ForgeError::Application(ApplicationError::RenderingFailed { .. })
        ));
    }
}
