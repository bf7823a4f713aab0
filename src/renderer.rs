//! Template renderer for j2subst.
//! Wraps a MiniJinja environment whose loader walks the resolved search
//! directories in order.
use std::sync::Arc;

use minijinja::{AutoEscape, Environment, ErrorKind};

use crate::error::Result;
use crate::registry::Registry;
use crate::search::SearchDir;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a named template source. Templates it references are looked
    /// up in `search`, first match wins.
    fn render_named(
        &self,
        name: &str,
        source: &str,
        search: &[Arc<SearchDir>],
        context: &serde_json::Value,
    ) -> Result<String>;

    /// Renders an anonymous template string.
    fn render_str(
        &self,
        source: &str,
        search: &[Arc<SearchDir>],
        context: &serde_json::Value,
    ) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// Base environment with the registry installed; cloned per render
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new(registry: &Registry) -> Self {
        let mut env = Environment::new();
        // templates produce plain text whatever the output suffix
        env.set_auto_escape_callback(|_| AutoEscape::None);
        registry.install(&mut env);
        Self { env }
    }

    fn overlay(&self, search: &[Arc<SearchDir>]) -> Environment<'static> {
        let mut env = self.env.clone();
        let dirs: Vec<Arc<SearchDir>> = search.to_vec();
        env.set_loader(move |name| {
            for dir in &dirs {
                match dir.load(name) {
                    Ok(Some((_, source))) => return Ok(Some(source)),
                    Ok(None) => continue,
                    Err(e) => {
                        return Err(minijinja::Error::new(
                            ErrorKind::InvalidOperation,
                            format!("could not read template {name:?}"),
                        )
                        .with_source(e))
                    }
                }
            }
            Ok(None)
        });
        env
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new(&Registry::new())
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render_named(
        &self,
        name: &str,
        source: &str,
        search: &[Arc<SearchDir>],
        context: &serde_json::Value,
    ) -> Result<String> {
        let mut env = self.overlay(search);
        env.add_template_owned(name.to_string(), source.to_string())?;
        let tmpl = env.get_template(name)?;
        Ok(tmpl.render(context)?)
    }

    fn render_str(
        &self,
        source: &str,
        search: &[Arc<SearchDir>],
        context: &serde_json::Value,
    ) -> Result<String> {
        let env = self.overlay(search);
        Ok(env.render_str(source, context)?)
    }
}
