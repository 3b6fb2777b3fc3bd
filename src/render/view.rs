use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use axum::response::Html;
use tera::{Context, Tera, Value};

use super::context::merge_context;
use super::loader::load_tera;
use crate::config::ViewConfig;
use crate::error::{Result, ViewError};
use crate::extension::url::ActiveHelpers;
use crate::extension::{Extension, UrlExtension, UrlHelpers};

const STRING_TEMPLATE: &str = "__string";

/// A tera environment plus variables merged into every render.
///
/// Built once at startup, then shared behind an `Arc` by [`ViewLayer`](crate::middleware::ViewLayer).
/// The URL functions are registered once on the shared environment and read
/// the helpers of the request being rendered.
#[derive(Clone)]
pub struct View {
    tera: Tera,
    extensions: Vec<Arc<dyn Extension>>,
    defaults: BTreeMap<String, Value>,
}

impl View {
    pub fn new(mut tera: Tera) -> Self {
        UrlExtension::active().register(&mut tera);
        Self {
            tera,
            extensions: Vec::new(),
            defaults: BTreeMap::new(),
        }
    }

    /// Load the configured template roots and default variables.
    pub fn from_config(config: &ViewConfig) -> Result<Self> {
        let mut view = Self::new(load_tera(&config.templates)?);
        for (key, value) in &config.defaults {
            let value = serde_json::to_value(value).map_err(|e| ViewError::DefaultValue {
                key: key.clone(),
                source: e,
            })?;
            view.insert(key.clone(), value);
        }
        Ok(view)
    }

    pub fn add_extension(&mut self, extension: impl Extension + 'static) {
        tracing::debug!(extension = extension.name(), "Registering extension");
        extension.register(&mut self.tera);
        self.extensions.push(Arc::new(extension));
    }

    pub fn tera(&self) -> &Tera {
        &self.tera
    }

    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    /// Render a named template with the default variables and `data`.
    pub fn fetch(&self, template: &str, data: &Context) -> Result<String> {
        let context = self.context(&[], data);
        self.render_template(None, template, &context)
    }

    /// Render a template given as source text.
    pub fn fetch_from_string(&self, source: &str, data: &Context) -> Result<String> {
        let context = self.context(&[], data);
        self.render_source(None, source, &context)
    }

    pub fn render(&self, template: &str, data: &Context) -> Result<Html<String>> {
        self.fetch(template, data).map(Html)
    }

    /// Defaults, then each of `layers`, then `data`.
    pub(crate) fn context(&self, layers: &[&BTreeMap<String, Value>], data: &Context) -> Context {
        let mut all = Vec::with_capacity(layers.len() + 1);
        all.push(&self.defaults);
        all.extend_from_slice(layers);
        merge_context(&all, data)
    }

    pub(crate) fn render_template(
        &self,
        helpers: Option<&Arc<UrlHelpers>>,
        template: &str,
        context: &Context,
    ) -> Result<String> {
        tracing::debug!(template, "Rendering template");
        let _active = helpers.map(|helpers| ActiveHelpers::enter(Arc::clone(helpers)));
        self.tera
            .render(template, context)
            .map_err(|e| ViewError::Template {
                name: template.to_string(),
                source: e,
            })
    }

    // A string template is compiled alone with the view's functions and
    // filters. Only sources that pull in named templates (extends, include,
    // import) fall back to a copy of the full environment.
    pub(crate) fn render_source(
        &self,
        helpers: Option<&Arc<UrlHelpers>>,
        source: &str,
        context: &Context,
    ) -> Result<String> {
        let _active = helpers.map(|helpers| ActiveHelpers::enter(Arc::clone(helpers)));
        let template_error = |e| ViewError::Template {
            name: "<string>".into(),
            source: e,
        };

        if !references_templates(source) {
            let mut tera = self.standalone_env();
            tera.add_raw_template(STRING_TEMPLATE, source)
                .map_err(template_error)?;
            return tera.render(STRING_TEMPLATE, context).map_err(template_error);
        }

        tracing::debug!("String template references named templates");
        let mut tera = self.tera.clone();
        tera.render_str(source, context).map_err(template_error)
    }

    fn standalone_env(&self) -> Tera {
        let mut tera = Tera::default();
        UrlExtension::active().register(&mut tera);
        for extension in &self.extensions {
            extension.register(&mut tera);
        }
        tera
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.defaults.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.defaults.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.defaults.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.defaults.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.defaults.iter()
    }

    pub fn defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new(Tera::default())
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extensions: Vec<&str> = self.extensions.iter().map(|e| e.name()).collect();
        f.debug_struct("View")
            .field("templates", &self.template_names())
            .field("extensions", &extensions)
            .field("defaults", &self.defaults)
            .finish()
    }
}

fn references_templates(source: &str) -> bool {
    ["extends", "include", "import"].iter().any(|tag| {
        source.match_indices("{%").any(|(start, _)| {
            source[start + 2..]
                .trim_start_matches('-')
                .trim_start()
                .starts_with(tag)
        })
    })
}
