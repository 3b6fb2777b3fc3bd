//! Tera views for axum applications.
//!
//! - [`View`] wraps a tera environment and a bag of default variables.
//! - [`ViewLayer`] attaches a [`RequestView`] to every request, exposing
//!   `url_for`, `full_url_for`, `relative_url_for`, `is_current_url`,
//!   `current_url` and `base_path` to templates.
//! - [`relative_path`] computes the relative reference between two URL paths.

pub mod config;
pub mod error;
pub mod extension;
pub mod middleware;
pub mod paths;
pub mod render;
pub mod routing;

use std::path::Path;
use std::sync::Arc;

pub use config::{load_config, ViewConfig};
pub use error::{Result, ViewError};
pub use extension::{Extension, UrlExtension, UrlHelpers};
pub use middleware::{RequestView, ViewLayer, DEFAULT_ATTRIBUTE};
pub use paths::relative_path;
pub use render::View;
pub use routing::{Params, RequestUri, RouteParser, RouteTable};

/// Everything needed to serve views, built from one views.toml.
pub struct ViewSetup {
    pub config: ViewConfig,
    pub view: Arc<View>,
    pub routes: Arc<RouteTable>,
}

impl ViewSetup {
    /// The middleware layer configured with this setup's base path and attribute name.
    pub fn layer(&self) -> Result<ViewLayer> {
        let routes: Arc<dyn RouteParser> = self.routes.clone();
        ViewLayer::new(Arc::clone(&self.view), routes).with_settings(&self.config.view)
    }

    /// URL helpers bound to an arbitrary URI, for rendering outside a request.
    pub fn helpers_for(&self, uri: RequestUri) -> UrlHelpers {
        let routes: Arc<dyn RouteParser> = self.routes.clone();
        UrlHelpers::new(routes, uri, self.config.view.base_path.clone())
    }
}

/// Load a views.toml, its templates and its routes.
pub fn setup(config_path: &Path) -> Result<ViewSetup> {
    let config = load_config(config_path)?;
    let view = View::from_config(&config)?;
    let routes = RouteTable::from_patterns(&config.routes)?;

    tracing::info!(
        templates = view.tera().get_template_names().count(),
        routes = routes.len(),
        base_path = %config.view.base_path,
        "View setup complete"
    );

    Ok(ViewSetup {
        config,
        view: Arc::new(view),
        routes: Arc::new(routes),
    })
}
