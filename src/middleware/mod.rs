//! Tower middleware attaching a request-scoped view to every request.
//!
//! The [`View`] is built once and shared; only the [`UrlHelpers`] are
//! rebuilt per request, bound to that request's URI.
//!
//! ```ignore
//! let view = Arc::new(View::from_config(&config)?);
//! let routes = Arc::new(RouteTable::from_patterns(&config.routes)?);
//!
//! let app = Router::new()
//!     .route("/hello/{name}", get(hello))
//!     .layer(ViewLayer::new(view, routes).with_settings(&config.view)?);
//!
//! async fn hello(view: RequestView) -> Result<Html<String>, ViewError> {
//!     view.render("hello.html", &Context::new())
//! }
//! ```

pub mod registry;
pub mod request_view;

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Request;
use tower::{Layer, Service};

use crate::config::{validate_base_path, ViewSettings};
use crate::error::{Result, ViewError};
use crate::extension::UrlHelpers;
use crate::render::View;
use crate::routing::{RequestUri, RouteParser};

pub use registry::{Registry, ServiceRegistry};
pub use request_view::{RequestView, ViewAttributes};

/// Attribute name used when none is configured.
pub const DEFAULT_ATTRIBUTE: &str = "view";

#[derive(Clone)]
pub struct ViewLayer {
    view: Arc<View>,
    routes: Arc<dyn RouteParser>,
    base_path: String,
    attribute: String,
}

impl ViewLayer {
    pub fn new(view: Arc<View>, routes: Arc<dyn RouteParser>) -> Self {
        Self {
            view,
            routes,
            base_path: String::new(),
            attribute: DEFAULT_ATTRIBUTE.to_string(),
        }
    }

    /// Take the view registered under `key`, failing if it is absent or not a [`View`].
    pub fn from_registry<R>(registry: &R, key: &str, routes: Arc<dyn RouteParser>) -> Result<Self>
    where
        R: Registry + ?Sized,
    {
        let missing = || ViewError::MissingService {
            key: key.to_string(),
        };
        if !registry.has(key) {
            return Err(missing());
        }

        let view = registry
            .get(key)
            .ok_or_else(missing)?
            .downcast::<View>()
            .map_err(|_| ViewError::ServiceType {
                key: key.to_string(),
            })?;

        Ok(Self::new(view, routes))
    }

    /// Fails with `ConfigInvalid` unless the path is empty, or starts with
    /// '/' and does not end with '/'.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Result<Self> {
        let base_path = base_path.into();
        validate_base_path(&base_path)?;
        self.base_path = base_path;
        Ok(self)
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    pub fn with_settings(self, settings: &ViewSettings) -> Result<Self> {
        Ok(self
            .with_base_path(settings.base_path.clone())?
            .with_attribute(settings.attribute.clone()))
    }

    pub fn view(&self) -> &Arc<View> {
        &self.view
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }
}

impl<S> Layer<S> for ViewLayer {
    type Service = ViewService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ViewService {
            inner,
            layer: self.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ViewService<S> {
    inner: S,
    layer: ViewLayer,
}

impl<S, B> Service<Request<B>> for ViewService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        let uri = RequestUri::from_parts(request.uri(), request.headers());
        tracing::debug!(
            path = uri.path(),
            attribute = %self.layer.attribute,
            "Attaching request view"
        );

        let helpers = UrlHelpers::new(
            Arc::clone(&self.layer.routes),
            uri,
            self.layer.base_path.clone(),
        );
        let view = RequestView::new(Arc::clone(&self.layer.view), helpers);

        let mut attributes = request
            .extensions()
            .get::<ViewAttributes>()
            .cloned()
            .unwrap_or_default();
        attributes.insert(self.layer.attribute.clone(), view);
        request.extensions_mut().insert(attributes);

        self.inner.call(request)
    }
}
