use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Extensions, Request};
use axum::response::Html;
use tera::{Context, Value};

use super::DEFAULT_ATTRIBUTE;
use crate::error::{Result, ViewError};
use crate::extension::UrlHelpers;
use crate::render::View;

/// The shared [`View`] together with URL helpers bound to one request.
///
/// Cloning is cheap; all clones share the same request variables, so a
/// value inserted by an earlier middleware is seen by the handler.
#[derive(Clone)]
pub struct RequestView {
    inner: Arc<Inner>,
}

struct Inner {
    view: Arc<View>,
    helpers: Arc<UrlHelpers>,
    variables: RwLock<BTreeMap<String, Value>>,
}

impl RequestView {
    pub fn new(view: Arc<View>, helpers: UrlHelpers) -> Self {
        Self {
            inner: Arc::new(Inner {
                view,
                helpers: Arc::new(helpers),
                variables: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// Look up the view attached under `key` by [`ViewLayer`](super::ViewLayer).
    pub fn from_extensions(extensions: &Extensions, key: &str) -> Result<Self> {
        extensions
            .get::<ViewAttributes>()
            .and_then(|attributes| attributes.get(key))
            .cloned()
            .ok_or_else(|| ViewError::ViewNotFound {
                key: key.to_string(),
            })
    }

    pub fn from_request<B>(request: &Request<B>, key: &str) -> Result<Self> {
        Self::from_extensions(request.extensions(), key)
    }

    pub fn view(&self) -> &View {
        &self.inner.view
    }

    pub fn helpers(&self) -> &UrlHelpers {
        &self.inner.helpers
    }

    /// Render with the view defaults, then this request's variables, then `data`.
    pub fn fetch(&self, template: &str, data: &Context) -> Result<String> {
        let context = self.context(data);
        self.inner
            .view
            .render_template(Some(&self.inner.helpers), template, &context)
    }

    pub fn fetch_from_string(&self, source: &str, data: &Context) -> Result<String> {
        let context = self.context(data);
        self.inner
            .view
            .render_source(Some(&self.inner.helpers), source, &context)
    }

    pub fn render(&self, template: &str, data: &Context) -> Result<Html<String>> {
        self.fetch(template, data).map(Html)
    }

    /// Set a variable for every later render of this request.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner
            .variables
            .write()
            .unwrap()
            .insert(key.into(), value.into())
    }

    /// The request variable `key`, not falling back to the view defaults.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.variables.read().unwrap().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.variables.write().unwrap().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.variables.read().unwrap().contains_key(key)
    }

    fn context(&self, data: &Context) -> Context {
        let variables = self.inner.variables.read().unwrap();
        self.inner.view.context(&[&*variables], data)
    }
}

/// Request views keyed by attribute name, stored in the request extensions.
#[derive(Clone, Default)]
pub struct ViewAttributes(HashMap<String, RequestView>);

impl ViewAttributes {
    pub fn insert(&mut self, key: impl Into<String>, view: RequestView) {
        self.0.insert(key.into(), view);
    }

    pub fn get(&self, key: &str) -> Option<&RequestView> {
        self.0.get(key)
    }
}

/// Extracts the view attached under the default attribute name.
impl<S> FromRequestParts<S> for RequestView
where
    S: Send + Sync,
{
    type Rejection = ViewError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        Self::from_extensions(&parts.extensions, DEFAULT_ATTRIBUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{RequestUri, RouteTable};
    use tera::Tera;

    fn request_view() -> RequestView {
        let mut tera = Tera::default();
        tera.add_raw_template("page.txt", r#"{{ title }} {{ url_for(name="home") }}"#)
            .unwrap();
        let mut view = View::new(tera);
        view.insert("title", "Home");

        let mut routes = RouteTable::new();
        routes.add("home", "/").unwrap();
        let helpers = UrlHelpers::new(
            Arc::new(routes),
            RequestUri::parse("http://localhost/page").unwrap(),
            "/app",
        );
        RequestView::new(Arc::new(view), helpers)
    }

    #[test]
    fn test_fetch_uses_request_functions() {
        let output = request_view().fetch("page.txt", &Context::new()).unwrap();
        assert_eq!(output, "Home /app/");
    }

    #[test]
    fn test_fetch_from_string_uses_request_functions() {
        let output = request_view()
            .fetch_from_string("{{ current_url() }}", &Context::new())
            .unwrap();
        assert_eq!(output, "/app/page");
    }

    #[test]
    fn test_views_sharing_one_environment_keep_their_own_uri() {
        let mut tera = Tera::default();
        tera.add_raw_template("current.txt", "{{ current_url(with_query=true) }}")
            .unwrap();
        let view = Arc::new(View::new(tera));
        let routes: Arc<RouteTable> = Arc::new(RouteTable::new());

        let bound = |uri: &str| {
            let helpers = UrlHelpers::new(routes.clone(), RequestUri::parse(uri).unwrap(), "");
            RequestView::new(Arc::clone(&view), helpers)
        };
        let first = bound("http://localhost/one?page=1");
        let second = bound("http://localhost/two");

        assert_eq!(first.fetch("current.txt", &Context::new()).unwrap(), "/one?page=1");
        assert_eq!(second.fetch("current.txt", &Context::new()).unwrap(), "/two");
        assert_eq!(first.fetch("current.txt", &Context::new()).unwrap(), "/one?page=1");
    }

    #[test]
    fn test_request_variables_layer_between_defaults_and_data() {
        let view = request_view();
        let attached = view.clone();

        // set by an earlier layer on its clone
        assert_eq!(attached.insert("title", "Dashboard"), None);
        assert!(view.contains_key("title"));
        assert_eq!(view.get("title"), Some(Value::from("Dashboard")));
        assert_eq!(
            view.fetch("page.txt", &Context::new()).unwrap(),
            "Dashboard /app/"
        );

        let mut data = Context::new();
        data.insert("title", "Call");
        assert_eq!(view.fetch("page.txt", &data).unwrap(), "Call /app/");

        assert_eq!(view.remove("title"), Some(Value::from("Dashboard")));
        assert_eq!(view.fetch("page.txt", &Context::new()).unwrap(), "Home /app/");
        // the shared defaults are untouched
        assert_eq!(view.view().get("title"), Some(&Value::from("Home")));
    }

    #[test]
    fn test_request_variables_are_per_request() {
        let mut tera = Tera::default();
        tera.add_raw_template("user.txt", "{{ user }}").unwrap();
        let mut shared = View::new(tera);
        shared.insert("user", "guest");
        let view = Arc::new(shared);

        let helpers = || {
            UrlHelpers::new(
                Arc::new(RouteTable::new()),
                RequestUri::parse("http://localhost/").unwrap(),
                "",
            )
        };
        let signed_in = RequestView::new(Arc::clone(&view), helpers());
        let anonymous = RequestView::new(Arc::clone(&view), helpers());
        signed_in.insert("user", "josh");

        assert_eq!(signed_in.fetch("user.txt", &Context::new()).unwrap(), "josh");
        assert_eq!(anonymous.fetch("user.txt", &Context::new()).unwrap(), "guest");
    }

    #[test]
    fn test_shared_view_has_no_request_functions() {
        let view = request_view();
        let result = view.view().fetch("page.txt", &Context::new());
        assert!(matches!(result, Err(ViewError::Template { .. })));
    }

    #[test]
    fn test_from_extensions() {
        let view = request_view();
        let mut attributes = ViewAttributes::default();
        attributes.insert("renderer", view);

        let mut extensions = Extensions::new();
        extensions.insert(attributes);

        assert!(RequestView::from_extensions(&extensions, "renderer").is_ok());
        let err = RequestView::from_extensions(&extensions, "view").err().unwrap();
        assert_eq!(
            err.to_string(),
            "View could not be found in the request extensions using the key \"view\""
        );
    }

    #[test]
    fn test_from_extensions_without_attributes() {
        let result = RequestView::from_extensions(&Extensions::new(), "view");
        assert!(matches!(result, Err(ViewError::ViewNotFound { key }) if key == "view"));
    }
}
