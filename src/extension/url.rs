use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use tera::{Tera, Value};

use super::Extension;
use crate::error::Result;
use crate::paths::relative_path;
use crate::routing::{encode_query, Params, RequestUri, RouteParser};

/// URL helpers bound to one request URI and the application's base path.
#[derive(Clone)]
pub struct UrlHelpers {
    routes: Arc<dyn RouteParser>,
    uri: RequestUri,
    base_path: String,
}

impl UrlHelpers {
    pub fn new(routes: Arc<dyn RouteParser>, uri: RequestUri, base_path: impl Into<String>) -> Self {
        Self {
            routes,
            uri,
            base_path: base_path.into(),
        }
    }

    /// `base_path` followed by the route's path and query.
    pub fn url_for(&self, name: &str, data: &Params, query: &Params) -> Result<String> {
        let path = self.routes.build_path(name, data, query)?;
        Ok(format!("{}{}", self.base_path, path))
    }

    /// Like [`url_for`](Self::url_for), prefixed with the request's scheme and authority.
    pub fn full_url_for(&self, name: &str, data: &Params, query: &Params) -> Result<String> {
        let url = self.url_for(name, data, query)?;
        Ok(format!("{}{}", self.uri.origin(), url))
    }

    /// The route's URL relative to the current request path.
    ///
    /// The query string is built from `query` only; the current request's
    /// query does not carry over.
    pub fn relative_url_for(&self, name: &str, data: &Params, query: &Params) -> Result<String> {
        let to = self.url_for(name, data, &Params::new())?;
        let from = self.current_url(false);
        let mut url = relative_path(&to, &from)?;

        let query = encode_query(query)?;
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        Ok(url)
    }

    pub fn is_current_url(&self, name: &str, data: &Params) -> Result<bool> {
        let url = self.url_for(name, data, &Params::new())?;
        Ok(url == self.current_url(false))
    }

    /// `base_path` plus the request path, with `?query` appended only when
    /// asked for and the query is non-empty.
    pub fn current_url(&self, with_query: bool) -> String {
        let mut url = format!("{}{}", self.base_path, self.uri.path());
        if with_query && !self.uri.query().is_empty() {
            url.push('?');
            url.push_str(self.uri.query());
        }
        url
    }

    pub fn uri(&self) -> &RequestUri {
        &self.uri
    }

    pub fn set_uri(&mut self, uri: RequestUri) -> &mut Self {
        self.uri = uri;
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn set_base_path(&mut self, base_path: impl Into<String>) -> &mut Self {
        self.base_path = base_path.into();
        self
    }
}

thread_local! {
    static ACTIVE_HELPERS: RefCell<Option<Arc<UrlHelpers>>> = const { RefCell::new(None) };
}

/// Makes `helpers` the ones seen by [`UrlExtension::active`] functions on
/// this thread until the guard is dropped. Guards nest.
pub(crate) struct ActiveHelpers {
    previous: Option<Arc<UrlHelpers>>,
}

impl ActiveHelpers {
    pub(crate) fn enter(helpers: Arc<UrlHelpers>) -> Self {
        let previous = ACTIVE_HELPERS.with(|active| active.replace(Some(helpers)));
        Self { previous }
    }
}

impl Drop for ActiveHelpers {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE_HELPERS.with(|active| *active.borrow_mut() = previous);
    }
}

#[derive(Clone)]
enum HelperSource {
    Bound(Arc<UrlHelpers>),
    Active,
}

impl HelperSource {
    fn resolve(&self, function: &str) -> tera::Result<Arc<UrlHelpers>> {
        match self {
            Self::Bound(helpers) => Ok(Arc::clone(helpers)),
            Self::Active => ACTIVE_HELPERS
                .with(|active| active.borrow().clone())
                .ok_or_else(|| {
                    tera::Error::msg(format!(
                        "Function `{function}` is only available while rendering a request view"
                    ))
                }),
        }
    }
}

/// Exposes [`UrlHelpers`] to templates as `url_for`, `full_url_for`,
/// `relative_url_for`, `is_current_url`, `current_url` and `base_path`.
pub struct UrlExtension {
    source: HelperSource,
}

impl UrlExtension {
    /// Functions bound to one fixed set of helpers.
    pub fn new(helpers: Arc<UrlHelpers>) -> Self {
        Self {
            source: HelperSource::Bound(helpers),
        }
    }

    /// Functions that call whichever helpers the current render entered.
    ///
    /// Every [`View`](crate::View) registers these, so one shared environment
    /// serves all requests.
    pub fn active() -> Self {
        Self {
            source: HelperSource::Active,
        }
    }
}

impl Extension for UrlExtension {
    fn name(&self) -> &str {
        "url"
    }

    fn register(&self, tera: &mut Tera) {
        let source = self.source.clone();
        tera.register_function("url_for", move |args: &HashMap<String, Value>| {
            let call = RouteCall::from_args("url_for", args)?;
            source
                .resolve("url_for")?
                .url_for(&call.name, &call.data, &call.query)
                .map(Value::String)
                .map_err(|e| function_error("url_for", e))
        });

        let source = self.source.clone();
        tera.register_function("full_url_for", move |args: &HashMap<String, Value>| {
            let call = RouteCall::from_args("full_url_for", args)?;
            source
                .resolve("full_url_for")?
                .full_url_for(&call.name, &call.data, &call.query)
                .map(Value::String)
                .map_err(|e| function_error("full_url_for", e))
        });

        let source = self.source.clone();
        tera.register_function("relative_url_for", move |args: &HashMap<String, Value>| {
            let call = RouteCall::from_args("relative_url_for", args)?;
            source
                .resolve("relative_url_for")?
                .relative_url_for(&call.name, &call.data, &call.query)
                .map(Value::String)
                .map_err(|e| function_error("relative_url_for", e))
        });

        let source = self.source.clone();
        tera.register_function("is_current_url", move |args: &HashMap<String, Value>| {
            let call = RouteCall::from_args("is_current_url", args)?;
            source
                .resolve("is_current_url")?
                .is_current_url(&call.name, &call.data)
                .map(Value::Bool)
                .map_err(|e| function_error("is_current_url", e))
        });

        let source = self.source.clone();
        tera.register_function("current_url", move |args: &HashMap<String, Value>| {
            let with_query = match args.get("with_query") {
                None => false,
                Some(Value::Bool(b)) => *b,
                Some(_) => {
                    return Err(tera::Error::msg(
                        "Function `current_url`: `with_query` must be a boolean",
                    ))
                }
            };
            let helpers = source.resolve("current_url")?;
            Ok(Value::String(helpers.current_url(with_query)))
        });

        let source = self.source.clone();
        tera.register_function("base_path", move |_: &HashMap<String, Value>| {
            let helpers = source.resolve("base_path")?;
            Ok(Value::String(helpers.base_path().to_string()))
        });
    }
}

fn function_error(function: &str, source: crate::error::ViewError) -> tera::Error {
    tera::Error::chain(format!("Function `{function}` failed"), source)
}

/// Keyword arguments of a route-based template function.
///
/// `name` selects the route, `data` and `query` take objects, and any other
/// keyword argument is added to the route data.
struct RouteCall {
    name: String,
    data: Params,
    query: Params,
}

impl RouteCall {
    fn from_args(function: &str, args: &HashMap<String, Value>) -> tera::Result<Self> {
        let name = match args.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => {
                return Err(tera::Error::msg(format!(
                    "Function `{function}`: `name` must be a string"
                )))
            }
            None => {
                return Err(tera::Error::msg(format!(
                    "Function `{function}` requires a `name` argument"
                )))
            }
        };

        let mut data = match args.get("data") {
            Some(value) => object_params(function, "data", value)?,
            None => Params::new(),
        };
        let query = match args.get("query") {
            Some(value) => object_params(function, "query", value)?,
            None => Params::new(),
        };

        for (key, value) in args {
            if matches!(key.as_str(), "name" | "data" | "query") {
                continue;
            }
            data.insert(key.clone(), scalar_param(function, key, value)?);
        }

        Ok(Self { name, data, query })
    }
}

fn object_params(function: &str, arg: &str, value: &Value) -> tera::Result<Params> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| Ok((key.clone(), scalar_param(function, key, value)?)))
            .collect(),
        Value::Null => Ok(Params::new()),
        _ => Err(tera::Error::msg(format!(
            "Function `{function}`: `{arg}` must be an object"
        ))),
    }
}

fn scalar_param(function: &str, key: &str, value: &Value) -> tera::Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(tera::Error::msg(format!(
            "Function `{function}`: value of `{key}` must be a string, number or boolean"
        ))),
    }
}
