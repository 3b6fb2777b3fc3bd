pub mod table;
pub mod uri;

use std::collections::BTreeMap;

use crate::error::{Result, ViewError};

pub use table::{RoutePattern, RouteTable};
pub use uri::RequestUri;

/// Route data and query parameters, keyed by name.
pub type Params = BTreeMap<String, String>;

/// The path-building capability the URL helpers need from a router.
pub trait RouteParser: Send + Sync {
    /// Build the path of a named route, without any base path.
    ///
    /// Non-empty `query` is appended as `?key=value&...`.
    fn build_path(&self, name: &str, data: &Params, query: &Params) -> Result<String>;
}

/// Form-encode query parameters (`a=1&b=x+y`); empty input gives an empty string.
pub fn encode_query(query: &Params) -> Result<String> {
    serde_urlencoded::to_string(query).map_err(|e| ViewError::QueryEncode { source: e })
}
