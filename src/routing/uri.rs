use axum::http::header::HOST;
use axum::http::{HeaderMap, Uri};

use crate::error::{Result, ViewError};

/// The parts of the current request URI the URL helpers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUri {
    scheme: String,
    authority: String,
    path: String,
    query: String,
}

impl RequestUri {
    pub fn new(
        scheme: impl Into<String>,
        authority: impl Into<String>,
        path: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
            path: path.into(),
            query: query.into(),
        }
    }

    /// Parse an absolute or origin-form URI such as `http://example.com/a?b=c`.
    pub fn parse(input: &str) -> Result<Self> {
        let uri: Uri = input.parse().map_err(|e| ViewError::InvalidUri {
            uri: input.to_string(),
            source: e,
        })?;
        Ok(Self::from_parts(&uri, &HeaderMap::new()))
    }

    /// Build from an inbound request.
    ///
    /// Server-side request URIs are usually origin-form, so the authority
    /// falls back to the `Host` header and the scheme to `http`.
    pub fn from_parts(uri: &Uri, headers: &HeaderMap) -> Self {
        let scheme = uri.scheme_str().unwrap_or("http");
        let authority = match uri.authority() {
            Some(authority) => authority.as_str(),
            None => headers
                .get(HOST)
                .and_then(|value| value.to_str().ok())
                .unwrap_or(""),
        };

        Self::new(scheme, authority, uri.path(), uri.query().unwrap_or(""))
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query string without the leading `?`; empty when absent.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// `scheme://authority`, or an empty string when the authority is unknown.
    pub fn origin(&self) -> String {
        if self.authority.is_empty() {
            String::new()
        } else {
            format!("{}://{}", self.scheme, self.authority)
        }
    }
}
