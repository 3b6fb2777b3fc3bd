#![allow(unused_assignments)]

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ViewError {
    #[error("View config not found at {path}")]
    #[diagnostic(help("Pass the path to a views.toml file with --config"))]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse {path}")]
    #[diagnostic(help("Check the TOML syntax in your views.toml file"))]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid view configuration for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    #[error("Default variable '{key}' cannot be converted to a template value")]
    DefaultValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Template directory not found: {path}")]
    #[diagnostic(help("Every entry of templates.paths must be an existing directory"))]
    TemplateDirectoryMissing { path: PathBuf },

    #[error("Failed to load templates")]
    #[diagnostic(help("Check your Tera template syntax"))]
    TemplateLoad {
        #[source]
        source: tera::Error,
    },

    #[error("Template rendering failed: {name}")]
    #[diagnostic(help("Check your Tera template syntax"))]
    Template {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Glob pattern error: {pattern}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("View could not be found in the request extensions using the key \"{key}\"")]
    #[diagnostic(help("Add a ViewLayer with the same attribute name in front of this handler"))]
    ViewNotFound { key: String },

    #[error("No service registered under the key \"{key}\"")]
    MissingService { key: String },

    #[error("Service registered under the key \"{key}\" is not a View")]
    ServiceType { key: String },

    #[error("Named route does not exist: {name}")]
    RouteNotFound { name: String },

    #[error("Missing data for URL segment '{param}' of route '{route}'")]
    MissingRouteData { route: String, param: String },

    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidRoutePattern { pattern: String, reason: String },

    #[error("Path must be absolute: '{path}'")]
    NotAbsolutePath { path: String },

    #[error("Invalid URI: {uri}")]
    InvalidUri {
        uri: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("Failed to encode query string")]
    QueryEncode {
        #[source]
        source: serde_urlencoded::ser::Error,
    },
}

pub type Result<T> = std::result::Result<T, ViewError>;

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "View error");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
