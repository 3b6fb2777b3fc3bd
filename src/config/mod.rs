pub mod schema;

use std::path::Path;

use crate::error::{Result, ViewError};

pub use schema::{validate_base_path, TemplatesConfig, ViewConfig, ViewSettings};

pub const CONFIG_FILE: &str = "views.toml";

/// Load and validate a ViewConfig from a views.toml file (or a directory containing one).
///
/// Relative template roots are resolved against the directory of the file.
pub fn load_config(path: &Path) -> Result<ViewConfig> {
    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE)
    } else {
        path.to_path_buf()
    };

    if !config_path.exists() {
        return Err(ViewError::ConfigNotFound { path: config_path });
    }

    let content = std::fs::read_to_string(&config_path).map_err(|e| ViewError::Io {
        context: format!("reading {}", config_path.display()),
        source: e,
    })?;

    let mut config: ViewConfig =
        toml::from_str(&content).map_err(|e| ViewError::ConfigParse {
            path: config_path.clone(),
            source: e,
        })?;

    config.validate()?;

    if let Some(base_dir) = config_path.parent() {
        config.templates.resolve_paths(base_dir);
    }

    tracing::debug!(path = %config_path.display(), "Loaded view config");

    Ok(config)
}
