use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewError};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ViewConfig {
    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub view: ViewSettings,

    /// Named routes, `name = "/pattern/{param}"`.
    #[serde(default)]
    pub routes: BTreeMap<String, String>,

    /// Variables merged into every render.
    #[serde(default)]
    pub defaults: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_template_paths")]
    pub paths: Vec<PathBuf>,

    /// Roots addressable as `@namespace/name`.
    #[serde(default)]
    pub namespaces: BTreeMap<String, Vec<PathBuf>>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_autoescape")]
    pub autoescape: bool,
}

fn default_template_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("templates")]
}

fn default_autoescape() -> bool {
    true
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            paths: default_template_paths(),
            namespaces: BTreeMap::new(),
            exclude: Vec::new(),
            autoescape: default_autoescape(),
        }
    }
}

impl TemplatesConfig {
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        };
        self.paths.iter_mut().for_each(resolve);
        self.namespaces
            .values_mut()
            .flat_map(|paths| paths.iter_mut())
            .for_each(resolve);
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewSettings {
    #[serde(default)]
    pub base_path: String,

    /// Name the request view is attached under.
    #[serde(default = "default_attribute")]
    pub attribute: String,
}

fn default_attribute() -> String {
    crate::middleware::DEFAULT_ATTRIBUTE.to_string()
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            attribute: default_attribute(),
        }
    }
}

/// A base path is empty, or starts with '/' and does not end with '/'.
pub fn validate_base_path(base_path: &str) -> Result<()> {
    if !base_path.is_empty() && (!base_path.starts_with('/') || base_path.ends_with('/')) {
        return Err(ViewError::ConfigInvalid {
            field: "view.base_path".into(),
            reason: format!("'{base_path}' must be empty or start with '/' and not end with '/'"),
        });
    }
    Ok(())
}

impl ViewConfig {
    pub fn validate(&self) -> Result<()> {
        validate_base_path(&self.view.base_path)?;

        if self.view.attribute.is_empty() {
            return Err(ViewError::ConfigInvalid {
                field: "view.attribute".into(),
                reason: "must not be empty".into(),
            });
        }

        for (name, pattern) in &self.routes {
            if !pattern.starts_with('/') {
                return Err(ViewError::ConfigInvalid {
                    field: format!("routes.{name}"),
                    reason: "route patterns must start with '/'".into(),
                });
            }
        }

        for namespace in self.templates.namespaces.keys() {
            if namespace.is_empty() || namespace.contains(['@', '/']) {
                return Err(ViewError::ConfigInvalid {
                    field: format!("templates.namespaces.{namespace}"),
                    reason: "namespace names must be non-empty and contain no '@' or '/'".into(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config: ViewConfig = toml::from_str("").unwrap();
        assert_eq!(config.templates.paths, vec![PathBuf::from("templates")]);
        assert!(config.templates.autoescape);
        assert_eq!(config.view.attribute, "view");
        assert_eq!(config.view.base_path, "");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let toml_str = r#"
[templates]
paths = ["templates", "shared"]
exclude = ["**/*.swp"]
autoescape = false

[templates.namespaces]
admin = ["admin"]

[view]
base_path = "/app"
attribute = "renderer"

[routes]
hello = "/hello/{name}"

[defaults]
site_name = "Example"
year = 2024
"#;
        let config: ViewConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.templates.paths.len(), 2);
        assert!(!config.templates.autoescape);
        assert_eq!(config.templates.namespaces["admin"], vec![PathBuf::from("admin")]);
        assert_eq!(config.view.attribute, "renderer");
        assert_eq!(config.routes["hello"], "/hello/{name}");
        assert_eq!(config.defaults["year"], toml::Value::Integer(2024));
    }

    #[rstest]
    #[case("[view]\nbase_path = \"app\"", "view.base_path")]
    #[case("[view]\nbase_path = \"/app/\"", "view.base_path")]
    #[case("[view]\nattribute = \"\"", "view.attribute")]
    #[case("[routes]\nhello = \"hello\"", "routes.hello")]
    #[case("[templates.namespaces]\n\"a/b\" = [\"x\"]", "templates.namespaces.a/b")]
    fn test_validation_errors(#[case] toml_str: &str, #[case] expected_field: &str) {
        let config: ViewConfig = toml::from_str(toml_str).unwrap();
        match config.validate() {
            Err(ViewError::ConfigInvalid { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_paths() {
        let mut templates = TemplatesConfig {
            paths: vec![PathBuf::from("templates"), PathBuf::from("/abs/shared")],
            ..Default::default()
        };
        templates
            .namespaces
            .insert("admin".into(), vec![PathBuf::from("admin")]);

        templates.resolve_paths(Path::new("/srv/site"));

        assert_eq!(
            templates.paths,
            vec![PathBuf::from("/srv/site/templates"), PathBuf::from("/abs/shared")]
        );
        assert_eq!(
            templates.namespaces["admin"],
            vec![PathBuf::from("/srv/site/admin")]
        );
    }
}
