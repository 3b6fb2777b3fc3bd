use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tera::Tera;
use walkdir::WalkDir;

use crate::config::TemplatesConfig;
use crate::error::{Result, ViewError};

/// Template names under a namespace look like `@admin/users/list.html`.
pub const NAMESPACE_PREFIX: char = '@';

/// A template file and the name it is registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    pub name: String,
    pub path: PathBuf,
}

/// Walk every configured root and collect template files.
///
/// Names are `/`-separated paths relative to their root. When two roots of
/// the same namespace contain the same name, the root listed first wins.
pub fn collect_templates(config: &TemplatesConfig) -> Result<Vec<TemplateFile>> {
    let exclude = build_glob_set(&config.exclude)?;
    let mut found = BTreeMap::new();

    for root in &config.paths {
        collect_root(root, None, &exclude, &mut found)?;
    }
    for (namespace, roots) in &config.namespaces {
        for root in roots {
            collect_root(root, Some(namespace.as_str()), &exclude, &mut found)?;
        }
    }

    Ok(found
        .into_iter()
        .map(|(name, path)| TemplateFile { name, path })
        .collect())
}

/// Build a tera environment from the configured template roots.
pub fn load_tera(config: &TemplatesConfig) -> Result<Tera> {
    let files = collect_templates(config)?;

    let mut tera = Tera::default();
    if !config.autoescape {
        tera.autoescape_on(Vec::new());
    }

    tera.add_template_files(
        files
            .iter()
            .map(|file| (file.path.as_path(), Some(file.name.as_str()))),
    )
    .map_err(|e| ViewError::TemplateLoad { source: e })?;

    tracing::info!(
        templates = files.len(),
        roots = config.paths.len(),
        namespaces = config.namespaces.len(),
        "Loaded templates"
    );

    Ok(tera)
}

fn collect_root(
    root: &Path,
    namespace: Option<&str>,
    exclude: &GlobSet,
    found: &mut BTreeMap<String, PathBuf>,
) -> Result<()> {
    if !root.is_dir() {
        return Err(ViewError::TemplateDirectoryMissing {
            path: root.to_path_buf(),
        });
    }

    for entry in WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel_path) = entry.path().strip_prefix(root) else {
            continue;
        };

        let rel_name = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclude.is_match(&rel_name) {
            continue;
        }

        let name = match namespace {
            Some(namespace) => format!("{NAMESPACE_PREFIX}{namespace}/{rel_name}"),
            None => rel_name,
        };
        found
            .entry(name)
            .or_insert_with(|| entry.path().to_path_buf());
    }

    Ok(())
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ViewError::GlobPattern {
            pattern: pattern.clone(),
            source: e,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ViewError::GlobPattern {
        pattern: "<combined>".into(),
        source: e,
    })
}
