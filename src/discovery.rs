//! Plugin Discovery
//!
//! Recursively scans a plugins directory for `plugin.json` files and source
//! directories for transformable modules.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::{PluginBuildConfig, DEFAULT_OUT_DIR};
use crate::error::CompileError;

pub const PLUGIN_CONFIG_FILE: &str = "plugin.json";

/// Directories never scanned: installed packages, VCS metadata and build
/// output.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "target", DEFAULT_OUT_DIR];

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Every `plugin.json` under `root`, sorted.
pub fn discover_plugin_configs(root: &Path) -> Vec<PathBuf> {
    let mut configs = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && entry.file_name() == PLUGIN_CONFIG_FILE {
                    debug!(path = %entry.path().display(), "found plugin config");
                    configs.push(entry.into_path());
                }
            }
            Err(e) => warn!(error = %e, "skipping unreadable path during discovery"),
        }
    }

    configs.sort();
    configs
}

/// Loads every discovered config. One bad config does not hide the others.
pub fn load_plugin_configs(root: &Path) -> Vec<(PathBuf, Result<PluginBuildConfig, CompileError>)> {
    discover_plugin_configs(root)
        .into_iter()
        .map(|path| {
            let config = PluginBuildConfig::from_file(&path);
            (path, config)
        })
        .collect()
}

/// Source files under `dir` whose extension is in `extensions`, sorted.
/// `exclude` (typically the output directory) is never entered.
pub fn find_source_files(dir: &Path, extensions: &[String], exclude: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e) && e.path() != exclude)
        .flatten()
    {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext));
        if matches {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discovers_nested_configs_and_skips_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b-plugin")).unwrap();
        fs::create_dir_all(root.join("a-plugin/nested")).unwrap();
        fs::create_dir_all(root.join("a-plugin/node_modules/dep")).unwrap();
        fs::write(root.join("b-plugin/plugin.json"), "{}").unwrap();
        fs::write(root.join("a-plugin/nested/plugin.json"), "{}").unwrap();
        fs::write(root.join("a-plugin/node_modules/dep/plugin.json"), "{}").unwrap();

        let configs = discover_plugin_configs(root);

        assert_eq!(
            configs,
            vec![
                root.join("a-plugin/nested/plugin.json"),
                root.join("b-plugin/plugin.json"),
            ]
        );
    }

    #[test]
    fn test_find_source_files_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("routes")).unwrap();
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::write(root.join("App.jsx"), "").unwrap();
        fs::write(root.join("App.css"), "").unwrap();
        fs::write(root.join("routes/nodes.js"), "").unwrap();
        fs::write(root.join("dist/App.jsx"), "").unwrap();

        let extensions = vec!["js".to_string(), "jsx".to_string()];
        let files = find_source_files(root, &extensions, &root.join("out"));

        assert_eq!(files, vec![root.join("App.jsx"), root.join("routes/nodes.js")]);
    }
}
