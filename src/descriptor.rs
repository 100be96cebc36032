//! Bundle Descriptor
//!
//! The packaging plan handed to the external bundler for one plugin. Nothing
//! here transforms code: it names the entry, the single output file and its
//! format, and every host-shared specifier the bundler must leave external.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{HostBindingMap, PluginBuildConfig};

/// Module format of the emitted bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    #[default]
    Es,
    Umd,
    Iife,
    Cjs,
}

impl BundleFormat {
    /// Formats that wrap the bundle and read externals from globals.
    pub fn needs_globals(self) -> bool {
        matches!(self, BundleFormat::Umd | BundleFormat::Iife)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDescriptor {
    pub entry: PathBuf,
    pub file_name: String,
    pub format: BundleFormat,
    /// Name the single export is exposed under.
    pub name: String,
    /// Specifiers the bundler must never resolve or embed.
    pub external: Vec<String>,
    /// Specifier to global path. Only wrapping formats read it, so it is
    /// empty (and omitted) for the others.
    #[serde(default, skip_serializing_if = "HostBindingMap::is_empty")]
    pub globals: HostBindingMap,
    /// Always false: styles travel inside the single emitted file.
    pub css_code_split: bool,
    pub inline_styles: bool,
}

impl BundleDescriptor {
    pub fn from_config(config: &PluginBuildConfig) -> Self {
        let bindings = config.host_bindings();
        let globals = if config.format.needs_globals() {
            bindings.clone()
        } else {
            HostBindingMap::new()
        };
        BundleDescriptor {
            entry: config.entry.clone(),
            file_name: config.output_name.clone(),
            format: config.format,
            name: config.exported_name.clone(),
            external: bindings.specifiers(),
            globals,
            css_code_split: false,
            inline_styles: config.inline_styles,
        }
    }

    /// The same plan pointed at a different entry, e.g. the transformed copy.
    pub fn with_entry(&self, entry: &Path) -> Self {
        BundleDescriptor {
            entry: entry.to_path_buf(),
            ..self.clone()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_config() -> PluginBuildConfig {
        PluginBuildConfig::from_json(
            r#"{
                "entry": "src/App.jsx",
                "outputName": "plugin-component.js",
                "exportedName": "PluginComponent",
                "format": "umd",
                "hostBindings": { "react": "window.React", "react-dom": "window.ReactDOM" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_every_host_binding_is_external() {
        let descriptor = BundleDescriptor::from_config(&sample_config());

        assert_eq!(descriptor.external, vec!["react", "react-dom"]);
        assert_eq!(
            descriptor.globals.get("react-dom").unwrap().to_string(),
            "window.ReactDOM"
        );
    }

    #[test]
    fn test_single_file_output() {
        let descriptor = BundleDescriptor::from_config(&sample_config());

        assert_eq!(descriptor.file_name, "plugin-component.js");
        assert_eq!(descriptor.name, "PluginComponent");
        assert_eq!(descriptor.format, BundleFormat::Umd);
        assert!(descriptor.format.needs_globals());
        assert!(!descriptor.css_code_split);
        assert!(descriptor.inline_styles);
    }

    #[test]
    fn test_module_format_omits_globals() {
        let mut config = sample_config();
        config.format = BundleFormat::Es;
        let descriptor = BundleDescriptor::from_config(&config);

        assert!(descriptor.globals.is_empty());
        assert_eq!(descriptor.external, vec!["react", "react-dom"]);
        let value: serde_json::Value =
            serde_json::from_str(&descriptor.to_json().unwrap()).unwrap();
        assert!(value.get("globals").is_none(), "got: {}", value);
    }

    #[test]
    fn test_descriptor_json_shape() {
        let descriptor = BundleDescriptor::from_config(&sample_config())
            .with_entry(Path::new("dist/src/App.jsx"));
        let value: serde_json::Value =
            serde_json::from_str(&descriptor.to_json().unwrap()).unwrap();

        assert_eq!(value["entry"], "dist/src/App.jsx");
        assert_eq!(value["fileName"], "plugin-component.js");
        assert_eq!(value["format"], "umd");
        assert_eq!(value["external"][0], "react");
        assert_eq!(value["globals"]["react"], "window.React");
        assert_eq!(value["cssCodeSplit"], false);
    }
}
