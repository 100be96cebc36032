//! Plugin build configuration.
//!
//! A plugin is described by a `plugin.json` next to its sources:
//!
//! ```json
//! {
//!   "entry": "src/App.jsx",
//!   "outputName": "plugin-component.js",
//!   "exportedName": "PluginComponent",
//!   "hostBindings": { "react": "window.React" }
//! }
//! ```
//!
//! Every `hostBindings` key is elided from imports, rewritten to its global
//! path, and marked external in the bundle descriptor.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::descriptor::BundleFormat;
use crate::error::CompileError;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

pub const DEFAULT_OUTPUT_NAME: &str = "plugin-component.js";
pub const DEFAULT_EXPORTED_NAME: &str = "PluginComponent";
pub const DEFAULT_INTERNAL_PREFIX: &str = "_";
pub const DEFAULT_OUT_DIR: &str = "dist";

/// Member names the classic element runtime exposes on the host instance.
pub const ELEMENT_CONSTRUCTOR_MEMBER: &str = "createElement";
pub const FRAGMENT_CONSTRUCTOR_MEMBER: &str = "Fragment";

pub(crate) fn is_identifier_name(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOST PATH
// ═══════════════════════════════════════════════════════════════════════════════

/// A dotted property path rooted at a host global, e.g. `window.React`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostPath {
    segments: Vec<String>,
}

impl HostPath {
    pub fn parse(path: &str) -> Result<Self, CompileError> {
        let invalid = |reason: &str| CompileError::InvalidHostPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if !is_identifier_name(segment) {
                return Err(invalid(&format!("\"{}\" is not an identifier", segment)));
            }
            segments.push(segment.to_string());
        }

        Ok(HostPath { segments })
    }

    /// The global the path is rooted at.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Extends the path by one member. The member may be any export name;
    /// non-identifier members are emitted as computed access.
    pub fn child(&self, member: &str) -> HostPath {
        let mut segments = self.segments.clone();
        segments.push(member.to_string());
        HostPath { segments }
    }

    /// True when `chain` begins with every segment of this path.
    pub fn is_prefix_of(&self, chain: &[&str]) -> bool {
        chain.len() >= self.segments.len()
            && self
                .segments
                .iter()
                .zip(chain)
                .all(|(segment, link)| segment == link)
    }
}

impl fmt::Display for HostPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl TryFrom<String> for HostPath {
    type Error = CompileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HostPath::parse(&value)
    }
}

impl From<HostPath> for String {
    fn from(path: HostPath) -> Self {
        path.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOST BINDING MAP
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBinding {
    pub specifier: String,
    pub path: HostPath,
}

/// Ordered mapping of module specifier to host global path.
///
/// Order matters: the first binding is the one markup lowering targets by
/// default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostBindingMap {
    entries: Vec<HostBinding>,
}

impl HostBindingMap {
    pub fn new() -> Self {
        HostBindingMap::default()
    }

    /// Inserts a binding. An existing specifier keeps its position.
    pub fn insert(&mut self, specifier: impl Into<String>, path: HostPath) {
        let specifier = specifier.into();
        if let Some(existing) = self.entries.iter_mut().find(|b| b.specifier == specifier) {
            existing.path = path;
        } else {
            self.entries.push(HostBinding { specifier, path });
        }
    }

    /// Parses `path` and inserts it.
    pub fn bind(mut self, specifier: &str, path: &str) -> Result<Self, CompileError> {
        self.insert(specifier, HostPath::parse(path)?);
        Ok(self)
    }

    pub fn get(&self, specifier: &str) -> Option<&HostPath> {
        self.entries
            .iter()
            .find(|b| b.specifier == specifier)
            .map(|b| &b.path)
    }

    pub fn contains(&self, specifier: &str) -> bool {
        self.get(specifier).is_some()
    }

    pub fn first(&self) -> Option<&HostBinding> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostBinding> {
        self.entries.iter()
    }

    pub fn specifiers(&self) -> Vec<String> {
        self.entries.iter().map(|b| b.specifier.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for HostBindingMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for binding in &self.entries {
            map.serialize_entry(&binding.specifier, &binding.path)?;
        }
        map.end()
    }
}

struct HostBindingMapVisitor;

impl<'de> Visitor<'de> for HostBindingMapVisitor {
    type Value = HostBindingMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping module specifiers to global property paths")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
        let mut bindings = HostBindingMap::new();
        while let Some((specifier, path)) = access.next_entry::<String, HostPath>()? {
            bindings.insert(specifier, path);
        }
        Ok(bindings)
    }
}

impl<'de> Deserialize<'de> for HostBindingMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HostBindingMapVisitor)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENT LOWERING TARGETS
// ═══════════════════════════════════════════════════════════════════════════════

/// Call targets for lowered markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementLowering {
    pub element: HostPath,
    pub fragment: HostPath,
}

impl ElementLowering {
    pub fn new(element: HostPath, fragment: HostPath) -> Self {
        ElementLowering { element, fragment }
    }

    /// Targets derived from a runtime instance path: `<path>.createElement`
    /// and `<path>.Fragment`.
    pub fn for_runtime(path: &HostPath) -> Self {
        ElementLowering {
            element: path.child(ELEMENT_CONSTRUCTOR_MEMBER),
            fragment: path.child(FRAGMENT_CONSTRUCTOR_MEMBER),
        }
    }

    /// Resolves the lowering targets from the first host binding, applying
    /// explicit overrides. `None` means markup is left for a later compiler.
    pub fn resolve(
        bindings: &HostBindingMap,
        element_override: Option<&str>,
        fragment_override: Option<&str>,
    ) -> Result<Option<Self>, CompileError> {
        let derived = bindings.first().map(|b| Self::for_runtime(&b.path));

        let element = match element_override {
            Some(path) => Some(HostPath::parse(path)?),
            None => derived.as_ref().map(|d| d.element.clone()),
        };
        let fragment = match fragment_override {
            Some(path) => Some(HostPath::parse(path)?),
            None => derived.as_ref().map(|d| d.fragment.clone()),
        };

        match (element, fragment) {
            (Some(element), Some(fragment)) => Ok(Some(ElementLowering { element, fragment })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(CompileError::Config(
                "elementConstructorPath is set but no fragmentConstructorPath can be derived; \
                 add a host binding or set fragmentConstructorPath"
                    .to_string(),
            )),
            (None, Some(_)) => Err(CompileError::Config(
                "fragmentConstructorPath is set but no elementConstructorPath can be derived; \
                 add a host binding or set elementConstructorPath"
                    .to_string(),
            )),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORM CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

fn default_internal_prefix() -> String {
    DEFAULT_INTERNAL_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

/// The per-file transform surface, as written in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    #[serde(default)]
    pub host_bindings: HostBindingMap,
    #[serde(default)]
    pub element_constructor_path: Option<String>,
    #[serde(default)]
    pub fragment_constructor_path: Option<String>,
    #[serde(default = "default_internal_prefix")]
    pub internal_prefix: String,
    #[serde(default = "default_true")]
    pub lower_elements: bool,
}

impl TransformConfig {
    /// Layers `extra` over the configured bindings. Lowering targets are
    /// derived later, from the merged map.
    pub fn with_extra_bindings(mut self, extra: &HostBindingMap) -> Self {
        for binding in extra.iter() {
            self.host_bindings
                .insert(binding.specifier.clone(), binding.path.clone());
        }
        self
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            host_bindings: HostBindingMap::new(),
            element_constructor_path: None,
            fragment_constructor_path: None,
            internal_prefix: default_internal_prefix(),
            lower_elements: true,
        }
    }
}

/// Validated options handed to [`crate::transform_plugin_source`].
///
/// Immutable for the duration of a build, so one value can be shared by every
/// file transform running in parallel.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub host_bindings: HostBindingMap,
    pub lowering: Option<ElementLowering>,
    pub internal_prefix: String,
}

impl TransformOptions {
    /// Options with lowering targets derived from `host_bindings`.
    pub fn new(host_bindings: HostBindingMap) -> Self {
        let lowering = host_bindings
            .first()
            .map(|b| ElementLowering::for_runtime(&b.path));
        TransformOptions {
            host_bindings,
            lowering,
            internal_prefix: default_internal_prefix(),
        }
    }

    pub fn with_lowering(mut self, lowering: Option<ElementLowering>) -> Self {
        self.lowering = lowering;
        self
    }

    pub fn with_internal_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.internal_prefix = prefix.into();
        self
    }
}

impl TryFrom<&TransformConfig> for TransformOptions {
    type Error = CompileError;

    fn try_from(config: &TransformConfig) -> Result<Self, Self::Error> {
        let lowering = if config.lower_elements {
            ElementLowering::resolve(
                &config.host_bindings,
                config.element_constructor_path.as_deref(),
                config.fragment_constructor_path.as_deref(),
            )?
        } else {
            None
        };

        Ok(TransformOptions {
            host_bindings: config.host_bindings.clone(),
            lowering,
            internal_prefix: config.internal_prefix.clone(),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLUGIN BUILD CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

fn default_output_name() -> String {
    DEFAULT_OUTPUT_NAME.to_string()
}

fn default_exported_name() -> String {
    DEFAULT_EXPORTED_NAME.to_string()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUT_DIR)
}

fn default_source_extensions() -> Vec<String> {
    ["js", "jsx", "mjs", "ts", "tsx"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

/// One plugin's build, as declared in its `plugin.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginBuildConfig {
    pub entry: PathBuf,
    #[serde(default = "default_output_name")]
    pub output_name: String,
    #[serde(default = "default_exported_name")]
    pub exported_name: String,
    #[serde(default)]
    pub format: BundleFormat,
    #[serde(default = "default_true")]
    pub inline_styles: bool,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
    #[serde(flatten)]
    pub transform: TransformConfig,
}

impl PluginBuildConfig {
    /// A config with defaults for everything but the entry and bindings.
    pub fn new(entry: impl Into<PathBuf>, host_bindings: HostBindingMap) -> Self {
        PluginBuildConfig {
            entry: entry.into(),
            output_name: default_output_name(),
            exported_name: default_exported_name(),
            format: BundleFormat::default(),
            inline_styles: true,
            out_dir: default_out_dir(),
            source_extensions: default_source_extensions(),
            transform: TransformConfig {
                host_bindings,
                ..TransformConfig::default()
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        let config: PluginBuildConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `plugin.json`, resolving relative paths against its directory.
    pub fn from_file(path: &Path) -> Result<Self, CompileError> {
        let json = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
        let mut config = Self::from_json(&json)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if config.entry.is_relative() {
            config.entry = base.join(&config.entry);
        }
        if config.out_dir.is_relative() {
            config.out_dir = base.join(&config.out_dir);
        }
        Ok(config)
    }

    pub fn host_bindings(&self) -> &HostBindingMap {
        &self.transform.host_bindings
    }

    pub fn transform_options(&self) -> Result<TransformOptions, CompileError> {
        TransformOptions::try_from(&self.transform)
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.entry.as_os_str().is_empty() {
            return Err(CompileError::Config("entry must not be empty".to_string()));
        }
        if self.output_name.trim().is_empty() {
            return Err(CompileError::Config(
                "outputName must not be empty".to_string(),
            ));
        }
        if !is_identifier_name(&self.exported_name) {
            return Err(CompileError::Config(format!(
                "exportedName \"{}\" is not a valid identifier",
                self.exported_name
            )));
        }
        self.transform_options().map(|_| ())
    }
}
