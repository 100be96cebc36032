//! Plugin build orchestration.
//!
//! Transforms every module of a plugin in parallel, checks the emitted entry
//! against the output contract, and lays the result out for the external
//! bundler together with its descriptor.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, info_span};

use crate::config::{PluginBuildConfig, TransformOptions};
use crate::context::TransformReport;
use crate::contract::check_output_contract;
use crate::descriptor::BundleDescriptor;
use crate::discovery::find_source_files;
use crate::error::CompileError;
use crate::transform::transform_plugin_source;

pub const DESCRIPTOR_FILE: &str = "descriptor.json";

#[derive(Debug, Clone)]
pub struct TransformedModule {
    pub source_path: PathBuf,
    /// Path relative to the plugin's source root.
    pub relative_path: PathBuf,
    pub code: String,
    pub report: TransformReport,
}

/// Everything one plugin build produced, before anything is written.
#[derive(Debug, Clone)]
pub struct PluginArtifact {
    pub modules: Vec<TransformedModule>,
    /// Entry path relative to the source root.
    pub entry: PathBuf,
    pub descriptor: BundleDescriptor,
}

impl PluginArtifact {
    pub fn entry_module(&self) -> Option<&TransformedModule> {
        self.modules.iter().find(|m| m.relative_path == self.entry)
    }
}

fn transform_file(
    path: &Path,
    root: &Path,
    options: &TransformOptions,
) -> Result<TransformedModule, CompileError> {
    let source = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
    let file = path.to_string_lossy();
    let output = transform_plugin_source(&source, &file, options)?;
    let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();

    Ok(TransformedModule {
        source_path: path.to_path_buf(),
        relative_path,
        code: output.code,
        report: output.report,
    })
}

/// Builds one plugin: every source file under the entry's directory is
/// transformed independently, then each emitted module is checked.
pub fn build_plugin(config: &PluginBuildConfig) -> Result<PluginArtifact, CompileError> {
    let span = info_span!("build_plugin", entry = %config.entry.display());
    let _guard = span.enter();

    let options = config.transform_options()?;
    if !config.entry.is_file() {
        return Err(CompileError::Config(format!(
            "entry {} does not exist",
            config.entry.display()
        )));
    }

    let root = config
        .entry
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut sources = find_source_files(&root, &config.source_extensions, &config.out_dir);
    if !sources.contains(&config.entry) {
        sources.push(config.entry.clone());
    }

    let modules = sources
        .par_iter()
        .map(|path| transform_file(path, &root, &options))
        .collect::<Result<Vec<_>, _>>()?;

    for module in &modules {
        let is_entry = module.source_path == config.entry;
        check_output_contract(
            &module.code,
            &module.source_path.to_string_lossy(),
            config.host_bindings(),
            is_entry,
        )?;
    }

    let entry = config
        .entry
        .strip_prefix(&root)
        .unwrap_or(&config.entry)
        .to_path_buf();

    let rewritten: u32 = modules.iter().map(|m| m.report.rewritten_references).sum();
    info!(
        modules = modules.len(),
        rewritten,
        "plugin transformed"
    );

    Ok(PluginArtifact {
        modules,
        entry,
        descriptor: BundleDescriptor::from_config(config),
    })
}

/// Independent builds, one result per config, in input order.
pub fn build_plugins(configs: &[PluginBuildConfig]) -> Vec<Result<PluginArtifact, CompileError>> {
    configs
        .par_iter()
        .map(build_plugin)
        .collect()
}

/// Mirrors the transformed modules under `out_dir` and writes the
/// descriptor next to them. Returns the descriptor's path.
pub fn write_artifact(artifact: &PluginArtifact, out_dir: &Path) -> Result<PathBuf, CompileError> {
    for module in &artifact.modules {
        let target = out_dir.join(&module.relative_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| CompileError::io(parent, e))?;
        }
        fs::write(&target, &module.code).map_err(|e| CompileError::io(&target, e))?;
    }

    let descriptor = artifact.descriptor.with_entry(&out_dir.join(&artifact.entry));
    let descriptor_path = out_dir.join(DESCRIPTOR_FILE);
    fs::create_dir_all(out_dir).map_err(|e| CompileError::io(out_dir, e))?;
    fs::write(&descriptor_path, descriptor.to_json()?)
        .map_err(|e| CompileError::io(&descriptor_path, e))?;

    info!(out_dir = %out_dir.display(), modules = artifact.modules.len(), "artifact written");
    Ok(descriptor_path)
}
