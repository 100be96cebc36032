//! # Plugin Runtime Shim
//!
//! Build-time transform that lets a separately compiled UI plugin run inside
//! a host application while sharing the host's single runtime instance.
//!
//! ## Invariants
//!
//! 1. **Host-shared imports are elided.** Every top-level import whose module
//!    specifier is a key of `hostBindings` is removed; the local names it
//!    bound go into a per-file rewrite table keyed by LOCAL name.
//!
//! 2. **References are qualified.** A free reference to an elided binding is
//!    replaced by the binding's global path: `Lib.create(x)` with
//!    `Lib → Host.Lib` becomes `Host.Lib.create(x)`.
//!
//! 3. **Guards are mandatory.**
//!    - `Lib._x` (internal prefix) is never rewritten.
//!    - A chain already spelled as its target is never rewritten again, so
//!      the transform is idempotent.
//!
//! 4. **Markup lowers onto the same path.** Element and fragment constructors
//!    are addressed through the path the rewriter assigns to the runtime
//!    binding, so lowered output never needs the elided import.
//!
//! 5. **Host modules stay external.** The bundle descriptor lists every
//!    host-shared specifier as external; the emitted entry imports none of
//!    them and exports exactly one value.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod config;
mod context;
mod contract;
mod descriptor;
mod discovery;
mod elision;
mod error;
mod jsx_lowerer;
mod paths;
mod pipeline;
mod rewriter;
mod scope;
mod transform;

#[cfg(test)]
mod elision_tests;
#[cfg(test)]
mod lowering_tests;
#[cfg(test)]
mod transform_tests;

pub use config::{
    ElementLowering, HostBinding, HostBindingMap, HostPath, PluginBuildConfig, TransformConfig,
    TransformOptions,
};
pub use context::{ElidedImport, TransformReport};
pub use contract::{check_output_contract, module_surface, ModuleSurface};
pub use descriptor::{BundleDescriptor, BundleFormat};
pub use discovery::{discover_plugin_configs, find_source_files, load_plugin_configs};
pub use error::CompileError;
pub use jsx_lowerer::clean_jsx_text;
pub use pipeline::{build_plugin, build_plugins, write_artifact, PluginArtifact, TransformedModule};
#[cfg(feature = "napi")]
pub use transform::transform_plugin_native;
pub use transform::{transform_plugin_source, TransformOutput};

/// Bundle descriptor for a `plugin.json` document, as JSON.
#[cfg(feature = "napi")]
#[napi]
pub fn bundle_descriptor_native(config_json: String) -> napi::Result<serde_json::Value> {
    let config = PluginBuildConfig::from_json(&config_json)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(BundleDescriptor::from_config(&config))
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}
