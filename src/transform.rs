//! Per-file transform entry point.
//!
//! parse → elide host imports → lower markup / rewrite references → print.
//! The middle two run inside one traversal (see `rewriter`).

#[cfg(feature = "napi")]
use napi_derive::napi;
use oxc_allocator::Allocator;
use oxc_ast_visit::VisitMut;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[cfg(feature = "napi")]
use crate::config::TransformConfig;
use crate::config::TransformOptions;
use crate::context::{TransformContext, TransformReport};
use crate::error::CompileError;
use crate::rewriter::HostGlobalRewriter;

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    pub code: String,
    pub report: TransformReport,
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// `configJson` is a `TransformConfig` object (`hostBindings`, ...).
#[cfg(feature = "napi")]
#[napi]
pub fn transform_plugin_native(
    source: String,
    file_path: String,
    config_json: String,
) -> napi::Result<serde_json::Value> {
    let config: TransformConfig = serde_json::from_str(&config_json)
        .map_err(|e| napi::Error::from_reason(format!("Invalid config: {}", e)))?;
    let options = TransformOptions::try_from(&config)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let output = transform_plugin_source(&source, &file_path, &options)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(output).map_err(|e| napi::Error::from_reason(e.to_string()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTERNAL IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Source type by extension. Unknown extensions parse as JavaScript with
/// markup, which is what plugin entries are written in.
pub fn source_type_for(file_path: &str) -> SourceType {
    let extension = Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let module = SourceType::default().with_module(true);
    match extension {
        "ts" | "mts" | "cts" => module.with_typescript(true),
        "tsx" => module.with_typescript(true).with_jsx(true),
        _ => module.with_jsx(true),
    }
}

pub fn transform_plugin_source(
    source: &str,
    file_path: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, CompileError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type_for(file_path)).parse();

    if ret.panicked || !ret.errors.is_empty() {
        let mut messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        if messages.is_empty() {
            messages.push("parser aborted".to_string());
        }
        return Err(CompileError::Parse {
            file: file_path.to_string(),
            messages,
        });
    }

    let mut program = ret.program;
    let mut ctx = TransformContext::new(file_path);

    let mut rewriter = HostGlobalRewriter::new(&allocator, &mut ctx, options);
    rewriter.visit_program(&mut program);
    rewriter.finish();

    if let Some(error) = ctx.errors.drain(..).next() {
        return Err(error);
    }

    let code = Codegen::new().build(&program).code;
    let report = ctx.report;

    debug!(
        file = file_path,
        elided = report.elided_imports.len(),
        rewritten = report.rewritten_references,
        lowered = report.lowered_elements,
        "transformed plugin source"
    );

    Ok(TransformOutput { code, report })
}
