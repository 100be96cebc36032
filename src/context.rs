//! Per-file transform state.
//!
//! A `TransformContext` lives for exactly one file's traversal. Nothing in it
//! is shared between files, so parallel transforms never contend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::HostPath;
use crate::error::CompileError;

/// Local names bound by elided imports, keyed by the LOCAL name.
#[derive(Debug, Clone, Default)]
pub struct RewriteTable {
    targets: HashMap<String, HostPath>,
}

impl RewriteTable {
    pub fn insert(&mut self, local: impl Into<String>, target: HostPath) {
        self.targets.insert(local.into(), target);
    }

    pub fn get(&self, local: &str) -> Option<&HostPath> {
        self.targets.get(local)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElidedImport {
    pub specifier: String,
    pub locals: Vec<String>,
}

/// What one file's transform did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformReport {
    pub elided_imports: Vec<ElidedImport>,
    pub rewritten_references: u32,
    pub already_qualified: u32,
    /// Accesses left untouched by the internal-prefix guard, as `Lib._x`.
    pub retained_internal: Vec<String>,
    pub lowered_elements: u32,
}

#[derive(Debug)]
pub struct TransformContext {
    pub file_path: String,
    pub table: RewriteTable,
    pub report: TransformReport,
    /// Rewrites that could not be made safely. The first one fails the file.
    pub errors: Vec<CompileError>,
}

impl TransformContext {
    pub fn new(file_path: impl Into<String>) -> Self {
        TransformContext {
            file_path: file_path.into(),
            table: RewriteTable::default(),
            report: TransformReport::default(),
            errors: Vec::new(),
        }
    }
}
