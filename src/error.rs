//! Error types for plugin transforms and builds.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure a plugin build can surface.
///
/// Each variant carries a stable code (see [`CompileError::code`]) so bundler
/// integrations can match on it without parsing messages.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The plugin source could not be parsed. Fatal for that file.
    #[error("[PLG-ERR-PARSE-001] failed to parse {file}: {}", .messages.join("; "))]
    Parse { file: String, messages: Vec<String> },

    /// A host binding path is not a dotted identifier path.
    #[error("[PLG-ERR-CONFIG-001] invalid host path \"{path}\": {reason}")]
    InvalidHostPath { path: String, reason: String },

    /// The plugin configuration is inconsistent.
    #[error("[PLG-ERR-CONFIG-002] invalid plugin config: {0}")]
    Config(String),

    /// A config or descriptor document is not valid JSON for its schema.
    #[error("[PLG-ERR-CONFIG-003] invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing a build file failed.
    #[error("[PLG-ERR-IO-001] I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The emitted module still imports a host-shared module.
    #[error("[PLG-ERR-CONTRACT-001] {file} still imports host-shared module \"{specifier}\"")]
    HostImportRetained { file: String, specifier: String },

    /// A rewritten reference or lowered element would resolve its host root
    /// through a local binding instead of the host global.
    #[error("[PLG-ERR-REWRITE-001] {file}: \"{reference}\" cannot be qualified here, the local binding \"{root}\" hides the host global")]
    HostRootShadowed {
        file: String,
        reference: String,
        root: String,
    },

    /// A reference to an elided binding has no valid qualified form.
    #[error("[PLG-ERR-REWRITE-002] {file}: cannot qualify \"{reference}\": {reason}")]
    UnqualifiableReference {
        file: String,
        reference: String,
        reason: String,
    },

    /// The entry module does not export exactly one value.
    #[error("[PLG-ERR-CONTRACT-002] entry {file} must export exactly one value, found {}: [{}]", .exports.len(), .exports.join(", "))]
    ExportSurface { file: String, exports: Vec<String> },
}

impl CompileError {
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Parse { .. } => "PLG-ERR-PARSE-001",
            CompileError::InvalidHostPath { .. } => "PLG-ERR-CONFIG-001",
            CompileError::Config(_) => "PLG-ERR-CONFIG-002",
            CompileError::Json(_) => "PLG-ERR-CONFIG-003",
            CompileError::Io { .. } => "PLG-ERR-IO-001",
            CompileError::HostRootShadowed { .. } => "PLG-ERR-REWRITE-001",
            CompileError::UnqualifiableReference { .. } => "PLG-ERR-REWRITE-002",
            CompileError::HostImportRetained { .. } => "PLG-ERR-CONTRACT-001",
            CompileError::ExportSurface { .. } => "PLG-ERR-CONTRACT-002",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }
}
