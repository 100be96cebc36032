//! Import Elision
//!
//! Removes top-level imports of host-shared modules and records what each one
//! bound, by local name, so the rewriter can redirect the references.

use oxc_ast::ast::*;
use tracing::{debug, warn};

use crate::config::{HostBindingMap, HostPath};
use crate::context::{ElidedImport, TransformContext};

/// Resolves what a single import specifier stands for on the host.
fn specifier_target(specifier: &ImportDeclarationSpecifier, path: &HostPath) -> (String, HostPath) {
    match specifier {
        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
            (s.local.name.to_string(), path.clone())
        }
        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
            (s.local.name.to_string(), path.clone())
        }
        ImportDeclarationSpecifier::ImportSpecifier(s) => {
            let imported = match &s.imported {
                ModuleExportName::IdentifierName(id) => id.name.to_string(),
                ModuleExportName::IdentifierReference(id) => id.name.to_string(),
                ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
            };
            let target = if imported == "default" {
                path.clone()
            } else {
                path.child(&imported)
            };
            (s.local.name.to_string(), target)
        }
    }
}

/// Drops every import whose source is a key of `bindings`, filling the
/// context's rewrite table. Imports of other modules are left alone.
pub fn elide_host_imports(
    program: &mut Program<'_>,
    bindings: &HostBindingMap,
    ctx: &mut TransformContext,
) {
    if bindings.is_empty() {
        return;
    }

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                let source = decl.source.value.as_str();
                let Some(path) = bindings.get(source) else {
                    continue;
                };

                let mut locals = Vec::new();
                if let Some(specifiers) = &decl.specifiers {
                    for specifier in specifiers {
                        let (local, target) = specifier_target(specifier, path);
                        debug!(
                            file = %ctx.file_path,
                            specifier = source,
                            local = %local,
                            target = %target,
                            "eliding host import binding"
                        );
                        ctx.table.insert(local.clone(), target);
                        locals.push(local);
                    }
                }

                ctx.report.elided_imports.push(ElidedImport {
                    specifier: source.to_string(),
                    locals,
                });
            }
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(source) = &decl.source {
                    if bindings.contains(source.value.as_str()) {
                        warn!(
                            file = %ctx.file_path,
                            specifier = source.value.as_str(),
                            "re-export of a host-shared module cannot be redirected"
                        );
                    }
                }
            }
            Statement::ExportAllDeclaration(decl) => {
                if bindings.contains(decl.source.value.as_str()) {
                    warn!(
                        file = %ctx.file_path,
                        specifier = decl.source.value.as_str(),
                        "re-export of a host-shared module cannot be redirected"
                    );
                }
            }
            _ => {}
        }
    }

    if ctx.report.elided_imports.is_empty() {
        return;
    }

    program.body.retain(|stmt| match stmt {
        Statement::ImportDeclaration(decl) => !bindings.contains(decl.source.value.as_str()),
        _ => true,
    });
}
