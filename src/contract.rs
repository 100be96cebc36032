//! Output contract check.
//!
//! Re-reads an emitted module and verifies what the host loader relies on:
//! no host-shared module is imported, and the entry exposes exactly one value.

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::Parser;
use std::collections::HashSet;

use crate::config::HostBindingMap;
use crate::error::CompileError;
use crate::scope::collect_pattern_names;
use crate::transform::source_type_for;

/// The module-level surface of an emitted file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleSurface {
    pub imports: Vec<String>,
    pub exports: Vec<String>,
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn declaration_exports(declaration: &Declaration, exports: &mut Vec<String>) {
    match declaration {
        Declaration::VariableDeclaration(var) => {
            let mut names = HashSet::new();
            for d in &var.declarations {
                collect_pattern_names(&d.id, &mut names);
            }
            let mut names: Vec<String> = names.into_iter().collect();
            names.sort();
            exports.extend(names);
        }
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                exports.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                exports.push(id.name.to_string());
            }
        }
        // Type-level declarations export no runtime value.
        _ => {}
    }
}

/// Lists the imports and runtime exports of `code`.
pub fn module_surface(code: &str, file: &str) -> Result<ModuleSurface, CompileError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, source_type_for(file)).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return Err(CompileError::Parse {
            file: file.to_string(),
            messages: ret.errors.iter().map(|e| e.to_string()).collect(),
        });
    }

    let mut surface = ModuleSurface::default();
    for stmt in &ret.program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                surface.imports.push(decl.source.value.to_string());
            }
            Statement::ExportDefaultDeclaration(_) => {
                surface.exports.push("default".to_string());
            }
            Statement::ExportNamedDeclaration(decl) => {
                if decl.export_kind.is_type() {
                    continue;
                }
                // A re-export loads its source like an import does.
                if let Some(source) = &decl.source {
                    surface.imports.push(source.value.to_string());
                }
                if let Some(declaration) = &decl.declaration {
                    declaration_exports(declaration, &mut surface.exports);
                }
                for spec in &decl.specifiers {
                    if !spec.export_kind.is_type() {
                        surface.exports.push(export_name(&spec.exported));
                    }
                }
            }
            Statement::ExportAllDeclaration(decl) => {
                if decl.export_kind.is_type() {
                    continue;
                }
                surface.imports.push(decl.source.value.to_string());
                let name = match &decl.exported {
                    Some(name) => export_name(name),
                    None => format!("* from \"{}\"", decl.source.value),
                };
                surface.exports.push(name);
            }
            _ => {}
        }
    }
    Ok(surface)
}

/// Fails when `code` still imports or re-exports a host-shared module, or,
/// for the entry, when it does not export exactly one value.
pub fn check_output_contract(
    code: &str,
    file: &str,
    bindings: &HostBindingMap,
    is_entry: bool,
) -> Result<ModuleSurface, CompileError> {
    let surface = module_surface(code, file)?;

    if let Some(specifier) = surface.imports.iter().find(|s| bindings.contains(s)) {
        return Err(CompileError::HostImportRetained {
            file: file.to_string(),
            specifier: specifier.clone(),
        });
    }

    if is_entry && surface.exports.len() != 1 {
        return Err(CompileError::ExportSurface {
            file: file.to_string(),
            exports: surface.exports.clone(),
        });
    }

    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn react() -> HostBindingMap {
        HostBindingMap::new().bind("react", "window.React").unwrap()
    }

    #[test]
    fn test_clean_entry_passes() {
        let code = "import axios from \"axios\";\nfunction App() {}\nexport default App;\n";
        let surface = check_output_contract(code, "App.jsx", &react(), true).unwrap();
        assert_eq!(surface.imports, vec!["axios"]);
        assert_eq!(surface.exports, vec!["default"]);
    }

    #[test]
    fn test_retained_host_import_fails() {
        let code = "import React from \"react\";\nexport default 1;\n";
        let err = check_output_contract(code, "App.jsx", &react(), true).unwrap_err();
        assert_eq!(err.code(), "PLG-ERR-CONTRACT-001");
    }

    #[test]
    fn test_host_re_exports_count_as_imports() {
        let named = "export { useState } from \"react\";\n";
        let err = check_output_contract(named, "hooks.js", &react(), false).unwrap_err();
        assert_eq!(err.code(), "PLG-ERR-CONTRACT-001");

        let star = "export * from \"react\";\n";
        let err = check_output_contract(star, "hooks.js", &react(), false).unwrap_err();
        assert!(err.to_string().contains("\"react\""), "got: {}", err);

        let other = "export * from \"./util\";\n";
        let surface = check_output_contract(other, "hooks.js", &react(), false).unwrap();
        assert_eq!(surface.imports, vec!["./util"]);
    }

    #[test]
    fn test_type_only_re_export_is_not_loaded() {
        let code = "export type { FC } from \"react\";\nexport default function App() {}\n";
        let surface = check_output_contract(code, "App.tsx", &react(), true).unwrap();
        assert!(surface.imports.is_empty());
    }

    #[test]
    fn test_entry_must_export_one_value() {
        let none = check_output_contract("const a = 1;", "App.jsx", &react(), true).unwrap_err();
        assert_eq!(none.code(), "PLG-ERR-CONTRACT-002");

        let two = "export const a = 1;\nexport default a;\n";
        let err = check_output_contract(two, "App.jsx", &react(), true).unwrap_err();
        assert!(
            err.to_string().contains("[a, default]"),
            "should list exports, got: {}",
            err
        );
    }

    #[test]
    fn test_non_entry_may_export_anything() {
        let code = "export const a = 1;\nexport function b() {}\n";
        let surface = check_output_contract(code, "util.js", &react(), false).unwrap();
        assert_eq!(surface.exports, vec!["a", "b"]);
    }

    #[test]
    fn test_type_exports_are_not_values() {
        let code = "export type Props = { a: string };\nexport default function App() {}\n";
        let surface = check_output_contract(code, "App.tsx", &react(), true).unwrap();
        assert_eq!(surface.exports, vec!["default"]);
    }
}
