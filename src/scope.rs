//! Lexical scope tracking for the reference rewriter.
//!
//! Only names that collide with elided imports matter, so scopes hold plain
//! name sets rather than full symbol tables.

use oxc_ast::ast::*;
use oxc_ast_visit::Visit;
use oxc_syntax::scope::ScopeFlags;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<HashSet<String>>,
}

impl ScopeStack {
    pub fn push(&mut self, names: HashSet<String>) {
        self.scopes.push(names);
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// True when an enclosing scope declares `name`, hiding any import.
    pub fn shadows(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|s| s.contains(name))
    }
}

pub fn collect_pattern_names(pattern: &BindingPattern, names: &mut HashSet<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => {
            names.insert(id.name.to_string());
        }
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                collect_pattern_names(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                collect_pattern_names(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for elem in arr.elements.iter().flatten() {
                collect_pattern_names(elem, names);
            }
            if let Some(rest) = &arr.rest {
                collect_pattern_names(&rest.argument, names);
            }
        }
        BindingPattern::AssignmentPattern(assign) => {
            collect_pattern_names(&assign.left, names);
        }
    }
}

pub fn collect_param_names(params: &FormalParameters, names: &mut HashSet<String>) {
    for param in &params.items {
        collect_pattern_names(&param.pattern, names);
    }
}

fn collect_declaration_names(declaration: &Declaration, names: &mut HashSet<String>) {
    match declaration {
        Declaration::VariableDeclaration(decl) => {
            for d in &decl.declarations {
                collect_pattern_names(&d.id, names);
            }
        }
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                names.insert(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                names.insert(id.name.to_string());
            }
        }
        _ => {}
    }
}

/// Names declared directly in a statement list: `let`, `const`, `var`,
/// function and class declarations, exported or not.
pub fn declared_names(statements: &[Statement]) -> HashSet<String> {
    let mut names = HashSet::new();
    for stmt in statements {
        if let Some(declaration) = stmt.as_declaration() {
            collect_declaration_names(declaration, &mut names);
            continue;
        }
        match stmt {
            Statement::ExportNamedDeclaration(export) => {
                if let Some(declaration) = &export.declaration {
                    collect_declaration_names(declaration, &mut names);
                }
            }
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                    if let Some(id) = &func.id {
                        names.insert(id.name.to_string());
                    }
                }
                ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                    if let Some(id) = &class.id {
                        names.insert(id.name.to_string());
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
    names
}

/// Everything bound at module level once host imports are gone: declarations,
/// hoisted `var`s and the locals of the imports that remain.
pub fn module_scope_names(body: &[Statement]) -> HashSet<String> {
    let mut names = declared_names(body);
    names.extend(HoistedNameCollector::collect(body));
    for stmt in body {
        let Statement::ImportDeclaration(import) = stmt else {
            continue;
        };
        for specifier in import.specifiers.iter().flatten() {
            names.insert(specifier.local().name.to_string());
        }
    }
    names
}

/// Lexical declarations of every case share the switch body's scope.
pub fn switch_scope_names(cases: &[SwitchCase]) -> HashSet<String> {
    cases
        .iter()
        .flat_map(|case| declared_names(&case.consequent))
        .collect()
}

/// A class `static {}` block scopes its own `var`s as well as its lexical
/// declarations.
pub fn static_block_names(block: &StaticBlock) -> HashSet<String> {
    let mut names = declared_names(&block.body);
    names.extend(HoistedNameCollector::collect(&block.body));
    names
}

/// Collects `var` and function declarations hoisted to a function scope,
/// without descending into nested functions.
#[derive(Default)]
pub struct HoistedNameCollector {
    pub names: HashSet<String>,
}

impl HoistedNameCollector {
    pub fn collect(statements: &[Statement]) -> HashSet<String> {
        let mut collector = HoistedNameCollector::default();
        for stmt in statements {
            collector.visit_statement(stmt);
        }
        collector.names
    }
}

impl<'a> Visit<'a> for HoistedNameCollector {
    fn visit_variable_declaration(&mut self, decl: &VariableDeclaration<'a>) {
        if decl.kind == VariableDeclarationKind::Var {
            for d in &decl.declarations {
                collect_pattern_names(&d.id, &mut self.names);
            }
        }
        oxc_ast_visit::walk::walk_variable_declaration(self, decl);
    }

    fn visit_function(&mut self, func: &Function<'a>, _flags: ScopeFlags) {
        if matches!(func.r#type, FunctionType::FunctionDeclaration) {
            if let Some(id) = &func.id {
                self.names.insert(id.name.to_string());
            }
        }
    }

    fn visit_arrow_function_expression(&mut self, _func: &ArrowFunctionExpression<'a>) {}

    fn visit_class(&mut self, _class: &Class<'a>) {}
}

/// Everything a function body binds locally: parameters, hoisted
/// declarations and its top-level lexical declarations.
pub fn function_scope_names(
    params: &FormalParameters,
    body: Option<&FunctionBody>,
) -> HashSet<String> {
    let mut names = HashSet::new();
    collect_param_names(params, &mut names);
    if let Some(body) = body {
        names.extend(HoistedNameCollector::collect(&body.statements));
        names.extend(declared_names(&body.statements));
    }
    names
}
