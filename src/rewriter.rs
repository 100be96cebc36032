//! Global Reference Rewriter
//!
//! One mutable traversal per file. On entering the program it elides host
//! imports (filling the rewrite table); it then lowers markup as it meets it
//! and redirects every free reference to an elided binding onto the
//! binding's host path.
//!
//! INVARIANTS:
//! - A reference is rewritten only when no enclosing scope re-declares it.
//! - A chain already spelled as its target (`Host.Lib.x` for `Host.Lib`) is
//!   left alone, so running the pass twice changes nothing.
//! - `Lib._x` on a rewrite target is never touched (internal-prefix guard).
//! - An emitted host path must resolve to the global: if a local binding
//!   hides its root at the point of use, the file fails instead.

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_ast_visit::walk_mut::{
    walk_arrow_function_expression, walk_block_statement, walk_catch_clause, walk_class,
    walk_computed_member_expression, walk_expression, walk_for_in_statement,
    walk_for_of_statement, walk_for_statement, walk_function, walk_import_expression,
    walk_object_property, walk_program, walk_static_block, walk_static_member_expression,
    walk_switch_cases,
};
use oxc_ast_visit::VisitMut;
use oxc_span::SPAN;
use oxc_syntax::scope::ScopeFlags;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::config::{HostBindingMap, HostPath, TransformOptions};
use crate::context::TransformContext;
use crate::elision::elide_host_imports;
use crate::error::CompileError;
use crate::jsx_lowerer::JsxLowerer;
use crate::paths::{
    host_path_expression, host_path_jsx_name, host_path_jsx_object, jsx_member_chain,
    member_chain,
};
use crate::scope::{
    collect_pattern_names, declared_names, function_scope_names, module_scope_names,
    static_block_names, switch_scope_names, ScopeStack,
};

pub struct HostGlobalRewriter<'a, 'c> {
    ast: AstBuilder<'a>,
    ctx: &'c mut TransformContext,
    bindings: &'c HostBindingMap,
    internal_prefix: &'c str,
    lowerer: Option<JsxLowerer<'a>>,
    scopes: ScopeStack,
}

impl<'a, 'c> HostGlobalRewriter<'a, 'c> {
    pub fn new(
        allocator: &'a Allocator,
        ctx: &'c mut TransformContext,
        options: &'c TransformOptions,
    ) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            ctx,
            bindings: &options.host_bindings,
            internal_prefix: options.internal_prefix.as_str(),
            lowerer: options
                .lowering
                .clone()
                .map(|targets| JsxLowerer::new(allocator, targets)),
            scopes: ScopeStack::default(),
        }
    }

    /// Folds lowering statistics into the report.
    pub fn finish(self) {
        if let Some(lowerer) = self.lowerer {
            self.ctx.report.lowered_elements += lowerer.lowered;
        }
    }

    /// The host path for a free reference to `name`, if it is a rewrite target.
    fn target_for(&self, name: &str) -> Option<HostPath> {
        if self.scopes.shadows(name) {
            return None;
        }
        self.ctx.table.get(name).cloned()
    }

    fn is_internal(&self, property: &str) -> bool {
        !self.internal_prefix.is_empty() && property.starts_with(self.internal_prefix)
    }

    /// Fails the file when a local binding in scope hides `path`'s root.
    fn check_root(&mut self, reference: &str, path: &HostPath) {
        if self.scopes.shadows(path.root()) {
            self.ctx.errors.push(CompileError::HostRootShadowed {
                file: self.ctx.file_path.clone(),
                reference: reference.to_string(),
                root: path.root().to_string(),
            });
        }
    }

    fn unqualifiable(&mut self, reference: &str, reason: &str) {
        self.ctx.errors.push(CompileError::UnqualifiableReference {
            file: self.ctx.file_path.clone(),
            reference: reference.to_string(),
            reason: reason.to_string(),
        });
    }

    fn record_rewrite(&mut self, local: &str, target: &HostPath) {
        self.check_root(local, target);
        self.ctx.report.rewritten_references += 1;
        debug!(
            file = %self.ctx.file_path,
            local,
            target = %target,
            "rewrote host reference"
        );
    }

    fn record_internal(&mut self, access: String) {
        warn!(
            file = %self.ctx.file_path,
            access = %access,
            "internal member left unqualified"
        );
        self.ctx.report.retained_internal.push(access);
    }

    /// Swaps the innermost object of a static chain for `replacement`.
    fn replace_chain_root(member: &mut StaticMemberExpression<'a>, replacement: Expression<'a>) {
        if let Expression::StaticMemberExpression(inner) = &mut member.object {
            Self::replace_chain_root(inner, replacement);
        } else {
            member.object = replacement;
        }
    }

    /// Swaps the innermost object of a member tag for `replacement`.
    fn replace_jsx_root(
        member: &mut JSXMemberExpression<'a>,
        replacement: JSXMemberExpressionObject<'a>,
    ) {
        if let JSXMemberExpressionObject::MemberExpression(inner) = &mut member.object {
            Self::replace_jsx_root(inner, replacement);
        } else {
            member.object = replacement;
        }
    }

    fn with_scope(&mut self, names: HashSet<String>, f: impl FnOnce(&mut Self)) {
        self.scopes.push(names);
        f(self);
        self.scopes.pop();
    }

    /// Lowered markup calls the element and fragment constructors by path, so
    /// their roots must be visible here too.
    fn check_lowering_roots(&mut self) {
        let Some(lowerer) = &self.lowerer else {
            return;
        };
        let targets = lowerer.targets();
        let paths = [targets.element.clone(), targets.fragment.clone()];
        for path in &paths {
            self.check_root(&path.to_string(), path);
        }
    }

    /// `<Lib.Provider>` → `<Host.Lib.Provider>`, with the same guards as
    /// member expressions.
    fn rewrite_jsx_member(&mut self, member: &mut JSXMemberExpression<'a>) {
        let Some(chain) = jsx_member_chain(member)
            .map(|links| links.into_iter().map(str::to_string).collect::<Vec<_>>())
        else {
            return;
        };
        let Some(target) = self.target_for(&chain[0]) else {
            return;
        };

        let links: Vec<&str> = chain.iter().map(String::as_str).collect();
        if target.is_prefix_of(&links) {
            self.ctx.report.already_qualified += 1;
            return;
        }
        if self.is_internal(&chain[1]) {
            self.record_internal(format!("{}.{}", chain[0], chain[1]));
            return;
        }

        match host_path_jsx_object(&self.ast, &target) {
            Some(object) => {
                Self::replace_jsx_root(member, object);
                self.record_rewrite(&chain[0], &target);
            }
            None => self.unqualifiable(&chain[0], "the host path is not a valid tag name"),
        }
    }

    /// `export { Lib }` names a binding elision removed. The binding is
    /// re-declared from its host path right before the export.
    fn alias_exported_bindings(&mut self, program: &mut Program<'a>) {
        let mut aliased: HashSet<String> = HashSet::new();
        let statements = std::mem::replace(&mut program.body, self.ast.vec());
        let mut body = self.ast.vec_with_capacity(statements.len());

        for stmt in statements {
            if let Statement::ExportNamedDeclaration(export) = &stmt {
                let is_local = export.source.is_none() && !export.export_kind.is_type();
                let locals: Vec<String> = export
                    .specifiers
                    .iter()
                    .filter(|spec| is_local && !spec.export_kind.is_type())
                    .map(|spec| spec.local.name().to_string())
                    .collect();

                for local in locals {
                    let Some(target) = self.target_for(&local) else {
                        continue;
                    };
                    if !aliased.insert(local.clone()) {
                        continue;
                    }
                    body.push(self.alias_declaration(&local, &target));
                    self.record_rewrite(&local, &target);
                }
            }
            body.push(stmt);
        }

        program.body = body;
    }

    /// `const <local> = <host path>;`
    fn alias_declaration(&self, local: &str, target: &HostPath) -> Statement<'a> {
        let name = self.ast.allocator.alloc_str(local);
        let declarator = self.ast.variable_declarator(
            SPAN,
            VariableDeclarationKind::Const,
            self.ast.binding_pattern_binding_identifier(SPAN, name),
            None::<oxc_allocator::Box<'a, TSTypeAnnotation<'a>>>,
            Some(host_path_expression(&self.ast, target)),
            false,
        );
        Statement::VariableDeclaration(self.ast.alloc_variable_declaration(
            SPAN,
            VariableDeclarationKind::Const,
            self.ast.vec1(declarator),
            false,
        ))
    }
}

impl<'a, 'c> VisitMut<'a> for HostGlobalRewriter<'a, 'c> {
    fn visit_program(&mut self, program: &mut Program<'a>) {
        elide_host_imports(program, self.bindings, self.ctx);
        if self.ctx.table.is_empty() && self.lowerer.is_none() {
            return;
        }

        let names = module_scope_names(&program.body);
        self.with_scope(names, |this| {
            walk_program(this, program);
            if !this.ctx.table.is_empty() {
                this.alias_exported_bindings(program);
            }
        });
    }

    fn visit_expression(&mut self, expr: &mut Expression<'a>) {
        match expr {
            Expression::JSXElement(_) | Expression::JSXFragment(_) => {
                if self.lowerer.is_some() {
                    self.check_lowering_roots();
                }
                if let Some(lowerer) = self.lowerer.as_mut() {
                    lowerer.lower_node(expr);
                }
                // Embedded expressions are walked here, so markup nested in
                // callbacks is lowered under the callback's scope.
                walk_expression(self, expr);
            }
            Expression::Identifier(id) => {
                let name = id.name.to_string();
                if let Some(target) = self.target_for(&name) {
                    *expr = host_path_expression(&self.ast, &target);
                    self.record_rewrite(&name, &target);
                }
            }
            _ => walk_expression(self, expr),
        }
    }

    fn visit_static_member_expression(&mut self, member: &mut StaticMemberExpression<'a>) {
        let chain: Option<Vec<String>> =
            member_chain(member).map(|links| links.into_iter().map(str::to_string).collect());
        let Some(chain) = chain else {
            walk_static_member_expression(self, member);
            return;
        };

        // Pure identifier chain: only the root can be a reference.
        let Some(target) = self.target_for(&chain[0]) else {
            return;
        };

        let links: Vec<&str> = chain.iter().map(String::as_str).collect();
        if target.is_prefix_of(&links) {
            self.ctx.report.already_qualified += 1;
            return;
        }

        if self.is_internal(&chain[1]) {
            self.record_internal(format!("{}.{}", chain[0], chain[1]));
            return;
        }

        Self::replace_chain_root(member, host_path_expression(&self.ast, &target));
        self.record_rewrite(&chain[0], &target);
    }

    fn visit_computed_member_expression(&mut self, member: &mut ComputedMemberExpression<'a>) {
        if let (Expression::Identifier(id), Expression::StringLiteral(key)) =
            (&member.object, &member.expression)
        {
            if self.is_internal(key.value.as_str()) && self.target_for(id.name.as_str()).is_some()
            {
                let access = format!("{}[\"{}\"]", id.name, key.value);
                self.record_internal(access);
                return;
            }
        }
        walk_computed_member_expression(self, member);
    }

    fn visit_object_property(&mut self, prop: &mut ObjectProperty<'a>) {
        // `{ Lib }` must become `{ Lib: Host.Lib }`, not `{ Host.Lib }`.
        if prop.shorthand {
            if let Expression::Identifier(id) = &prop.value {
                if self.target_for(id.name.as_str()).is_some() {
                    prop.shorthand = false;
                }
            }
        }
        walk_object_property(self, prop);
    }

    fn visit_import_expression(&mut self, expr: &mut ImportExpression<'a>) {
        if let Expression::StringLiteral(source) = &expr.source {
            if self.bindings.contains(source.value.as_str()) {
                warn!(
                    file = %self.ctx.file_path,
                    specifier = source.value.as_str(),
                    "dynamic import of a host-shared module is not redirected"
                );
            }
        }
        walk_import_expression(self, expr);
    }

    /// Reached only when markup is kept: tags that name elided bindings are
    /// qualified in place.
    fn visit_jsx_element_name(&mut self, name: &mut JSXElementName<'a>) {
        match name {
            JSXElementName::IdentifierReference(id) => {
                let local = id.name.to_string();
                let Some(target) = self.target_for(&local) else {
                    return;
                };
                match host_path_jsx_name(&self.ast, &target) {
                    Some(qualified) => {
                        *name = qualified;
                        self.record_rewrite(&local, &target);
                    }
                    None => self.unqualifiable(&local, "the host path is not a valid tag name"),
                }
            }
            JSXElementName::MemberExpression(member) => self.rewrite_jsx_member(member),
            _ => {}
        }
    }

    fn visit_class(&mut self, class: &mut Class<'a>) {
        // A class expression's own name is bound inside its body only.
        let mut names = HashSet::new();
        if matches!(class.r#type, ClassType::ClassExpression) {
            if let Some(id) = &class.id {
                names.insert(id.name.to_string());
            }
        }
        self.with_scope(names, |this| walk_class(this, class));
    }

    fn visit_static_block(&mut self, block: &mut StaticBlock<'a>) {
        let names = static_block_names(block);
        self.with_scope(names, |this| walk_static_block(this, block));
    }

    fn visit_switch_statement(&mut self, stmt: &mut SwitchStatement<'a>) {
        self.visit_expression(&mut stmt.discriminant);
        let names = switch_scope_names(&stmt.cases);
        self.with_scope(names, |this| walk_switch_cases(this, &mut stmt.cases));
    }

    fn visit_function(&mut self, func: &mut Function<'a>, flags: ScopeFlags) {
        let mut names = function_scope_names(&func.params, func.body.as_deref());
        if !matches!(func.r#type, FunctionType::FunctionDeclaration) {
            if let Some(id) = &func.id {
                names.insert(id.name.to_string());
            }
        }
        self.with_scope(names, |this| walk_function(this, func, flags));
    }

    fn visit_arrow_function_expression(&mut self, arrow: &mut ArrowFunctionExpression<'a>) {
        let names = function_scope_names(&arrow.params, Some(&*arrow.body));
        self.with_scope(names, |this| walk_arrow_function_expression(this, arrow));
    }

    fn visit_block_statement(&mut self, block: &mut BlockStatement<'a>) {
        let names = declared_names(&block.body);
        self.with_scope(names, |this| walk_block_statement(this, block));
    }

    fn visit_catch_clause(&mut self, clause: &mut CatchClause<'a>) {
        let mut names = HashSet::new();
        if let Some(param) = &clause.param {
            collect_pattern_names(&param.pattern, &mut names);
        }
        self.with_scope(names, |this| walk_catch_clause(this, clause));
    }

    fn visit_for_statement(&mut self, stmt: &mut ForStatement<'a>) {
        let mut names = HashSet::new();
        if let Some(ForStatementInit::VariableDeclaration(var_decl)) = &stmt.init {
            for decl in &var_decl.declarations {
                collect_pattern_names(&decl.id, &mut names);
            }
        }
        self.with_scope(names, |this| walk_for_statement(this, stmt));
    }

    fn visit_for_in_statement(&mut self, stmt: &mut ForInStatement<'a>) {
        let mut names = HashSet::new();
        if let ForStatementLeft::VariableDeclaration(var_decl) = &stmt.left {
            for decl in &var_decl.declarations {
                collect_pattern_names(&decl.id, &mut names);
            }
        }
        self.with_scope(names, |this| walk_for_in_statement(this, stmt));
    }

    fn visit_for_of_statement(&mut self, stmt: &mut ForOfStatement<'a>) {
        let mut names = HashSet::new();
        if let ForStatementLeft::VariableDeclaration(var_decl) = &stmt.left {
            for decl in &var_decl.declarations {
                collect_pattern_names(&decl.id, &mut names);
            }
        }
        self.with_scope(names, |this| walk_for_of_statement(this, stmt));
    }
}
