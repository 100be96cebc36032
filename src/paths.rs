//! AST construction and inspection for host property paths.

use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_span::SPAN;

use crate::config::{is_identifier_name, HostPath};
use crate::jsx_lowerer::is_intrinsic_tag;

/// Builds `root.a.b` for a host path. Members that are not identifiers
/// (string export names) are emitted as computed access.
pub fn host_path_expression<'a>(ast: &AstBuilder<'a>, path: &HostPath) -> Expression<'a> {
    let root = ast.allocator.alloc_str(path.root());
    let mut expr = ast.expression_identifier(SPAN, root);

    for segment in &path.segments()[1..] {
        let name = ast.allocator.alloc_str(segment);
        expr = if is_identifier_name(segment) {
            Expression::from(ast.member_expression_static(
                SPAN,
                expr,
                ast.identifier_name(SPAN, name),
                false,
            ))
        } else {
            Expression::from(ast.member_expression_computed(
                SPAN,
                expr,
                ast.expression_string_literal(SPAN, name, None),
                false,
            ))
        };
    }

    expr
}

/// The names of a pure static chain, root first: `a.b.c` → `[a, b, c]`.
/// Anything other than identifiers and static members yields `None`.
pub fn static_chain<'b>(expr: &'b Expression<'_>) -> Option<Vec<&'b str>> {
    match expr {
        Expression::Identifier(id) => Some(vec![id.name.as_str()]),
        Expression::StaticMemberExpression(member) => member_chain(member),
        _ => None,
    }
}

pub fn member_chain<'b>(member: &'b StaticMemberExpression<'_>) -> Option<Vec<&'b str>> {
    let mut chain = static_chain(&member.object)?;
    chain.push(member.property.name.as_str());
    Some(chain)
}

fn jsx_object_from<'a>(
    ast: &AstBuilder<'a>,
    segments: &[String],
) -> Option<JSXMemberExpressionObject<'a>> {
    let (root, members) = segments.split_first()?;
    if !segments.iter().all(|s| is_identifier_name(s)) {
        return None;
    }
    let mut object =
        ast.jsx_member_expression_object_identifier_reference(SPAN, ast.allocator.alloc_str(root));
    for member in members {
        let property = ast.jsx_identifier(SPAN, ast.allocator.alloc_str(member));
        object = ast.jsx_member_expression_object_member_expression(SPAN, object, property);
    }
    Some(object)
}

/// `root.a.b` as a markup member object, for qualifying member tags.
/// `None` when a segment cannot appear in a markup name.
pub fn host_path_jsx_object<'a>(
    ast: &AstBuilder<'a>,
    path: &HostPath,
) -> Option<JSXMemberExpressionObject<'a>> {
    jsx_object_from(ast, path.segments())
}

/// A host path as a component tag name. A single lowercase segment would
/// read back as a host element, so it has no tag form.
pub fn host_path_jsx_name<'a>(ast: &AstBuilder<'a>, path: &HostPath) -> Option<JSXElementName<'a>> {
    let (last, parents) = path.segments().split_last()?;
    if !is_identifier_name(last) {
        return None;
    }
    let name = ast.allocator.alloc_str(last);
    if parents.is_empty() {
        if is_intrinsic_tag(last) {
            return None;
        }
        return Some(ast.jsx_element_name_identifier_reference(SPAN, name));
    }

    let object = jsx_object_from(ast, parents)?;
    Some(ast.jsx_element_name_member_expression(SPAN, object, ast.jsx_identifier(SPAN, name)))
}

/// The names of a member tag, root first: `<A.B.C>` → `[A, B, C]`.
/// `None` when the root is `this`.
pub fn jsx_member_chain<'b>(member: &'b JSXMemberExpression<'_>) -> Option<Vec<&'b str>> {
    let mut chain = match &member.object {
        JSXMemberExpressionObject::IdentifierReference(id) => vec![id.name.as_str()],
        JSXMemberExpressionObject::MemberExpression(inner) => jsx_member_chain(inner)?,
        JSXMemberExpressionObject::ThisExpression(_) => return None,
    };
    chain.push(member.property.name.as_str());
    Some(chain)
}
