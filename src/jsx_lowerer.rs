//! Markup Lowering
//!
//! Turns markup expressions into calls on the host's element constructor
//! (classic runtime): `<div id="a">hi</div>` becomes
//! `window.React.createElement("div", { id: "a" }, "hi")`.
//!
//! The constructor and fragment are emitted as fully-qualified host paths, so
//! lowered output never needs an import of the runtime module.

use oxc_allocator::{Allocator, Box as oxc_box, CloneIn};
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_span::SPAN;

use crate::config::{is_identifier_name, ElementLowering};
use crate::paths::host_path_expression;

pub struct JsxLowerer<'a> {
    pub ast: AstBuilder<'a>,
    targets: ElementLowering,
    /// Elements and fragments lowered so far.
    pub lowered: u32,
}

impl<'a> JsxLowerer<'a> {
    pub fn new(allocator: &'a Allocator, targets: ElementLowering) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            targets,
            lowered: 0,
        }
    }

    /// Lowers `expr` if it is markup. Child elements are lowered in place;
    /// embedded expressions are copied as written, so markup inside them is
    /// left for whoever walks the result.
    pub fn lower_node(&mut self, expr: &mut Expression<'a>) {
        let lowered = match expr {
            Expression::JSXElement(element) => self.lower_jsx_element(element),
            Expression::JSXFragment(fragment) => self.lower_jsx_fragment(fragment),
            _ => return,
        };
        *expr = lowered;
    }

    pub fn targets(&self) -> &ElementLowering {
        &self.targets
    }

    fn alloc(&self, s: &str) -> &'a str {
        self.ast.allocator.alloc_str(s)
    }

    fn string_literal(&self, s: &str) -> Expression<'a> {
        self.ast.expression_string_literal(SPAN, self.alloc(s), None)
    }

    fn null(&self) -> Expression<'a> {
        self.ast.expression_identifier(SPAN, "null")
    }

    fn lower_jsx_element(&mut self, element: &JSXElement<'a>) -> Expression<'a> {
        let tag = self.lower_tag_name(&element.opening_element.name);
        let props = self.lower_attributes(&element.opening_element.attributes);
        let children = self.lower_children(&element.children);
        self.construct(tag, props, children)
    }

    fn lower_jsx_fragment(&mut self, fragment: &JSXFragment<'a>) -> Expression<'a> {
        let tag = host_path_expression(&self.ast, &self.targets.fragment);
        let props = self.null();
        let children = self.lower_children(&fragment.children);
        self.construct(tag, props, children)
    }

    /// `element(tag, props, ...children)`
    fn construct(
        &mut self,
        tag: Expression<'a>,
        props: Expression<'a>,
        children: Vec<Expression<'a>>,
    ) -> Expression<'a> {
        self.lowered += 1;

        let mut args = self.ast.vec();
        args.push(Argument::from(tag));
        args.push(Argument::from(props));
        for child in children {
            args.push(Argument::from(child));
        }

        let callee = host_path_expression(&self.ast, &self.targets.element);
        self.ast.expression_call(
            SPAN,
            callee,
            None::<oxc_box<TSTypeParameterInstantiation>>,
            args,
            false,
        )
    }

    fn lower_tag_name(&self, name: &JSXElementName<'a>) -> Expression<'a> {
        match name {
            JSXElementName::Identifier(id) => {
                if is_intrinsic_tag(id.name.as_str()) {
                    self.string_literal(id.name.as_str())
                } else {
                    self.ast.expression_identifier(SPAN, self.alloc(id.name.as_str()))
                }
            }
            JSXElementName::IdentifierReference(id) => {
                if is_intrinsic_tag(id.name.as_str()) {
                    self.string_literal(id.name.as_str())
                } else {
                    self.ast.expression_identifier(SPAN, self.alloc(id.name.as_str()))
                }
            }
            JSXElementName::NamespacedName(ns) => {
                self.string_literal(&format!("{}:{}", ns.namespace.name, ns.name.name))
            }
            JSXElementName::MemberExpression(member) => self.lower_member_tag(member),
            JSXElementName::ThisExpression(_) => self.ast.expression_this(SPAN),
        }
    }

    fn lower_member_tag(&self, member: &JSXMemberExpression<'a>) -> Expression<'a> {
        let object = match &member.object {
            JSXMemberExpressionObject::IdentifierReference(id) => {
                self.ast.expression_identifier(SPAN, self.alloc(id.name.as_str()))
            }
            JSXMemberExpressionObject::MemberExpression(inner) => self.lower_member_tag(inner),
            _ => self.ast.expression_this(SPAN),
        };
        Expression::from(self.ast.member_expression_static(
            SPAN,
            object,
            self.ast
                .identifier_name(SPAN, self.alloc(member.property.name.as_str())),
            false,
        ))
    }

    fn property_key(&self, name: &str) -> PropertyKey<'a> {
        if is_identifier_name(name) {
            PropertyKey::StaticIdentifier(
                self.ast.alloc(self.ast.identifier_name(SPAN, self.alloc(name))),
            )
        } else {
            PropertyKey::StringLiteral(
                self.ast
                    .alloc(self.ast.string_literal(SPAN, self.alloc(name), None)),
            )
        }
    }

    fn lower_attributes(&mut self, attributes: &[JSXAttributeItem<'a>]) -> Expression<'a> {
        if attributes.is_empty() {
            return self.null();
        }

        let mut props = self.ast.vec();
        for item in attributes {
            match item {
                JSXAttributeItem::Attribute(attr) => {
                    let name = match &attr.name {
                        JSXAttributeName::Identifier(id) => id.name.to_string(),
                        JSXAttributeName::NamespacedName(ns) => {
                            format!("{}:{}", ns.namespace.name, ns.name.name)
                        }
                    };
                    let key = self.property_key(&name);

                    let value = match &attr.value {
                        Some(JSXAttributeValue::StringLiteral(s)) => {
                            self.string_literal(&decode_entities(s.value.as_str()))
                        }
                        Some(JSXAttributeValue::ExpressionContainer(container)) => self
                            .lower_jsx_expression(&container.expression)
                            .unwrap_or_else(|| self.ast.expression_identifier(SPAN, "undefined")),
                        Some(JSXAttributeValue::Element(el)) => self.lower_jsx_element(el),
                        Some(JSXAttributeValue::Fragment(frag)) => self.lower_jsx_fragment(frag),
                        None => self.ast.expression_boolean_literal(SPAN, true),
                    };

                    props.push(self.ast.object_property_kind_object_property(
                        SPAN,
                        PropertyKind::Init,
                        key,
                        value,
                        false,
                        false,
                        false,
                    ));
                }
                JSXAttributeItem::SpreadAttribute(spread) => {
                    let spread_expr = spread.argument.clone_in(self.ast.allocator);
                    props.push(self.ast.object_property_kind_spread_property(SPAN, spread_expr));
                }
            }
        }

        self.ast.expression_object(SPAN, props)
    }

    fn lower_children(&mut self, children: &[JSXChild<'a>]) -> Vec<Expression<'a>> {
        let mut lowered = Vec::new();
        for child in children {
            match child {
                JSXChild::Text(t) => {
                    if let Some(text) = clean_jsx_text(t.value.as_str()) {
                        lowered.push(self.string_literal(&text));
                    }
                }
                JSXChild::Element(el) => lowered.push(self.lower_jsx_element(el)),
                JSXChild::Fragment(frag) => lowered.push(self.lower_jsx_fragment(frag)),
                JSXChild::ExpressionContainer(container) => {
                    if let Some(e) = self.lower_jsx_expression(&container.expression) {
                        lowered.push(e);
                    }
                }
                JSXChild::Spread(spread) => {
                    lowered.push(spread.expression.clone_in(self.ast.allocator));
                }
            }
        }
        lowered
    }

    /// `None` for an empty container (`{}` or `{/* comment */}`).
    fn lower_jsx_expression(&self, jsx_expr: &JSXExpression<'a>) -> Option<Expression<'a>> {
        Some(jsx_expr.as_expression()?.clone_in(self.ast.allocator))
    }
}

/// Host elements are passed by name: lowercase tags and custom elements.
pub fn is_intrinsic_tag(name: &str) -> bool {
    name.contains('-') || name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
}

/// Collapses markup text the way the classic runtime expects: lines are
/// trimmed, blank lines dropped, and the rest joined with single spaces.
/// Returns `None` when nothing is left.
pub fn clean_jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'));

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut trimmed = line.replace('\t', " ");
        if i != 0 {
            trimmed = trimmed.trim_start_matches(' ').to_string();
        }
        if i != lines.len() - 1 {
            trimmed = trimmed.trim_end_matches(' ').to_string();
        }
        if trimmed.is_empty() {
            continue;
        }
        if Some(i) != last_non_empty {
            trimmed.push(' ');
        }
        out.push_str(&trimmed);
    }

    if out.is_empty() {
        None
    } else {
        Some(decode_entities(&out))
    }
}

/// Decodes the character references that commonly appear in markup text.
/// Unknown references are kept verbatim.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate.find(';').and_then(|end| {
            let name = &candidate[1..end];
            decode_reference(name).map(|c| (c, end + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = name.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "copy" => Some('\u{a9}'),
        "hellip" => Some('\u{2026}'),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        _ => None,
    }
}
