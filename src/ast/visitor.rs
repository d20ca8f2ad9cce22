//! Pre-order traversal over the AST.
//!
//! Passes that need to observe nodes without resolving them (declaration
//! collection, diagnostics sweeps) implement [`Visitor`] and call [`walk`].
//! The overload matcher itself does not use a visitor; it pattern-matches on
//! calls directly.

use super::nodes::Node;

/// Pre-order AST visitor. `visit` returns whether to descend into children.
pub trait Visitor {
    fn visit(&mut self, node: &Node) -> bool;
}

/// Drive `visitor` over `node` and its children in pre-order.
pub fn walk<V: Visitor>(visitor: &mut V, node: &Node) {
    if !visitor.visit(node) {
        return;
    }
    match node {
        Node::Nop
        | Node::NilLiteral(_)
        | Node::BoolLiteral(_)
        | Node::NumberLiteral(_)
        | Node::CharLiteral(_)
        | Node::StringLiteral(_)
        | Node::SymbolLiteral(_)
        | Node::Var(_)
        | Node::Primitive(_) => {}
        Node::TupleLiteral(tuple) => {
            for element in &tuple.elements {
                walk(visitor, element);
            }
        }
        Node::Assign(assign) => walk(visitor, &assign.value),
        Node::Expressions(expressions) => {
            for child in &expressions.nodes {
                walk(visitor, child);
            }
        }
        Node::If(if_node) => {
            walk(visitor, &if_node.condition);
            walk(visitor, &if_node.then_branch);
            if let Some(else_branch) = &if_node.else_branch {
                walk(visitor, else_branch);
            }
        }
        Node::TupleIndex(index) => walk(visitor, &index.receiver),
        Node::Splat(splat) => walk(visitor, &splat.expression),
        Node::Out(out) => walk(visitor, &out.expression),
        Node::Call(call) => {
            if let Some(receiver) = &call.receiver {
                walk(visitor, receiver);
            }
            for arg in &call.args {
                walk(visitor, arg);
            }
            for named in &call.named_args {
                walk(visitor, &named.value);
            }
            if let Some(block) = &call.block {
                if let Some(body) = &block.body {
                    walk(visitor, body);
                }
            }
        }
        Node::Def(def) => {
            for arg in &def.args {
                if let Some(default_value) = &arg.default_value {
                    walk(visitor, default_value);
                }
            }
            walk(visitor, &def.body);
        }
        Node::Super(super_node) => {
            for arg in &super_node.args {
                walk(visitor, arg);
            }
        }
    }
}
