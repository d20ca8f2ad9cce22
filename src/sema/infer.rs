//! Expression typing.
//!
//! The resolver drives inference: typing a call means resolving it, and
//! resolving a call means typing its arguments and the chosen def's body.
//! Everything here consults only in-memory AST and type data; nothing
//! suspends or blocks.

use std::collections::HashMap;

use crate::ast::Node;
use crate::types::TypeId;

use super::defs::DefId;
use super::errors::ResolveError;
use super::resolver::Resolver;

/// Typing environment for one body: local bindings, the receiver type, and
/// the def currently being instantiated (if any).
#[derive(Clone, Debug)]
pub struct Env {
    pub locals: HashMap<String, TypeId>,
    pub self_type: TypeId,
    pub current_def: Option<CurrentDef>,
}

/// The def whose body is being typed.
#[derive(Clone, Debug)]
pub struct CurrentDef {
    pub def_id: DefId,
    /// Type the def was declared on; super-lookup starts above it.
    pub owner: TypeId,
    /// Declared return type, resolved under the instantiation's
    /// substitutions. Primitive bodies type as this.
    pub return_type: Option<TypeId>,
}

impl Env {
    #[must_use]
    pub fn with_self(self_type: TypeId) -> Self {
        Self {
            locals: HashMap::new(),
            self_type,
            current_def: None,
        }
    }
}

impl Resolver<'_> {
    /// Type an expression, resolving any calls it contains.
    ///
    /// # Errors
    /// Returns a [`ResolveError`] for an undefined local, a tuple index out
    /// of bounds, or any call-resolution failure inside the expression.
    pub fn infer(&mut self, node: &mut Node, env: &mut Env) -> Result<TypeId, ResolveError> {
        let b = *self.ctx.types.builtins();
        match node {
            Node::Nop | Node::NilLiteral(_) | Node::Def(_) => Ok(b.nil),
            Node::BoolLiteral(_) => Ok(b.bool_),
            Node::NumberLiteral(literal) => Ok(match literal.kind {
                crate::ast::NumberKind::Int32 => b.int32,
                crate::ast::NumberKind::Int64 => b.int64,
                crate::ast::NumberKind::Float64 => b.float64,
            }),
            Node::CharLiteral(_) => Ok(b.char_),
            Node::StringLiteral(_) => Ok(b.string),
            Node::SymbolLiteral(_) => Ok(b.symbol),
            Node::TupleLiteral(tuple) => {
                let mut elements = Vec::with_capacity(tuple.elements.len());
                for element in &mut tuple.elements {
                    elements.push(self.infer(element, env)?);
                }
                Ok(self.ctx.types.tuple_of(elements))
            }
            Node::Var(var) => {
                env.locals
                    .get(&var.name)
                    .copied()
                    .ok_or(ResolveError::UndefinedLocal {
                        name: var.name.clone(),
                        span: var.span,
                    })
            }
            Node::Assign(assign) => {
                let ty = self.infer(&mut assign.value, env)?;
                env.locals.insert(assign.name.clone(), ty);
                Ok(ty)
            }
            Node::Expressions(sequence) => {
                let mut last = b.nil;
                for child in &mut sequence.nodes {
                    last = self.infer(child, env)?;
                }
                Ok(last)
            }
            Node::If(if_node) => {
                self.infer(&mut if_node.condition, env)?;
                let then_ty = self.infer(&mut if_node.then_branch, env)?;
                let else_ty = match &mut if_node.else_branch {
                    Some(else_branch) => self.infer(else_branch, env)?,
                    None => b.nil,
                };
                Ok(self.ctx.types.union_of(vec![then_ty, else_ty]))
            }
            Node::TupleIndex(index) => {
                let receiver_ty = self.infer(&mut index.receiver, env)?;
                let Some(elements) = self
                    .ctx
                    .types
                    .tuple_elements(receiver_ty)
                    .map(<[TypeId]>::to_vec)
                else {
                    return Err(ResolveError::Internal {
                        message: format!(
                            "tuple index on non-tuple {}",
                            self.ctx.types.display(receiver_ty)
                        ),
                        span: index.span,
                    });
                };
                elements.get(index.index).copied().ok_or_else(|| {
                    ResolveError::TupleIndexOutOfBounds {
                        index: index.index,
                        tuple: self.ctx.types.display(receiver_ty),
                        span: index.span,
                    }
                })
            }
            Node::Splat(splat) => self.infer(&mut splat.expression, env),
            Node::Out(out) => self.infer(&mut out.expression, env),
            Node::Call(call) => self.resolve_call(call, env),
            Node::Super(super_node) => self.resolve_super(super_node, env),
            Node::Primitive(primitive) => env
                .current_def
                .as_ref()
                .and_then(|current| current.return_type)
                .ok_or_else(|| ResolveError::Internal {
                    message: format!(
                        "primitive '{}' has no declared return type",
                        primitive.name
                    ),
                    span: primitive.span,
                }),
        }
    }
}
