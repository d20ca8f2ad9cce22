//! Argument preprocessing: call-site splat expansion and named-argument
//! validation.
//!
//! The preprocessor turns a call's positional arguments into the *effective
//! argument vector*: a flat sequence of typed expressions with every splat
//! expanded in place. Expansion synthesizes one tuple-element read per
//! absorbed element so downstream consumers keep index-accessor semantics
//! into the original operand.

use crate::ast::{NamedArgument, Node, TupleIndex};
use crate::diagnostics::Span;
use crate::types::TypeId;

use super::errors::ResolveError;
use super::infer::Env;
use super::resolver::Resolver;

/// One entry of the effective argument vector.
#[derive(Clone, Debug)]
pub struct EffectiveArg {
    pub node: Node,
    pub ty: TypeId,
    pub origin: ArgOrigin,
}

/// Where an effective argument came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgOrigin {
    /// Written directly at position `index` of the call.
    Direct { index: usize },
    /// Element `element` of the splat written at position `index`.
    SplatExpansion { index: usize, element: usize },
}

/// A named argument with its value already typed.
#[derive(Clone, Debug)]
pub struct TypedNamedArg {
    pub name: String,
    pub node: Node,
    pub ty: TypeId,
    pub span: Option<Span>,
}

impl Resolver<'_> {
    /// Build the effective argument vector plus the typed named arguments.
    ///
    /// Splat operands must be tuple-typed; unions are rejected outright
    /// (disjunctive arity resolution is unsupported). Named arguments are
    /// checked for duplicate keys here; mapping them onto formals is the
    /// matcher's concern.
    pub(crate) fn effective_args(
        &mut self,
        args: &[Node],
        named_args: &[NamedArgument],
        env: &mut Env,
    ) -> Result<(Vec<EffectiveArg>, Vec<TypedNamedArg>), ResolveError> {
        let mut effective = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            if let Node::Splat(splat) = arg {
                let mut operand = (*splat.expression).clone();
                let ty = self.infer(&mut operand, env)?;
                let canonical = self.ctx.types.remove_alias(ty);
                if self.ctx.types.is_union(canonical) {
                    let has_tuple_member = self
                        .ctx
                        .types
                        .union_members(canonical)
                        .unwrap_or(&[])
                        .iter()
                        .any(|member| self.ctx.types.tuple_elements(*member).is_some());
                    let type_name = self.ctx.types.display(canonical);
                    let span = splat.span.or(arg.span());
                    return Err(if has_tuple_member {
                        ResolveError::SplatUnion { type_name, span }
                    } else {
                        ResolveError::NotATuple {
                            slot: index,
                            type_name,
                            span,
                        }
                    });
                }
                let Some(elements) = self
                    .ctx
                    .types
                    .tuple_elements(canonical)
                    .map(<[TypeId]>::to_vec)
                else {
                    return Err(ResolveError::NotATuple {
                        slot: index,
                        type_name: self.ctx.types.display(canonical),
                        span: splat.span.or(arg.span()),
                    });
                };
                effective.extend(expand_splat(&operand, index, &elements));
            } else {
                let mut node = arg.clone();
                let ty = self.infer(&mut node, env)?;
                effective.push(EffectiveArg {
                    node,
                    ty,
                    origin: ArgOrigin::Direct { index },
                });
            }
        }

        let mut named = Vec::with_capacity(named_args.len());
        for (index, named_arg) in named_args.iter().enumerate() {
            if named_args[..index]
                .iter()
                .any(|prior| prior.name == named_arg.name)
            {
                return Err(ResolveError::NamedArgDuplicate {
                    name: named_arg.name.clone(),
                    span: named_arg.span,
                });
            }
            let mut node = (*named_arg.value).clone();
            let ty = self.infer(&mut node, env)?;
            named.push(TypedNamedArg {
                name: named_arg.name.clone(),
                node,
                ty,
                span: named_arg.span,
            });
        }
        Ok((effective, named))
    }
}

/// Synthesize the tuple-element reads standing in for an expanded splat.
#[must_use]
pub fn expand_splat(operand: &Node, arg_index: usize, elements: &[TypeId]) -> Vec<EffectiveArg> {
    elements
        .iter()
        .enumerate()
        .map(|(element, ty)| EffectiveArg {
            node: Node::TupleIndex(TupleIndex {
                receiver: Box::new(operand.clone()),
                index: element,
                span: operand.span(),
            }),
            ty: *ty,
            origin: ArgOrigin::SplatExpansion {
                index: arg_index,
                element,
            },
        })
        .collect()
}
