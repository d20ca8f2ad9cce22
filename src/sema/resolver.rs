//! Call resolution orchestration.
//!
//! `resolve_call` drives the pipeline: type the receiver, preprocess the
//! arguments, run every candidate def through the matcher, rank the
//! survivors, rewrite the call's argument vector into canonical positional
//! form, and request inference of the chosen body. A union-typed receiver
//! resolves against every member and produces a multi-target dispatch.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::ast::{Call, CallState, Node, Super};
use crate::diagnostics::Span;
use crate::types::TypeId;

use super::SemanticContext;
use super::defs::{DefId, signature};
use super::errors::{ArityRange, Mismatch, Rejection, ResolveError};
use super::infer::{CurrentDef, Env};
use super::matcher::{self, Binding, Matched};
use super::method_table::LookupStart;
use super::preprocess::{EffectiveArg, TypedNamedArg};
use super::rank::{self, Ranked};

/// Instantiation depth past which recursive calls must carry a declared
/// return type.
const MAX_INSTANTIATION_DEPTH: usize = 64;

/// Resolves calls against a semantic context. One resolver drives one
/// top-level typing pass; the instantiation stack tracks in-flight bodies.
pub struct Resolver<'a> {
    pub(crate) ctx: &'a mut SemanticContext,
    stack: Vec<(DefId, Vec<TypeId>)>,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(ctx: &'a mut SemanticContext) -> Self {
        Self {
            ctx,
            stack: Vec::new(),
        }
    }

    /// Resolve one call site. On failure the call is left in the `Failed`
    /// state and the error describes the cause.
    ///
    /// # Errors
    /// Returns the [`ResolveError`] that terminated this call's resolution:
    /// undefined method, a preprocessing failure, every candidate rejected,
    /// an ambiguous ranking, or a typing failure in the chosen body.
    pub fn resolve_call(&mut self, call: &mut Call, env: &mut Env) -> Result<TypeId, ResolveError> {
        match self.resolve_call_inner(call, env) {
            Ok(ty) => Ok(ty),
            Err(error) => {
                call.advance(CallState::Failed);
                Err(error)
            }
        }
    }

    fn resolve_call_inner(
        &mut self,
        call: &mut Call,
        env: &mut Env,
    ) -> Result<TypeId, ResolveError> {
        let receiver_ty = match call.receiver.as_deref_mut() {
            Some(receiver) => Some(self.infer(receiver, env)?),
            None => None,
        };
        let (effective, named) = self.effective_args(&call.args, &call.named_args, env)?;
        call.advance(CallState::Preprocessed);
        let has_block = call.block.is_some();

        let owner = self
            .ctx
            .types
            .remove_alias(receiver_ty.unwrap_or(env.self_type));
        let members: Vec<TypeId> = match self.ctx.types.union_members(owner) {
            Some(members) => members.to_vec(),
            None => vec![owner],
        };
        debug!(
            "resolving call '{}' over {} receiver type(s)",
            call.name,
            members.len()
        );

        let mut winners: Vec<(TypeId, Matched)> = Vec::with_capacity(members.len());
        for member in &members {
            let matched = self.match_against(
                LookupStart::At(*member),
                receiver_ty.is_none(),
                &call.name,
                call.span,
                *member,
                &effective,
                &named,
                has_block,
            )?;
            winners.push((*member, matched));
        }
        call.advance(CallState::Matched);

        // Named arguments are rewritten into their positional slots and the
        // splat expansions take their place in the vector; for a dispatch
        // the first member's binding fixes the order.
        if let Some((_, first)) = winners.first() {
            canonicalize(call, first, &effective, &named);
        }
        call.target_defs = winners.iter().map(|(_, matched)| matched.def_id).collect();
        call.advance(CallState::Bound);

        let mut return_types = Vec::with_capacity(winners.len());
        for (member, matched) in &winners {
            return_types.push(self.instantiate(matched, *member, &effective, &named)?);
        }
        let ty = if return_types.len() == 1 {
            return_types[0]
        } else {
            self.ctx.types.union_of(return_types)
        };
        call.resolved_type = Some(ty);
        call.advance(CallState::Typed);
        debug!(
            "call '{}' resolved to {}",
            call.name,
            self.ctx.types.display(ty)
        );
        Ok(ty)
    }

    /// Resolve a super call: reconstruct the argument list from the
    /// enclosing def's formals when forwarding implicitly, then look up
    /// strictly above the declaring owner.
    ///
    /// # Errors
    /// Returns [`ResolveError::SuperOutsideMethod`] outside a method body,
    /// or any resolution failure of the forwarded call.
    pub fn resolve_super(
        &mut self,
        node: &mut Super,
        env: &mut Env,
    ) -> Result<TypeId, ResolveError> {
        let Some(current) = env.current_def.clone() else {
            return Err(ResolveError::SuperOutsideMethod { span: node.span });
        };
        let def = self.ctx.defs.get(current.def_id).clone();
        let forwarded_args: Vec<Node> = if node.has_parentheses || !node.args.is_empty() {
            node.args.clone()
        } else {
            def.args
                .iter()
                .enumerate()
                .map(|(index, arg)| {
                    if def.splat_index == Some(index) {
                        Node::splat(Node::var(arg.name.as_str()))
                    } else {
                        Node::var(arg.name.as_str())
                    }
                })
                .collect()
        };
        let (effective, named) = self.effective_args(&forwarded_args, &[], env)?;
        let matched = self.match_against(
            LookupStart::Above(current.owner),
            false,
            &def.name,
            node.span,
            env.self_type,
            &effective,
            &named,
            false,
        )?;
        node.target_defs = vec![matched.def_id];
        let ty = self.instantiate(&matched, env.self_type, &effective, &named)?;
        node.resolved_type = Some(ty);
        Ok(ty)
    }

    #[allow(clippy::too_many_arguments)]
    fn match_against(
        &mut self,
        start: LookupStart,
        program_fallback: bool,
        name: &str,
        span: Option<Span>,
        self_type: TypeId,
        effective: &[EffectiveArg],
        named: &[TypedNamedArg],
        has_block: bool,
    ) -> Result<Matched, ResolveError> {
        let program = self.ctx.types.builtins().program;
        let lookup = self
            .ctx
            .methods
            .lookup(&self.ctx.types, start, name)
            .or_else(|| {
                if program_fallback {
                    self.ctx
                        .methods
                        .lookup(&self.ctx.types, LookupStart::At(program), name)
                } else {
                    None
                }
            });
        let Some((_, def_ids)) = lookup else {
            let receiver = match start {
                LookupStart::At(owner) | LookupStart::Above(owner) => {
                    self.ctx.types.display(owner)
                }
            };
            return Err(ResolveError::UndefinedMethod {
                name: name.to_string(),
                receiver,
                span,
            });
        };
        let def_ids: Vec<DefId> = def_ids.to_vec();

        let mut candidates: Vec<Matched> = Vec::new();
        let mut rejections: Vec<(DefId, Mismatch)> = Vec::new();
        for def_id in def_ids {
            match matcher::match_def(
                &self.ctx.types,
                &self.ctx.defs,
                def_id,
                effective,
                named,
                has_block,
                Some(self_type),
            ) {
                Ok(matched) => {
                    trace!("candidate {} accepted", signature(self.ctx.defs.get(def_id)));
                    candidates.push(matched);
                }
                Err(reason) => {
                    trace!(
                        "candidate {} rejected: {}",
                        signature(self.ctx.defs.get(def_id)),
                        reason.describe()
                    );
                    rejections.push((def_id, reason));
                }
            }
        }

        match rank::best(&self.ctx.types, &candidates) {
            Some(Ranked::Winner(index)) => Ok(candidates.swap_remove(index)),
            Some(Ranked::Ambiguous(indices)) => Err(ResolveError::Ambiguous {
                name: name.to_string(),
                candidates: indices
                    .iter()
                    .map(|&index| signature(self.ctx.defs.get(candidates[index].def_id)))
                    .collect(),
                span,
            }),
            None => Err(self.rejection_error(name, span, effective, named, rejections)),
        }
    }

    /// Shape the all-candidates-rejected outcome: pure arity failures
    /// report the widened arity window; a named-argument or missing-formal
    /// cause shared by every candidate reports its dedicated message;
    /// anything else is `no overload matches` with per-candidate causes.
    fn rejection_error(
        &self,
        name: &str,
        span: Option<Span>,
        effective: &[EffectiveArg],
        named: &[TypedNamedArg],
        rejections: Vec<(DefId, Mismatch)>,
    ) -> ResolveError {
        let given = effective.len() + named.len();
        if !rejections.is_empty() {
            if rejections
                .iter()
                .all(|(_, reason)| matches!(reason, Mismatch::Arity { .. }))
            {
                let mut expected: Option<ArityRange> = None;
                for (_, reason) in &rejections {
                    if let Mismatch::Arity {
                        expected: window, ..
                    } = reason
                    {
                        expected = Some(match expected {
                            Some(merged) => merged.merge(*window),
                            None => *window,
                        });
                    }
                }
                return ResolveError::WrongArity {
                    name: name.to_string(),
                    given,
                    expected: expected.unwrap_or(ArityRange::exact(0)),
                    span,
                };
            }
            match &rejections[0].1 {
                Mismatch::NamedArgUnknown { name: arg }
                    if rejections.iter().all(|(_, reason)| {
                        matches!(reason, Mismatch::NamedArgUnknown { name } if name == arg)
                    }) =>
                {
                    return ResolveError::NamedArgUnknown {
                        name: arg.clone(),
                        span,
                    };
                }
                Mismatch::NamedArgCoversSplat { name: arg }
                    if rejections.iter().all(|(_, reason)| {
                        matches!(reason, Mismatch::NamedArgCoversSplat { name } if name == arg)
                    }) =>
                {
                    return ResolveError::NamedArgCoversSplat {
                        name: arg.clone(),
                        span,
                    };
                }
                Mismatch::MissingArgs { names }
                    if rejections.iter().all(|(_, reason)| {
                        matches!(reason, Mismatch::MissingArgs { names: other } if other == names)
                    }) =>
                {
                    return ResolveError::MissingArgs {
                        names: names.clone(),
                        span,
                    };
                }
                _ => {}
            }
        }

        let mut arg_types: Vec<String> = effective
            .iter()
            .map(|arg| self.ctx.types.display(arg.ty))
            .collect();
        arg_types.extend(
            named
                .iter()
                .map(|arg| format!("{}: {}", arg.name, self.ctx.types.display(arg.ty))),
        );
        ResolveError::NoOverloadMatches {
            name: name.to_string(),
            arg_types,
            rejections: rejections
                .into_iter()
                .map(|(def_id, reason)| Rejection {
                    signature: signature(self.ctx.defs.get(def_id)),
                    reason,
                })
                .collect(),
            span,
        }
    }

    /// Type the chosen def's body under the call's bindings. Instantiations
    /// are memoized per (def, formal types); recursion past the in-flight
    /// stack falls back to the declared return type.
    fn instantiate(
        &mut self,
        matched: &Matched,
        receiver: TypeId,
        effective: &[EffectiveArg],
        named: &[TypedNamedArg],
    ) -> Result<TypeId, ResolveError> {
        let def = self.ctx.defs.get(matched.def_id).clone();
        let declaring_owner = self.ctx.defs.owner(matched.def_id);

        let mut locals = HashMap::new();
        let mut formal_types = Vec::with_capacity(def.args.len());
        for (formal, binding) in matched.bindings.iter().enumerate() {
            let ty = match binding {
                Binding::Positional(index) => effective[*index].ty,
                Binding::Named(index) => named[*index].ty,
                Binding::Splat(indices) => {
                    let element_types: Vec<TypeId> =
                        indices.iter().map(|index| effective[*index].ty).collect();
                    self.ctx.types.tuple_of(element_types)
                }
                Binding::Default => {
                    let Some(default_value) = def.args[formal].default_value.clone() else {
                        return Err(ResolveError::Internal {
                            message: format!(
                                "formal '{}' bound to a missing default",
                                def.args[formal].name
                            ),
                            span: def.span,
                        });
                    };
                    let mut node = default_value;
                    let mut default_env = Env::with_self(receiver);
                    self.infer(&mut node, &mut default_env)?
                }
            };
            locals.insert(def.args[formal].name.clone(), ty);
            formal_types.push(ty);
        }

        let key = (matched.def_id, formal_types);
        if let Some(cached) = self.ctx.instantiations.get(&key) {
            trace!("instantiation cache hit for '{}'", def.name);
            return Ok(*cached);
        }

        let declared_return = match def.return_type.as_ref() {
            Some(restriction) => restriction.resolve(
                &mut self.ctx.types,
                &def.free_vars,
                &matched.substitutions,
                Some(receiver),
            ),
            None => None,
        };
        if self.stack.contains(&key) || self.stack.len() >= MAX_INSTANTIATION_DEPTH {
            return declared_return.ok_or_else(|| ResolveError::RecursionLimit {
                name: def.name.clone(),
                span: def.span,
            });
        }

        self.stack.push(key.clone());
        let mut body = (*def.body).clone();
        let mut body_env = Env {
            locals,
            self_type: receiver,
            current_def: Some(CurrentDef {
                def_id: matched.def_id,
                owner: declaring_owner,
                return_type: declared_return,
            }),
        };
        let result = self.infer(&mut body, &mut body_env);
        self.stack.pop();
        let ty = result?;
        self.ctx.instantiations.insert(key, ty);
        Ok(ty)
    }
}

/// Replace the call's positional vector with the canonical form: formals in
/// declaration order, named arguments moved into their slots, splat
/// expansions in place. Defaults are not materialized at the call site.
fn canonicalize(
    call: &mut Call,
    matched: &Matched,
    effective: &[EffectiveArg],
    named: &[TypedNamedArg],
) {
    let mut canonical = Vec::new();
    for binding in &matched.bindings {
        match binding {
            Binding::Positional(index) => canonical.push(effective[*index].node.clone()),
            Binding::Splat(indices) => {
                canonical.extend(indices.iter().map(|index| effective[*index].node.clone()));
            }
            Binding::Named(index) => canonical.push(named[*index].node.clone()),
            Binding::Default => {}
        }
    }
    call.args = canonical;
    call.named_args.clear();
}
