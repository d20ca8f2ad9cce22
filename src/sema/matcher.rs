//! Per-definition overload matching.
//!
//! Given one def and a preprocessed call (effective arguments plus named
//! arguments), decide whether the def accepts the call, under which formal
//! bindings and free-variable substitutions, and record the data the ranker
//! needs to compare accepted candidates.

use std::collections::HashMap;

use crate::ast::Def;
use crate::types::{Restriction, RestrictionEnv, TypeId, TypeRegistry};

use super::defs::{DefArena, DefId};
use super::errors::{ArityRange, Mismatch};
use super::partition::{PartitionError, partition};
use super::preprocess::{EffectiveArg, TypedNamedArg};

/// How a formal parameter was filled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    /// Index into the effective argument vector.
    Positional(usize),
    /// Index into the named-argument list.
    Named(usize),
    /// Effective argument indices absorbed by the splat, possibly empty.
    Splat(Vec<usize>),
    /// Filled from the formal's default value.
    Default,
}

/// A def that accepted the call, with everything the ranker and the
/// resolver need afterwards.
#[derive(Clone, Debug)]
pub struct Matched {
    pub def_id: DefId,
    /// One binding per formal, in declaration order.
    pub bindings: Vec<Binding>,
    /// Free type variable substitutions fixed during restriction checks.
    pub substitutions: HashMap<String, TypeId>,
    /// Restriction each call slot was checked against, effective arguments
    /// first and named arguments after, for specificity comparison.
    pub slot_restrictions: Vec<Option<Restriction>>,
    pub has_splat: bool,
    pub splat_absorbed: usize,
}

/// Accepted argument-count window per §matcher arity rules: the minimum is
/// the first defaulted formal (the splat counts for one less when nothing
/// before it is defaulted); a splat lifts the maximum entirely.
#[must_use]
pub fn arity_range(def: &Def) -> ArityRange {
    let formal_count = def.args.len();
    let first_default = def
        .args
        .iter()
        .position(|arg| arg.default_value.is_some());
    let min = match (first_default, def.splat_index) {
        (Some(first_default), _) => first_default,
        (None, Some(_)) => formal_count - 1,
        (None, None) => formal_count,
    };
    let max = match def.splat_index {
        Some(_) => None,
        None => Some(formal_count),
    };
    ArityRange { min, max }
}

/// Decide whether `def_id` accepts the preprocessed call.
///
/// # Errors
/// Returns the [`Mismatch`] that rejected the def: arity outside the
/// accepted window, a named argument that is unknown, doubly specified, or
/// targeting the splat, a missing required formal, a failed restriction, or
/// incompatible block expectations.
pub fn match_def(
    registry: &TypeRegistry,
    arena: &DefArena,
    def_id: DefId,
    effective: &[EffectiveArg],
    named: &[TypedNamedArg],
    has_block: bool,
    self_type: Option<TypeId>,
) -> Result<Matched, Mismatch> {
    let def = arena.get(def_id);
    let formal_count = def.args.len();
    let given = effective.len() + named.len();

    let expected = arity_range(def);
    if !expected.contains(given) {
        return Err(Mismatch::Arity { given, expected });
    }

    let parts = match partition(formal_count, def.splat_index, effective.len()) {
        Ok(parts) => parts,
        Err(PartitionError::TooMany { given, max }) => {
            return Err(Mismatch::Arity {
                given,
                expected: ArityRange::exact(max),
            });
        }
    };

    let mut bindings: Vec<Option<Binding>> = vec![None; formal_count];
    for &(formal, actual) in &parts.before {
        bindings[formal] = Some(Binding::Positional(actual));
    }
    if let Some(slots) = &parts.splat {
        bindings[slots.formal] = Some(Binding::Splat(slots.actuals.clone().collect()));
    }
    for &(formal, actual) in &parts.after {
        bindings[formal] = Some(Binding::Positional(actual));
    }

    // Named arguments map onto still-open formals outside the splat region.
    for (named_index, named_arg) in named.iter().enumerate() {
        let Some(formal) = def.args.iter().position(|arg| arg.name == named_arg.name) else {
            return Err(Mismatch::NamedArgUnknown {
                name: named_arg.name.clone(),
            });
        };
        if def.splat_index == Some(formal) {
            return Err(Mismatch::NamedArgCoversSplat {
                name: named_arg.name.clone(),
            });
        }
        if bindings[formal].is_some() {
            return Err(Mismatch::NamedArgDuplicate {
                name: named_arg.name.clone(),
            });
        }
        bindings[formal] = Some(Binding::Named(named_index));
    }

    // Remaining formals fall back to their defaults.
    let mut missing = Vec::new();
    for (formal, binding) in bindings.iter_mut().enumerate() {
        if binding.is_none() {
            if def.args[formal].default_value.is_some() {
                *binding = Some(Binding::Default);
            } else {
                missing.push(def.args[formal].name.clone());
            }
        }
    }
    if !missing.is_empty() {
        return Err(Mismatch::MissingArgs { names: missing });
    }

    // Restriction checks; splat-absorbed actuals are checked one by one.
    let mut substitutions = HashMap::new();
    let env = RestrictionEnv {
        registry,
        free_vars: &def.free_vars,
        self_type,
    };
    let mut slot_restrictions: Vec<Option<Restriction>> =
        vec![None; effective.len() + named.len()];
    let mut splat_absorbed = 0usize;
    for (formal, binding) in bindings.iter().enumerate() {
        let arg = &def.args[formal];
        let Some(binding) = binding else {
            continue;
        };
        match binding {
            Binding::Positional(actual) => {
                if let Some(restriction) = &arg.restriction {
                    if !restriction.accepts(effective[*actual].ty, &env, &mut substitutions) {
                        return Err(restriction_mismatch(
                            registry,
                            arg.name.clone(),
                            effective[*actual].ty,
                            restriction,
                        ));
                    }
                    slot_restrictions[*actual] = Some(restriction.clone());
                }
            }
            Binding::Named(named_index) => {
                if let Some(restriction) = &arg.restriction {
                    if !restriction.accepts(named[*named_index].ty, &env, &mut substitutions) {
                        return Err(restriction_mismatch(
                            registry,
                            arg.name.clone(),
                            named[*named_index].ty,
                            restriction,
                        ));
                    }
                    slot_restrictions[effective.len() + named_index] = Some(restriction.clone());
                }
            }
            Binding::Splat(actuals) => {
                splat_absorbed = actuals.len();
                if let Some(restriction) = &arg.restriction {
                    for actual in actuals {
                        if !restriction.accepts(effective[*actual].ty, &env, &mut substitutions) {
                            return Err(restriction_mismatch(
                                registry,
                                arg.name.clone(),
                                effective[*actual].ty,
                                restriction,
                            ));
                        }
                        slot_restrictions[*actual] = Some(restriction.clone());
                    }
                }
            }
            Binding::Default => {}
        }
    }

    if def.yields && !has_block {
        return Err(Mismatch::BlockRequired);
    }
    if !def.yields && has_block {
        return Err(Mismatch::BlockUnexpected);
    }

    Ok(Matched {
        def_id,
        bindings: bindings
            .into_iter()
            .map(|binding| binding.unwrap_or(Binding::Default))
            .collect(),
        substitutions,
        slot_restrictions,
        has_splat: def.splat_index.is_some(),
        splat_absorbed,
    })
}

fn restriction_mismatch(
    registry: &TypeRegistry,
    arg: String,
    actual: TypeId,
    restriction: &Restriction,
) -> Mismatch {
    Mismatch::Restriction {
        arg,
        actual: registry.display(actual),
        restriction: restriction.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Arg, Node};
    use crate::sema::preprocess::ArgOrigin;
    use crate::types::TypeRegistry;

    fn effective(types: &[TypeId]) -> Vec<EffectiveArg> {
        types
            .iter()
            .enumerate()
            .map(|(index, ty)| EffectiveArg {
                node: Node::Nop,
                ty: *ty,
                origin: ArgOrigin::Direct { index },
            })
            .collect()
    }

    fn named(pairs: &[(&str, TypeId)]) -> Vec<TypedNamedArg> {
        pairs
            .iter()
            .map(|(name, ty)| TypedNamedArg {
                name: (*name).to_string(),
                node: Node::Nop,
                ty: *ty,
                span: None,
            })
            .collect()
    }

    fn declare(arena: &mut DefArena, registry: &TypeRegistry, def: Def) -> DefId {
        arena.declare(registry.builtins().program, def).unwrap()
    }

    #[test]
    fn arity_range_formulae() {
        let plain = Def::new("f", vec![Arg::new("a"), Arg::new("b")], Node::Nop);
        assert_eq!(arity_range(&plain), ArityRange::exact(2));

        let defaulted = Def::new(
            "f",
            vec![Arg::new("a"), Arg::new("b").with_default(Node::int(0))],
            Node::Nop,
        );
        assert_eq!(
            arity_range(&defaulted),
            ArityRange {
                min: 1,
                max: Some(2)
            }
        );

        let splat = Def::new(
            "f",
            vec![Arg::new("a"), Arg::new("rest"), Arg::new("z")],
            Node::Nop,
        )
        .with_splat(1);
        assert_eq!(arity_range(&splat), ArityRange::at_least(2));

        let splat_with_default = Def::new(
            "f",
            vec![Arg::new("a").with_default(Node::int(0)), Arg::new("rest")],
            Node::Nop,
        )
        .with_splat(1);
        assert_eq!(arity_range(&splat_with_default), ArityRange::at_least(0));
    }

    #[test]
    fn exact_arity_without_splat() {
        let registry = TypeRegistry::new();
        let b = *registry.builtins();
        let mut arena = DefArena::new();
        let id = declare(
            &mut arena,
            &registry,
            Def::new("f", vec![Arg::new("a"), Arg::new("b")], Node::Nop),
        );

        let ok = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32, b.char_]),
            &[],
            false,
            None,
        )
        .unwrap();
        assert_eq!(
            ok.bindings,
            vec![Binding::Positional(0), Binding::Positional(1)]
        );

        let err = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32]),
            &[],
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Mismatch::Arity { given: 1, .. }));
    }

    #[test]
    fn splat_accepts_from_n_minus_one_upwards() {
        let registry = TypeRegistry::new();
        let b = *registry.builtins();
        let mut arena = DefArena::new();
        let id = declare(
            &mut arena,
            &registry,
            Def::new("f", vec![Arg::new("a"), Arg::new("rest")], Node::Nop).with_splat(1),
        );

        let err = match_def(&registry, &arena, id, &[], &[], false, None).unwrap_err();
        assert!(matches!(err, Mismatch::Arity { given: 0, .. }));

        let zero_absorbed = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32]),
            &[],
            false,
            None,
        )
        .unwrap();
        assert_eq!(zero_absorbed.splat_absorbed, 0);
        assert_eq!(
            zero_absorbed.bindings,
            vec![Binding::Positional(0), Binding::Splat(vec![])]
        );

        let three_absorbed = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32, b.char_, b.char_, b.string]),
            &[],
            false,
            None,
        )
        .unwrap();
        assert_eq!(three_absorbed.splat_absorbed, 3);
        assert_eq!(
            three_absorbed.bindings,
            vec![Binding::Positional(0), Binding::Splat(vec![1, 2, 3])]
        );
    }

    #[test]
    fn splat_restriction_applies_to_every_absorbed_element() {
        let registry = TypeRegistry::new();
        let b = *registry.builtins();
        let mut arena = DefArena::new();
        let id = declare(
            &mut arena,
            &registry,
            Def::new(
                "f",
                vec![Arg::restricted("args", Restriction::path("Int32"))],
                Node::Nop,
            )
            .with_splat(0),
        );

        assert!(match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32, b.int32, b.int32]),
            &[],
            false,
            None,
        )
        .is_ok());

        let err = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32, b.int32, b.char_]),
            &[],
            false,
            None,
        )
        .unwrap_err();
        assert!(
            matches!(err, Mismatch::Restriction { ref arg, ref actual, .. } if arg == "args" && actual == "Char")
        );
    }

    #[test]
    fn named_arguments_fill_open_formals() {
        let registry = TypeRegistry::new();
        let b = *registry.builtins();
        let mut arena = DefArena::new();
        let id = declare(
            &mut arena,
            &registry,
            Def::new(
                "f",
                vec![
                    Arg::new("a"),
                    Arg::new("b"),
                    Arg::new("c").with_default(Node::int(0)),
                ],
                Node::Nop,
            ),
        );

        let ok = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32]),
            &named(&[("b", b.char_)]),
            false,
            None,
        )
        .unwrap();
        assert_eq!(
            ok.bindings,
            vec![
                Binding::Positional(0),
                Binding::Named(0),
                Binding::Default
            ]
        );

        let err = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32]),
            &named(&[("nope", b.char_)]),
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Mismatch::NamedArgUnknown { ref name } if name == "nope"));

        let err = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32, b.int32]),
            &named(&[("a", b.char_)]),
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Mismatch::NamedArgDuplicate { ref name } if name == "a"));
    }

    #[test]
    fn named_argument_cannot_cover_the_splat() {
        let registry = TypeRegistry::new();
        let b = *registry.builtins();
        let mut arena = DefArena::new();
        let id = declare(
            &mut arena,
            &registry,
            Def::new("f", vec![Arg::new("rest")], Node::Nop).with_splat(0),
        );
        let err = match_def(
            &registry,
            &arena,
            id,
            &[],
            &named(&[("rest", b.int32)]),
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Mismatch::NamedArgCoversSplat { ref name } if name == "rest"));
    }

    #[test]
    fn missing_required_formal_is_reported_by_name() {
        let registry = TypeRegistry::new();
        let b = *registry.builtins();
        let mut arena = DefArena::new();
        let id = declare(
            &mut arena,
            &registry,
            Def::new(
                "f",
                vec![
                    Arg::new("a"),
                    Arg::new("b"),
                    Arg::new("c").with_default(Node::int(0)),
                ],
                Node::Nop,
            ),
        );
        let err = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32]),
            &named(&[("c", b.int32)]),
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Mismatch::MissingArgs { ref names } if names == &["b".to_string()]));
    }

    #[test]
    fn block_compatibility() {
        let registry = TypeRegistry::new();
        let mut arena = DefArena::new();
        let yielding = declare(
            &mut arena,
            &registry,
            Def::new("each", vec![], Node::Nop).with_yields(),
        );
        let plain = declare(&mut arena, &registry, Def::new("size", vec![], Node::Nop));

        assert!(matches!(
            match_def(&registry, &arena, yielding, &[], &[], false, None),
            Err(Mismatch::BlockRequired)
        ));
        assert!(match_def(&registry, &arena, yielding, &[], &[], true, None).is_ok());
        assert!(matches!(
            match_def(&registry, &arena, plain, &[], &[], true, None),
            Err(Mismatch::BlockUnexpected)
        ));
    }

    #[test]
    fn free_vars_bind_consistently_across_slots() {
        let registry = TypeRegistry::new();
        let b = *registry.builtins();
        let mut arena = DefArena::new();
        let id = declare(
            &mut arena,
            &registry,
            Def::new(
                "pair",
                vec![
                    Arg::restricted("a", Restriction::path("T")),
                    Arg::restricted("b", Restriction::path("T")),
                ],
                Node::Nop,
            )
            .with_free_vars(vec!["T".into()]),
        );

        let ok = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32, b.int32]),
            &[],
            false,
            None,
        )
        .unwrap();
        assert_eq!(ok.substitutions.get("T"), Some(&b.int32));

        let err = match_def(
            &registry,
            &arena,
            id,
            &effective(&[b.int32, b.char_]),
            &[],
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Mismatch::Restriction { .. }));
    }
}
