//! Type restrictions attached to formal parameters and return types.

use std::collections::HashMap;
use std::fmt;

use super::registry::{TypeId, TypeRegistry};

/// Type expression constraining which actual types a formal accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Restriction {
    /// Named type, or a free type variable of the enclosing def.
    Path(String),
    Union(Vec<Restriction>),
    SelfType,
}

impl Restriction {
    #[must_use]
    pub fn path(name: impl Into<String>) -> Self {
        Restriction::Path(name.into())
    }

    #[must_use]
    pub fn union(members: Vec<Restriction>) -> Self {
        Restriction::Union(members)
    }

    /// Shorthand for `T | Nil`.
    #[must_use]
    pub fn nilable(name: impl Into<String>) -> Self {
        Restriction::Union(vec![Restriction::path(name), Restriction::path("Nil")])
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::Path(name) => f.write_str(name),
            Restriction::Union(members) => {
                for (index, member) in members.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Restriction::SelfType => f.write_str("self"),
        }
    }
}

/// Context a restriction is evaluated in: the registry, the enclosing def's
/// free type variables, and the receiver type standing in for `self`.
#[derive(Clone, Copy)]
pub struct RestrictionEnv<'a> {
    pub registry: &'a TypeRegistry,
    pub free_vars: &'a [String],
    pub self_type: Option<TypeId>,
}

impl Restriction {
    /// Whether `actual` satisfies this restriction.
    ///
    /// A path naming a free variable binds it on first use and pins later
    /// uses to the bound type; bindings accumulate in `substitutions`.
    /// Unknown type names never match.
    #[must_use]
    pub fn accepts(
        &self,
        actual: TypeId,
        env: &RestrictionEnv<'_>,
        substitutions: &mut HashMap<String, TypeId>,
    ) -> bool {
        match self {
            Restriction::Path(name) => {
                if env.free_vars.iter().any(|var| var == name) {
                    let canonical = env.registry.remove_alias(actual);
                    match substitutions.get(name) {
                        Some(bound) => *bound == canonical,
                        None => {
                            substitutions.insert(name.clone(), canonical);
                            true
                        }
                    }
                } else {
                    match env.registry.lookup(name) {
                        Some(target) => env.registry.is_subtype(actual, target),
                        None => false,
                    }
                }
            }
            Restriction::Union(members) => {
                let canonical = env.registry.remove_alias(actual);
                if let Some(actual_members) = env.registry.union_members(canonical) {
                    actual_members.to_vec().into_iter().all(|member| {
                        members
                            .iter()
                            .any(|branch| branch.accepts(member, env, substitutions))
                    })
                } else {
                    members
                        .iter()
                        .any(|branch| branch.accepts(canonical, env, substitutions))
                }
            }
            Restriction::SelfType => match env.self_type {
                Some(self_type) => env.registry.is_subtype(actual, self_type),
                None => false,
            },
        }
    }

    /// Resolve the restriction to a concrete type handle, interning unions
    /// as needed. Free variables resolve through `substitutions`.
    pub fn resolve(
        &self,
        registry: &mut TypeRegistry,
        free_vars: &[String],
        substitutions: &HashMap<String, TypeId>,
        self_type: Option<TypeId>,
    ) -> Option<TypeId> {
        match self {
            Restriction::Path(name) => {
                if free_vars.iter().any(|var| var == name) {
                    substitutions.get(name).copied()
                } else {
                    registry.lookup(name)
                }
            }
            Restriction::Union(members) => {
                let mut resolved = Vec::with_capacity(members.len());
                for member in members {
                    resolved.push(member.resolve(registry, free_vars, substitutions, self_type)?);
                }
                Some(registry.union_of(resolved))
            }
            Restriction::SelfType => self_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(
        registry: &'a TypeRegistry,
        free_vars: &'a [String],
    ) -> RestrictionEnv<'a> {
        RestrictionEnv {
            registry,
            free_vars,
            self_type: None,
        }
    }

    #[test]
    fn path_accepts_subtypes() {
        let registry = TypeRegistry::new();
        let b = *registry.builtins();
        let mut subs = HashMap::new();
        let restriction = Restriction::path("Int");
        assert!(restriction.accepts(b.int32, &env(&registry, &[]), &mut subs));
        assert!(!restriction.accepts(b.char_, &env(&registry, &[]), &mut subs));
    }

    #[test]
    fn unknown_path_never_matches() {
        let registry = TypeRegistry::new();
        let b = *registry.builtins();
        let mut subs = HashMap::new();
        let restriction = Restriction::path("Widget");
        assert!(!restriction.accepts(b.int32, &env(&registry, &[]), &mut subs));
    }

    #[test]
    fn union_restriction_covers_union_actuals() {
        let mut registry = TypeRegistry::new();
        let b = *registry.builtins();
        let string_nil = registry.union_of(vec![b.string, b.nil]);
        let mut subs = HashMap::new();
        let restriction = Restriction::nilable("String");
        assert!(restriction.accepts(string_nil, &env(&registry, &[]), &mut subs));
        assert!(restriction.accepts(b.string, &env(&registry, &[]), &mut subs));

        let plain = Restriction::path("String");
        assert!(!plain.accepts(string_nil, &env(&registry, &[]), &mut subs));
    }

    #[test]
    fn free_var_binds_then_pins() {
        let registry = TypeRegistry::new();
        let b = *registry.builtins();
        let free_vars = vec!["T".to_string()];
        let mut subs = HashMap::new();
        let restriction = Restriction::path("T");
        assert!(restriction.accepts(b.int32, &env(&registry, &free_vars), &mut subs));
        assert_eq!(subs.get("T"), Some(&b.int32));
        assert!(restriction.accepts(b.int32, &env(&registry, &free_vars), &mut subs));
        assert!(!restriction.accepts(b.char_, &env(&registry, &free_vars), &mut subs));
    }

    #[test]
    fn resolve_interns_unions() {
        let mut registry = TypeRegistry::new();
        let restriction = Restriction::nilable("String");
        let resolved = restriction
            .resolve(&mut registry, &[], &HashMap::new(), None)
            .unwrap();
        assert!(registry.is_union(resolved));
        assert_eq!(registry.display(resolved), "String | Nil");
    }

    #[test]
    fn display_renders_union_members() {
        let restriction = Restriction::union(vec![
            Restriction::path("Int32"),
            Restriction::path("Char"),
        ]);
        assert_eq!(restriction.to_string(), "Int32 | Char");
        assert_eq!(Restriction::SelfType.to_string(), "self");
    }
}
