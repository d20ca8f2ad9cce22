//! Per-owner overload lookup lists.
//!
//! Each `(owner type, method name)` pair maps to the ordered list of def
//! handles visible on that type. Redeclaring an identical signature replaces
//! the earlier entry so the superseded def never participates in matching.

use std::collections::HashMap;

use crate::ast::Def;
use crate::types::{TypeId, TypeRegistry};

use super::defs::{DefArena, DefId};

#[derive(Debug, Default)]
pub struct MethodTable {
    table: HashMap<(TypeId, String), Vec<DefId>>,
}

/// Where a lookup starts relative to the receiver type.
#[derive(Clone, Copy, Debug)]
pub enum LookupStart {
    /// The receiver type itself, then its ancestors.
    At(TypeId),
    /// Strictly above the given type; used by super-calls.
    Above(TypeId),
}

impl MethodTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declared def under its owner. An entry with an identical
    /// signature is replaced in place (redefinition).
    pub fn insert(&mut self, arena: &DefArena, owner: TypeId, id: DefId) {
        let def = arena.get(id);
        let key = (owner, def.name.clone());
        let entries = self.table.entry(key).or_default();
        if let Some(existing) = entries
            .iter_mut()
            .find(|existing| same_signature(arena.get(**existing), def))
        {
            *existing = id;
        } else {
            entries.push(id);
        }
    }

    /// Defs registered directly on `owner` under `name`.
    #[must_use]
    pub fn defs(&self, owner: TypeId, name: &str) -> Option<&[DefId]> {
        self.table
            .get(&(owner, name.to_string()))
            .map(Vec::as_slice)
    }

    /// Walk the ancestor chain and return the nearest type that defines
    /// `name`, together with its overload list.
    #[must_use]
    pub fn lookup(
        &self,
        registry: &TypeRegistry,
        start: LookupStart,
        name: &str,
    ) -> Option<(TypeId, &[DefId])> {
        let first = match start {
            LookupStart::At(owner) => registry.remove_alias(owner),
            LookupStart::Above(owner) => registry.supertype(owner)?,
        };
        for ancestor in registry.ancestors(first) {
            if let Some(defs) = self.defs(ancestor, name) {
                if !defs.is_empty() {
                    return Some((ancestor, defs));
                }
            }
        }
        None
    }
}

/// Signature identity for the redefinition rule: same name, same formal
/// names and restrictions, same splat position, same block expectation.
fn same_signature(a: &Def, b: &Def) -> bool {
    a.name == b.name
        && a.splat_index == b.splat_index
        && a.yields == b.yields
        && a.args.len() == b.args.len()
        && a.args
            .iter()
            .zip(b.args.iter())
            .all(|(lhs, rhs)| lhs.name == rhs.name && lhs.restriction == rhs.restriction)
}
