//! Overload ranking: choose the most specific accepted candidate.
//!
//! The specificity order, most significant first: per-slot restriction
//! strictness (a restricted slot beats an unrestricted one, a subtype
//! restriction beats its supertype), absence of a splat, fewer
//! splat-absorbed actuals. Candidates the order cannot separate are
//! ambiguous; redefinition never reaches the ranker because the method
//! table replaces identical signatures at declaration time.

use std::cmp::Ordering;

use crate::types::{Restriction, TypeRegistry};

use super::matcher::Matched;

/// Ranking outcome over a non-empty candidate set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ranked {
    /// Index of the unique most specific candidate.
    Winner(usize),
    /// Indices of the candidates tied at the top.
    Ambiguous(Vec<usize>),
}

/// Rank `candidates`; `None` when the set is empty.
#[must_use]
pub fn best(registry: &TypeRegistry, candidates: &[Matched]) -> Option<Ranked> {
    if candidates.is_empty() {
        return None;
    }
    if candidates.len() == 1 {
        return Some(Ranked::Winner(0));
    }
    let mut leader = 0;
    for index in 1..candidates.len() {
        if compare(registry, &candidates[index], &candidates[leader]) == Ordering::Greater {
            leader = index;
        }
    }
    let ties: Vec<usize> = (0..candidates.len())
        .filter(|&index| {
            index != leader
                && compare(registry, &candidates[leader], &candidates[index]) != Ordering::Greater
        })
        .collect();
    if ties.is_empty() {
        Some(Ranked::Winner(leader))
    } else {
        let mut all = vec![leader];
        all.extend(ties);
        all.sort_unstable();
        Some(Ranked::Ambiguous(all))
    }
}

/// `Greater` means `a` is more specific than `b`.
fn compare(registry: &TypeRegistry, a: &Matched, b: &Matched) -> Ordering {
    match restriction_order(registry, a, b) {
        Ordering::Equal => {}
        decided => return decided,
    }
    match (a.has_splat, b.has_splat) {
        (false, true) => return Ordering::Greater,
        (true, false) => return Ordering::Less,
        _ => {}
    }
    b.splat_absorbed.cmp(&a.splat_absorbed)
}

/// Aggregate the per-slot restriction comparison. A candidate wins the
/// aggregate only when it is stricter on some slot and looser on none;
/// mixed results are neutral and fall through to the next criterion.
fn restriction_order(registry: &TypeRegistry, a: &Matched, b: &Matched) -> Ordering {
    debug_assert_eq!(a.slot_restrictions.len(), b.slot_restrictions.len());
    let mut a_stricter = false;
    let mut b_stricter = false;
    for (lhs, rhs) in a.slot_restrictions.iter().zip(b.slot_restrictions.iter()) {
        match slot_order(registry, lhs.as_ref(), rhs.as_ref()) {
            Ordering::Greater => a_stricter = true,
            Ordering::Less => b_stricter = true,
            Ordering::Equal => {}
        }
    }
    match (a_stricter, b_stricter) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn slot_order(
    registry: &TypeRegistry,
    a: Option<&Restriction>,
    b: Option<&Restriction>,
) -> Ordering {
    match (a, b) {
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
        (Some(a), Some(b)) => {
            if a == b {
                return Ordering::Equal;
            }
            let a_sub = restriction_of(registry, a, b);
            let b_sub = restriction_of(registry, b, a);
            match (a_sub, b_sub) {
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => Ordering::Equal,
            }
        }
    }
}

/// Structural subset test between restrictions: does every type accepted by
/// `a` satisfy `b`?
fn restriction_of(registry: &TypeRegistry, a: &Restriction, b: &Restriction) -> bool {
    match (a, b) {
        (Restriction::Path(lhs), Restriction::Path(rhs)) => {
            if lhs == rhs {
                return true;
            }
            match (registry.lookup(lhs), registry.lookup(rhs)) {
                (Some(lhs), Some(rhs)) => registry.is_subtype(lhs, rhs),
                _ => false,
            }
        }
        (Restriction::Union(members), _) => members
            .iter()
            .all(|member| restriction_of(registry, member, b)),
        (_, Restriction::Union(members)) => members
            .iter()
            .any(|member| restriction_of(registry, a, member)),
        (Restriction::SelfType, Restriction::SelfType) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::defs::DefId;
    use std::collections::HashMap;

    fn candidate(
        def_id: usize,
        slots: Vec<Option<Restriction>>,
        has_splat: bool,
        splat_absorbed: usize,
    ) -> Matched {
        Matched {
            def_id: DefId(def_id),
            bindings: Vec::new(),
            substitutions: HashMap::new(),
            slot_restrictions: slots,
            has_splat,
            splat_absorbed,
        }
    }

    #[test]
    fn no_splat_beats_splat_at_equal_restrictions() {
        let registry = TypeRegistry::new();
        let fixed = candidate(
            0,
            vec![Some(Restriction::path("Int32"))],
            false,
            0,
        );
        let variadic = candidate(1, vec![Some(Restriction::path("Int32"))], true, 1);
        assert_eq!(
            best(&registry, &[fixed, variadic]),
            Some(Ranked::Winner(0))
        );
    }

    #[test]
    fn restricted_slot_beats_unrestricted() {
        let registry = TypeRegistry::new();
        let loose = candidate(0, vec![None], false, 0);
        let strict = candidate(1, vec![Some(Restriction::path("Int32"))], false, 0);
        assert_eq!(best(&registry, &[loose, strict]), Some(Ranked::Winner(1)));
    }

    #[test]
    fn subtype_restriction_beats_supertype() {
        let registry = TypeRegistry::new();
        let wide = candidate(0, vec![Some(Restriction::path("Int"))], false, 0);
        let narrow = candidate(1, vec![Some(Restriction::path("Int32"))], false, 0);
        assert_eq!(best(&registry, &[wide, narrow]), Some(Ranked::Winner(1)));
    }

    #[test]
    fn union_restriction_is_looser_than_member() {
        let registry = TypeRegistry::new();
        let member = candidate(0, vec![Some(Restriction::path("String"))], false, 0);
        let union = candidate(1, vec![Some(Restriction::nilable("String"))], false, 0);
        assert_eq!(best(&registry, &[member, union]), Some(Ranked::Winner(0)));
    }

    #[test]
    fn fewer_absorbed_actuals_wins_among_splats() {
        let registry = TypeRegistry::new();
        let absorbs_two = candidate(0, vec![None, None], true, 2);
        let absorbs_one = candidate(1, vec![None, None], true, 1);
        assert_eq!(
            best(&registry, &[absorbs_two, absorbs_one]),
            Some(Ranked::Winner(1))
        );
    }

    #[test]
    fn equal_candidates_are_ambiguous() {
        let registry = TypeRegistry::new();
        let a = candidate(0, vec![Some(Restriction::path("Int32"))], false, 0);
        let b = candidate(1, vec![Some(Restriction::path("Int32"))], false, 0);
        assert_eq!(
            best(&registry, &[a, b]),
            Some(Ranked::Ambiguous(vec![0, 1]))
        );
    }

    #[test]
    fn mixed_slot_strictness_is_ambiguous() {
        let registry = TypeRegistry::new();
        let first = candidate(
            0,
            vec![Some(Restriction::path("Int32")), Some(Restriction::path("Number"))],
            false,
            0,
        );
        let second = candidate(
            1,
            vec![Some(Restriction::path("Number")), Some(Restriction::path("Int32"))],
            false,
            0,
        );
        assert_eq!(
            best(&registry, &[first, second]),
            Some(Ranked::Ambiguous(vec![0, 1]))
        );
    }

    #[test]
    fn empty_set_has_no_ranking() {
        let registry = TypeRegistry::new();
        assert_eq!(best(&registry, &[]), None);
    }
}
