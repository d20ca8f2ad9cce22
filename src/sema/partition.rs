//! Splat partitioner.
//!
//! Given a def's formal count, its optional splat position, and the
//! effective argument count, computes which actual slots pair with the
//! positional prefix, which the splat absorbs, and which pair with the
//! positional suffix. Keeping the index arithmetic here keeps the matcher
//! linear.

use std::ops::Range;

use crate::ast::Arg;

/// Actual slots absorbed by the splat formal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplatSlots {
    pub formal: usize,
    pub actuals: Range<usize>,
}

/// The three pairings produced for one (def, argument count) combination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    /// `(formal index, actual index)` pairs before the splat.
    pub before: Vec<(usize, usize)>,
    pub splat: Option<SplatSlots>,
    /// `(formal index, actual index)` pairs after the splat.
    pub after: Vec<(usize, usize)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionError {
    /// More actuals than a splat-less def can take.
    TooMany { given: usize, max: usize },
}

/// Partition `actual_count` argument slots across a def's formals.
///
/// Without a splat the prefix covers everything; `actual_count` may fall
/// short of `formal_count` (defaults and named arguments fill the rest, a
/// concern of the matcher). With a splat, the splat region absorbs
/// `actual_count - (formal_count - 1)` slots when non-negative; the suffix
/// formals take the trailing actuals.
///
/// # Errors
/// Returns [`PartitionError::TooMany`] when a splat-less def is given more
/// actuals than it has formals.
pub fn partition(
    formal_count: usize,
    splat_index: Option<usize>,
    actual_count: usize,
) -> Result<Partition, PartitionError> {
    let Some(splat_index) = splat_index else {
        if actual_count > formal_count {
            return Err(PartitionError::TooMany {
                given: actual_count,
                max: formal_count,
            });
        }
        return Ok(Partition {
            before: (0..actual_count).map(|index| (index, index)).collect(),
            splat: None,
            after: Vec::new(),
        });
    };

    debug_assert!(splat_index < formal_count);
    let before_len = splat_index.min(actual_count);
    let absorbed = actual_count.saturating_sub(formal_count - 1);
    let after_start = before_len + absorbed;
    Ok(Partition {
        before: (0..before_len).map(|index| (index, index)).collect(),
        splat: Some(SplatSlots {
            formal: splat_index,
            actuals: before_len..after_start,
        }),
        after: (after_start..actual_count)
            .enumerate()
            .map(|(offset, actual)| (splat_index + 1 + offset, actual))
            .collect(),
    })
}

impl Partition {
    /// Number of actual slots the partition covers.
    #[must_use]
    pub fn covered(&self) -> usize {
        let absorbed = self
            .splat
            .as_ref()
            .map_or(0, |slots| slots.actuals.len());
        self.before.len() + absorbed + self.after.len()
    }

    pub fn each_before<'a, A>(
        &self,
        formals: &'a [Arg],
        actuals: &'a [A],
        mut f: impl FnMut(&'a Arg, usize, &'a A, usize),
    ) {
        for &(formal, actual) in &self.before {
            f(&formals[formal], formal, &actuals[actual], actual);
        }
    }

    pub fn each_at<'a, A>(
        &self,
        formals: &'a [Arg],
        actuals: &'a [A],
        mut f: impl FnMut(&'a Arg, usize, &'a A, usize),
    ) {
        if let Some(slots) = &self.splat {
            for actual in slots.actuals.clone() {
                f(&formals[slots.formal], slots.formal, &actuals[actual], actual);
            }
        }
    }

    pub fn each_after<'a, A>(
        &self,
        formals: &'a [Arg],
        actuals: &'a [A],
        mut f: impl FnMut(&'a Arg, usize, &'a A, usize),
    ) {
        for &(formal, actual) in &self.after {
            f(&formals[formal], formal, &actuals[actual], actual);
        }
    }
}
