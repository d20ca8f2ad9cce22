//! Resolution failure kinds and their diagnostic rendering.
//!
//! The message shapes here are load-bearing: downstream tooling matches on
//! them, so the exact wording is pinned by the test suite.

use std::error::Error as StdError;
use std::fmt;

use crate::diagnostics::{Diagnostic, Span};

/// Diagnostic codes emitted by the semantic core.
pub mod codes {
    pub const UNDEFINED_METHOD: &str = "SEM001";
    pub const WRONG_ARITY: &str = "SEM002";
    pub const NO_OVERLOAD: &str = "SEM003";
    pub const AMBIGUOUS_OVERLOAD: &str = "SEM004";
    pub const SPLAT_NOT_TUPLE: &str = "SEM005";
    pub const SPLAT_UNION: &str = "SEM006";
    pub const NAMED_ARG_UNKNOWN: &str = "SEM007";
    pub const NAMED_ARG_DUPLICATE: &str = "SEM008";
    pub const NAMED_ARG_COVERS_SPLAT: &str = "SEM009";
    pub const MISSING_ARG: &str = "SEM010";
    pub const UNDEFINED_LOCAL: &str = "SEM011";
    pub const RECURSION_LIMIT: &str = "SEM012";
    pub const TUPLE_INDEX_OUT_OF_BOUNDS: &str = "SEM014";
    pub const SUPER_OUTSIDE_METHOD: &str = "SEM015";
    pub const INTERNAL: &str = "SEM099";

    pub const PARAMETER_NAME_DUPLICATE: &str = "SEM020";
    pub const DEFAULT_AFTER_SPLAT: &str = "SEM021";
    pub const SPLAT_INDEX_INVALID: &str = "SEM022";
}

/// Accepted argument-count window of a def, used in arity diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArityRange {
    pub min: usize,
    /// `None` when a splat makes the def accept unbounded arguments.
    pub max: Option<usize>,
}

impl ArityRange {
    #[must_use]
    pub fn exact(count: usize) -> Self {
        Self {
            min: count,
            max: Some(count),
        }
    }

    #[must_use]
    pub fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    #[must_use]
    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }

    /// Widen to cover both windows; used when several overloads reject on
    /// arity and a single window must be reported.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for ArityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", self.min),
            Some(max) => write!(f, "{}..{max}", self.min),
            None => write!(f, "{}+", self.min),
        }
    }
}

/// Why a single candidate def rejected the call. Collected per overload so
/// the `no overload matches` diagnostic can explain every rejection.
#[derive(Clone, Debug)]
pub enum Mismatch {
    Arity {
        given: usize,
        expected: ArityRange,
    },
    NamedArgUnknown {
        name: String,
    },
    NamedArgDuplicate {
        name: String,
    },
    NamedArgCoversSplat {
        name: String,
    },
    MissingArgs {
        names: Vec<String>,
    },
    Restriction {
        arg: String,
        actual: String,
        restriction: String,
    },
    BlockRequired,
    BlockUnexpected,
}

impl Mismatch {
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Mismatch::Arity { given, expected } => {
                format!("wrong number of arguments (given {given}, expected {expected})")
            }
            Mismatch::NamedArgUnknown { name } => format!("no argument named '{name}'"),
            Mismatch::NamedArgDuplicate { name } => {
                format!("argument for parameter '{name}' already specified")
            }
            Mismatch::NamedArgCoversSplat { name } => {
                format!("named argument '{name}' targets the splat parameter")
            }
            Mismatch::MissingArgs { names } => format!("missing {}", format_missing(names)),
            Mismatch::Restriction {
                arg,
                actual,
                restriction,
            } => format!("expected argument '{arg}' to be {restriction}, not {actual}"),
            Mismatch::BlockRequired => "a block is required".to_string(),
            Mismatch::BlockUnexpected => "a block was given but the method does not yield".into(),
        }
    }
}

/// Candidate rejection carried into the `no overload matches` diagnostic.
#[derive(Clone, Debug)]
pub struct Rejection {
    pub signature: String,
    pub reason: Mismatch,
}

/// Errors that terminate a single call's resolution.
#[derive(Debug)]
pub enum ResolveError {
    UndefinedMethod {
        name: String,
        receiver: String,
        span: Option<Span>,
    },
    WrongArity {
        name: String,
        given: usize,
        expected: ArityRange,
        span: Option<Span>,
    },
    NoOverloadMatches {
        name: String,
        arg_types: Vec<String>,
        rejections: Vec<Rejection>,
        span: Option<Span>,
    },
    Ambiguous {
        name: String,
        candidates: Vec<String>,
        span: Option<Span>,
    },
    NotATuple {
        slot: usize,
        type_name: String,
        span: Option<Span>,
    },
    SplatUnion {
        type_name: String,
        span: Option<Span>,
    },
    NamedArgUnknown {
        name: String,
        span: Option<Span>,
    },
    NamedArgDuplicate {
        name: String,
        span: Option<Span>,
    },
    NamedArgCoversSplat {
        name: String,
        span: Option<Span>,
    },
    MissingArgs {
        names: Vec<String>,
        span: Option<Span>,
    },
    UndefinedLocal {
        name: String,
        span: Option<Span>,
    },
    RecursionLimit {
        name: String,
        span: Option<Span>,
    },
    TupleIndexOutOfBounds {
        index: usize,
        tuple: String,
        span: Option<Span>,
    },
    SuperOutsideMethod {
        span: Option<Span>,
    },
    Internal {
        message: String,
        span: Option<Span>,
    },
}

impl ResolveError {
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        match self {
            ResolveError::UndefinedMethod { span, .. }
            | ResolveError::WrongArity { span, .. }
            | ResolveError::NoOverloadMatches { span, .. }
            | ResolveError::Ambiguous { span, .. }
            | ResolveError::NotATuple { span, .. }
            | ResolveError::SplatUnion { span, .. }
            | ResolveError::NamedArgUnknown { span, .. }
            | ResolveError::NamedArgDuplicate { span, .. }
            | ResolveError::NamedArgCoversSplat { span, .. }
            | ResolveError::MissingArgs { span, .. }
            | ResolveError::UndefinedLocal { span, .. }
            | ResolveError::RecursionLimit { span, .. }
            | ResolveError::TupleIndexOutOfBounds { span, .. }
            | ResolveError::SuperOutsideMethod { span }
            | ResolveError::Internal { span, .. } => *span,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::UndefinedMethod { .. } => codes::UNDEFINED_METHOD,
            ResolveError::WrongArity { .. } => codes::WRONG_ARITY,
            ResolveError::NoOverloadMatches { .. } => codes::NO_OVERLOAD,
            ResolveError::Ambiguous { .. } => codes::AMBIGUOUS_OVERLOAD,
            ResolveError::NotATuple { .. } => codes::SPLAT_NOT_TUPLE,
            ResolveError::SplatUnion { .. } => codes::SPLAT_UNION,
            ResolveError::NamedArgUnknown { .. } => codes::NAMED_ARG_UNKNOWN,
            ResolveError::NamedArgDuplicate { .. } => codes::NAMED_ARG_DUPLICATE,
            ResolveError::NamedArgCoversSplat { .. } => codes::NAMED_ARG_COVERS_SPLAT,
            ResolveError::MissingArgs { .. } => codes::MISSING_ARG,
            ResolveError::UndefinedLocal { .. } => codes::UNDEFINED_LOCAL,
            ResolveError::RecursionLimit { .. } => codes::RECURSION_LIMIT,
            ResolveError::TupleIndexOutOfBounds { .. } => codes::TUPLE_INDEX_OUT_OF_BOUNDS,
            ResolveError::SuperOutsideMethod { .. } => codes::SUPER_OUTSIDE_METHOD,
            ResolveError::Internal { .. } => codes::INTERNAL,
        }
    }

    /// Convert into a diagnostic, preserving per-candidate rejection causes.
    #[must_use]
    pub fn into_diagnostic(self) -> Diagnostic {
        let mut diagnostic = Diagnostic::error(self.to_string())
            .with_code(self.code())
            .with_span(self.span());
        match self {
            ResolveError::NoOverloadMatches { rejections, .. } => {
                if !rejections.is_empty() {
                    diagnostic.add_note("overloads are:".to_string());
                    for rejection in rejections {
                        diagnostic.add_note(format!(
                            " - {}: {}",
                            rejection.signature,
                            rejection.reason.describe()
                        ));
                    }
                }
            }
            ResolveError::Ambiguous { candidates, .. } => {
                for candidate in candidates {
                    diagnostic.add_note(format!("candidate: {candidate}"));
                }
            }
            _ => {}
        }
        diagnostic
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UndefinedMethod { name, receiver, .. } => {
                write!(f, "undefined method '{name}' for {receiver}")
            }
            ResolveError::WrongArity {
                name,
                given,
                expected,
                ..
            } => write!(
                f,
                "wrong number of arguments for '{name}' (given {given}, expected {expected})"
            ),
            ResolveError::NoOverloadMatches {
                name, arg_types, ..
            } => {
                if arg_types.is_empty() {
                    write!(f, "no overload matches '{name}'")
                } else {
                    write!(
                        f,
                        "no overload matches '{name}' with types {}",
                        arg_types.join(", ")
                    )
                }
            }
            ResolveError::Ambiguous { name, .. } => write!(f, "ambiguous call to '{name}'"),
            ResolveError::NotATuple { type_name, .. } => {
                write!(f, "argument to splat must be a tuple, not {type_name}")
            }
            ResolveError::SplatUnion { type_name, .. } => {
                write!(f, "splatting a union ({type_name}) is not yet supported")
            }
            ResolveError::NamedArgUnknown { name, .. } => {
                write!(f, "no argument named '{name}'")
            }
            ResolveError::NamedArgDuplicate { name, .. } => {
                write!(f, "duplicated named argument '{name}'")
            }
            ResolveError::NamedArgCoversSplat { name, .. } => {
                write!(f, "named argument '{name}' targets the splat parameter")
            }
            ResolveError::MissingArgs { names, .. } => {
                write!(f, "missing {}", format_missing(names))
            }
            ResolveError::UndefinedLocal { name, .. } => {
                write!(f, "undefined local variable or method '{name}'")
            }
            ResolveError::RecursionLimit { name, .. } => {
                write!(f, "can't infer the return type of recursive call '{name}'")
            }
            ResolveError::TupleIndexOutOfBounds { index, tuple, .. } => {
                write!(f, "index {index} out of bounds for tuple {tuple}")
            }
            ResolveError::SuperOutsideMethod { .. } => {
                write!(f, "can't use 'super' outside of a method")
            }
            ResolveError::Internal { message, .. } => write!(f, "internal error: {message}"),
        }
    }
}

impl StdError for ResolveError {}

fn format_missing(names: &[String]) -> String {
    if names.len() == 1 {
        format!("argument: {}", names[0])
    } else {
        format!("arguments: {}", names.join(", "))
    }
}
