#![deny(warnings)]
#![deny(clippy::all, clippy::pedantic, clippy::perf, clippy::suspicious)] // Catch correctness + perf + suspicious patterns early.
#![deny(clippy::unwrap_used, clippy::expect_used)]

//! Semantic analysis core for the Quartz compiler.
//!
//! Quartz is a statically typed object-oriented language in the
//! Ruby/Crystal family. This crate implements the part of its compiler
//! that decides, at each call site, which method definition(s) must be
//! instantiated and typed: overload resolution over type restrictions,
//! splat parameters, named arguments, defaults, call-site tuple splatting,
//! and specificity ranking, plus the call-resolution protocol driving
//! downstream inference.

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod sema;
pub mod types;

pub use error::{Error, Result};
pub use sema::{Resolver, SemanticContext, analyze};
