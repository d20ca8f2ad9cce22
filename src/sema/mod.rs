//! Semantic analysis core: overload resolution and call typing.
//!
//! [`SemanticContext`] owns the type registry, the def arena, and the
//! per-owner method table. [`Resolver`] drives call resolution against a
//! context; [`analyze`] runs the two passes (declaration collection, then
//! typing) over a program node and accumulates diagnostics.

pub mod defs;
pub mod errors;
pub mod infer;
pub mod matcher;
pub mod method_table;
pub mod partition;
pub mod preprocess;
pub mod rank;
pub mod resolver;

use std::collections::HashMap;

use crate::ast::{Arg, Def, Node, Primitive, Visitor, walk};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::types::{Restriction, TypeId, TypeRegistry};

pub use defs::{DefArena, DefId, signature};
pub use errors::{ArityRange, Mismatch, Rejection, ResolveError, codes};
pub use infer::{CurrentDef, Env};
pub use matcher::{Binding, Matched, arity_range, match_def};
pub use method_table::{LookupStart, MethodTable};
pub use partition::{Partition, PartitionError, SplatSlots, partition};
pub use preprocess::{ArgOrigin, EffectiveArg, TypedNamedArg, expand_splat};
pub use rank::{Ranked, best};
pub use resolver::Resolver;

/// Shared state of one semantic analysis run: types, declared defs, and the
/// overload lookup table. Append-only while resolution reads from it.
#[derive(Debug)]
pub struct SemanticContext {
    pub types: TypeRegistry,
    pub defs: DefArena,
    pub methods: MethodTable,
    /// Memoized body typings keyed by (def, formal argument types).
    pub(crate) instantiations: HashMap<(DefId, Vec<TypeId>), TypeId>,
}

impl SemanticContext {
    #[must_use]
    pub fn new() -> Self {
        let mut ctx = Self {
            types: TypeRegistry::new(),
            defs: DefArena::new(),
            methods: MethodTable::new(),
            instantiations: HashMap::new(),
        };
        ctx.bootstrap_primitives();
        ctx
    }

    /// Declare a method on `owner`, replacing an identical signature.
    ///
    /// # Errors
    /// Propagates the structural-invariant diagnostics of
    /// [`DefArena::declare`].
    pub fn declare_method(&mut self, owner: TypeId, def: Def) -> Result<DefId, Diagnostic> {
        let id = self.defs.declare(owner, def)?;
        self.methods.insert(&self.defs, owner, id);
        Ok(id)
    }

    /// Declare a def owned by the top-level program type.
    ///
    /// # Errors
    /// Propagates the structural-invariant diagnostics of
    /// [`DefArena::declare`].
    pub fn declare_top_level(&mut self, def: Def) -> Result<DefId, Diagnostic> {
        let program = self.types.builtins().program;
        self.declare_method(program, def)
    }

    /// Arithmetic and comparison intrinsics on the numeric primitives; the
    /// bodies are `Primitive` markers typed via the declared return type.
    fn bootstrap_primitives(&mut self) {
        let builtins = *self.types.builtins();
        let numerics = [
            (builtins.int32, "Int32"),
            (builtins.int64, "Int64"),
            (builtins.float64, "Float64"),
        ];
        for (owner, type_name) in numerics {
            for op in ["+", "-", "*", "/"] {
                self.declare_builtin(
                    owner,
                    Def::new(
                        op,
                        vec![Arg::restricted("other", Restriction::path(type_name))],
                        Node::Primitive(Primitive::new("binary")),
                    )
                    .with_return_type(Restriction::path(type_name)),
                );
            }
            self.declare_builtin(
                owner,
                Def::new(
                    "==",
                    vec![Arg::restricted("other", Restriction::path(type_name))],
                    Node::Primitive(Primitive::new("binary")),
                )
                .with_return_type(Restriction::path("Bool")),
            );
        }
    }

    fn declare_builtin(&mut self, owner: TypeId, def: Def) {
        if let Err(diagnostic) = self.declare_method(owner, def) {
            debug_assert!(false, "invalid builtin def: {diagnostic}");
        }
    }
}

impl Default for SemanticContext {
    fn default() -> Self {
        Self::new()
    }
}

struct DeclarationCollector {
    defs: Vec<Def>,
}

impl Visitor for DeclarationCollector {
    fn visit(&mut self, node: &Node) -> bool {
        if let Node::Def(def) = node {
            self.defs.push((**def).clone());
            false
        } else {
            true
        }
    }
}

/// Run semantic analysis over a program node: collect def declarations,
/// then type the remaining expressions in order. Each failed call
/// contributes one diagnostic; resolution continues with the next
/// top-level expression. Returns the program's type when typing reached
/// the end.
pub fn analyze(
    ctx: &mut SemanticContext,
    program: &mut Node,
    diagnostics: &mut Diagnostics,
) -> Option<TypeId> {
    let mut collector = DeclarationCollector { defs: Vec::new() };
    walk(&mut collector, program);
    for def in collector.defs {
        if let Err(diagnostic) = ctx.declare_top_level(def) {
            diagnostics.report(diagnostic);
        }
    }

    let program_type = ctx.types.builtins().program;
    let mut resolver = Resolver::new(ctx);
    let mut env = Env::with_self(program_type);
    match program {
        Node::Expressions(sequence) => {
            let mut last = None;
            for child in &mut sequence.nodes {
                match resolver.infer(child, &mut env) {
                    Ok(ty) => last = Some(ty),
                    Err(error) => diagnostics.report(error.into_diagnostic()),
                }
            }
            last
        }
        other => match resolver.infer(other, &mut env) {
            Ok(ty) => Some(ty),
            Err(error) => {
                diagnostics.report(error.into_diagnostic());
                None
            }
        },
    }
}
