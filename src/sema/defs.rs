//! Arena ownership of method definitions.
//!
//! Defs are created by the declaration pass and are immutable afterwards;
//! everything else refers to them through [`DefId`] handles. Declaration
//! validates the structural invariants up front so the matcher can assume
//! them.

use crate::ast::{Arg, Def};
use crate::diagnostics::Diagnostic;
use crate::types::TypeId;

use super::errors::codes;

/// Integer handle into the def arena. Handles are stable for the lifetime
/// of the semantic context and double as declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub usize);

#[derive(Debug)]
pub struct StoredDef {
    pub def: Def,
    pub owner: TypeId,
}

/// Append-only store of declared defs.
#[derive(Debug, Default)]
pub struct DefArena {
    defs: Vec<StoredDef>,
}

impl DefArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a def, returning its handle.
    ///
    /// # Errors
    /// Returns a coded diagnostic when the def breaks a structural
    /// invariant: duplicated argument name, out-of-range splat index, or a
    /// default value on or after the splat.
    pub fn declare(&mut self, owner: TypeId, def: Def) -> Result<DefId, Diagnostic> {
        validate_def(&def)?;
        let id = DefId(self.defs.len());
        self.defs.push(StoredDef { def, owner });
        Ok(id)
    }

    #[must_use]
    pub fn get(&self, id: DefId) -> &Def {
        &self.defs[id.0].def
    }

    #[must_use]
    pub fn owner(&self, id: DefId) -> TypeId {
        self.defs[id.0].owner
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

fn validate_def(def: &Def) -> Result<(), Diagnostic> {
    if let Some(splat_index) = def.splat_index {
        if splat_index >= def.args.len() {
            return Err(declaration_error(
                codes::SPLAT_INDEX_INVALID,
                format!("splat index out of range in '{}'", def.name),
                def,
            ));
        }
        for (index, arg) in def.args.iter().enumerate() {
            if index >= splat_index && arg.default_value.is_some() {
                return Err(declaration_error(
                    codes::DEFAULT_AFTER_SPLAT,
                    format!(
                        "default value for '{}' must come before the splat parameter",
                        arg.name
                    ),
                    def,
                ));
            }
        }
    }
    for (index, arg) in def.args.iter().enumerate() {
        if def.args[..index].iter().any(|prior| prior.name == arg.name) {
            return Err(declaration_error(
                codes::PARAMETER_NAME_DUPLICATE,
                format!("duplicated argument name '{}' in '{}'", arg.name, def.name),
                def,
            ));
        }
    }
    Ok(())
}

fn declaration_error(code: &'static str, message: String, def: &Def) -> Diagnostic {
    Diagnostic::error(message).with_code(code).with_span(def.span)
}

/// Render a def signature for diagnostics, e.g. `foo(x : Int32, *rest)`.
#[must_use]
pub fn signature(def: &Def) -> String {
    let mut out = String::new();
    out.push_str(&def.name);
    out.push('(');
    for (index, arg) in def.args.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        out.push_str(&render_arg(arg, def.splat_index == Some(index)));
    }
    if def.yields {
        if !def.args.is_empty() {
            out.push_str(", ");
        }
        out.push('&');
    }
    out.push(')');
    out
}

fn render_arg(arg: &Arg, is_splat: bool) -> String {
    let mut out = String::new();
    if is_splat {
        out.push('*');
    }
    out.push_str(&arg.name);
    if let Some(restriction) = &arg.restriction {
        out.push_str(&format!(" : {restriction}"));
    }
    out
}
