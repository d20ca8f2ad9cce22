//! AST model for the semantic core.

pub mod nodes;
pub mod visitor;

pub use nodes::{
    Arg, Assign, Block, BoolLiteral, Call, CallState, CharLiteral, Def, Expressions, If,
    NamedArgument, NilLiteral, Node, NumberKind, NumberLiteral, Out, Primitive, Splat,
    StringLiteral, Super, SymbolLiteral, TupleIndex, TupleLiteral, Var,
};
pub use visitor::{Visitor, walk};
