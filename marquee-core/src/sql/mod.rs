//! Typed SQL intermediate representation.
//!
//! Fragment builders produce [`Select`] trees plus a [`ParamSet`]; a single
//! [`Renderer`] turns the merged result into dialect-specific text. Anything
//! the caller supplies reaches SQL only as a bound parameter: identifiers and
//! inline literals are `&'static str`.

pub mod ast;
pub mod params;
pub mod render;

pub use ast::{
    ArithOp, CmpOp, ColumnRef, Expr, Join, JoinKind, OrderTerm, Predicate,
    Projection, Select, SqlType, TableRef, UnionProjection, UnionQuery, col,
};
pub use params::{ParamMerge, ParamSet, SqlValue};
pub use render::{CompiledQuery, Dialect, Renderer};
