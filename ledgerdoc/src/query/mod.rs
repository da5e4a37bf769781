//! Statement generation.
//!
//! Everything in this module is pure: it turns documents and predicate maps
//! into [Query] values (statement text plus ordered parameters) and never
//! touches a ledger. The [crate::repository::Repository] decides when to run them.
//!
//! Field names and parameter values are always taken from a single pass over
//! the source document ([Fields] / [predicates]), so the n-th `?` in a
//! statement is bound to the n-th parameter.

mod builder;
mod fields;
mod predicate;

pub use builder::*;
pub use fields::*;
pub use predicate::*;
