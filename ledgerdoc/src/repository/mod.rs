//! Document operations against one named collection.
//!
//! A [Repository] is bound to a collection for its whole life and owns no
//! other state. Each operation takes the transaction it runs in, builds its
//! statement with [crate::query::QueryBuilder] and funnels it through
//! [Repository::execute].

mod repository;

pub use repository::*;
