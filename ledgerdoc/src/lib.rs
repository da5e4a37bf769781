//! # ledgerdoc
//!
//! Document operations over a ledger database whose query language is
//! PartiQL-like, plus a guarded stream consumer.
//!
//! - [repository::Repository] builds parameterized statements for one
//!   collection and runs them inside a transaction supplied by a
//!   [transaction::LedgerDriver].
//! - [reconcile] removes duplicate result rows and replaces identity-only
//!   projections with full documents.
//! - [batch] runs a list of operations, one transaction per item.
//! - [stream::ConsumerGuard] keeps a stream consumer from being started twice.
//!
//! [transaction::MemoryLedger] is an in-process driver that understands the
//! statements the repository produces.
//!
//! ```rust,ignore
//! use ledgerdoc::doc;
//! use ledgerdoc::repository::Repository;
//! use ledgerdoc::transaction::{LedgerBuilder, LedgerDriver};
//!
//! let ledger = LedgerBuilder::new("vehicle-registration").open_in_memory()?;
//! let people = Repository::new("Person")?;
//! ledger.execute_lambda(|txn| people.upsert(txn, &doc! { name: "a" }, doc! { age: 5 }))?;
//! ```

pub mod batch;
pub mod collection;
pub mod common;
pub mod errors;
pub mod query;
pub mod reconcile;
pub mod repository;
pub mod stream;
pub mod transaction;

#[cfg(test)]
mod tests {
    #[ctor::ctor]
    fn init() {
        colog::init();
    }
}
