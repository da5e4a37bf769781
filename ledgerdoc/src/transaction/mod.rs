//! Transactions are owned by the ledger driver.
//!
//! The repository never begins, commits or retries a transaction. It receives
//! a [TransactionExecutor] that is already open and issues statements through
//! it. A [LedgerDriver] opens the transaction, runs a body against it and
//! commits, aborts or re-runs the body according to its own policy.
//!
//! [MemoryLedger] is an in-process driver that understands exactly the
//! statements produced by [crate::query::QueryBuilder]; it backs the tests and
//! local experiments.

mod config;
mod driver;
mod executor;
mod memory;

pub use config::*;
pub use driver::*;
pub use executor::*;
pub use memory::*;
