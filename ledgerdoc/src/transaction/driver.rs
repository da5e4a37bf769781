use crate::errors::LedgerResult;
use crate::transaction::TransactionExecutor;

/// Opens transactions and owns their lifecycle.
///
/// `execute_lambda` runs `body` against a fresh transaction and commits it when
/// the body succeeds. On an optimistic concurrency conflict the driver may run
/// `body` again against a new transaction, so bodies must be safe to re-run.
/// Any other error aborts the transaction and is returned unchanged.
pub trait LedgerDriver {
    fn ledger_name(&self) -> &str;

    fn execute_lambda<T, F>(&self, body: F) -> LedgerResult<T>
    where
        F: FnMut(&dyn TransactionExecutor) -> LedgerResult<T>;
}
