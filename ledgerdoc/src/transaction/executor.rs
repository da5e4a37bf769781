use crate::collection::Document;
use crate::common::Value;
use crate::errors::LedgerResult;

/// Runs statements inside one open transaction.
///
/// Results are returned in the order the ledger produced them. A failure is an
/// `ExecutionFailure` (or `OccConflict`) and is never retried by the caller of
/// this trait; the driver decides.
pub trait TransactionExecutor {
    fn execute(&self, statement: &str, params: &[Value]) -> LedgerResult<Vec<Document>>;
}

impl<T: TransactionExecutor + ?Sized> TransactionExecutor for &T {
    fn execute(&self, statement: &str, params: &[Value]) -> LedgerResult<Vec<Document>> {
        (**self).execute(statement, params)
    }
}
