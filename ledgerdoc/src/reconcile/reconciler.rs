use crate::collection::Document;
use crate::errors::LedgerResult;
use crate::repository::Repository;
use crate::transaction::TransactionExecutor;
use std::collections::HashSet;

/// Keeps the first row seen for each `documentId`, in first-seen order.
///
/// Rows without a `documentId` are dropped.
pub fn dedupe(rows: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| match row.document_id() {
            Some(document_id) => seen.insert(document_id.to_string()),
            None => {
                log::debug!("Dropping result row without documentId");
                false
            }
        })
        .collect()
}

/// Deduplicates `rows` and replaces identity-only projections with the full
/// stored document, using `txn` so the reads see the same transaction.
///
/// A projection whose document can no longer be found is kept as-is.
pub fn reconcile(
    repository: &Repository,
    txn: &dyn TransactionExecutor,
    rows: Vec<Document>,
) -> LedgerResult<Vec<Document>> {
    dedupe(rows)
        .into_iter()
        .map(|row| hydrate(repository, txn, row))
        .collect()
}

fn hydrate(
    repository: &Repository,
    txn: &dyn TransactionExecutor,
    row: Document,
) -> LedgerResult<Document> {
    if !row.is_identity_only() {
        return Ok(row);
    }

    let document_id = row.document_id().unwrap_or_default().to_string();
    match repository.find(txn, &document_id)? {
        Some(document) => Ok(document),
        None => {
            log::warn!(
                "Document {} of {} vanished before it could be hydrated",
                document_id,
                repository.collection()
            );
            Ok(row)
        }
    }
}
