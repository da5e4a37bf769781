use crate::batch::{DocumentOperation, RawOperation};
use crate::collection::Document;
use crate::errors::LedgerResult;
use crate::reconcile::reconcile;
use crate::repository::Repository;
use crate::transaction::LedgerDriver;
use std::borrow::Borrow;

/// How a batch reacts to failures and shapes its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOptions {
    /// Record a failing item as [ItemOutput::Error] and keep going, instead of
    /// aborting the batch.
    pub continue_on_fail: bool,
    /// Emit one output per document instead of one per item.
    pub flatten_results: bool,
}

/// Outcome of one batch item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutput {
    Results(Vec<Document>),
    Error(String),
}

impl ItemOutput {
    pub fn is_error(&self) -> bool {
        matches!(self, ItemOutput::Error(_))
    }

    /// `{"results": [...]}` or `{"error": "..."}`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ItemOutput::Results(documents) => serde_json::json!({
                "results": documents.iter().map(Document::to_json).collect::<Vec<_>>()
            }),
            ItemOutput::Error(message) => serde_json::json!({ "error": message }),
        }
    }
}

/// Runs each operation in its own transaction and returns one output per
/// operation, in order.
///
/// Inside each transaction the raw result rows are reconciled, so every
/// output holds unique, fully populated documents. Without
/// `continue_on_fail` the first failure is returned and later items are not
/// run; items already run stay committed.
pub fn run_batch<D: LedgerDriver>(
    driver: &D,
    repository: &Repository,
    operations: &[DocumentOperation],
    options: &BatchOptions,
) -> LedgerResult<Vec<ItemOutput>> {
    run_items(driver, repository, operations.iter().map(Ok), options)
}

/// Like [run_batch], but parses each item's parameters just before it runs.
///
/// A parameter that fails to parse is a failure of that item only: with
/// `continue_on_fail` it becomes an [ItemOutput::Error] at its position.
pub fn run_raw_batch<D: LedgerDriver>(
    driver: &D,
    repository: &Repository,
    operations: &[RawOperation],
    options: &BatchOptions,
) -> LedgerResult<Vec<ItemOutput>> {
    run_items(
        driver,
        repository,
        operations.iter().map(RawOperation::parse),
        options,
    )
}

fn run_items<D, I, O>(
    driver: &D,
    repository: &Repository,
    items: I,
    options: &BatchOptions,
) -> LedgerResult<Vec<ItemOutput>>
where
    D: LedgerDriver,
    I: Iterator<Item = LedgerResult<O>>,
    O: Borrow<DocumentOperation>,
{
    let mut outputs = Vec::new();
    for (index, item) in items.enumerate() {
        let outcome = item.and_then(|operation| {
            let operation = operation.borrow();
            log::debug!(
                "Running batch item {} ({}) on {}",
                index,
                operation.name(),
                repository.collection()
            );
            driver.execute_lambda(|txn| {
                let rows = operation.apply(repository, txn)?;
                reconcile(repository, txn, rows)
            })
        });

        match outcome {
            Ok(documents) => outputs.push(ItemOutput::Results(documents)),
            Err(err) if options.continue_on_fail => {
                log::warn!("Batch item {} failed, continuing: {}", index, err);
                outputs.push(ItemOutput::Error(err.message().to_string()));
            }
            Err(err) => {
                log::error!("Batch item {} failed: {}", index, err);
                return Err(err);
            }
        }
    }
    Ok(outputs)
}

/// Expands per-item outputs into one JSON value per document. Error items
/// stay in place as `{"error": "..."}`.
pub fn flatten(outputs: &[ItemOutput]) -> Vec<serde_json::Value> {
    outputs
        .iter()
        .flat_map(|output| match output {
            ItemOutput::Results(documents) => {
                documents.iter().map(Document::to_json).collect::<Vec<_>>()
            }
            error => vec![error.to_json()],
        })
        .collect()
}

/// Renders outputs as the JSON items handed back to a host, flattened when
/// `options.flatten_results` is set.
pub fn render_outputs(outputs: &[ItemOutput], options: &BatchOptions) -> Vec<serde_json::Value> {
    if options.flatten_results {
        flatten(outputs)
    } else {
        outputs.iter().map(ItemOutput::to_json).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{FixedClock, Value, CREATED_AT, UPDATED_AT};
    use crate::doc;
    use crate::errors::ErrorKind;
    use crate::transaction::{LedgerBuilder, MemoryLedger};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (MemoryLedger, Repository) {
        let ledger = LedgerBuilder::new("batch").open_in_memory().unwrap();
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        let repository = Repository::with_clock("People", Arc::new(clock)).unwrap();
        (ledger, repository)
    }

    #[test]
    fn test_insert_results_are_hydrated() {
        let (ledger, repository) = setup();
        let operations = vec![DocumentOperation::Insert {
            document: doc! { name: "a" },
        }];

        let outputs = run_batch(&ledger, &repository, &operations, &BatchOptions::default()).unwrap();

        match &outputs[0] {
            ItemOutput::Results(documents) => {
                assert_eq!(documents.len(), 1);
                assert!(documents[0].document_id().is_some());
                assert!(documents[0].contains_key(CREATED_AT));
                assert!(documents[0].contains_key(UPDATED_AT));
                assert_eq!(documents[0].get("name"), Some(&Value::from("a")));
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_failure_aborts_without_continue_on_fail() {
        let (ledger, repository) = setup();
        let operations = vec![
            DocumentOperation::Insert { document: doc! { name: "a" } },
            DocumentOperation::Insert { document: doc! { name: "a" } },
            DocumentOperation::Upsert {
                filter: doc! { name: "a" },
                document: doc! { age: 5 },
            },
            DocumentOperation::All,
        ];

        let err = run_batch(&ledger, &repository, &operations, &BatchOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::AmbiguousUpsert);
        assert_eq!(ledger.count("People"), 2);
    }

    #[test]
    fn test_continue_on_fail_keeps_positions() {
        let (ledger, repository) = setup();
        let operations = vec![
            DocumentOperation::Update {
                document: doc! { age: 1 },
                filter: Document::new(),
            },
            DocumentOperation::Insert { document: doc! { name: "b" } },
            DocumentOperation::All,
        ];
        let options = BatchOptions {
            continue_on_fail: true,
            flatten_results: false,
        };

        let outputs = run_batch(&ledger, &repository, &operations, &options).unwrap();
        assert_eq!(outputs.len(), 3);
        assert!(outputs[0].is_error());
        assert!(!outputs[1].is_error());
        match &outputs[2] {
            ItemOutput::Results(documents) => assert_eq!(documents.len(), 1),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_flatten() {
        let outputs = vec![
            ItemOutput::Results(vec![doc! { documentId: "A" }, doc! { documentId: "B" }]),
            ItemOutput::Error("boom".to_string()),
            ItemOutput::Results(vec![]),
        ];
        assert_eq!(
            flatten(&outputs),
            vec![
                json!({"documentId": "A"}),
                json!({"documentId": "B"}),
                json!({"error": "boom"}),
            ]
        );
    }

    #[test]
    fn test_render_outputs_per_item() {
        let outputs = vec![ItemOutput::Results(vec![doc! { documentId: "A" }])];
        assert_eq!(
            render_outputs(&outputs, &BatchOptions::default()),
            vec![json!({"results": [{"documentId": "A"}]})]
        );
    }

    #[test]
    fn test_raw_batch_keeps_malformed_item_in_place() {
        let (ledger, repository) = setup();
        let operations = vec![
            RawOperation::new("insert", None, Some(r#"{"name": "a"}"#)),
            RawOperation::new("select", Some("not json"), None),
            RawOperation::new("all", None, None),
        ];
        let options = BatchOptions {
            continue_on_fail: true,
            flatten_results: false,
        };

        let outputs = run_raw_batch(&ledger, &repository, &operations, &options).unwrap();
        assert_eq!(outputs.len(), 3);
        assert!(!outputs[0].is_error());
        assert!(outputs[1].is_error());
        match &outputs[2] {
            ItemOutput::Results(documents) => assert_eq!(documents.len(), 1),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_raw_batch_malformed_item_aborts_without_continue_on_fail() {
        let (ledger, repository) = setup();
        let operations = vec![
            RawOperation::new("insert", None, Some(r#"{"name": "a"}"#)),
            RawOperation::new("update", Some(r#"{"name": "a"}"#), None),
            RawOperation::new("insert", None, Some(r#"{"name": "b"}"#)),
        ];

        let err = run_raw_batch(&ledger, &repository, &operations, &BatchOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedInput);
        assert_eq!(ledger.count("People"), 1);
    }
}
