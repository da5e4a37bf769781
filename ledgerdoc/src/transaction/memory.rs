use crate::collection::Document;
use crate::common::{atomic, Atomic, ReadExecutor, Value, WriteExecutor, DOC_ID, PLACEHOLDER};
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::query::Operator;
use crate::transaction::{DriverConfig, LedgerDriver, TransactionExecutor};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

static SELECT_ALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SELECT \* FROM (\w+) BY documentId$").expect("valid pattern"));
static SELECT_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^SELECT \* FROM (\w+) BY documentId WHERE (.+);$").expect("valid pattern")
});
static INSERT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^INSERT INTO (\w+) VALUE \?;$").expect("valid pattern"));
static INSERT_INTO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^FROM (\w+) AS (\w+) BY documentId WHERE (.+) INSERT INTO (\w+)\.(\w+) VALUE \?;$")
        .expect("valid pattern")
});
static UPDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^UPDATE (\w+) BY documentId SET (.+) WHERE (.+);$").expect("valid pattern")
});
static TERM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+) (=|IN) \?$").expect("valid pattern"));
static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+) = \?$").expect("valid pattern"));

#[derive(Debug, Clone)]
struct StoredRow {
    id: String,
    data: Document,
}

impl StoredRow {
    fn to_result(&self) -> Document {
        std::iter::once((DOC_ID.to_string(), Value::String(self.id.clone())))
            .chain(self.data.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }

    fn identity(&self) -> Document {
        std::iter::once((DOC_ID.to_string(), Value::String(self.id.clone()))).collect()
    }
}

type Tables = HashMap<String, Vec<StoredRow>>;
type Term = (String, Operator);

#[derive(Debug, PartialEq)]
enum Statement {
    SelectAll {
        table: String,
    },
    SelectBy {
        table: String,
        terms: Vec<Term>,
    },
    Insert {
        table: String,
    },
    InsertInto {
        table: String,
        terms: Vec<Term>,
        field: String,
    },
    Update {
        table: String,
        assignments: Vec<String>,
        terms: Vec<Term>,
    },
}

fn execution_failure(message: &str) -> LedgerError {
    log::error!("{}", message);
    LedgerError::new(message, ErrorKind::ExecutionFailure)
}

fn parse_terms(clause: &str) -> LedgerResult<Vec<Term>> {
    clause
        .split(" AND ")
        .map(|term| -> LedgerResult<Term> {
            let captures = TERM
                .captures(term)
                .ok_or_else(|| execution_failure(&format!("Unsupported WHERE term {:?}", term)))?;
            let operator = if &captures[2] == "IN" {
                Operator::In
            } else {
                Operator::Eq
            };
            Ok((captures[1].to_string(), operator))
        })
        .collect()
}

fn parse_assignments(clause: &str) -> LedgerResult<Vec<String>> {
    clause
        .split(", ")
        .map(|assignment| {
            ASSIGNMENT
                .captures(assignment)
                .map(|c| c[1].to_string())
                .ok_or_else(|| {
                    execution_failure(&format!("Unsupported SET assignment {:?}", assignment))
                })
        })
        .collect()
}

fn parse_statement(statement: &str) -> LedgerResult<Statement> {
    if let Some(c) = SELECT_ALL.captures(statement) {
        return Ok(Statement::SelectAll {
            table: c[1].to_string(),
        });
    }
    if let Some(c) = SELECT_BY.captures(statement) {
        return Ok(Statement::SelectBy {
            table: c[1].to_string(),
            terms: parse_terms(&c[2])?,
        });
    }
    if let Some(c) = INSERT.captures(statement) {
        return Ok(Statement::Insert {
            table: c[1].to_string(),
        });
    }
    if let Some(c) = INSERT_INTO.captures(statement) {
        if c[2] != c[4] {
            return Err(execution_failure(&format!(
                "Unknown alias {} in nested insert",
                &c[4]
            )));
        }
        return Ok(Statement::InsertInto {
            table: c[1].to_string(),
            terms: parse_terms(&c[3])?,
            field: c[5].to_string(),
        });
    }
    if let Some(c) = UPDATE.captures(statement) {
        return Ok(Statement::Update {
            table: c[1].to_string(),
            assignments: parse_assignments(&c[2])?,
            terms: parse_terms(&c[3])?,
        });
    }
    Err(execution_failure(&format!(
        "Unsupported statement {:?}",
        statement
    )))
}

fn row_matches(row: &StoredRow, terms: &[Term], params: &[Value]) -> LedgerResult<bool> {
    for ((name, operator), param) in terms.iter().zip(params) {
        let id_value;
        let actual = if name == DOC_ID {
            id_value = Value::String(row.id.clone());
            Some(&id_value)
        } else {
            row.data.get(name)
        };

        let hit = match operator {
            Operator::Eq => actual == Some(param),
            Operator::In => {
                let candidates = param.as_array().ok_or_else(|| {
                    execution_failure(&format!("IN operand for {} is not a list", name))
                })?;
                actual.map(|a| candidates.contains(a)).unwrap_or(false)
            }
        };
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

fn document_param(value: &Value) -> LedgerResult<Document> {
    match value {
        Value::Document(document) => Ok(document.clone()),
        other => Err(execution_failure(&format!(
            "VALUE operand must be a document, found {}",
            other
        ))),
    }
}

/// One open transaction of a [MemoryLedger]: a private copy of the tables
/// that replaces the committed state only when the lambda succeeds.
pub struct MemoryTransaction {
    tables: RefCell<Tables>,
}

impl MemoryTransaction {
    fn select(&self, table: &str, terms: &[Term], params: &[Value]) -> LedgerResult<Vec<Document>> {
        let tables = self.tables.borrow();
        let mut results = Vec::new();
        for row in tables.get(table).into_iter().flatten() {
            if row_matches(row, terms, params)? {
                results.push(row.to_result());
            }
        }
        Ok(results)
    }

    fn insert(&self, table: &str, params: &[Value]) -> LedgerResult<Vec<Document>> {
        let data = document_param(&params[0])?;
        if data.contains_key(DOC_ID) {
            return Err(execution_failure(
                "documentId is assigned by the ledger and cannot be inserted",
            ));
        }
        let row = StoredRow {
            id: uuid::Uuid::new_v4().simple().to_string(),
            data,
        };
        let identity = row.identity();
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .push(row);
        Ok(vec![identity])
    }

    fn insert_into(
        &self,
        table: &str,
        terms: &[Term],
        field: &str,
        params: &[Value],
    ) -> LedgerResult<Vec<Document>> {
        let (where_params, child) = params.split_at(params.len() - 1);
        let child = document_param(&child[0])?;
        let mut tables = self.tables.borrow_mut();
        let mut results = Vec::new();
        for row in tables.get_mut(table).into_iter().flatten() {
            if !row_matches(row, terms, where_params)? {
                continue;
            }
            match row.data.get_mut(field) {
                None => row.data.put(field, vec![Value::Document(child.clone())])?,
                Some(Value::Array(items)) => items.push(Value::Document(child.clone())),
                Some(_) => {
                    return Err(execution_failure(&format!(
                        "Field {} of {} is not a list",
                        field, row.id
                    )))
                }
            }
            results.push(row.identity());
        }
        Ok(results)
    }

    fn update(
        &self,
        table: &str,
        assignments: &[String],
        terms: &[Term],
        params: &[Value],
    ) -> LedgerResult<Vec<Document>> {
        if assignments.iter().any(|name| name == DOC_ID) {
            return Err(execution_failure("documentId is immutable"));
        }
        let (set_params, where_params) = params.split_at(assignments.len());
        let mut tables = self.tables.borrow_mut();
        let mut results = Vec::new();
        for row in tables.get_mut(table).into_iter().flatten() {
            if !row_matches(row, terms, where_params)? {
                continue;
            }
            for (name, value) in assignments.iter().zip(set_params) {
                row.data.put(name.as_str(), value.clone())?;
            }
            results.push(row.identity());
        }
        Ok(results)
    }
}

impl TransactionExecutor for MemoryTransaction {
    fn execute(&self, statement: &str, params: &[Value]) -> LedgerResult<Vec<Document>> {
        let parsed = parse_statement(statement)?;
        let placeholders = statement.matches(PLACEHOLDER).count();
        if placeholders != params.len() {
            return Err(execution_failure(&format!(
                "Statement has {} placeholders but {} parameters were bound",
                placeholders,
                params.len()
            )));
        }

        match parsed {
            Statement::SelectAll { table } => self.select(&table, &[], &[]),
            Statement::SelectBy { table, terms } => self.select(&table, &terms, params),
            Statement::Insert { table } => self.insert(&table, params),
            Statement::InsertInto { table, terms, field } => {
                self.insert_into(&table, &terms, &field, params)
            }
            Statement::Update {
                table,
                assignments,
                terms,
            } => self.update(&table, &assignments, &terms, params),
        }
    }
}

/// An in-process ledger.
///
/// Lambdas run one at a time against a snapshot of the committed tables. A
/// successful lambda publishes its snapshot; a failed one discards it. A lambda
/// that fails with `OccConflict` is re-run up to the configured retry limit.
/// Conflicts can be injected with [MemoryLedger::inject_conflicts] to exercise
/// that path.
///
/// A lambda must not call `execute_lambda` on the same ledger.
pub struct MemoryLedger {
    config: DriverConfig,
    tables: Atomic<Tables>,
    lambda_lock: Mutex<()>,
    pending_conflicts: AtomicU32,
    attempts: AtomicU32,
}

impl MemoryLedger {
    pub fn new(config: DriverConfig) -> Self {
        MemoryLedger {
            config,
            tables: atomic(HashMap::new()),
            lambda_lock: Mutex::new(()),
            pending_conflicts: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Committed documents of `collection`, with their `documentId`, in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.tables.read_with(|tables| {
            tables
                .get(collection)
                .map(|rows| rows.iter().map(StoredRow::to_result).collect())
                .unwrap_or_default()
        })
    }

    pub fn count(&self, collection: &str) -> usize {
        self.tables
            .read_with(|tables| tables.get(collection).map(Vec::len).unwrap_or(0))
    }

    /// Makes the next `conflicts` commits fail with `OccConflict`.
    pub fn inject_conflicts(&self, conflicts: u32) {
        self.pending_conflicts.store(conflicts, Ordering::SeqCst);
    }

    /// Number of transaction bodies run so far, retries included.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn commit(&self, transaction: MemoryTransaction) -> LedgerResult<()> {
        let conflicted = self
            .pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflicted {
            return Err(LedgerError::new(
                "Transaction was not committed because of an optimistic concurrency conflict",
                ErrorKind::OccConflict,
            ));
        }
        let tables = transaction.tables.into_inner();
        self.tables.write_with(|committed| *committed = tables);
        Ok(())
    }
}

impl LedgerDriver for MemoryLedger {
    fn ledger_name(&self) -> &str {
        self.config.ledger_name()
    }

    fn execute_lambda<T, F>(&self, mut body: F) -> LedgerResult<T>
    where
        F: FnMut(&dyn TransactionExecutor) -> LedgerResult<T>,
    {
        let _serial = self.lambda_lock.lock();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.attempts.fetch_add(1, Ordering::SeqCst);

            let transaction = MemoryTransaction {
                tables: RefCell::new(self.tables.read_with(|tables| tables.clone())),
            };
            let outcome = body(&transaction)
                .and_then(|value| self.commit(transaction).map(|_| value));

            match outcome {
                Ok(value) => {
                    log::debug!("Committed transaction on {} (attempt {})", self.ledger_name(), attempt);
                    return Ok(value);
                }
                Err(err)
                    if err.kind() == &ErrorKind::OccConflict
                        && attempt <= self.config.retry_limit() =>
                {
                    log::warn!(
                        "OCC conflict on {} (attempt {}), retrying transaction",
                        self.ledger_name(),
                        attempt
                    );
                }
                Err(err) => {
                    log::debug!("Aborted transaction on {}: {}", self.ledger_name(), err);
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::transaction::LedgerBuilder;

    fn ledger() -> MemoryLedger {
        LedgerBuilder::new("test").open_in_memory().unwrap()
    }

    #[test]
    fn test_parse_update() {
        let parsed =
            parse_statement("UPDATE P BY documentId SET a = ?, b = ? WHERE c = ? AND d IN ?;")
                .unwrap();
        assert_eq!(
            parsed,
            Statement::Update {
                table: "P".to_string(),
                assignments: vec!["a".to_string(), "b".to_string()],
                terms: vec![("c".to_string(), Operator::Eq), ("d".to_string(), Operator::In)],
            }
        );
    }

    #[test]
    fn test_unsupported_statement() {
        let err = parse_statement("DELETE FROM P").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExecutionFailure);
    }

    #[test]
    fn test_insert_and_select() {
        let ledger = ledger();
        let inserted = ledger
            .execute_lambda(|txn| {
                txn.execute("INSERT INTO P VALUE ?;", &[Value::Document(doc! { name: "a" })])
            })
            .unwrap();
        assert_eq!(inserted.len(), 1);
        assert!(inserted[0].is_identity_only());

        let rows = ledger
            .execute_lambda(|txn| txn.execute("SELECT * FROM P BY documentId", &[]))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].document_id(), inserted[0].document_id());
        assert_eq!(rows[0].field_names(), vec!["documentId", "name"]);
    }

    #[test]
    fn test_placeholder_mismatch_fails() {
        let ledger = ledger();
        let err = ledger
            .execute_lambda(|txn| txn.execute("INSERT INTO P VALUE ?;", &[]))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExecutionFailure);
    }

    #[test]
    fn test_failed_body_rolls_back() {
        let ledger = ledger();
        let result: LedgerResult<()> = ledger.execute_lambda(|txn| {
            txn.execute("INSERT INTO P VALUE ?;", &[Value::Document(doc! { a: 1 })])?;
            Err(LedgerError::new("boom", ErrorKind::InternalError))
        });
        assert!(result.is_err());
        assert_eq!(ledger.count("P"), 0);
    }

    #[test]
    fn test_conflicts_are_retried() {
        let ledger = ledger();
        ledger.inject_conflicts(2);
        ledger
            .execute_lambda(|txn| {
                txn.execute("INSERT INTO P VALUE ?;", &[Value::Document(doc! { a: 1 })])
            })
            .unwrap();
        assert_eq!(ledger.attempts(), 3);
        assert_eq!(ledger.count("P"), 1);
    }

    #[test]
    fn test_conflicts_beyond_retry_limit_surface() {
        let ledger = LedgerBuilder::new("test")
            .retry_limit(1)
            .open_in_memory()
            .unwrap();
        ledger.inject_conflicts(5);
        let err = ledger
            .execute_lambda(|txn| {
                txn.execute("INSERT INTO P VALUE ?;", &[Value::Document(doc! { a: 1 })])
            })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::OccConflict);
        assert_eq!(ledger.attempts(), 2);
        assert_eq!(ledger.count("P"), 0);
    }

    #[test]
    fn test_in_requires_list() {
        let ledger = ledger();
        ledger
            .execute_lambda(|txn| {
                txn.execute("INSERT INTO P VALUE ?;", &[Value::Document(doc! { a: 1 })])
            })
            .unwrap();
        let err = ledger
            .execute_lambda(|txn| {
                txn.execute("SELECT * FROM P BY documentId WHERE a IN ?;", &[Value::I64(1)])
            })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExecutionFailure);
    }

    #[test]
    fn test_insert_rejects_document_id() {
        let ledger = ledger();
        let err = ledger
            .execute_lambda(|txn| {
                txn.execute(
                    "INSERT INTO P VALUE ?;",
                    &[Value::Document(doc! { documentId: "x" })],
                )
            })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExecutionFailure);
    }
}
