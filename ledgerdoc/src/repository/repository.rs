use crate::collection::Document;
use crate::common::{Clock, SystemClock, Value, CREATED_AT, DOC_ID, UPDATED_AT};
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::query::{predicates, Operator, Query, QueryBuilder};
use crate::transaction::TransactionExecutor;
use std::sync::Arc;

/// Document-oriented operations on one collection.
///
/// The repository never opens, commits or retries a transaction. Every
/// operation runs inside the executor it is given, and a driver retry simply
/// calls the operation again.
///
/// ```rust,ignore
/// let repository = Repository::new("Person")?;
/// ledger.execute_lambda(|txn| {
///     repository.upsert(txn, &doc! { name: "a" }, doc! { age: 5 })
/// })?;
/// ```
#[derive(Clone)]
pub struct Repository {
    builder: QueryBuilder,
    clock: Arc<dyn Clock>,
}

impl Repository {
    /// Creates a repository bound to `collection`, stamping documents with the system clock.
    pub fn new(collection: &str) -> LedgerResult<Self> {
        Self::with_clock(collection, Arc::new(SystemClock))
    }

    pub fn with_clock(collection: &str, clock: Arc<dyn Clock>) -> LedgerResult<Self> {
        Ok(Repository {
            builder: QueryBuilder::new(collection)?,
            clock,
        })
    }

    pub fn collection(&self) -> &str {
        self.builder.collection()
    }

    /// Returns every document of the collection.
    pub fn all(&self, txn: &dyn TransactionExecutor) -> LedgerResult<Vec<Document>> {
        self.execute(txn, &self.builder.select_all())
    }

    /// Returns the document with the given `documentId`, if it exists.
    pub fn find(
        &self,
        txn: &dyn TransactionExecutor,
        document_id: &str,
    ) -> LedgerResult<Option<Document>> {
        let mut predicate = Document::new();
        predicate.put(DOC_ID, document_id)?;
        self.find_by(txn, &predicate)
    }

    /// Returns the first document matching `predicate`, if any.
    pub fn find_by(
        &self,
        txn: &dyn TransactionExecutor,
        predicate: &Document,
    ) -> LedgerResult<Option<Document>> {
        Ok(self.find_where(txn, predicate)?.into_iter().next())
    }

    /// Returns every document matching all fields of `predicate`.
    ///
    /// A list value matches with `IN`, any other value with `=`.
    pub fn find_where(
        &self,
        txn: &dyn TransactionExecutor,
        predicate: &Document,
    ) -> LedgerResult<Vec<Document>> {
        let query = self.builder.select_by(predicate)?;
        self.execute(txn, &query)
    }

    /// Inserts `document` and returns the ledger's projection of the new row.
    ///
    /// `createdAt` is set to now when absent, and `updatedAt` to `createdAt`
    /// when absent, so both are equal on a plain first insert.
    pub fn insert(
        &self,
        txn: &dyn TransactionExecutor,
        mut document: Document,
    ) -> LedgerResult<Vec<Document>> {
        document.put_if_absent(CREATED_AT, self.clock.now())?;
        let created_at = document.get(CREATED_AT).cloned().unwrap_or(Value::Null);
        document.put_if_absent(UPDATED_AT, created_at)?;

        self.execute(txn, &self.builder.insert(document))
    }

    /// Appends `document` to the `field` list of the row matching `predicate`
    /// and returns that row's `documentId`.
    pub fn insert_into(
        &self,
        txn: &dyn TransactionExecutor,
        field: &str,
        document: Document,
        predicate: &Document,
    ) -> LedgerResult<String> {
        let query = self.builder.insert_into(field, document, predicate)?;
        let results = self.execute(txn, &query)?;
        let parent = results.first().and_then(Document::document_id);
        match parent {
            Some(document_id) => Ok(document_id.to_string()),
            None => {
                log::error!(
                    "Nested insert into {}.{} matched no document",
                    self.collection(),
                    field
                );
                Err(LedgerError::new(
                    &format!(
                        "No {} document matched {} for nested insert into {}",
                        self.collection(),
                        predicate.to_json(),
                        field
                    ),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    /// Sets the fields of `document` on every row matching `predicate`.
    ///
    /// `updatedAt` is set to now when absent. The number of affected rows is
    /// not checked; an update that matches nothing returns an empty list.
    pub fn update(
        &self,
        txn: &dyn TransactionExecutor,
        mut document: Document,
        predicate: &Document,
    ) -> LedgerResult<Vec<Document>> {
        document.put_if_absent(UPDATED_AT, self.clock.now())?;
        let query = self.builder.update(&document, predicate)?;
        self.execute(txn, &query)
    }

    /// Inserts when nothing matches `predicate`, updates when exactly one row
    /// does, and fails with `AmbiguousUpsert` otherwise.
    ///
    /// The inserted document is `predicate` merged with `document`, so it
    /// satisfies the predicate that was searched for. A list value in the
    /// predicate selects with `IN`, which a stored list never satisfies, so
    /// inserting with one fails with `MalformedInput` and writes nothing.
    pub fn upsert(
        &self,
        txn: &dyn TransactionExecutor,
        predicate: &Document,
        document: Document,
    ) -> LedgerResult<Vec<Document>> {
        let existing = self.find_where(txn, predicate)?;
        match existing.len() {
            0 => {
                self.check_insertable_predicate(predicate)?;
                self.insert(txn, predicate.merge(&document))
            }
            1 => self.update(txn, document, predicate),
            matches => {
                log::error!(
                    "Upsert on {} matched {} documents",
                    self.collection(),
                    matches
                );
                Err(LedgerError::new(
                    &format!(
                        "Upsert matched multiple documents; searching for {}, found {} documents",
                        predicate.to_json(),
                        matches
                    ),
                    ErrorKind::AmbiguousUpsert,
                ))
            }
        }
    }

    fn check_insertable_predicate(&self, predicate: &Document) -> LedgerResult<()> {
        let listed = predicates(predicate)?
            .into_iter()
            .filter(|term| term.operator() == Operator::In)
            .map(|term| term.name().to_string())
            .collect::<Vec<_>>();
        if listed.is_empty() {
            return Ok(());
        }
        log::error!(
            "Upsert on {} cannot insert with list predicate fields {:?}",
            self.collection(),
            listed
        );
        Err(LedgerError::new(
            &format!(
                "Upsert found no document for {} and cannot insert one: list values for {} would select with IN",
                predicate.to_json(),
                listed.join(", ")
            ),
            ErrorKind::MalformedInput,
        ))
    }

    /// Runs `query` in `txn` and returns the full ordered result list.
    ///
    /// Every other operation goes through here.
    pub fn execute(
        &self,
        txn: &dyn TransactionExecutor,
        query: &Query,
    ) -> LedgerResult<Vec<Document>> {
        log::debug!("Query: {}", query.statement());
        log::trace!("Params: {:?}", query.params());
        txn.execute(query.statement(), query.params()).map_err(|err| {
            log::error!("Query on {} failed: {}", self.collection(), err);
            err
        })
    }
}
