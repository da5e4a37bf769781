use crate::collection::Document;
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::repository::Repository;
use crate::transaction::TransactionExecutor;

/// Parses a JSON object parameter into a [Document].
///
/// Missing, empty, non-JSON and non-object input all fail with
/// `MalformedInput`, so a bad parameter never reaches a query as an empty
/// predicate.
pub fn parse_document(raw: Option<&str>) -> LedgerResult<Document> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            log::error!("Missing JSON document parameter");
            return Err(LedgerError::new(
                "A JSON document parameter is required",
                ErrorKind::MalformedInput,
            ));
        }
    };

    let json: serde_json::Value = serde_json::from_str(raw).map_err(|err| {
        log::error!("Invalid JSON document parameter: {}", err);
        LedgerError::new_with_cause(
            "Parameter is not valid JSON",
            ErrorKind::MalformedInput,
            LedgerError::from(err),
        )
    })?;

    Document::from_json(&json)
}

/// One item of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOperation {
    All,
    Select { filter: Document },
    Insert { document: Document },
    Update { document: Document, filter: Document },
    Upsert { filter: Document, document: Document },
}

impl DocumentOperation {
    /// Builds an operation from its name and raw JSON parameters.
    ///
    /// Only the parameters the operation uses are parsed.
    pub fn from_raw(
        name: &str,
        filter: Option<&str>,
        document: Option<&str>,
    ) -> LedgerResult<DocumentOperation> {
        match name {
            "all" => Ok(DocumentOperation::All),
            "select" => Ok(DocumentOperation::Select {
                filter: parse_document(filter)?,
            }),
            "insert" => Ok(DocumentOperation::Insert {
                document: parse_document(document)?,
            }),
            "update" => Ok(DocumentOperation::Update {
                document: parse_document(document)?,
                filter: parse_document(filter)?,
            }),
            "upsert" => Ok(DocumentOperation::Upsert {
                filter: parse_document(filter)?,
                document: parse_document(document)?,
            }),
            other => {
                log::error!("Unknown document operation {:?}", other);
                Err(LedgerError::new(
                    &format!("Unknown document operation {:?}", other),
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentOperation::All => "all",
            DocumentOperation::Select { .. } => "select",
            DocumentOperation::Insert { .. } => "insert",
            DocumentOperation::Update { .. } => "update",
            DocumentOperation::Upsert { .. } => "upsert",
        }
    }

    /// Runs the operation in `txn` and returns the raw result rows.
    ///
    /// Documents are cloned so the same operation can be re-run when the
    /// driver retries the transaction.
    pub fn apply(
        &self,
        repository: &Repository,
        txn: &dyn TransactionExecutor,
    ) -> LedgerResult<Vec<Document>> {
        match self {
            DocumentOperation::All => repository.all(txn),
            DocumentOperation::Select { filter } => repository.find_where(txn, filter),
            DocumentOperation::Insert { document } => repository.insert(txn, document.clone()),
            DocumentOperation::Update { document, filter } => {
                repository.update(txn, document.clone(), filter)
            }
            DocumentOperation::Upsert { filter, document } => {
                repository.upsert(txn, filter, document.clone())
            }
        }
    }
}

/// An operation as a host supplies it: a name and unparsed JSON parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOperation {
    pub name: String,
    pub filter: Option<String>,
    pub document: Option<String>,
}

impl RawOperation {
    pub fn new(name: &str, filter: Option<&str>, document: Option<&str>) -> Self {
        RawOperation {
            name: name.to_string(),
            filter: filter.map(str::to_string),
            document: document.map(str::to_string),
        }
    }

    pub fn parse(&self) -> LedgerResult<DocumentOperation> {
        DocumentOperation::from_raw(
            &self.name,
            self.filter.as_deref(),
            self.document.as_deref(),
        )
    }
}
