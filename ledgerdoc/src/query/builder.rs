use crate::collection::{validate_identifier, Document};
use crate::common::{Value, DOC_ID, NESTED_ALIAS, PLACEHOLDER};
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::query::{join_assignments, join_predicates, predicates, split_fields};
use std::fmt::{Display, Formatter};

/// A statement and the parameters bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    statement: String,
    params: Vec<Value>,
}

impl Query {
    pub fn new(statement: impl Into<String>, params: Vec<Value>) -> Self {
        Query {
            statement: statement.into(),
            params,
        }
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Number of `?` placeholders in the statement.
    pub fn placeholder_count(&self) -> usize {
        self.statement.matches(PLACEHOLDER).count()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.statement, self.params)
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.statement)
    }
}

/// Builds the statements of one collection.
///
/// ```ignore
/// let builder = QueryBuilder::new("Person")?;
/// let query = builder.select_by(&doc! { name: "a", age: 5 })?;
/// assert_eq!(
///     query.statement(),
///     "SELECT * FROM Person BY documentId WHERE name = ? AND age = ?;"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuilder {
    collection: String,
}

impl QueryBuilder {
    pub fn new(collection: &str) -> LedgerResult<Self> {
        validate_identifier(collection)?;
        Ok(QueryBuilder {
            collection: collection.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// `SELECT * FROM <c> BY documentId`
    pub fn select_all(&self) -> Query {
        Query::new(
            format!("SELECT * FROM {} BY {}", self.collection, DOC_ID),
            Vec::new(),
        )
    }

    /// `SELECT * FROM <c> BY documentId WHERE f1 <op> ? AND ...;`
    pub fn select_by(&self, predicate: &Document) -> LedgerResult<Query> {
        let terms = non_empty_predicates(predicate, "select")?;
        let statement = format!(
            "SELECT * FROM {} BY {} WHERE {};",
            self.collection,
            DOC_ID,
            join_predicates(&terms)
        );
        let params = terms.into_iter().map(|t| t.into_value()).collect();
        Ok(Query::new(statement, params))
    }

    /// `INSERT INTO <c> VALUE ?;` with the whole document as the only parameter.
    pub fn insert(&self, document: Document) -> Query {
        Query::new(
            format!("INSERT INTO {} VALUE {};", self.collection, PLACEHOLDER),
            vec![Value::Document(document)],
        )
    }

    /// `FROM <c> AS t BY documentId WHERE w1 <op> ? ... INSERT INTO t.<field> VALUE ?;`
    ///
    /// Predicate values are bound first and the child document last.
    pub fn insert_into(
        &self,
        field: &str,
        document: Document,
        predicate: &Document,
    ) -> LedgerResult<Query> {
        validate_identifier(field)?;
        let terms = non_empty_predicates(predicate, "nested insert")?;
        let statement = format!(
            "FROM {} AS {} BY {} WHERE {} INSERT INTO {}.{} VALUE {};",
            self.collection,
            NESTED_ALIAS,
            DOC_ID,
            join_predicates(&terms),
            NESTED_ALIAS,
            field,
            PLACEHOLDER
        );
        let mut params: Vec<Value> = terms.into_iter().map(|t| t.into_value()).collect();
        params.push(Value::Document(document));
        Ok(Query::new(statement, params))
    }

    /// `UPDATE <c> BY documentId SET f1 = ?, ... WHERE w1 <op> ? AND ...;`
    ///
    /// Document values are bound first, predicate values second.
    pub fn update(&self, document: &Document, predicate: &Document) -> LedgerResult<Query> {
        let fields = split_fields(document)?;
        if fields.is_empty() {
            log::error!("Update of {} has no fields to set", self.collection);
            return Err(LedgerError::new(
                "Update document has no fields to set",
                ErrorKind::MalformedInput,
            ));
        }
        let terms = non_empty_predicates(predicate, "update")?;
        let statement = format!(
            "UPDATE {} BY {} SET {} WHERE {};",
            self.collection,
            DOC_ID,
            join_assignments(fields.names()),
            join_predicates(&terms)
        );
        let mut params = fields.into_values();
        params.extend(terms.into_iter().map(|t| t.into_value()));
        Ok(Query::new(statement, params))
    }
}

fn non_empty_predicates(
    predicate: &Document,
    operation: &str,
) -> LedgerResult<Vec<crate::query::FieldPredicate>> {
    if predicate.is_empty() {
        log::error!("The {} predicate is empty", operation);
        return Err(LedgerError::new(
            &format!("The {} predicate must name at least one field", operation),
            ErrorKind::MalformedInput,
        ));
    }
    predicates(predicate)
}
