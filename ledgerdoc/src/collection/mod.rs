//! Documents and collection names.
//!
//! A [Document] is an insertion-ordered map of field names to [crate::common::Value]s.
//! A collection is a named logical table inside a ledger. Collection and field
//! names are spliced into statement text, so both are checked against a strict
//! identifier pattern before any statement is built.

mod document;

pub use document::*;

use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Checks that `name` can be used verbatim as a collection or field name in a statement.
pub fn validate_identifier(name: &str) -> LedgerResult<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        log::error!("Invalid identifier {:?}", name);
        Err(LedgerError::new(
            &format!("Invalid identifier {:?}: expected letters, digits and underscores", name),
            ErrorKind::InvalidFieldName,
        ))
    }
}
