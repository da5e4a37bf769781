use crate::collection::{validate_identifier, Document};
use crate::common::{Value, PLACEHOLDER};
use crate::errors::LedgerResult;
use itertools::Itertools;

/// Field names and values of a document, split in one pass.
///
/// `names[i]` and `values[i]` always come from the same entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    names: Vec<String>,
    values: Vec<Value>,
}

impl Fields {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Splits `document` into its ordered field names and values.
pub fn split_fields(document: &Document) -> LedgerResult<Fields> {
    let mut fields = Fields {
        names: Vec::with_capacity(document.size()),
        values: Vec::with_capacity(document.size()),
    };
    for (name, value) in document.iter() {
        validate_identifier(name)?;
        fields.names.push(name.clone());
        fields.values.push(value.clone());
    }
    Ok(fields)
}

/// Joins field names into a SET clause body: `a = ?, b = ?`.
pub fn join_assignments(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("{} = {}", name, PLACEHOLDER))
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_split_fields_aligns_names_and_values() {
        let fields = split_fields(&doc! { name: "a", age: 5, tags: ["x"] }).unwrap();
        assert_eq!(fields.names(), &["name", "age", "tags"]);
        assert_eq!(fields.values()[0], Value::from("a"));
        assert_eq!(fields.values()[1], Value::I64(5));
        assert!(fields.values()[2].is_array());
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_fields(&Document::new()).unwrap().is_empty());
    }

    #[test]
    fn test_join_assignments() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(join_assignments(&names), "a = ?, b = ?");
        assert_eq!(join_assignments(&[]), "");
    }
}
