//! # CSV Data Rows
//!
//! Reads label data into [`Row`]s: ordered field-name → value maps, one per
//! CSV record. The first CSV line is the header; access is keyed only, so
//! column order never matters to the engine.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::EtiquetaError;

/// One CSV record keyed by header field name.
pub type Row = IndexMap<String, String>;

/// Read all rows from a CSV source. The first record is the header.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Row>, EtiquetaError> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Row::new();
        for (name, value) in headers.iter().zip(record.iter()) {
            row.insert(name.to_string(), value.to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Read all rows from a CSV file on disk.
pub fn read_rows_from_path(path: impl AsRef<Path>) -> Result<Vec<Row>, EtiquetaError> {
    read_rows(File::open(path)?)
}

/// Row filter built from a `--only key` or `--only key=value` argument.
///
/// Without a value, a row passes when `row[key]` is nonempty; with one, when
/// `row[key]` equals it. A missing key never passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSelector {
    pub key: String,
    pub value: Option<String>,
}

impl RowSelector {
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((key, value)) => Self {
                key: key.to_string(),
                value: Some(value.to_string()),
            },
            None => Self {
                key: spec.to_string(),
                value: None,
            },
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        match (row.get(&self.key), &self.value) {
            (Some(actual), Some(wanted)) => actual == wanted,
            (Some(actual), None) => !actual.is_empty(),
            (None, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_rows_keyed_by_header() {
        let rows = read_rows("name,sku\nAlice,A-1\nBob,B-2\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name").map(String::as_str), Some("Alice"));
        assert_eq!(rows[1].get("sku").map(String::as_str), Some("B-2"));
    }

    #[test]
    fn test_quoted_fields() {
        let rows = read_rows("name,note\n\"Smith, Jane\",\"says \"\"hi\"\"\"\n".as_bytes()).unwrap();
        assert_eq!(rows[0].get("name").map(String::as_str), Some("Smith, Jane"));
        assert_eq!(rows[0].get("note").map(String::as_str), Some("says \"hi\""));
    }

    #[test]
    fn test_selector_nonempty() {
        let rows = read_rows("name,print\nAlice,yes\nBob,\n".as_bytes()).unwrap();
        let selector = RowSelector::parse("print");
        assert!(selector.matches(&rows[0]));
        assert!(!selector.matches(&rows[1]));
    }

    #[test]
    fn test_selector_exact_value() {
        let rows = read_rows("name,batch\nAlice,a\nBob,b\n".as_bytes()).unwrap();
        let selector = RowSelector::parse("batch=b");
        assert_eq!(selector.value.as_deref(), Some("b"));
        assert!(!selector.matches(&rows[0]));
        assert!(selector.matches(&rows[1]));
    }

    #[test]
    fn test_selector_missing_key() {
        let rows = read_rows("name\nAlice\n".as_bytes()).unwrap();
        assert!(!RowSelector::parse("absent").matches(&rows[0]));
    }
}
