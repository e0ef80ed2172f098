//! Value flattener
//!
//! Turns nested extraction values into two shapes at once: the nested
//! [`Record`] (one entry per field) and the flat [`Row`] (one scalar cell per
//! column). Sequences contribute a `<name>.length` column plus one column per
//! element; mappings contribute one column per key. Columns below the top
//! level are row-only, the record keeps the composite value whole.

use crate::types::*;

pub const LENGTH_SUFFIX: &str = "length";

/// Store `value` under `name` into `row` and `record`. `None` is a no-op.
///
/// A `FieldName::Multi` against a mapping stores each declared name as its
/// own top-level field. Names the mapping lacks are skipped.
///
/// # Panics
///
/// When a scalar or a sequence is stored under a `FieldName::Multi`: columns
/// need a single string name for any value that is not a mapping.
pub fn store_field(
    row: &mut Row,
    record: &mut Record,
    name: &FieldName,
    value: Option<&FieldValue>,
    separator: &str,
) {
    let mut sink = Sink {
        row,
        record,
        separator,
    };

    match name {
        FieldName::Single(name) => sink.store(name, value, false),
        FieldName::Multi(names) => sink.store_multi(names, value),
    }
}

struct Sink<'a> {
    row: &'a mut Row,
    record: &'a mut Record,
    separator: &'a str,
}

impl Sink<'_> {
    fn column(&self, name: &str, suffix: &str) -> String {
        format!("{}{}{}", name, self.separator, suffix)
    }

    fn store(&mut self, name: &str, value: Option<&FieldValue>, row_only: bool) {
        let Some(value) = value else {
            return;
        };

        match value {
            FieldValue::Sequence(items) => {
                let length = self.column(name, LENGTH_SUFFIX);
                self.row.insert(length, Scalar::from(items.len()));
                for (index, item) in items.iter().enumerate() {
                    let column = self.column(name, &index.to_string());
                    self.store(&column, Some(item), true);
                }
            }
            FieldValue::Mapping(entries) => {
                for (key, item) in entries {
                    let column = self.column(name, key);
                    self.store(&column, Some(item), true);
                }
            }
            FieldValue::Scalar(scalar) => {
                self.row.insert(name.to_string(), scalar.clone());
            }
        }

        if !row_only {
            self.record.insert(name.to_string(), value.clone());
        }
    }

    fn store_multi(&mut self, names: &[String], value: Option<&FieldValue>) {
        match value {
            None => {}
            Some(FieldValue::Mapping(entries)) => {
                for name in names {
                    self.store(name, entries.get(name), false);
                }
            }
            Some(other) => panic!(
                "cannot store {:?} under multiple names ({}): only mappings split into fields",
                other,
                names.join(", ")
            ),
        }
    }
}

/// Accumulates one document's record and row.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
    row: Row,
    separator: String,
}

impl RecordBuilder {
    /// Start a record that already names its document.
    pub fn new(document: &str, separator: &str) -> Self {
        let mut builder = Self {
            record: Record::new(),
            row: Row::new(),
            separator: separator.to_string(),
        };
        builder.store(
            &FieldName::single(DOCUMENT_FIELD),
            Some(&FieldValue::from(document)),
        );
        builder
    }

    /// See [`store_field`].
    pub fn store(&mut self, name: &FieldName, value: Option<&FieldValue>) {
        store_field(&mut self.row, &mut self.record, name, value, &self.separator);
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn finish(self) -> (Record, Row) {
        (self.record, self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flatten(name: &FieldName, value: &FieldValue) -> (Record, Row) {
        let mut row = Row::new();
        let mut record = Record::new();
        store_field(&mut row, &mut record, name, Some(value), ".");
        (record, row)
    }

    #[test]
    fn test_sequence_gets_length_and_index_columns() {
        let value = FieldValue::sequence([1_i64, 2, 3]);
        let (record, row) = flatten(&FieldName::single("x"), &value);

        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["x.length", "x.0", "x.1", "x.2"]);
        assert_eq!(row["x.length"], Scalar::Int(3));
        assert_eq!(row["x.2"], Scalar::Int(3));
        assert_eq!(record.len(), 1);
        assert_eq!(record["x"], value);
    }

    #[test]
    fn test_multi_name_splits_into_top_level_fields() {
        let value = FieldValue::mapping([("received", "d1"), ("accepted", "d2")]);
        let (record, row) = flatten(&FieldName::multi(&["received", "accepted"]), &value);

        assert_eq!(row["received"], Scalar::from("d1"));
        assert_eq!(row["accepted"], Scalar::from("d2"));
        assert_eq!(record["received"], FieldValue::from("d1"));
        assert_eq!(record["accepted"], FieldValue::from("d2"));
        assert_eq!(record.len(), 2);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_multi_name_skips_missing_keys() {
        let value = FieldValue::mapping([("published", "d3")]);
        let (record, row) = flatten(
            &FieldName::multi(&["received", "accepted", "published"]),
            &value,
        );

        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["published"]);
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["published"]);
    }

    #[test]
    fn test_nested_mapping_is_row_only_below_top_level() {
        let inner = FieldValue::mapping([("first", "Ada"), ("last", "Lovelace")]);
        let value = FieldValue::mapping([("lead", inner)]);
        let (record, row) = flatten(&FieldName::single("people"), &value);

        assert_eq!(row["people.lead.first"], Scalar::from("Ada"));
        assert_eq!(row["people.lead.last"], Scalar::from("Lovelace"));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["people"]);
    }

    #[test]
    fn test_absent_value_is_noop() {
        let mut row = Row::new();
        let mut record = Record::new();
        store_field(&mut row, &mut record, &FieldName::single("title"), None, ".");
        assert!(row.is_empty());
        assert!(record.is_empty());
    }

    #[test]
    fn test_custom_separator() {
        let mut row = Row::new();
        let mut record = Record::new();
        let value = FieldValue::sequence(["A. One"]);
        store_field(&mut row, &mut record, &FieldName::single("authors"), Some(&value), "_");
        assert!(row.contains_key("authors_length"));
        assert!(row.contains_key("authors_0"));
    }

    #[test]
    #[should_panic(expected = "multiple names")]
    fn test_scalar_under_multi_name_panics() {
        flatten(&FieldName::multi(&["a", "b"]), &FieldValue::from("oops"));
    }

    #[test]
    #[should_panic(expected = "multiple names")]
    fn test_sequence_under_multi_name_panics() {
        flatten(
            &FieldName::multi(&["received", "accepted"]),
            &FieldValue::sequence(["d1", "d2"]),
        );
    }

    #[test]
    fn test_builder_starts_with_document() {
        let mut builder = RecordBuilder::new("paper.pdf", ".");
        builder.store(&FieldName::single("title"), Some(&FieldValue::from("T")));
        let (record, row) = builder.finish();

        assert_eq!(record.keys().collect::<Vec<_>>(), vec![DOCUMENT_FIELD, "title"]);
        assert_eq!(row[DOCUMENT_FIELD], Scalar::from("paper.pdf"));
    }
}
