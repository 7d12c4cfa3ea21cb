//! Column/row grid shared by the table and CSV renderers.
//!
//! Resources expose their columns through [`Tabular`]; the grid itself knows
//! nothing about any particular resource type. Domain formatting (prices,
//! "used/total" ratios, joined lists) belongs in each `Tabular` impl.

use serde_json::Value;

use crate::error::CliError;

/// A record that can be projected onto a fixed set of named columns.
pub trait Tabular {
    /// Column names in display order. Must be the same for every value of a type.
    fn columns(&self) -> &'static [&'static str];

    /// Display string for `column`, or `None` for a column this record lacks.
    fn value(&self, column: &str) -> Option<String>;
}

impl<T: Tabular + ?Sized> Tabular for &T {
    fn columns(&self) -> &'static [&'static str] {
        (**self).columns()
    }

    fn value(&self, column: &str) -> Option<String> {
        (**self).value(column)
    }
}

/// One column of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Widest of the header and every cell, in characters.
    pub width: usize,
}

/// Accumulated rows, ready to render.
///
/// The first insertion fixes the column set; later rows are projected onto it
/// by column name. Cells for unknown columns are dropped and missing cells are
/// left empty.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
    fixed: bool,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add one record as a row.
    pub fn insert<T: Tabular + ?Sized>(&mut self, item: &T) {
        self.fix_columns(item.columns().iter().copied());
        self.push_row(|column| item.value(column));
    }

    /// Add every record of a sequence, in order.
    pub fn insert_all<T: Tabular>(&mut self, items: &[T]) {
        for item in items {
            self.insert(item);
        }
    }

    /// Add a plain JSON mapping, or a sequence of mappings.
    ///
    /// Any other shape fails with [`CliError::UnsupportedType`] and leaves the
    /// table untouched, including when only some elements of a sequence are bad.
    pub fn insert_value(&mut self, value: &Value) -> Result<(), CliError> {
        match value {
            Value::Object(map) => {
                self.insert_map(map);
                Ok(())
            }
            Value::Array(values) => {
                let maps = values
                    .iter()
                    .map(|value| match value {
                        Value::Object(map) => Ok(map),
                        other => Err(CliError::UnsupportedType(format!(
                            "array of {}",
                            type_name(other)
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                for map in maps {
                    self.insert_map(map);
                }
                Ok(())
            }
            other => Err(CliError::UnsupportedType(type_name(other).to_string())),
        }
    }

    fn insert_map(&mut self, map: &serde_json::Map<String, Value>) {
        self.fix_columns(map.keys().map(String::as_str));
        self.push_row(|column| map.get(column).map(cell));
    }

    fn fix_columns<'a>(&mut self, names: impl Iterator<Item = &'a str>) {
        if self.fixed {
            return;
        }
        self.columns = names
            .map(|name| Column {
                name: name.to_string(),
                width: name.to_uppercase().chars().count(),
            })
            .collect();
        self.fixed = true;
    }

    fn push_row(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let row: Vec<String> = self
            .columns
            .iter_mut()
            .map(|column| {
                let value = lookup(&column.name).unwrap_or_default();
                column.width = column.width.max(value.chars().count());
                value
            })
            .collect();
        self.rows.push(row);
    }
}

/// Default display of a JSON value inside a cell.
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Volume {
        id: u64,
        name: &'static str,
        size_gb: u32,
    }

    impl Tabular for Volume {
        fn columns(&self) -> &'static [&'static str] {
            &["id", "name", "size"]
        }

        fn value(&self, column: &str) -> Option<String> {
            Some(match column {
                "id" => self.id.to_string(),
                "name" => self.name.to_string(),
                "size" => format!("{} GB", self.size_gb),
                _ => return None,
            })
        }
    }

    struct Snapshot {
        name: &'static str,
    }

    impl Tabular for Snapshot {
        fn columns(&self) -> &'static [&'static str] {
            &["name", "origin"]
        }

        fn value(&self, column: &str) -> Option<String> {
            match column {
                "name" => Some(self.name.to_string()),
                "origin" => Some("vol".to_string()),
                _ => None,
            }
        }
    }

    #[test]
    fn first_insert_fixes_columns_and_widths() {
        let mut table = Table::new();
        table.insert_all(&[
            Volume {
                id: 1,
                name: "data",
                size_gb: 10,
            },
            Volume {
                id: 2,
                name: "backups-long",
                size_gb: 500,
            },
        ]);

        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "size"]);
        let widths: Vec<usize> = table.columns().iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![2, 12, 6]);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[1], vec!["2", "backups-long", "500 GB"]);
    }

    #[test]
    fn later_rows_project_onto_fixed_columns() {
        let mut table = Table::new();
        table.insert(&Volume {
            id: 1,
            name: "data",
            size_gb: 10,
        });
        table.insert(&Snapshot { name: "nightly" });

        assert_eq!(table.columns().len(), 3);
        assert_eq!(table.rows()[1], vec!["", "nightly", ""]);
    }

    #[test]
    fn json_mapping_uses_its_keys() {
        let mut table = Table::new();
        table
            .insert_value(&json!([
                { "name": "fra1", "servers": 3 },
                { "name": "ams1", "extra": true },
            ]))
            .unwrap();

        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "servers"]);
        assert_eq!(table.rows()[0], vec!["fra1", "3"]);
        assert_eq!(table.rows()[1], vec!["ams1", ""]);
    }

    #[test]
    fn json_columns_follow_document_order() {
        let value: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let mut table = Table::new();
        table.insert_value(&value).unwrap();

        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(table.rows()[0], vec!["1", "2", "3"]);
    }

    #[test]
    fn unsupported_value_leaves_table_untouched() {
        let mut table = Table::new();
        let err = table
            .insert_value(&json!([{ "name": "ok" }, "not a mapping"]))
            .unwrap_err();

        assert!(matches!(err, CliError::UnsupportedType(ref t) if t == "array of string"));
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn scalar_is_unsupported() {
        let mut table = Table::new();
        assert!(matches!(
            table.insert_value(&json!(42)),
            Err(CliError::UnsupportedType(_))
        ));
    }
}
