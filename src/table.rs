use std::collections::HashSet;

use thiserror::Error;

use crate::value::Value;

/// One table row; values are positionally aligned with the table's columns.
pub type Row = Vec<Value>;

/// Column-level errors raised by table construction and by operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("duplicate column {0:?}")]
    DuplicateColumn(String),

    #[error("row has {found} values but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },

    #[error("column {0:?} does not hold nested tables")]
    NotNested(String),
}

/// Named columns plus ordered rows.
///
/// Every row holds exactly one value per column and column names are unique.
/// Both are checked when rows are added through [`Table::push_row`] or
/// [`Table::from_rows`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table, checking column uniqueness and row widths.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, SchemaError> {
        check_unique(&columns)?;
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(SchemaError::RowWidth {
                expected: columns.len(),
                found: row.len(),
            });
        }
        Ok(Table { columns, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`Table::column_index`], failing on unknown names.
    pub fn require_column(&self, name: &str) -> Result<usize, SchemaError> {
        self.column_index(name)
            .ok_or_else(|| SchemaError::UnknownColumn(name.to_string()))
    }

    pub fn push_row(&mut self, row: Row) -> Result<(), SchemaError> {
        if row.len() != self.columns.len() {
            return Err(SchemaError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }
}

/// Fails on the first repeated column name.
pub fn check_unique(columns: &[String]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(SchemaError::DuplicateColumn(column.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut table = Table::new(names(&["a", "b"]));
        assert!(table.push_row(vec![Value::Integer(1), Value::Null]).is_ok());
        assert_eq!(
            table.push_row(vec![Value::Integer(1)]),
            Err(SchemaError::RowWidth {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_from_rows_rejects_duplicates() {
        let result = Table::from_rows(names(&["a", "a"]), vec![]);
        assert_eq!(result, Err(SchemaError::DuplicateColumn("a".into())));
    }

    #[test]
    fn test_column_lookup() {
        let table = Table::new(names(&["name", "age"]));
        assert_eq!(table.column_index("age"), Some(1));
        assert_eq!(
            table.require_column("city"),
            Err(SchemaError::UnknownColumn("city".into()))
        );
    }
}
