use std::{
    collections::HashSet,
    io::{BufRead, BufReader, Read},
};

use serde_json::Map;

use crate::{loader::LoadError, table::Table, value::Value};

type Record = Map<String, serde_json::Value>;

/// Reads a top-level JSON array of objects.
pub fn read_array(reader: impl Read) -> Result<Table, LoadError> {
    let records: Vec<Record> = serde_json::from_reader(reader).map_err(LoadError::Json)?;
    build_table(records)
}

/// Reads JSON Lines: one object per line, blank lines skipped.
pub fn read_lines(reader: impl Read) -> Result<Table, LoadError> {
    let mut records = Vec::new();
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str::<Record>(line).map_err(|source| {
            LoadError::JsonLine {
                line: index + 1,
                source,
            }
        })?;
        records.push(record);
    }
    build_table(records)
}

/// Columns are the union of all keys in first-seen order; absent keys are
/// null.
fn build_table(records: Vec<Record>) -> Result<Table, LoadError> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for record in &records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = Table::new(columns);
    for mut record in records {
        let row = table
            .columns
            .iter()
            .map(|column| record.remove(column).map(json_to_value).unwrap_or(Value::Null))
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

/// Converts a JSON value into a cell.
///
/// Nested arrays and objects are kept as their compact JSON text.
pub fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::String(s),
        nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
            Value::String(nested.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_of_keys() {
        let data = r#"[{"a": 1, "b": "x"}, {"c": true, "a": 2.5}]"#;
        let table = read_array(data.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["a", "b", "c"]);
        assert_eq!(
            table.rows[1],
            vec![Value::Float(2.5), Value::Null, Value::Boolean(true)]
        );
    }

    #[test]
    fn test_bad_line_is_reported() {
        let data = "{\"a\": 1}\n\n{\"a\": \n";
        match read_lines(data.as_bytes()) {
            Err(LoadError::JsonLine { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected a line error, got {other:?}"),
        }
    }
}
