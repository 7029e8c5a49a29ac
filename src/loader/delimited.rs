use std::io::Read;

use crate::{
    loader::LoadError,
    table::{Table, check_unique},
    value::Value,
};

/// Reads CSV with a header row. Short rows are padded with nulls, extra
/// fields are dropped.
pub fn read(reader: impl Read) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    check_unique(&columns)?;

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record?;
        let row = (0..table.columns.len())
            .map(|i| record.get(i).map(infer_value).unwrap_or(Value::Null))
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

/// Infers a typed value from a text cell.
///
/// Empty cells and `null` (any case) are null; otherwise integer, float and
/// boolean are tried in that order before falling back to a string.
pub fn infer_value(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(n) = cell.parse::<i64>() {
        return Value::Integer(n);
    }
    if let Ok(n) = cell.parse::<f64>() {
        return Value::Float(n);
    }
    if cell.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    Value::String(cell.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_value() {
        let cases = vec![
            ("", Value::Null),
            ("NULL", Value::Null),
            ("42", Value::Integer(42)),
            ("-7", Value::Integer(-7)),
            ("2.5", Value::Float(2.5)),
            ("True", Value::Boolean(true)),
            ("false", Value::Boolean(false)),
            ("  NY ", Value::String("NY".into())),
        ];
        for (cell, expected) in cases {
            assert_eq!(infer_value(cell), expected, "cell {cell:?}");
        }
    }

    #[test]
    fn test_short_rows_are_padded() {
        let data = "name, age, city\nAlice, 30\nBob, 25, LA, extra\n";
        let table = read(data.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["name", "age", "city"]);
        assert_eq!(table.rows[0][2], Value::Null);
        assert_eq!(table.rows[1][2], Value::String("LA".into()));
    }
}
