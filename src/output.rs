//! Result rendering for dq tables.
//!
//! Two shapes are supported:
//!
//! - **Text** via [`render()`] - column-aligned table with a rule under the header
//! - **JSON** via [`to_json()`] and [`to_json_pretty()`] - an array of objects,
//!   keys in column order, nested tables as nested arrays
//!
//! # Examples
//!
//! ```
//! use dq_lang::{Table, Value};
//! use dq_lang::output::{render, to_json};
//!
//! let mut table = Table::new(vec!["name".to_string(), "age".to_string()]);
//! table.push_row(vec![Value::String("Alice".into()), Value::Integer(30)]).unwrap();
//!
//! assert_eq!(render(&table), "name  | age\n------+----\nAlice | 30 \n");
//! assert_eq!(to_json(&table), r#"[{"name":"Alice","age":30}]"#);
//! ```

use serde_json::Map;

use crate::{table::Table, value::Value};

/// Renders `table` as aligned text, one line per row.
///
/// Cells are left-aligned and padded to the widest entry of their column;
/// columns are joined with `" | "` and the rule row uses `-+-`. A table
/// without columns renders as the empty string.
pub fn render(table: &Table) -> String {
    if table.columns.is_empty() {
        return String::new();
    }

    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(Value::as_string).collect())
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_line(&mut output, table.columns.iter().map(String::as_str), &widths);

    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    output.push_str(&rule.join("-+-"));
    output.push('\n');

    for row in &cells {
        push_line(&mut output, row.iter().map(String::as_str), &widths);
    }
    output
}

fn push_line<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    output.push_str(&padded.join(" | "));
    output.push('\n');
}

/// Compact JSON array of row objects.
pub fn to_json(table: &Table) -> String {
    table_to_json(table).to_string()
}

/// Pretty-printed JSON with 2-space indentation.
pub fn to_json_pretty(table: &Table) -> String {
    let json = table_to_json(table);
    serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
}

/// Converts a table into a JSON array of objects keyed by column name.
pub fn table_to_json(table: &Table) -> serde_json::Value {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, serde_json::Value> = table
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| (column.clone(), value_to_json(value)))
                .collect();
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(rows)
}

/// Converts one cell; non-finite floats become null.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::Number((*n).into()),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Nested(table) => table_to_json(table),
    }
}
