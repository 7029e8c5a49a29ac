use std::fs::File;

use parquet::{
    file::reader::{FileReader, SerializedFileReader},
    record::Field,
};

use crate::{
    loader::LoadError,
    table::{Table, check_unique},
    value::Value,
};

/// Reads a Parquet file through the row API; top-level fields are columns.
pub fn read(file: File) -> Result<Table, LoadError> {
    let reader = SerializedFileReader::new(file)?;

    let columns: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema()
        .get_fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();
    check_unique(&columns)?;

    let mut table = Table::new(columns);
    for row in reader.get_row_iter(None)? {
        let row = row?;
        let values = row
            .get_column_iter()
            .map(|(_, field)| field_to_value(field))
            .collect();
        table.push_row(values)?;
    }
    Ok(table)
}

fn field_to_value(field: &Field) -> Value {
    match field {
        Field::Null => Value::Null,
        Field::Bool(b) => Value::Boolean(*b),
        Field::Byte(n) => Value::Integer(*n as i64),
        Field::Short(n) => Value::Integer(*n as i64),
        Field::Int(n) => Value::Integer(*n as i64),
        Field::Long(n) => Value::Integer(*n),
        Field::UByte(n) => Value::Integer(*n as i64),
        Field::UShort(n) => Value::Integer(*n as i64),
        Field::UInt(n) => Value::Integer(*n as i64),
        Field::ULong(n) => i64::try_from(*n)
            .map(Value::Integer)
            .unwrap_or(Value::Float(*n as f64)),
        Field::Float(n) => Value::Float(*n as f64),
        Field::Double(n) => Value::Float(*n),
        Field::Str(s) => Value::String(s.clone()),
        Field::Bytes(bytes) => match bytes.as_utf8() {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::String(field.to_string()),
        },
        // dates, timestamps, decimals and nested groups
        other => Value::String(other.to_string()),
    }
}
