use std::io::Read;

use apache_avro::{Reader, Schema, types::Value as AvroValue};

use crate::{
    loader::LoadError,
    table::{Table, check_unique},
    value::Value,
};

/// Reads an Avro object container file whose schema is a record.
pub fn read(reader: impl Read) -> Result<Table, LoadError> {
    let reader = Reader::new(reader)?;

    let columns: Vec<String> = match reader.writer_schema() {
        Schema::Record(record) => record.fields.iter().map(|f| f.name.clone()).collect(),
        _ => {
            return Err(LoadError::AvroShape(
                "top-level schema must be a record".to_string(),
            ));
        }
    };
    check_unique(&columns)?;

    let mut table = Table::new(columns);
    for datum in reader {
        let AvroValue::Record(mut fields) = datum? else {
            return Err(LoadError::AvroShape("expected a record datum".to_string()));
        };

        let row = table
            .columns
            .iter()
            .map(|column| {
                fields
                    .iter()
                    .position(|(name, _)| name == column)
                    .map(|i| avro_to_value(fields.swap_remove(i).1))
                    .unwrap_or(Value::Null)
            })
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

fn avro_to_value(value: AvroValue) -> Value {
    match value {
        AvroValue::Null => Value::Null,
        AvroValue::Boolean(b) => Value::Boolean(b),
        AvroValue::Int(n) => Value::Integer(n as i64),
        AvroValue::Long(n) => Value::Integer(n),
        AvroValue::Float(n) => Value::Float(n as f64),
        AvroValue::Double(n) => Value::Float(n),
        AvroValue::String(s) => Value::String(s),
        AvroValue::Bytes(bytes) | AvroValue::Fixed(_, bytes) => {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        AvroValue::Enum(_, symbol) => Value::String(symbol),
        AvroValue::Union(_, inner) => avro_to_value(*inner),
        other => match serde_json::Value::try_from(other) {
            Ok(json) => Value::String(json.to_string()),
            Err(_) => Value::Null,
        },
    }
}
