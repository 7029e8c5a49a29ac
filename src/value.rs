use std::fmt;

use crate::{ast::Literal, table::Table};

/// Separator placed between the parts of a composite grouping key.
///
/// A control character keeps `("a b", "c")` and `("a", "b c")` apart.
pub const KEY_SEPARATOR: char = '\u{0}';

/// A cell value in a dq table.
///
/// Integers and floats are kept apart: arithmetic on two integers stays
/// integral whenever the result is exact, and aggregates over integer
/// columns produce integers.
///
/// # Examples
///
/// ```
/// use dq_lang::{Table, Value};
///
/// let null = Value::Null;
/// let integer = Value::Integer(42);
/// let float = Value::Float(3.5);
/// let string = Value::String("NY".to_string());
/// let boolean = Value::Boolean(true);
///
/// // Nested tables are produced by `group`
/// let nested = Value::Nested(Table::new(vec!["age".to_string()]));
/// assert_eq!(nested.to_string(), "[]");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing or explicit null
    Null,

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit float
    Float(f64),

    /// UTF-8 string
    String(String),

    /// Boolean
    Boolean(bool),

    /// Sub-table stored in one cell
    Nested(Table),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric coercion. Only integers and floats convert.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean coercion for `and`, `or` and `not`.
    ///
    /// Null counts as `false` here. Anything that is neither a boolean nor
    /// null does not convert.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Null => Some(false),
            _ => None,
        }
    }

    /// Display form of the value; total over every kind.
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Human-readable kind name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Nested(_) => "table",
        }
    }
}

/// Plain notation in the usual range, exponent notation for very small or
/// very large magnitudes (`1e-30`, `1.5e300`).
fn fmt_float(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let magnitude = n.abs();
    if n.is_finite() && magnitude != 0.0 && !(1e-4..1e21).contains(&magnitude) {
        write!(f, "{n:e}")
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => fmt_float(*n, f),
            Value::String(s) => write!(f, "{s}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Nested(table) => {
                write!(f, "[")?;
                for (i, row) in table.rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{{")?;
                    for (j, (column, value)) in table.columns.iter().zip(row).enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{column}:{value}")?;
                    }
                    write!(f, "}}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Float(n) => Value::Float(*n),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Boolean(b) => Value::Boolean(*b),
        }
    }
}

/// Builds the composite key used by `group` and `distinct`.
pub fn composite_key<'a>(values: impl IntoIterator<Item = &'a Value>) -> String {
    let mut key = String::new();
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(&value.as_string());
    }
    key
}
