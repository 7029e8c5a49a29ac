//! Aggregate-mode evaluation for `reduce`.
//!
//! Inside `reduce`, an expression is evaluated once per nested table rather
//! than once per row. Aggregate calls such as `sum(amount)` collapse one
//! nested column to a single value, and may be combined with literals,
//! arithmetic and unary minus:
//!
//! ```text
//! reduce total = sum(amount), share = sum(amount) * 100 / 12, n = count()
//! ```
//!
//! Bare column references, comparisons, logical operators and scalar
//! functions are rejected because they have no single value over a table.

use std::cmp::Ordering;

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    ast::{Expr, UnaryOp},
    evaluator::{EvalError, SCALAR_FUNCTIONS, apply_unary, arithmetic, exact_decimal},
    table::Table,
    value::Value,
};

/// Evaluates `expr` in aggregate mode over one nested table.
pub fn eval_aggregate(expr: &Expr, nested: &Table) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(literal) => Ok(Value::from(literal)),
        Expr::FuncCall { name, args } => call_aggregate(name, args, nested),
        Expr::Binary { op, left, right } if op.is_arithmetic() => {
            let left = eval_aggregate(left, nested)?;
            let right = eval_aggregate(right, nested)?;
            arithmetic(*op, &left, &right)
        }
        Expr::Binary { op, .. } => Err(EvalError::NotAggregate(format!("operator '{op}'"))),
        Expr::Unary {
            op: UnaryOp::Negate,
            operand,
        } => {
            let operand = eval_aggregate(operand, nested)?;
            apply_unary(UnaryOp::Negate, &operand)
        }
        Expr::Unary { op, .. } => Err(EvalError::NotAggregate(format!("operator '{op}'"))),
        Expr::Column(name) => Err(EvalError::NotAggregate(format!(
            "bare column reference {name:?}"
        ))),
        Expr::IsNull { .. } => Err(EvalError::NotAggregate("'is null'".to_string())),
    }
}

fn call_aggregate(name: &str, args: &[Expr], nested: &Table) -> Result<Value, EvalError> {
    match name {
        // counts rows, whatever the arguments
        "count" => Ok(Value::Integer(nested.len() as i64)),
        "sum" => aggregate_sum(&column_values(name, args, nested)?),
        "avg" => aggregate_avg(&column_values(name, args, nested)?),
        "min" => aggregate_extreme(name, &column_values(name, args, nested)?, Ordering::Less),
        "max" => aggregate_extreme(name, &column_values(name, args, nested)?, Ordering::Greater),
        "first" => Ok(column_values(name, args, nested)?
            .into_iter()
            .next()
            .cloned()
            .unwrap_or(Value::Null)),
        "last" => Ok(column_values(name, args, nested)?
            .into_iter()
            .next_back()
            .cloned()
            .unwrap_or(Value::Null)),
        _ if SCALAR_FUNCTIONS.contains(&name) => Err(EvalError::NotAggregate(format!(
            "non-aggregate function {name:?}"
        ))),
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

/// Non-null values of the single column argument of an aggregate call.
fn column_values<'t>(
    name: &str,
    args: &[Expr],
    nested: &'t Table,
) -> Result<Vec<&'t Value>, EvalError> {
    let [Expr::Column(column)] = args else {
        if args.len() != 1 {
            return Err(EvalError::Arity {
                function: name.to_string(),
                expected: "1 argument",
                found: args.len(),
            });
        }
        return Err(EvalError::TypeError(format!(
            "{name}() argument must be a column reference"
        )));
    };

    let index = nested
        .column_index(column)
        .ok_or_else(|| EvalError::UnknownColumn(column.clone()))?;
    Ok(nested
        .column_values(index)
        .filter(|value| !value.is_null())
        .collect())
}

fn require_numeric(function: &str, values: &[&Value]) -> Result<(), EvalError> {
    match values.iter().find(|value| !value.is_numeric()) {
        Some(value) => Err(EvalError::TypeError(format!(
            "{function}: non-numeric value {value}"
        ))),
        None => Ok(()),
    }
}

/// Exact sum through `Decimal`, or `None` when a value does not fit.
fn decimal_sum(values: &[&Value]) -> Option<Decimal> {
    values.iter().try_fold(Decimal::ZERO, |acc, value| {
        let d = match value {
            Value::Integer(n) => Decimal::from(*n),
            other => exact_decimal(other.as_float()?)?,
        };
        acc.checked_add(d)
    })
}

fn float_sum(values: &[&Value]) -> f64 {
    values.iter().filter_map(|value| value.as_float()).sum()
}

fn aggregate_sum(values: &[&Value]) -> Result<Value, EvalError> {
    require_numeric("sum", values)?;
    if values.is_empty() {
        return Ok(Value::Null);
    }

    if values.iter().all(|value| matches!(value, Value::Integer(_))) {
        let mut total: i64 = 0;
        for value in values {
            if let Value::Integer(n) = value {
                total = total
                    .checked_add(*n)
                    .ok_or_else(|| EvalError::Overflow("sum()".to_string()))?;
            }
        }
        return Ok(Value::Integer(total));
    }

    let total = decimal_sum(values)
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| float_sum(values));
    Ok(Value::Float(total))
}

fn aggregate_avg(values: &[&Value]) -> Result<Value, EvalError> {
    require_numeric("avg", values)?;
    if values.is_empty() {
        return Ok(Value::Null);
    }

    let count = values.len();
    let plain = float_sum(values) / count as f64;
    let average = decimal_sum(values)
        .and_then(|d| d.checked_div(Decimal::from(count as u64)))
        .and_then(|d| d.to_f64())
        .filter(|d| *d != 0.0 || plain == 0.0)
        .unwrap_or(plain);
    Ok(Value::Float(average))
}

/// `min` (wanted = Less) or `max` (wanted = Greater).
///
/// Integer columns keep an integer result; any float contributor turns the
/// result into a float.
fn aggregate_extreme(
    function: &str,
    values: &[&Value],
    wanted: Ordering,
) -> Result<Value, EvalError> {
    require_numeric(function, values)?;

    let mut best: Option<&Value> = None;
    for &value in values {
        let replace = match best {
            None => true,
            Some(current) => numeric_cmp(value, current) == wanted,
        };
        if replace {
            best = Some(value);
        }
    }

    let all_integers = values.iter().all(|value| matches!(value, Value::Integer(_)));
    Ok(match best {
        None => Value::Null,
        Some(value) if all_integers => value.clone(),
        Some(value) => value.as_float().map(Value::Float).unwrap_or(Value::Null),
    })
}

fn numeric_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        _ => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}
