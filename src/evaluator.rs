use std::{cell::RefCell, cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, UnaryOp},
    value::Value,
};

/// Aggregate function names; only meaningful inside `reduce`.
pub const AGGREGATE_FUNCTIONS: &[&str] = &["count", "sum", "avg", "min", "max", "first", "last"];

/// Scalar function names understood in row mode.
pub const SCALAR_FUNCTIONS: &[&str] = &[
    "upper",
    "lower",
    "trim",
    "len",
    "substr",
    "coalesce",
    "if",
    "year",
    "month",
    "day",
    "contains",
    "startswith",
    "endswith",
    "matches",
];

/// Errors that can occur while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Column reference that the current row does not have
    #[error("column {0:?} not found")]
    UnknownColumn(String),

    #[error("unknown function {0:?}")]
    UnknownFunction(String),

    /// Wrong number of arguments to a function
    #[error("{function}() takes {expected}, got {found}")]
    Arity {
        function: String,
        expected: &'static str,
        found: usize,
    },

    /// Operand kinds the operator or function cannot work with
    #[error("type error: {0}")]
    TypeError(String),

    #[error("{context} requires a boolean, got {found}")]
    NotBoolean {
        context: &'static str,
        found: &'static str,
    },

    #[error("{function}(): cannot parse {input:?} as a date")]
    DateParse {
        function: &'static str,
        input: String,
    },

    #[error("integer overflow in {0}")]
    Overflow(String),

    #[error("aggregate function {0:?} can only be used inside 'reduce'")]
    AggregateOutsideReduce(String),

    /// Construct that has no meaning over a whole nested table
    #[error("{0} is not allowed inside 'reduce'")]
    NotAggregate(String),

    #[error("invalid regex {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },
}

/// Row-mode expression evaluator.
///
/// An evaluator is built once per pipeline stage from the table's column
/// names, then applied to every row of that table. Column references are
/// resolved through a precomputed name index and regular expressions used by
/// `matches()` are compiled once per evaluator.
///
/// # Examples
///
/// ```
/// use dq_lang::{Evaluator, Value};
/// use dq_lang::parser::Parser;
/// use dq_lang::lexer::Lexer;
///
/// let columns = vec!["age".to_string()];
/// let expr = Parser::new(Lexer::new("age * 2 + 1")).parse().unwrap();
///
/// let evaluator = Evaluator::new(&columns);
/// let result = evaluator.eval(&expr, &[Value::Integer(20)]).unwrap();
/// assert_eq!(result, Value::Integer(41));
/// ```
pub struct Evaluator {
    columns: HashMap<String, usize>,
    patterns: RefCell<HashMap<String, Regex>>,
}

impl Evaluator {
    pub fn new(columns: &[String]) -> Self {
        Evaluator {
            columns: columns
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect(),
            patterns: RefCell::new(HashMap::new()),
        }
    }

    /// Evaluates `expr` against one row laid out like the evaluator's columns.
    pub fn eval(&self, expr: &Expr, row: &[Value]) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),
            Expr::Column(name) => self
                .columns
                .get(name)
                .and_then(|&i| row.get(i))
                .cloned()
                .ok_or_else(|| EvalError::UnknownColumn(name.clone())),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, row)?;
                let right = self.eval(right, row)?;
                apply_binop(*op, &left, &right)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand, row)?;
                apply_unary(*op, &operand)
            }
            Expr::IsNull { operand, negated } => {
                let is_null = self.eval(operand, row)?.is_null();
                Ok(Value::Boolean(is_null != *negated))
            }
            Expr::FuncCall { name, args } => self.call(name, args, row),
        }
    }

    fn call(&self, name: &str, args: &[Expr], row: &[Value]) -> Result<Value, EvalError> {
        match name {
            "upper" => self.string_fn(name, args, row, |s| Value::String(s.to_uppercase())),
            "lower" => self.string_fn(name, args, row, |s| Value::String(s.to_lowercase())),
            "trim" => self.string_fn(name, args, row, |s| Value::String(s.trim().to_string())),
            "len" => self.string_fn(name, args, row, |s| {
                Value::Integer(s.chars().count() as i64)
            }),
            "substr" => self.call_substr(args, row),
            "coalesce" => self.call_coalesce(args, row),
            "if" => self.call_if(args, row),
            "year" => self.call_date_part("year", args, row),
            "month" => self.call_date_part("month", args, row),
            "day" => self.call_date_part("day", args, row),
            "contains" => self.string_predicate(name, args, row, |s, p| Ok(s.contains(p))),
            "startswith" => self.string_predicate(name, args, row, |s, p| Ok(s.starts_with(p))),
            "endswith" => self.string_predicate(name, args, row, |s, p| Ok(s.ends_with(p))),
            "matches" => {
                self.string_predicate(name, args, row, |s, p| Ok(self.regex(p)?.is_match(s)))
            }
            _ if AGGREGATE_FUNCTIONS.contains(&name) => {
                Err(EvalError::AggregateOutsideReduce(name.to_string()))
            }
            _ => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }

    /// One-argument string functions: null in, null out; other values are
    /// stringified first.
    fn string_fn(
        &self,
        name: &str,
        args: &[Expr],
        row: &[Value],
        f: impl Fn(&str) -> Value,
    ) -> Result<Value, EvalError> {
        check_arity(name, args, 1, "1 argument")?;
        match self.eval(&args[0], row)? {
            Value::Null => Ok(Value::Null),
            value => Ok(f(&value.as_string())),
        }
    }

    fn string_predicate(
        &self,
        name: &str,
        args: &[Expr],
        row: &[Value],
        f: impl Fn(&str, &str) -> Result<bool, EvalError>,
    ) -> Result<Value, EvalError> {
        check_arity(name, args, 2, "2 arguments")?;
        let subject = self.eval(&args[0], row)?;
        let pattern = match self.eval(&args[1], row)? {
            Value::String(s) => s,
            other => {
                return Err(EvalError::TypeError(format!(
                    "{name}() second argument must be a string, got {}",
                    other.type_name()
                )));
            }
        };
        if subject.is_null() {
            return Ok(Value::Null);
        }
        Ok(Value::Boolean(f(&subject.as_string(), &pattern)?))
    }

    fn regex(&self, pattern: &str) -> Result<Regex, EvalError> {
        if let Some(re) = self.patterns.borrow().get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(pattern).map_err(|e| EvalError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.patterns
            .borrow_mut()
            .insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    /// substr(s, start, length), character based, clamped to the string.
    fn call_substr(&self, args: &[Expr], row: &[Value]) -> Result<Value, EvalError> {
        check_arity("substr", args, 3, "3 arguments (string, start, length)")?;
        let subject = self.eval(&args[0], row)?;
        if subject.is_null() {
            return Ok(Value::Null);
        }
        let s = subject.as_string();

        let start = self.eval(&args[1], row)?.as_float().ok_or_else(|| {
            EvalError::TypeError("substr: start must be a number".to_string())
        })?;
        let length = self.eval(&args[2], row)?.as_float().ok_or_else(|| {
            EvalError::TypeError("substr: length must be a number".to_string())
        })?;

        let start = start.max(0.0) as usize;
        let length = length.max(0.0) as usize;
        Ok(Value::String(s.chars().skip(start).take(length).collect()))
    }

    fn call_coalesce(&self, args: &[Expr], row: &[Value]) -> Result<Value, EvalError> {
        if args.is_empty() {
            return Err(EvalError::Arity {
                function: "coalesce".to_string(),
                expected: "at least 1 argument",
                found: 0,
            });
        }
        for arg in args {
            let value = self.eval(arg, row)?;
            if !value.is_null() {
                return Ok(value);
            }
        }
        Ok(Value::Null)
    }

    /// if(cond, then, else); only the taken branch is evaluated.
    fn call_if(&self, args: &[Expr], row: &[Value]) -> Result<Value, EvalError> {
        check_arity("if", args, 3, "3 arguments (condition, then, else)")?;
        let condition = self.eval(&args[0], row)?;
        let taken = condition.as_bool().ok_or(EvalError::NotBoolean {
            context: "if() condition",
            found: condition.type_name(),
        })?;
        if taken {
            self.eval(&args[1], row)
        } else {
            self.eval(&args[2], row)
        }
    }

    fn call_date_part(
        &self,
        function: &'static str,
        args: &[Expr],
        row: &[Value],
    ) -> Result<Value, EvalError> {
        check_arity(function, args, 1, "1 argument")?;
        let input = match self.eval(&args[0], row)? {
            Value::Null => return Ok(Value::Null),
            Value::String(s) => s,
            other => {
                return Err(EvalError::DateParse {
                    function,
                    input: other.as_string(),
                });
            }
        };

        let date = parse_date(&input).ok_or_else(|| EvalError::DateParse {
            function,
            input: input.clone(),
        })?;

        let part = match function {
            "year" => date.year() as i64,
            "month" => date.month() as i64,
            _ => date.day() as i64,
        };
        Ok(Value::Integer(part))
    }
}

fn check_arity(
    function: &str,
    args: &[Expr],
    count: usize,
    expected: &'static str,
) -> Result<(), EvalError> {
    if args.len() != count {
        return Err(EvalError::Arity {
            function: function.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

/// Tries the accepted date layouts in order; the first match wins.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        // the calendar date in the timestamp's own offset
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    ["%m/%d/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(input, layout).ok())
}

/// Applies a binary operator to two evaluated operands.
pub fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if op.is_arithmetic() {
        arithmetic(op, left, right)
    } else if op.is_comparison() {
        compare(op, left, right)
    } else {
        let context = if op == BinOp::And { "'and'" } else { "'or'" };
        let l = left.as_bool().ok_or(EvalError::NotBoolean {
            context,
            found: left.type_name(),
        })?;
        let r = right.as_bool().ok_or(EvalError::NotBoolean {
            context,
            found: right.type_name(),
        })?;
        Ok(Value::Boolean(if op == BinOp::And { l && r } else { l || r }))
    }
}

pub fn apply_unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => {
            let b = operand.as_bool().ok_or(EvalError::NotBoolean {
                context: "'not'",
                found: operand.type_name(),
            })?;
            Ok(Value::Boolean(!b))
        }
        UnaryOp::Negate => match operand {
            Value::Null => Ok(Value::Null),
            Value::Integer(n) => n
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| EvalError::Overflow(format!("-{n}"))),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Err(EvalError::TypeError(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        },
    }
}

/// `+ - * /` with null propagation.
///
/// Two integers stay integral, except for a division with a remainder.
/// Division by zero yields null. `string + string` concatenates.
pub fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::String(a), Value::String(b)) if op == BinOp::Add => {
            Ok(Value::String(format!("{a}{b}")))
        }
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(float_arithmetic(op, a, b)),
            _ => Err(EvalError::TypeError(format!(
                "cannot perform {op} on {} and {}",
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

fn integer_arithmetic(op: BinOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let overflow = || EvalError::Overflow(format!("{a} {op} {b}"));
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        _ => {
            if b == 0 {
                return Ok(Value::Null);
            }
            let remainder = a.checked_rem(b).ok_or_else(overflow)?;
            if remainder != 0 {
                return Ok(float_arithmetic(op, a as f64, b as f64));
            }
            a.checked_div(b)
        }
    };
    result.map(Value::Integer).ok_or_else(overflow)
}

/// Float arithmetic through `Decimal` when both sides are representable,
/// plain `f64` otherwise.
fn float_arithmetic(op: BinOp, a: f64, b: f64) -> Value {
    if op == BinOp::Divide && b == 0.0 {
        return Value::Null;
    }

    let plain = match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        _ => a / b,
    };

    let decimal = exact_decimal(a)
        .zip(exact_decimal(b))
        .and_then(|(ad, bd)| match op {
            BinOp::Add => ad.checked_add(bd),
            BinOp::Subtract => ad.checked_sub(bd),
            BinOp::Multiply => ad.checked_mul(bd),
            BinOp::Divide => ad.checked_div(bd),
            _ => None,
        })
        .and_then(|rd| rd.to_f64())
        // underflow past 28 places rounds to zero without failing
        .filter(|rd| *rd != 0.0 || plain == 0.0);

    Value::Float(decimal.unwrap_or(plain))
}

/// Converts `x` to `Decimal` only when the conversion round-trips, so
/// magnitudes beyond 28 decimal places are never silently rounded.
pub(crate) fn exact_decimal(x: f64) -> Option<Decimal> {
    Decimal::from_f64(x).filter(|d| d.to_f64() == Some(x))
}

/// Comparison operators.
///
/// Null equals only null; ordering against null yields null. Strings
/// compare lexically, booleans support only equality and numbers compare
/// numerically across integer and float.
pub fn compare(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.is_null() || right.is_null() {
        let both = left.is_null() && right.is_null();
        return Ok(match op {
            BinOp::Equal => Value::Boolean(both),
            BinOp::NotEqual => Value::Boolean(!both),
            _ => Value::Null,
        });
    }

    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => match op {
            BinOp::Equal => return Ok(Value::Boolean(a == b)),
            BinOp::NotEqual => return Ok(Value::Boolean(a != b)),
            _ => {
                return Err(EvalError::TypeError(format!(
                    "cannot use {op} on booleans"
                )));
            }
        },
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => {
                return Err(EvalError::TypeError(format!(
                    "cannot compare {} with {}",
                    left.type_name(),
                    right.type_name()
                )));
            }
        },
    };

    let result = match op {
        BinOp::Equal => ordering == Ordering::Equal,
        BinOp::NotEqual => ordering != Ordering::Equal,
        BinOp::LessThan => ordering == Ordering::Less,
        BinOp::GreaterThan => ordering == Ordering::Greater,
        BinOp::LessEqual => ordering != Ordering::Greater,
        _ => ordering != Ordering::Less,
    };
    Ok(Value::Boolean(result))
}
