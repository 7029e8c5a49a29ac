use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use thiserror::Error;

use crate::{
    aggregate::eval_aggregate,
    ast::{Assignment, Expr, Operation, Query, RenamePair},
    evaluator::{EvalError, Evaluator},
    table::{Row, SchemaError, Table, check_unique},
    transform::AssignmentPlan,
    value::{Value, composite_key},
};

/// Errors raised while running a pipeline. Each carries the stage it came from.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error("{stage}: {source}")]
    Eval { stage: String, source: EvalError },

    #[error("{stage}: {source}")]
    Schema { stage: String, source: SchemaError },

    #[error("filter: expression did not return boolean, got {0}")]
    FilterNotBoolean(String),
}

fn schema_error(stage: &str) -> impl FnOnce(SchemaError) -> ExecError + '_ {
    move |source| ExecError::Schema {
        stage: stage.to_string(),
        source,
    }
}

fn eval_error(stage: impl Into<String>) -> impl FnOnce(EvalError) -> ExecError {
    let stage = stage.into();
    move |source| ExecError::Eval { stage, source }
}

/// Runs every operation of `query` over `input`, in order.
///
/// Each stage consumes the table produced by the previous one. The first
/// failing stage aborts the pipeline and no partial result is returned.
///
/// # Examples
///
/// ```
/// use dq_lang::{Parser, Table, Value, execute};
///
/// let mut input = Table::new(vec!["name".to_string(), "age".to_string()]);
/// input.push_row(vec![Value::String("Alice".into()), Value::Integer(30)]).unwrap();
/// input.push_row(vec![Value::String("Bob".into()), Value::Integer(25)]).unwrap();
///
/// let query = Parser::parse_str("users.csv | filter { age > 28 } | select name").unwrap();
/// let result = execute(&query, input).unwrap();
///
/// assert_eq!(result.columns, vec!["name"]);
/// assert_eq!(result.rows, vec![vec![Value::String("Alice".into())]]);
/// ```
pub fn execute(query: &Query, input: Table) -> Result<Table, ExecError> {
    query
        .operations
        .iter()
        .try_fold(input, |table, operation| execute_operation(operation, table))
}

/// Applies one pipeline operation to `table`.
pub fn execute_operation(operation: &Operation, table: Table) -> Result<Table, ExecError> {
    let rows_in = table.len();

    let result = match operation {
        Operation::Head(n) => head(*n, table),
        Operation::Tail(n) => tail(*n, table),
        Operation::SortAsc(columns) => sort(columns, false, table)?,
        Operation::SortDesc(columns) => sort(columns, true, table)?,
        Operation::Select(columns) => select(columns, table)?,
        Operation::Filter(condition) => filter(condition, table)?,
        Operation::Group {
            columns,
            nested_name,
        } => group(columns, nested_name, table)?,
        Operation::Transform(assignments) => transform(assignments, table)?,
        Operation::Reduce {
            nested_name,
            assignments,
        } => reduce(nested_name, assignments, table)?,
        Operation::Count => count(table),
        Operation::Distinct(columns) => distinct(columns, table),
        Operation::Rename(pairs) => rename(pairs, table)?,
        Operation::Remove(columns) => remove(columns, table)?,
    };

    tracing::debug!(
        operation = operation.name(),
        rows_in,
        rows_out = result.len(),
        columns = result.columns.len(),
        "executed stage"
    );
    Ok(result)
}

fn head(n: usize, mut table: Table) -> Table {
    table.rows.truncate(n);
    table
}

fn tail(n: usize, mut table: Table) -> Table {
    let skip = table.rows.len().saturating_sub(n);
    table.rows.drain(..skip);
    table
}

fn column_indices(
    stage: &str,
    table: &Table,
    columns: &[String],
) -> Result<Vec<usize>, ExecError> {
    columns
        .iter()
        .map(|column| table.require_column(column).map_err(schema_error(stage)))
        .collect()
}

/// Stable multi-key sort. Nulls go last in both directions.
fn sort(columns: &[String], descending: bool, mut table: Table) -> Result<Table, ExecError> {
    let stage = if descending { "sortd" } else { "sorta" };
    let indices = column_indices(stage, &table, columns)?;

    table.rows.sort_by(|a, b| {
        indices
            .iter()
            .map(|&i| sort_cmp(&a[i], &b[i], descending))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    Ok(table)
}

fn sort_cmp(a: &Value, b: &Value, descending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) if descending => value_cmp(a, b).reverse(),
        (false, false) => value_cmp(a, b),
    }
}

/// Ordering of two non-null values: numeric when both are numbers, by
/// display text otherwise.
fn value_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        _ => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.as_string().cmp(&b.as_string()),
        },
    }
}

fn project(rows: Vec<Row>, indices: &[usize]) -> Vec<Row> {
    rows.into_iter()
        .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
        .collect()
}

fn select(columns: &[String], table: Table) -> Result<Table, ExecError> {
    let indices = column_indices("select", &table, columns)?;
    check_unique(columns).map_err(schema_error("select"))?;

    Ok(Table {
        columns: columns.to_vec(),
        rows: project(table.rows, &indices),
    })
}

fn filter(condition: &Expr, table: Table) -> Result<Table, ExecError> {
    let evaluator = Evaluator::new(&table.columns);
    let mut rows = Vec::new();

    for row in table.rows {
        match evaluator.eval(condition, &row).map_err(eval_error("filter"))? {
            Value::Boolean(true) => rows.push(row),
            Value::Boolean(false) => {}
            // null is not a truth value here, unlike in `and`/`or`/`not`
            other => return Err(ExecError::FilterNotBoolean(other.type_name().to_string())),
        }
    }

    Ok(Table {
        columns: table.columns,
        rows,
    })
}

/// Partitions rows by the key columns; the complement columns of each
/// partition become one nested table.
fn group(columns: &[String], nested_name: &str, table: Table) -> Result<Table, ExecError> {
    let key_indices = column_indices("group", &table, columns)?;

    let mut output_columns = columns.to_vec();
    output_columns.push(nested_name.to_string());
    check_unique(&output_columns).map_err(schema_error("group"))?;

    let nested_indices: Vec<usize> = (0..table.columns.len())
        .filter(|i| !key_indices.contains(i))
        .collect();
    let nested_columns: Vec<String> = nested_indices
        .iter()
        .map(|&i| table.columns[i].clone())
        .collect();

    // first-seen order of keys is preserved
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Row, Table)> = Vec::new();

    for row in table.rows {
        let key_values: Row = key_indices.iter().map(|&i| row[i].clone()).collect();
        let key = composite_key(&key_values);

        let position = *positions.entry(key).or_insert_with(|| {
            groups.push((key_values, Table::new(nested_columns.clone())));
            groups.len() - 1
        });

        let nested_row: Row = row
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !key_indices.contains(i))
            .map(|(_, value)| value)
            .collect();
        groups[position].1.rows.push(nested_row);
    }

    let rows = groups
        .into_iter()
        .map(|(mut key_values, nested)| {
            key_values.push(Value::Nested(nested));
            key_values
        })
        .collect();

    Ok(Table {
        columns: output_columns,
        rows,
    })
}

fn transform(assignments: &[Assignment], table: Table) -> Result<Table, ExecError> {
    let plan = AssignmentPlan::new(&table.columns, assignments);
    let evaluator = Evaluator::new(&table.columns);
    let mut rows = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let mut output = plan.seed_row(row);
        // every assignment sees the input row, not earlier assignments
        for (i, assignment) in assignments.iter().enumerate() {
            let value = evaluator
                .eval(&assignment.expr, row)
                .map_err(eval_error(format!("transform {:?}", assignment.column)))?;
            plan.assign(&mut output, i, value);
        }
        rows.push(output);
    }

    Ok(Table {
        columns: plan.into_columns(),
        rows,
    })
}

fn reduce(
    nested_name: &str,
    assignments: &[Assignment],
    table: Table,
) -> Result<Table, ExecError> {
    let nested_index = table
        .require_column(nested_name)
        .map_err(schema_error("reduce"))?;
    let plan = AssignmentPlan::new(&table.columns, assignments);
    let mut rows = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let Value::Nested(nested) = &row[nested_index] else {
            return Err(ExecError::Schema {
                stage: "reduce".to_string(),
                source: SchemaError::NotNested(nested_name.to_string()),
            });
        };

        let mut output = plan.seed_row(row);
        for (i, assignment) in assignments.iter().enumerate() {
            let value = eval_aggregate(&assignment.expr, nested)
                .map_err(eval_error(format!("reduce {:?}", assignment.column)))?;
            plan.assign(&mut output, i, value);
        }
        rows.push(output);
    }

    Ok(Table {
        columns: plan.into_columns(),
        rows,
    })
}

fn count(table: Table) -> Table {
    Table {
        columns: vec!["count".to_string()],
        rows: vec![vec![Value::Integer(table.len() as i64)]],
    }
}

/// Keeps the first row of each distinct value tuple.
///
/// An unknown column yields an empty table with the input's columns rather
/// than an error.
fn distinct(columns: &[String], table: Table) -> Table {
    let indices: Vec<usize> = if columns.is_empty() {
        (0..table.columns.len()).collect()
    } else {
        match columns
            .iter()
            .map(|column| table.column_index(column))
            .collect::<Option<Vec<_>>>()
        {
            Some(indices) => indices,
            None => return Table::new(table.columns),
        }
    };

    let mut seen = HashSet::new();
    let rows = table
        .rows
        .into_iter()
        .filter(|row| seen.insert(composite_key(indices.iter().map(|&i| &row[i]))))
        .collect();

    Table {
        columns: table.columns,
        rows,
    }
}

/// Renames columns in place; rows are passed through untouched.
fn rename(pairs: &[RenamePair], table: Table) -> Result<Table, ExecError> {
    let mut columns = table.columns;

    for pair in pairs {
        let index = columns
            .iter()
            .position(|c| *c == pair.old)
            .ok_or_else(|| ExecError::Schema {
                stage: "rename".to_string(),
                source: SchemaError::UnknownColumn(pair.old.clone()),
            })?;
        columns[index] = pair.new.clone();
    }
    check_unique(&columns).map_err(schema_error("rename"))?;

    Ok(Table {
        columns,
        rows: table.rows,
    })
}

fn remove(columns: &[String], table: Table) -> Result<Table, ExecError> {
    let removed = column_indices("remove", &table, columns)?;

    let kept: Vec<usize> = (0..table.columns.len())
        .filter(|i| !removed.contains(i))
        .collect();
    let kept_columns = kept.iter().map(|&i| table.columns[i].clone()).collect();

    Ok(Table {
        columns: kept_columns,
        rows: project(table.rows, &kept),
    })
}

#[test]
fn test_sort_nulls_last_both_directions() {
    let values = [Value::Integer(2), Value::Null, Value::Integer(1)];
    let mut ascending = values.to_vec();
    ascending.sort_by(|a, b| sort_cmp(a, b, false));
    assert_eq!(ascending, vec![Value::Integer(1), Value::Integer(2), Value::Null]);

    let mut descending = values.to_vec();
    descending.sort_by(|a, b| sort_cmp(a, b, true));
    assert_eq!(descending, vec![Value::Integer(2), Value::Integer(1), Value::Null]);
}

#[test]
fn test_value_cmp_mixed_kinds() {
    assert_eq!(value_cmp(&Value::Integer(2), &Value::Float(1.5)), Ordering::Greater);
    assert_eq!(
        value_cmp(&Value::String("10".into()), &Value::Integer(9)),
        Ordering::Less
    );
}
