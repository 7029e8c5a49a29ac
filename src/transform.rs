use crate::{ast::Assignment, table::Row, value::Value};

/// Output column layout of an assignment stage (`transform` or `reduce`).
///
/// The layout is computed once from the input columns: an assignment to an
/// existing column overwrites it in place, an assignment to a new name
/// appends a column. Every row is then written through the same targets.
///
/// # Examples
///
/// For input columns `[name, age]` and
///
/// ```text
/// transform age = age + 1, label = upper(name)
/// ```
///
/// the output columns are `[name, age, label]` and the targets are `[1, 2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentPlan {
    columns: Vec<String>,
    targets: Vec<usize>,
}

impl AssignmentPlan {
    pub fn new(input: &[String], assignments: &[Assignment]) -> Self {
        let mut columns = input.to_vec();
        let mut targets = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            let target = match columns.iter().position(|c| *c == assignment.column) {
                Some(index) => index,
                None => {
                    columns.push(assignment.column.clone());
                    columns.len() - 1
                }
            };
            targets.push(target);
        }

        AssignmentPlan { columns, targets }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Consumes the plan, yielding the output column names.
    pub fn into_columns(self) -> Vec<String> {
        self.columns
    }

    /// Output row seeded from `row`, with appended columns set to null.
    pub fn seed_row(&self, row: &[Value]) -> Row {
        let mut output = Vec::with_capacity(self.columns.len());
        output.extend_from_slice(row);
        output.resize(self.columns.len(), Value::Null);
        output
    }

    /// Writes the result of assignment `index` into `output`.
    pub fn assign(&self, output: &mut Row, index: usize, value: Value) {
        output[self.targets[index]] = value;
    }
}
