use crate::ast::Expr;

/// Nested column name used by `group` and `reduce` when none is given.
pub const DEFAULT_NESTED_NAME: &str = "grouped";

/// Pipeline operation.
///
/// Each operation consumes the table produced by the previous stage and
/// produces a new one.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// First `n` rows
    ///
    /// # Example
    /// ```text
    /// head 10
    /// ```
    Head(usize),

    /// Last `n` rows
    Tail(usize),

    /// Stable ascending sort by one or more columns
    ///
    /// # Example
    /// ```text
    /// sorta city age
    /// ```
    SortAsc(Vec<String>),

    /// Stable descending sort by one or more columns
    SortDesc(Vec<String>),

    /// Projection in the given order
    Select(Vec<String>),

    /// Keeps rows for which the expression is `true`
    ///
    /// # Example
    /// ```text
    /// filter { age > 30 and city == "NY" }
    /// ```
    Filter(Expr),

    /// Partitions rows by key columns, nesting the remaining columns
    ///
    /// # Example
    /// ```text
    /// group city as people
    /// ```
    Group {
        columns: Vec<String>,
        nested_name: String,
    },

    /// Computes or overwrites columns row by row
    ///
    /// # Example
    /// ```text
    /// transform total = price * quantity, label = upper(name)
    /// ```
    Transform(Vec<Assignment>),

    /// Aggregates over the nested table of each row
    ///
    /// # Example
    /// ```text
    /// reduce people n = count(), oldest = max(age)
    /// ```
    Reduce {
        nested_name: String,
        assignments: Vec<Assignment>,
    },

    /// Replaces the table with its row count
    Count,

    /// First row for each distinct value tuple; all columns when empty
    Distinct(Vec<String>),

    /// Renames columns
    ///
    /// # Example
    /// ```text
    /// rename name first_name city town
    /// ```
    Rename(Vec<RenamePair>),

    /// Drops columns
    Remove(Vec<String>),
}

impl Operation {
    /// Keyword that introduces the operation in a query.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Head(_) => "head",
            Operation::Tail(_) => "tail",
            Operation::SortAsc(_) => "sorta",
            Operation::SortDesc(_) => "sortd",
            Operation::Select(_) => "select",
            Operation::Filter(_) => "filter",
            Operation::Group { .. } => "group",
            Operation::Transform(_) => "transform",
            Operation::Reduce { .. } => "reduce",
            Operation::Count => "count",
            Operation::Distinct(_) => "distinct",
            Operation::Rename(_) => "rename",
            Operation::Remove(_) => "remove",
        }
    }
}

/// `column = expr` inside `transform` or `reduce`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub expr: Expr,
}

/// One `old new` pair of a `rename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePair {
    pub old: String,
    pub new: String,
}
