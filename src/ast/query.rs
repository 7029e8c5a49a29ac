use crate::ast::Operation;

/// Complete query pipeline.
///
/// Represents a full query from the source file to the last operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Input file reference
    pub source: Source,

    /// Pipeline operations, applied in order
    pub operations: Vec<Operation>,
}

/// The file a query reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub filename: String,
}
