pub mod aggregate;
pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod engine;
pub mod evaluator;
pub mod lexer;
pub mod loader;
pub mod output;
pub mod parser;
pub mod table;
pub mod transform;
pub mod value;

pub use ast::{BinOp, Expr, Operation, Query, Token};
pub use engine::{ExecError, execute, execute_operation};
pub use evaluator::{EvalError, Evaluator};
pub use lexer::{LexError, Lexer};
pub use loader::{Format, LoadError, load};
pub use output::{render, to_json, to_json_pretty};
pub use parser::{ParseError, Parser};
pub use table::{Row, SchemaError, Table};
pub use value::Value;
