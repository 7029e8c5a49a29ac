//! # dq Query Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for the dq query language,
//! a small pipeline language for flat tabular files in the spirit of a shell
//! text filter, but operating on typed rows and columns.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, columns, operations, calls)
//! - **[operators]** - Binary and unary operators
//! - **[operations]** - Pipeline operations (filter, group, reduce, ...)
//! - **[query]** - Complete query structure: source file plus operations
//!
//! ## Quick Start
//!
//! ```text
//! users.csv | filter { age > 28 } | select name city
//! ```
//!
//! This query keeps users older than 28 and returns their names and cities.
//!
//! ## Core Concepts
//!
//! ### Pipeline Structure
//!
//! Every query starts with a file and chains operations with `|`:
//!
//! ```text
//! file | operation | operation | ...
//! ```
//!
//! The file name is scanned greedily up to the first whitespace or `|`, so
//! paths such as `data/2024/sales.csv` need no quoting. Names with spaces use
//! backticks.
//!
//! ### Grouping
//!
//! `group` partitions rows by key columns and stores the remaining columns as
//! a nested table in a single cell. `reduce` then aggregates over that nested
//! table, one output value per group:
//!
//! ```text
//! sales.csv | group region | reduce total = sum(amount), n = count() | remove grouped
//! ```
//!
//! ### Type System
//!
//! Cells are null, integer, float, string, boolean, or nested table. Integer
//! arithmetic stays integral when the result is exact; any null operand makes
//! an arithmetic result null.
//!
//! ## Examples
//!
//! ### Null Handling
//!
//! ```text
//! orders.json | transform total = coalesce(quantity, 0) * coalesce(price, 0)
//! ```
//!
//! ### Sorting and Slicing
//!
//! ```text
//! users.csv | sortd age | head 3
//! ```
//!
//! ### Null Tests
//!
//! ```text
//! users.csv | filter { email is not null }
//! ```
pub mod expressions;
pub mod operations;
pub mod operators;
pub mod query;
pub mod tokens;

pub use expressions::{Expr, Literal};
pub use operations::{Assignment, DEFAULT_NESTED_NAME, Operation, RenamePair};
pub use operators::{BinOp, UnaryOp};
pub use query::{Query, Source};
pub use tokens::{Token, TokenKind};
