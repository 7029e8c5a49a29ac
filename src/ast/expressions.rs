use crate::ast::{BinOp, UnaryOp};

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Expressions appear in `filter { ... }` bodies and on the right-hand side
/// of `transform` and `reduce` assignments. A tree is owned by the
/// operation that holds it and never changes after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.5
    /// "NY"
    /// true
    /// null
    /// ```
    Literal(Literal),

    /// Column reference, bare or backtick-quoted
    ///
    /// # Examples
    /// ```text
    /// age
    /// `first name`
    /// ```
    Column(String),

    /// Binary operation (arithmetic, comparison, logical)
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation (`not`, `-`)
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Function call; the name is lower-cased by the parser
    ///
    /// # Examples
    /// ```text
    /// upper(name)
    /// coalesce(price, 0)
    /// sum(total)
    /// ```
    FuncCall { name: String, args: Vec<Expr> },

    /// `is null` / `is not null` test
    ///
    /// Wraps the whole expression chain that precedes the suffix.
    IsNull { operand: Box<Expr>, negated: bool },
}

/// Literal values as written in a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn is_null(operand: Expr, negated: bool) -> Self {
        Expr::IsNull {
            operand: Box::new(operand),
            negated,
        }
    }
}
