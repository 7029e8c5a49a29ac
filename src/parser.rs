use thiserror::Error;

use crate::{
    ast::{
        Assignment, BinOp, DEFAULT_NESTED_NAME, Expr, Literal, Operation, Query, RenamePair,
        Source, Token, TokenKind, UnaryOp,
    },
    lexer::{LexError, Lexer},
};

/// Errors raised while parsing a query. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("expected {expected}, got {found} ({text:?}) at position {position}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        text: String,
        position: usize,
    },

    #[error("unknown operation {name:?} at position {position}")]
    UnknownOperation { name: String, position: usize },

    #[error("expected filename at position {position}")]
    MissingFilename { position: usize },

    #[error("{operation}: expected at least one column")]
    MissingColumns { operation: &'static str },

    #[error("rename: expected at least one old/new pair")]
    MissingRenamePair,

    #[error("invalid integer {text:?} at position {position}")]
    InvalidInteger { text: String, position: usize },

    #[error("invalid float {text:?} at position {position}")]
    InvalidFloat { text: String, position: usize },
}

impl ParseError {
    /// Character offset of the offending token, where one is known.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::Lex(LexError::UnterminatedString(p))
            | ParseError::Lex(LexError::UnterminatedIdentifier(p)) => Some(*p),
            ParseError::Lex(LexError::UnexpectedChar { position, .. })
            | ParseError::Lex(LexError::InvalidNumber { position, .. })
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::UnknownOperation { position, .. }
            | ParseError::MissingFilename { position }
            | ParseError::InvalidInteger { position, .. }
            | ParseError::InvalidFloat { position, .. } => Some(*position),
            ParseError::MissingColumns { .. } | ParseError::MissingRenamePair => None,
        }
    }
}

/// Recursive-descent parser over a fully lexed token buffer.
///
/// The source file name is scanned straight from the lexer in its filename
/// mode; everything after it is tokenized once and walked with a cursor, so
/// lookahead never needs to rewind.
pub struct Parser {
    lexer: Lexer,
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Parser {
            lexer,
            tokens: Vec::new(),
            cursor: 0,
        }
    }

    /// Convenience wrapper: parse a complete query string.
    pub fn parse_str(query: &str) -> Result<Query, ParseError> {
        Parser::new(Lexer::new(query)).parse_query()
    }

    fn fill(&mut self) -> Result<(), ParseError> {
        if self.tokens.is_empty() {
            self.tokens = self.lexer.tokenize()?;
            self.cursor = 0;
        }
        Ok(())
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.cursor + offset).min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        let token = self.peek();
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: token.kind,
            text: token.text.clone(),
            position: token.position,
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if !self.check(kind) {
            return Err(self.unexpected(expected));
        }
        Ok(self.advance())
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        if !self.peek().kind.is_identifier() {
            return Err(self.unexpected(expected));
        }
        Ok(self.advance().text)
    }

    /// Parse a complete query: source file, then `| operation` stages.
    pub fn parse_query(&mut self) -> Result<Query, ParseError> {
        let source = self.parse_source()?;
        self.fill()?;

        let mut operations = vec![];
        while self.check(TokenKind::Pipe) {
            self.advance(); // consume |
            operations.push(self.parse_operation()?);
        }

        if !self.check(TokenKind::Eof) {
            return Err(self.unexpected("'|' or end of query"));
        }

        tracing::debug!(
            source = %source.filename,
            operations = operations.len(),
            "parsed query"
        );
        Ok(Query { source, operations })
    }

    /// Parse a standalone expression spanning the whole input.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        self.fill()?;
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Eof, "end of expression")?;
        Ok(expr)
    }

    fn parse_source(&mut self) -> Result<Source, ParseError> {
        let token = self.lexer.scan_filename()?;
        if token.text.is_empty() {
            return Err(ParseError::MissingFilename {
                position: token.position,
            });
        }
        Ok(Source {
            filename: token.text,
        })
    }

    fn parse_operation(&mut self) -> Result<Operation, ParseError> {
        if self.peek().kind != TokenKind::Identifier {
            return Err(self.unexpected("operation name"));
        }
        let token = self.advance();

        match token.text.as_str() {
            "head" => Ok(Operation::Head(self.parse_count_argument("head")?)),
            "tail" => Ok(Operation::Tail(self.parse_count_argument("tail")?)),
            "sorta" => Ok(Operation::SortAsc(self.parse_required_columns("sorta")?)),
            "sortd" => Ok(Operation::SortDesc(self.parse_required_columns("sortd")?)),
            "select" => Ok(Operation::Select(self.parse_required_columns("select")?)),
            "remove" => Ok(Operation::Remove(self.parse_required_columns("remove")?)),
            "distinct" => Ok(Operation::Distinct(self.parse_column_list())),
            "filter" => self.parse_filter(),
            "group" => self.parse_group(),
            "transform" => Ok(Operation::Transform(self.parse_assignments()?)),
            "reduce" => self.parse_reduce(),
            "count" => Ok(Operation::Count),
            "rename" => self.parse_rename(),
            _ => Err(ParseError::UnknownOperation {
                name: token.text,
                position: token.position,
            }),
        }
    }

    fn parse_count_argument(&mut self, operation: &str) -> Result<usize, ParseError> {
        let token = self.expect(TokenKind::Integer, &format!("integer after '{operation}'"))?;
        token
            .text
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidInteger {
                text: token.text.clone(),
                position: token.position,
            })
    }

    /// Reads identifiers until the first token that cannot name a column.
    fn parse_column_list(&mut self) -> Vec<String> {
        let mut columns = vec![];
        while self.peek().kind.is_identifier() {
            columns.push(self.advance().text);
        }
        columns
    }

    fn parse_required_columns(
        &mut self,
        operation: &'static str,
    ) -> Result<Vec<String>, ParseError> {
        let columns = self.parse_column_list();
        if columns.is_empty() {
            return Err(ParseError::MissingColumns { operation });
        }
        Ok(columns)
    }

    fn parse_filter(&mut self) -> Result<Operation, ParseError> {
        self.expect(TokenKind::LBrace, "'{' after 'filter'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RBrace, "'}' to close filter")?;
        Ok(Operation::Filter(condition))
    }

    fn parse_group(&mut self) -> Result<Operation, ParseError> {
        // `as` lexes as a keyword, so the column list stops in front of it
        let columns = self.parse_required_columns("group")?;

        let nested_name = if self.check(TokenKind::As) {
            self.advance();
            self.expect_identifier("nested column name after 'as'")?
        } else {
            DEFAULT_NESTED_NAME.to_string()
        };

        Ok(Operation::Group {
            columns,
            nested_name,
        })
    }

    fn parse_reduce(&mut self) -> Result<Operation, ParseError> {
        // `reduce people n = count()` names the nested column; `reduce n = count()` does not
        let names_nested = self.peek().kind.is_identifier()
            && self.peek_at(1).kind.is_identifier()
            && self.peek_at(2).kind == TokenKind::Assign;

        let nested_name = if names_nested {
            self.advance().text
        } else {
            DEFAULT_NESTED_NAME.to_string()
        };

        let assignments = self.parse_assignments()?;
        Ok(Operation::Reduce {
            nested_name,
            assignments,
        })
    }

    fn parse_rename(&mut self) -> Result<Operation, ParseError> {
        let mut pairs = vec![];
        while self.peek().kind.is_identifier() {
            let old = self.advance().text;
            let new = self.expect_identifier(&format!("new name for column {old:?}"))?;
            pairs.push(RenamePair { old, new });
        }
        if pairs.is_empty() {
            return Err(ParseError::MissingRenamePair);
        }
        Ok(Operation::Rename(pairs))
    }

    /// Comma-separated `column = expr` list.
    fn parse_assignments(&mut self) -> Result<Vec<Assignment>, ParseError> {
        let mut assignments = vec![];

        loop {
            let column = self.expect_identifier("column name in assignment")?;
            self.expect(TokenKind::Assign, &format!("'=' after column {column:?}"))?;
            let expr = self.parse_expression()?;
            assignments.push(Assignment { column, expr });

            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance(); // consume ,
        }

        Ok(assignments)
    }

    fn peek_binary_op(&self) -> Option<BinOp> {
        let op = match self.peek().kind {
            TokenKind::Or => BinOp::Or,
            TokenKind::And => BinOp::And,
            TokenKind::EqEq => BinOp::Equal,
            TokenKind::NotEq => BinOp::NotEqual,
            TokenKind::Lt => BinOp::LessThan,
            TokenKind::Gt => BinOp::GreaterThan,
            TokenKind::LtEq => BinOp::LessEqual,
            TokenKind::GtEq => BinOp::GreaterEqual,
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Subtract,
            TokenKind::Star => BinOp::Multiply,
            TokenKind::Slash => BinOp::Divide,
            _ => return None,
        };
        Some(op)
    }

    /// Parse a full expression.
    ///
    /// A trailing `is [not] null` applies to everything parsed before it at
    /// this level, so `a + b is null` tests the sum. Binary operators may
    /// follow the suffix and take the test as their left operand.
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_unary()?;
        let mut expr = self.parse_binary(first, BinOp::Or.precedence())?;

        while self.check(TokenKind::Is) {
            self.advance(); // consume is
            let negated = self.check(TokenKind::Not);
            if negated {
                self.advance();
            }
            let expected = if negated {
                "'null' after 'is not'"
            } else {
                "'null' after 'is'"
            };
            self.expect(TokenKind::Null, expected)?;

            expr = Expr::is_null(expr, negated);
            expr = self.parse_binary(expr, BinOp::Or.precedence())?;
        }

        Ok(expr)
    }

    /// Precedence climbing: folds operators binding at least `min_precedence`.
    fn parse_binary(&mut self, mut left: Expr, min_precedence: u8) -> Result<Expr, ParseError> {
        while let Some(op) = self.peek_binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();

            let operand = self.parse_unary()?;
            // left-associative: the right side only takes tighter operators
            let right = self.parse_binary(operand, precedence + 1)?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::unary(op, operand))
    }

    /// Parse primary expressions: literals, columns, calls, parentheses
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();

        let expr = match token.kind {
            TokenKind::Integer => {
                self.advance();
                let n = token
                    .text
                    .parse::<i64>()
                    .map_err(|_| ParseError::InvalidInteger {
                        text: token.text.clone(),
                        position: token.position,
                    })?;
                Expr::Literal(Literal::Integer(n))
            }
            TokenKind::Float => {
                self.advance();
                let n = token
                    .text
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidFloat {
                        text: token.text.clone(),
                        position: token.position,
                    })?;
                Expr::Literal(Literal::Float(n))
            }
            TokenKind::String => {
                self.advance();
                Expr::Literal(Literal::String(token.text))
            }
            TokenKind::True => {
                self.advance();
                Expr::Literal(Literal::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Expr::Literal(Literal::Boolean(false))
            }
            TokenKind::Null => {
                self.advance();
                Expr::Literal(Literal::Null)
            }
            TokenKind::QuotedIdentifier => {
                self.advance();
                Expr::Column(token.text)
            }
            TokenKind::Identifier => {
                self.advance();
                if self.check(TokenKind::LParen) {
                    self.parse_function_call(&token.text)?
                } else {
                    Expr::Column(token.text)
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')' to close group")?;
                inner
            }
            _ => return Err(self.unexpected("expression")),
        };

        Ok(expr)
    }

    fn parse_function_call(&mut self, name: &str) -> Result<Expr, ParseError> {
        self.advance(); // consume (
        let name = name.to_lowercase();

        let mut args = vec![];
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance(); // consume ,
            }
        }

        self.expect(TokenKind::RParen, &format!("')' to close call to {name}"))?;
        Ok(Expr::FuncCall { name, args })
    }
}
