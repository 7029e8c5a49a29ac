use std::fmt;

/// Kind of a lexical token.
///
/// The literal text of the token (identifier name, number digits, decoded
/// string contents) travels separately in [`Token::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural
    /// Pipeline separator (`|`)
    Pipe,
    /// Opens a filter body (`{`)
    LBrace,
    /// Closes a filter body (`}`)
    RBrace,
    /// Left parenthesis for grouping or function calls
    LParen,
    /// Right parenthesis
    RParen,
    /// Separates assignments and function arguments
    Comma,
    /// Assignment (`=`) in `transform` and `reduce`
    Assign,
    /// A lone dot
    Dot,

    // Arithmetic
    /// Addition or string concatenation
    Plus,
    /// Subtraction or unary minus
    Minus,
    /// Multiplication
    Star,
    /// Division
    Slash,

    // Comparison
    /// Equality operator
    EqEq,
    /// Inequality operator
    NotEq,
    /// Less than
    Lt,
    /// Greater than
    Gt,
    /// Less than or equal
    LtEq,
    /// Greater than or equal
    GtEq,

    // Keywords
    /// Logical AND (word, not symbol)
    ///
    /// # Examples
    /// ```text
    /// age > 18 and city == "NY"
    /// ```
    And,
    /// Logical OR (word, not symbol)
    Or,
    /// Logical negation, also part of `is not null`
    Not,
    /// Start of the `is [not] null` suffix
    Is,
    /// Boolean literal `true`
    True,
    /// Boolean literal `false`
    False,
    /// Null literal
    Null,
    /// Names the nested column of a `group`
    ///
    /// # Examples
    /// ```text
    /// group city as people
    /// ```
    As,

    // Literals
    /// Integer literal, possibly negative
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -10
    /// ```
    Integer,
    /// Float literal, possibly negative
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// -1.5
    /// ```
    Float,
    /// String literal enclosed in double quotes
    String,

    // Identifiers
    /// Column, operation, or function name
    ///
    /// Must start with letter or underscore, followed by letters, digits, or underscores.
    Identifier,
    /// Identifier enclosed in backticks, may contain spaces
    ///
    /// # Examples
    /// ```text
    /// `first name`
    /// `my data.csv`
    /// ```
    QuotedIdentifier,

    /// End of input
    Eof,
}

impl TokenKind {
    /// True for tokens after which a `-` must be read as an operator.
    ///
    /// Anything that can end an operand (a literal, a name, a closing
    /// bracket) makes the following minus a subtraction; everything else
    /// leaves room for a negative literal.
    pub fn ends_operand(self) -> bool {
        !matches!(
            self,
            TokenKind::LParen
                | TokenKind::Comma
                | TokenKind::Assign
                | TokenKind::Pipe
                | TokenKind::LBrace
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::LtEq
                | TokenKind::GtEq
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Not
        )
    }

    /// Keyword lookup for a bare word.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        match word {
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            "not" => Some(TokenKind::Not),
            "is" => Some(TokenKind::Is),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            "as" => Some(TokenKind::As),
            _ => None,
        }
    }

    /// True for plain and backtick-quoted identifiers.
    pub fn is_identifier(self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::QuotedIdentifier)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Pipe => "|",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Assign => "=",
            TokenKind::Dot => ".",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Is => "is",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::As => "as",
            TokenKind::Integer => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::String => "STRING",
            TokenKind::Identifier => "IDENT",
            TokenKind::QuotedIdentifier => "QUOTED_IDENT",
            TokenKind::Eof => "EOF",
        };
        f.write_str(name)
    }
}

/// A lexical token: its kind, literal text, and character offset in the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})@{}", self.kind, self.text, self.position)
    }
}
