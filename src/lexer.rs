use thiserror::Error;

use crate::ast::{Token, TokenKind};

/// Errors raised while turning query text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unterminated string starting at position {0}")]
    UnterminatedString(usize),

    #[error("unterminated backtick identifier starting at position {0}")]
    UnterminatedIdentifier(usize),

    #[error("unexpected character {ch:?} at position {position}{hint}")]
    UnexpectedChar {
        ch: char,
        position: usize,
        hint: &'static str,
    },

    #[error("invalid number {text:?} at position {position}")]
    InvalidNumber { text: String, position: usize },
}

/// Pull-based tokenizer over a query string.
///
/// Besides the cursor, the lexer remembers the kind of the last token it
/// produced: a `-` directly followed by a digit starts a negative literal only
/// when that token could not have ended an operand.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    last_kind: Option<TokenKind>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            last_kind: None,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn text(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    /// Skips whitespace and `//` line comments.
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_char(1) == Some('/') {
                while let Some(ch) = self.current_char() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn emit(&mut self, kind: TokenKind, text: impl Into<String>, start: usize) -> Token {
        self.last_kind = Some(kind);
        Token::new(kind, text, start)
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        self.advance();
        let text = self.text(start);
        self.emit(kind, text, start)
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.text(start)
    }

    fn read_string(&mut self) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' if self.peek_char(1).is_some() => {
                    self.advance();
                    match self.current_char() {
                        Some('"') => result.push('"'),
                        Some('\\') => result.push('\\'),
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        // Unknown escapes are kept verbatim
                        Some(other) => {
                            result.push('\\');
                            result.push(other);
                        }
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString(start))
    }

    fn read_backtick(&mut self) -> Result<String, LexError> {
        let start = self.position;
        self.advance(); // consume opening backtick
        let mut result = String::new();

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == '`' {
                return Ok(result);
            }
            result.push(ch);
        }

        Err(LexError::UnterminatedIdentifier(start))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let mut is_float = false;

        if self.current_char() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                // `users.csv` style boundaries leave the dot for the next token
                is_float = true;
                self.advance();
            } else {
                break;
            }
        }

        let text = self.text(start);
        let valid = if is_float {
            text.parse::<f64>().is_ok()
        } else {
            text.parse::<i64>().is_ok()
        };
        if !valid {
            return Err(LexError::InvalidNumber {
                text,
                position: start,
            });
        }

        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Integer
        };
        Ok(self.emit(kind, text, start))
    }

    fn negative_literal_allowed(&self) -> bool {
        self.last_kind.is_none_or(|kind| !kind.ends_operand())
    }

    /// Scans the source file name.
    ///
    /// Consumes every character up to the next whitespace or `|` as one
    /// identifier, unless the name is written as a string literal or a
    /// backtick identifier. An empty token text means no name was present.
    pub fn scan_filename(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.position;

        match self.current_char() {
            Some('"') => {
                let name = self.read_string()?;
                Ok(self.emit(TokenKind::String, name, start))
            }
            Some('`') => {
                let name = self.read_backtick()?;
                Ok(self.emit(TokenKind::QuotedIdentifier, name, start))
            }
            _ => {
                while let Some(ch) = self.current_char() {
                    if ch.is_whitespace() || ch == '|' {
                        break;
                    }
                    self.advance();
                }
                let name = self.text(start);
                Ok(self.emit(TokenKind::Identifier, name, start))
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.position;

        let token = match self.current_char() {
            None => self.emit(TokenKind::Eof, "", start),
            Some('|') => self.single(TokenKind::Pipe, start),
            Some('{') => self.single(TokenKind::LBrace, start),
            Some('}') => self.single(TokenKind::RBrace, start),
            Some('(') => self.single(TokenKind::LParen, start),
            Some(')') => self.single(TokenKind::RParen, start),
            Some(',') => self.single(TokenKind::Comma, start),
            Some('.') => self.single(TokenKind::Dot, start),
            Some('+') => self.single(TokenKind::Plus, start),
            Some('*') => self.single(TokenKind::Star, start),
            Some('/') => self.single(TokenKind::Slash, start),
            Some('-') => {
                if self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
                    && self.negative_literal_allowed()
                {
                    self.read_number()?
                } else {
                    self.single(TokenKind::Minus, start)
                }
            }
            Some('=') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.single(TokenKind::EqEq, start)
                } else {
                    self.single(TokenKind::Assign, start)
                }
            }
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.single(TokenKind::NotEq, start)
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch: '!',
                        position: start,
                        hint: " (did you mean '!='?)",
                    });
                }
            }
            Some('<') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.single(TokenKind::LtEq, start)
                } else {
                    self.single(TokenKind::Lt, start)
                }
            }
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.single(TokenKind::GtEq, start)
                } else {
                    self.single(TokenKind::Gt, start)
                }
            }
            Some('"') => {
                let value = self.read_string()?;
                self.emit(TokenKind::String, value, start)
            }
            Some('`') => {
                let name = self.read_backtick()?;
                self.emit(TokenKind::QuotedIdentifier, name, start)
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();
                let kind = TokenKind::keyword(&ident).unwrap_or(TokenKind::Identifier);
                self.emit(kind, ident, start)
            }
            Some(ch) => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    position: start,
                    hint: "",
                });
            }
        };

        Ok(token)
    }

    /// Lexes the rest of the input, including the trailing `Eof` token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tracing::trace!(count = tokens.len(), "tokenized query");
        Ok(tokens)
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and or not is true false null as");
    let kinds: Vec<TokenKind> = lexer
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Not,
            TokenKind::Is,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Null,
            TokenKind::As,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_pipe() {
    let mut lexer = Lexer::new("users.csv | filter { x > 5 }");
    assert_eq!(lexer.scan_filename().unwrap().text, "users.csv");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Pipe);
    assert_eq!(lexer.next_token().unwrap().text, "filter");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::LBrace);
    assert_eq!(lexer.next_token().unwrap().text, "x");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Gt);
    assert_eq!(lexer.next_token().unwrap().text, "5");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::RBrace);
}
