use std::fmt::{self, Display};
use std::rc::Rc;

/// The closed set of token kinds the scanner ever emits.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    SEMICOLON,
    PLUS,
    MINUS,
    STAR,
    SLASH,

    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    LESS,
    LESS_EQUAL,
    GREATER,
    GREATER_EQUAL,

    STRING,
    NUMBER,
    IDENTIFIER,

    VAR,
    NIL,
    TRUE,
    FALSE,
    AND,
    OR,
    IF,
    ELSE,
    FOR,
    WHILE,
    FUN,
    RETURN,
    CLASS,
    SUPER,
    THIS,
    PRINT,

    EOF,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A `NUMBER` or `STRING` token's decoded payload. Every other kind leaves
/// this absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n:?}"),
            Literal::Str(s) => write!(f, "{s}"),
        }
    }
}

/// A source position: file, line, and column, used only for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub source_path: Rc<str>,
    pub line: usize,
    pub column: usize,
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_path, self.line, self.column)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub location: Location,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: String,
        literal: Option<Literal>,
        location: Location,
    ) -> Self {
        Self {
            kind,
            lexeme,
            literal,
            location,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literal = self
            .literal
            .as_ref()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "null".to_string());
        write!(f, "{} {} {}", self.kind, self.lexeme, literal)
    }
}
