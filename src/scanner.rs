use std::collections::HashMap;
use std::rc::Rc;

use crate::error::ScanError;
use crate::token::TokenKind::*;
use crate::token::{Literal, Location, Token, TokenKind};

/// The first step in any compiler or interpreter is scanning. The scanner
/// takes in raw source code as a series of characters and groups it into a
/// series of chunks we call tokens — the meaningful "words" and
/// "punctuation" that make up the language's grammar.
pub struct Scanner {
    source: Vec<char>,
    source_path: Rc<str>,
    tokens: Vec<Token>,
    errors: Vec<ScanError>,

    /// `start` points to the first character of the lexeme being scanned;
    /// `current` is the character under consideration; `line`/`line_start`
    /// track where `current` is so locations can be reported.
    start: usize,
    current: usize,
    line: usize,
    line_start: usize,
}

impl Scanner {
    pub fn new(source: String, source_path: impl Into<Rc<str>>) -> Self {
        Scanner {
            source: source.chars().collect(),
            source_path: source_path.into(),
            tokens: vec![],
            errors: vec![],
            start: 0,
            current: 0,
            line: 1,
            line_start: 0,
        }
    }

    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<ScanError>) {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        let eof_location = self.location_at(self.current);
        self.tokens.push(Token::new(EOF, String::new(), None, eof_location));
        (self.tokens, self.errors)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn location_at(&self, pos: usize) -> Location {
        Location {
            source_path: Rc::clone(&self.source_path),
            line: self.line,
            column: pos - self.line_start + 1,
        }
    }

    fn scan_token(&mut self) {
        let start_location = self.location_at(self.start);
        let c = *self.advance().unwrap();
        match c {
            '(' => self.add_token(LEFT_PAREN),
            ')' => self.add_token(RIGHT_PAREN),
            '{' => self.add_token(LEFT_BRACE),
            '}' => self.add_token(RIGHT_BRACE),
            ',' => self.add_token(COMMA),
            '.' => self.add_token(DOT),
            '-' => self.add_token(MINUS),
            '+' => self.add_token(PLUS),
            ';' => self.add_token(SEMICOLON),
            '*' => self.add_token(STAR),

            '!' => {
                let kind = if self.match_next('=') { BANG_EQUAL } else { BANG };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_next('=') { EQUAL_EQUAL } else { EQUAL };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_next('=') { LESS_EQUAL } else { LESS };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_next('=') { GREATER_EQUAL } else { GREATER };
                self.add_token(kind);
            }

            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.line += 1;
                self.line_start = self.current;
            }

            '/' => self.comment(),
            '"' => self.string(),
            d if is_digit(d) => self.number(),
            a if is_alpha(a) => self.identifier(),

            other => {
                self.errors.push(ScanError {
                    location: start_location,
                    message: format!("Unexpected character: {other}"),
                });
            }
        }
    }

    fn comment(&mut self) {
        if self.match_next('/') {
            while self.peek() != '\n' && !self.is_at_end() {
                self.advance();
            }
        } else {
            self.add_token(SLASH)
        }
    }

    fn string(&mut self) {
        let start_location = self.location_at(self.start);
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
                self.line_start = self.current + 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.errors.push(ScanError {
                location: start_location,
                message: "Unterminated string.".to_string(),
            });
            return;
        }

        // The closing ".
        self.advance();

        let value: String = self.source[self.start + 1..self.current - 1].iter().collect();
        self.add_token_with_literal(STRING, Some(Literal::Str(value)));
    }

    fn number(&mut self) {
        while is_digit(self.peek()) {
            self.advance();
        }

        // A trailing '.' without following digits is not part of the number.
        if self.peek() == '.' && is_digit(self.peek_next()) {
            self.advance();
            while is_digit(self.peek()) {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let value: f64 = text.parse().expect("number lexeme is always valid f64 text");
        self.add_token_with_literal(NUMBER, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while is_alpha_numeric(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let kind = keywords().get(text.as_str()).copied().unwrap_or(IDENTIFIER);
        self.add_token(kind);
    }

    fn advance(&mut self) -> Option<&char> {
        let res = self.source.get(self.current);
        self.current += 1;
        res
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_with_literal(kind, None);
    }

    fn add_token_with_literal(&mut self, kind: TokenKind, literal: Option<Literal>) {
        let text: String = self.source[self.start..self.current].iter().collect();
        let location = self.location_at(self.start);
        log::trace!(target: "interp::scanner", "{kind} {text:?} at {location}");
        self.tokens.push(Token::new(kind, text, literal, location));
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alpha_numeric(c: char) -> bool {
    is_alpha(c) || is_digit(c)
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn keywords() -> HashMap<&'static str, TokenKind> {
    HashMap::from([
        ("and", AND),
        ("class", CLASS),
        ("else", ELSE),
        ("false", FALSE),
        ("for", FOR),
        ("fun", FUN),
        ("if", IF),
        ("nil", NIL),
        ("or", OR),
        ("print", PRINT),
        ("return", RETURN),
        ("super", SUPER),
        ("this", THIS),
        ("true", TRUE),
        ("var", VAR),
        ("while", WHILE),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Scanner::new(src.to_string(), "test").scan_tokens();
        assert!(errors.is_empty(), "unexpected scan errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn single_char_tokens() {
        assert_eq!(scan("(){},.-+;*"), vec![
            LEFT_PAREN, RIGHT_PAREN, LEFT_BRACE, RIGHT_BRACE, COMMA, DOT, MINUS, PLUS,
            SEMICOLON, STAR, EOF,
        ]);
    }

    #[test]
    fn number_with_trailing_dot_is_not_consumed() {
        let (tokens, _) = Scanner::new("1.".to_string(), "test").scan_tokens();
        assert_eq!(tokens[0].kind, NUMBER);
        assert_eq!(tokens[0].lexeme, "1");
        assert_eq!(tokens[1].kind, DOT);
    }

    #[test]
    fn keywords_vs_identifiers() {
        assert_eq!(scan("class orchid"), vec![CLASS, IDENTIFIER, EOF]);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (_, errors) = Scanner::new("\"abc".to_string(), "test").scan_tokens();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Unterminated string.");
    }

    #[test]
    fn multiline_string_tracks_line_numbers() {
        let (tokens, _) = Scanner::new("\"a\nb\"\nidentifier".to_string(), "test").scan_tokens();
        assert_eq!(tokens[0].kind, STRING);
        assert_eq!(tokens[1].location.line, 3);
    }
}
