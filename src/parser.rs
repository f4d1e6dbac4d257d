use crate::error::ParseError;
use crate::expr::{Expr, LiteralValue, NodeId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Literal, Token, TokenKind};
use std::rc::Rc;

const MAX_ARGS: usize = 255;

/// Recursive-descent parser over the token stream.
/// Syntax errors are collected, not thrown: after one the parser
/// resynchronises at the next statement boundary and keeps going, so a
/// single run can report every syntax error it finds.
///
/// `NodeId`s are session-wide, not per-parse: a REPL persists one
/// interpreter (and its `locals` side table) across many lines, so the
/// id counter must be threaded in from the caller rather than restarting
/// at zero — two different lines' nodes must never collide.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
    next_node_id: NodeId,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>, start_node_id: NodeId) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            next_node_id: start_node_id,
        }
    }

    /// `program := declaration* EOF`. Returns the parsed statements, any
    /// syntax errors, and the next unused `NodeId` so the caller can seed
    /// the following parse (the next REPL line, or nothing for a one-shot
    /// file run) without reusing an id already live in `Interpreter::locals`.
    pub fn parse(mut self) -> (Vec<Stmt>, Vec<ParseError>, NodeId) {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        (statements, self.errors, self.next_node_id)
    }

    fn next_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    // ---- declarations -----------------------------------------------

    /// `declaration := varDecl | funDecl | classDecl | statement`
    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_kinds(&[TokenKind::VAR]) {
            self.var_declaration()
        } else if self.match_kinds(&[TokenKind::FUN]) {
            self.function_declaration("function").map(Stmt::Function)
        } else if self.match_kinds(&[TokenKind::CLASS]) {
            self.class_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                self.errors.push(err);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> PResult<Stmt> {
        let name = self.consume(TokenKind::IDENTIFIER, "Expect variable name.")?;
        let initializer = if self.match_kinds(&[TokenKind::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::SEMICOLON, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn function_declaration(&mut self, kind: &str) -> PResult<Rc<FunctionDecl>> {
        let name = self.consume(TokenKind::IDENTIFIER, &format!("Expect {kind} name."))?;
        self.consume(TokenKind::LEFT_PAREN, &format!("Expect '(' after {kind} name."))?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    let peek = self.peek();
                    self.errors.push(ParseError {
                        location: peek.location.clone(),
                        message: format!("Can't have more than {MAX_ARGS} parameters."),
                    });
                }
                params.push(self.consume(TokenKind::IDENTIFIER, "Expect parameter name.")?);
                if !self.match_kinds(&[TokenKind::COMMA]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LEFT_BRACE, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;
        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn class_declaration(&mut self) -> PResult<Stmt> {
        let name = self.consume(TokenKind::IDENTIFIER, "Expect class name.")?;

        let superclass = if self.match_kinds(&[TokenKind::LESS]) {
            let super_name = self.consume(TokenKind::IDENTIFIER, "Expect superclass name.")?;
            Some(Expr::Variable {
                id: self.next_id(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(TokenKind::LEFT_BRACE, "Expect '{' before class body.")?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function_declaration("method")?);
        }
        self.consume(TokenKind::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    // ---- statements ---------------------------------------------------

    /// `statement := block | ifStmt | whileStmt | forStmt | returnStmt | printStmt | exprStmt`
    fn statement(&mut self) -> PResult<Stmt> {
        if self.match_kinds(&[TokenKind::LEFT_BRACE]) {
            Ok(Stmt::Block(self.block()?))
        } else if self.match_kinds(&[TokenKind::IF]) {
            self.if_statement()
        } else if self.match_kinds(&[TokenKind::WHILE]) {
            self.while_statement()
        } else if self.match_kinds(&[TokenKind::FOR]) {
            self.for_statement()
        } else if self.match_kinds(&[TokenKind::RETURN]) {
            self.return_statement()
        } else if self.match_kinds(&[TokenKind::PRINT]) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    fn block(&mut self) -> PResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.consume(TokenKind::RIGHT_BRACE, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn if_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kinds(&[TokenKind::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    /// `for (init; cond; inc) body` desugars to
    /// `{ init; while (cond') { body; inc; } }` at parse time — there is no
    /// `for` node in the runtime AST.
    fn for_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer = if self.match_kinds(&[TokenKind::SEMICOLON]) {
            None
        } else if self.match_kinds(&[TokenKind::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::SEMICOLON) {
            self.expression()?
        } else {
            Expr::Literal(LiteralValue::Bool(true))
        };
        self.consume(TokenKind::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenKind::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn return_statement(&mut self) -> PResult<Stmt> {
        let keyword = self.previous();
        let value = if !self.check(TokenKind::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::SEMICOLON, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn print_statement(&mut self) -> PResult<Stmt> {
        let value = self.expression()?;
        self.consume(TokenKind::SEMICOLON, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> PResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::SEMICOLON, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    // ---- expressions ----------------------------------------------------

    fn expression(&mut self) -> PResult<Expr> {
        self.assignment()
    }

    /// `assign := (call ".")? IDENT "=" assign | logicOr`
    fn assignment(&mut self) -> PResult<Expr> {
        let expr = self.logic_or()?;

        if self.match_kinds(&[TokenKind::EQUAL]) {
            let equals = self.previous();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.next_id(),
                    name,
                    value: Box::new(value),
                }),
                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),
                _ => Err(ParseError {
                    location: equals.location.clone(),
                    message: "Invalid assignment target.".to_string(),
                }),
            };
        }

        Ok(expr)
    }

    fn logic_or(&mut self) -> PResult<Expr> {
        let mut expr = self.logic_and()?;
        while self.match_kinds(&[TokenKind::OR]) {
            let operator = self.previous();
            let right = self.logic_and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> PResult<Expr> {
        let mut expr = self.equality()?;
        while self.match_kinds(&[TokenKind::AND]) {
            let operator = self.previous();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> PResult<Expr> {
        let mut expr = self.comparison()?;
        while self.match_kinds(&[TokenKind::BANG_EQUAL, TokenKind::EQUAL_EQUAL]) {
            let operator = self.previous();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut expr = self.term()?;
        while self.match_kinds(&[
            TokenKind::GREATER,
            TokenKind::GREATER_EQUAL,
            TokenKind::LESS,
            TokenKind::LESS_EQUAL,
        ]) {
            let operator = self.previous();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut expr = self.factor()?;
        while self.match_kinds(&[TokenKind::MINUS, TokenKind::PLUS]) {
            let operator = self.previous();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> PResult<Expr> {
        let mut expr = self.unary()?;
        while self.match_kinds(&[TokenKind::SLASH, TokenKind::STAR]) {
            let operator = self.previous();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> PResult<Expr> {
        if self.match_kinds(&[TokenKind::BANG, TokenKind::MINUS]) {
            let operator = self.previous();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }

    /// `call := primary ( "(" args? ")" | "." IDENT )*`
    fn call(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_kinds(&[TokenKind::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.match_kinds(&[TokenKind::DOT]) {
                let name = self.consume(TokenKind::IDENTIFIER, "Expect property name after '.'.")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> PResult<Expr> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    let peek = self.peek();
                    self.errors.push(ParseError {
                        location: peek.location.clone(),
                        message: format!("Can't have more than {MAX_ARGS} arguments."),
                    });
                }
                arguments.push(self.expression()?);
                if !self.match_kinds(&[TokenKind::COMMA]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after arguments.")?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    /// `primary := NUMBER | STRING | "true" | "false" | "nil" | "(" expr ")" | IDENT | "this" | "super" "." IDENT`
    fn primary(&mut self) -> PResult<Expr> {
        if self.match_kinds(&[TokenKind::FALSE]) {
            return Ok(Expr::Literal(LiteralValue::Bool(false)));
        }
        if self.match_kinds(&[TokenKind::TRUE]) {
            return Ok(Expr::Literal(LiteralValue::Bool(true)));
        }
        if self.match_kinds(&[TokenKind::NIL]) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }
        if self.match_kinds(&[TokenKind::NUMBER]) {
            let value = match self.previous().literal {
                Some(Literal::Number(n)) => n,
                _ => unreachable!("scanner always attaches a Number literal to NUMBER tokens"),
            };
            return Ok(Expr::Literal(LiteralValue::Number(value)));
        }
        if self.match_kinds(&[TokenKind::STRING]) {
            let value = match self.previous().literal {
                Some(Literal::Str(s)) => s,
                _ => unreachable!("scanner always attaches a Str literal to STRING tokens"),
            };
            return Ok(Expr::Literal(LiteralValue::String(value)));
        }
        if self.match_kinds(&[TokenKind::THIS]) {
            return Ok(Expr::This {
                id: self.next_id(),
                keyword: self.previous(),
            });
        }
        if self.match_kinds(&[TokenKind::SUPER]) {
            let keyword = self.previous();
            self.consume(TokenKind::DOT, "Expect '.' after 'super'.")?;
            let method = self.consume(TokenKind::IDENTIFIER, "Expect superclass method name.")?;
            return Ok(Expr::Super {
                id: self.next_id(),
                keyword,
                method,
            });
        }
        if self.match_kinds(&[TokenKind::IDENTIFIER]) {
            return Ok(Expr::Variable {
                id: self.next_id(),
                name: self.previous(),
            });
        }
        if self.match_kinds(&[TokenKind::LEFT_PAREN]) {
            let expr = self.expression()?;
            self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(self.error_at_current("Expect expression."))
    }

    // ---- token-stream plumbing -----------------------------------------

    fn consume(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.error_at_current(message))
    }

    fn match_kinds(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EOF
    }

    fn peek(&self) -> Token {
        self.tokens[self.current].clone()
    }

    fn previous(&self) -> Token {
        self.tokens[self.current - 1].clone()
    }

    fn error_at_current(&self, message: &str) -> ParseError {
        let token = self.peek();
        let message = if token.kind == TokenKind::EOF {
            format!("Error at end: {message}")
        } else {
            format!("Error at '{}': {message}", token.lexeme)
        };
        ParseError {
            location: token.location,
            message,
        }
    }

    /// After a syntax error, discard tokens until we're likely at the start
    /// of the next statement, so the parser can report more than one error
    /// per run.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::SEMICOLON {
                return;
            }
            match self.peek().kind {
                TokenKind::CLASS
                | TokenKind::FUN
                | TokenKind::VAR
                | TokenKind::FOR
                | TokenKind::IF
                | TokenKind::WHILE
                | TokenKind::PRINT
                | TokenKind::RETURN => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(src: &str) -> (Vec<Stmt>, Vec<ParseError>) {
        let (tokens, scan_errors) = Scanner::new(src.to_string(), "test").scan_tokens();
        assert!(scan_errors.is_empty());
        let (statements, errors, _next_id) = Parser::new(tokens, 0).parse();
        (statements, errors)
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let (stmts, errors) = parse("1 + 2 * 3;");
        assert!(errors.is_empty());
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn reports_multiple_syntax_errors_in_one_pass() {
        let (_, errors) = parse("var; var;");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn for_loop_desugars_to_block_and_while() {
        let (stmts, errors) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(errors.is_empty());
        match &stmts[0] {
            Stmt::Block(inner) => {
                assert!(matches!(inner[0], Stmt::Var { .. }));
                assert!(matches!(inner[1], Stmt::While { .. }));
            }
            other => panic!("expected desugared block, got {other:?}"),
        }
    }

    #[test]
    fn assignment_target_must_be_valid() {
        let (_, errors) = parse("1 = 2;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Invalid assignment target"));
    }
}
