use std::collections::HashMap;

use crate::error::{self, ResolveError};
use crate::expr::{Expr, NodeId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionKind {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

/// Resolution fails closed: the first static error stops the walk rather
/// than collecting every one it can find (spec §7 stratum 2 — "first
/// occurrence aborts the run"). The error itself has already been reported
/// by the time `Err(())` comes back; this is a stop signal, not a value.
type RResult<T> = Result<T, ()>;

/// A single static pass over the AST between parsing and interpretation.
/// Produces a side table from every variable-referencing node to how many
/// enclosing scopes separate it from the scope that declares it, so the
/// interpreter never has to search for a binding at runtime.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    locals: HashMap<NodeId, usize>,
    current_function: FunctionKind,
    current_class: ClassKind,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
        }
    }

    pub fn resolve(mut self, statements: &[Stmt]) -> HashMap<NodeId, usize> {
        let _ = self.resolve_statements(statements);
        self.locals
    }

    fn resolve_statements(&mut self, statements: &[Stmt]) -> RResult<()> {
        for statement in statements {
            self.resolve_statement(statement)?;
        }
        Ok(())
    }

    fn resolve_statement(&mut self, stmt: &Stmt) -> RResult<()> {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                let result = self.resolve_statements(statements);
                self.end_scope();
                result
            }
            Stmt::Var { name, initializer } => {
                self.declare(name)?;
                if let Some(expr) = initializer {
                    self.resolve_expr(expr)?;
                }
                self.define(name);
                Ok(())
            }
            Stmt::Function(decl) => {
                self.declare(&decl.name)?;
                self.define(&decl.name);
                self.resolve_function(decl, FunctionKind::Function)
            }
            Stmt::Expression(expr) => self.resolve_expr(expr),
            Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_statement(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.resolve_statement(else_branch)?;
                }
                Ok(())
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_statement(body)
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    return self.error(keyword, "can't return from top-level code");
                }
                if let Some(expr) = value {
                    if self.current_function == FunctionKind::Initializer {
                        return self.error(keyword, "can't return a value from an initializer");
                    }
                    self.resolve_expr(expr)?;
                }
                Ok(())
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[std::rc::Rc<FunctionDecl>],
    ) -> RResult<()> {
        let enclosing_class = self.current_class;
        self.current_class = ClassKind::Class;

        self.declare(name)?;
        self.define(name);

        if let Some(Expr::Variable { name: super_name, .. }) = superclass {
            if super_name.lexeme == name.lexeme {
                self.current_class = enclosing_class;
                return self.error(super_name, "a class can't inherit from itself");
            }
            self.current_class = ClassKind::Subclass;
            self.resolve_expr(superclass.unwrap())?;
        }

        if superclass.is_some() {
            self.begin_scope();
            self.scopes.last_mut().unwrap().insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().unwrap().insert("this".to_string(), true);

        let result = (|| {
            for method in methods {
                let kind = if method.name.lexeme == "init" {
                    FunctionKind::Initializer
                } else {
                    FunctionKind::Method
                };
                self.resolve_function(method, kind)?;
            }
            Ok(())
        })();

        self.end_scope();
        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
        result
    }

    fn resolve_expr(&mut self, expr: &Expr) -> RResult<()> {
        match expr {
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        return self.error(name, "can't read local variable in its own initializer");
                    }
                }
                self.resolve_local(*id, name);
                Ok(())
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(*id, name);
                Ok(())
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            }
            Expr::Call { callee, arguments, .. } => {
                self.resolve_expr(callee)?;
                for argument in arguments {
                    self.resolve_expr(argument)?;
                }
                Ok(())
            }
            Expr::Grouping(inner) | Expr::Unary { right: inner, .. } => self.resolve_expr(inner),
            Expr::Literal(_) => Ok(()),
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value)?;
                self.resolve_expr(object)
            }
            Expr::This { id, keyword } => {
                if self.current_class == ClassKind::None {
                    return self.error(keyword, "can't use 'this' outside of a class");
                }
                self.resolve_local(*id, keyword);
                Ok(())
            }
            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassKind::None => return self.error(keyword, "can't use 'super' outside of a class"),
                    ClassKind::Class => {
                        return self.error(keyword, "can't use 'super' in a class with no superclass")
                    }
                    ClassKind::Subclass => {}
                }
                self.resolve_local(*id, keyword);
                Ok(())
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionKind) -> RResult<()> {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        let result = (|| {
            for param in &decl.params {
                self.declare(param)?;
                self.define(param);
            }
            self.resolve_statements(&decl.body)
        })();
        self.end_scope();

        self.current_function = enclosing_function;
        result
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) -> RResult<()> {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                return self.error(name, "a variable with this name is already declared in this scope");
            }
            scope.insert(name.lexeme.clone(), false);
        }
        Ok(())
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, id: NodeId, name: &Token) {
        for (hops, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.locals.insert(id, hops);
                return;
            }
        }
        // Not found in any local scope: treated as global, left out of the
        // side table, and resolved against the global frame at runtime.
    }

    /// Reports the error immediately (so the runner sees it even though the
    /// walk stops here) and returns the stop signal that every caller
    /// propagates with `?`.
    fn error(&self, token: &Token, message: impl Into<String>) -> RResult<()> {
        let err = ResolveError {
            location: token.location.clone(),
            message: message.into(),
        };
        error::report_resolve_error(&err);
        Err(())
    }
}
