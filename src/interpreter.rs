use std::collections::HashMap;
use std::rc::Rc;

use crate::environment::{EnvRef, Environment};
use crate::error::{self, RuntimeError};
use crate::expr::{Expr, LiteralValue, NodeId};
use crate::stmt::Stmt;
use crate::token::TokenKind;
use crate::value::callable::Callable;
use crate::value::class::LoxClass;
use crate::value::function::LoxFunction;
use crate::value::object::Value;

/// What executing a statement can produce besides the normal fall-through:
/// either a genuine runtime error, or an in-flight `return` unwinding toward
/// the enclosing function call. Kept distinct from the `thiserror` hierarchy
/// since a `return` is control flow, not a failure.
pub enum ExecSignal {
    Runtime(RuntimeError),
    Return(Value),
}

impl From<RuntimeError> for ExecSignal {
    fn from(err: RuntimeError) -> Self {
        ExecSignal::Runtime(err)
    }
}

/// Walks the AST, one post-order traversal per top-level statement. Holds
/// the global frame fixed and swaps `environment` as it enters and leaves
/// blocks, function calls, and method bodies.
pub struct Interpreter {
    pub globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<NodeId, usize>,
}

impl Interpreter {
    pub fn new(globals: EnvRef, locals: HashMap<NodeId, usize>) -> Self {
        Self {
            environment: Rc::clone(&globals),
            globals,
            locals,
        }
    }

    /// Merges in a side table produced by resolving one more chunk of
    /// source — each REPL line is resolved independently, but the parser's
    /// `NodeId` counter is threaded across lines (see `runner::run_source`)
    /// so two lines never share an id; a closure saved on one line and
    /// called after a later line's parse still looks up the right hop count.
    pub fn extend_locals(&mut self, locals: HashMap<NodeId, usize>) {
        self.locals.extend(locals);
    }

    /// Runs a whole program. A runtime error aborts the remaining statements
    /// but does not panic — the runner decides what exit code that means.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => continue,
                Err(ExecSignal::Runtime(err)) => {
                    error::report_runtime_error(&err);
                    break;
                }
                Err(ExecSignal::Return(_)) => {
                    unreachable!("top-level return would already be a resolver error")
                }
            }
        }
    }

    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<(), ExecSignal> {
        let previous = std::mem::replace(&mut self.environment, env);
        let result = (|| {
            for statement in statements {
                self.execute(statement)?;
            }
            Ok(())
        })();
        self.environment = previous;
        result
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), ExecSignal> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{value}");
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Block(statements) => {
                let scope = Environment::child_of(&self.environment);
                self.execute_block(statements, scope)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
                Ok(())
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
            Stmt::Function(decl) => {
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                let value = Value::Callable(Callable::Function(Rc::new(function)));
                self.environment.borrow_mut().define(decl.name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(ExecSignal::Return(value))
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &crate::token::Token,
        superclass: Option<&Expr>,
        methods: &[Rc<crate::stmt::FunctionDecl>],
    ) -> Result<(), ExecSignal> {
        let superclass = superclass
            .map(|expr| self.evaluate_superclass(expr))
            .transpose()?;

        self.environment.borrow_mut().define(name.lexeme.clone(), Value::Nil);

        let method_scope = if let Some(ref super_class) = superclass {
            let scope = Environment::child_of(&self.environment);
            scope
                .borrow_mut()
                .define("super", Value::Callable(Callable::Class(Rc::clone(super_class))));
            scope
        } else {
            Rc::clone(&self.environment)
        };

        let mut method_map = HashMap::new();
        for decl in methods {
            let is_initializer = decl.name.lexeme == "init";
            let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&method_scope), is_initializer);
            method_map.insert(decl.name.lexeme.clone(), Rc::new(function));
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass, method_map);
        Environment::assign_at(&self.environment, 0, name, Value::Callable(Callable::Class(Rc::new(class))))
            .map_err(ExecSignal::Runtime)
    }

    fn evaluate_superclass(&mut self, expr: &Expr) -> Result<Rc<LoxClass>, ExecSignal> {
        match self.evaluate(expr)? {
            Value::Callable(Callable::Class(class)) => Ok(class),
            _ => {
                let name = match expr {
                    Expr::Variable { name, .. } => name,
                    _ => unreachable!("a superclass expression is always a Variable"),
                };
                Err(ExecSignal::Runtime(RuntimeError::at(name, "invalid class")))
            }
        }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(value) => Ok(literal_value(value)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match (operator.kind, right) {
                    (TokenKind::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
                    (TokenKind::MINUS, _) => {
                        Err(RuntimeError::at(operator, "operand must be a number"))
                    }
                    (TokenKind::BANG, value) => Ok(Value::Bool(!value.is_truthy())),
                    _ => unreachable!("parser only emits MINUS/BANG unary operators"),
                }
            }
            Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right),
            Expr::Logical { left, operator, right } => {
                let left_value = self.evaluate(left)?;
                let short_circuits = if operator.kind == TokenKind::OR {
                    left_value.is_truthy()
                } else {
                    !left_value.is_truthy()
                };
                if short_circuits {
                    Ok(left_value)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Variable { id, name } => self.lookup_variable(*id, name),
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&hops) => Environment::assign_at(&self.environment, hops, name, value.clone())?,
                    None => Environment::assign_at(&self.globals, 0, name, value.clone())?,
                }
                Ok(value)
            }
            Expr::Call { callee, paren, arguments } => self.evaluate_call(callee, paren, arguments),
            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        let self_value = Value::Instance(Rc::clone(&instance));
                        instance.borrow().get(name, &self_value)
                    }
                    _ => Err(RuntimeError::at(name, "only instances have properties")),
                }
            }
            Expr::Set { object, name, value } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.borrow_mut().set(name, value.clone());
                        Ok(value)
                    }
                    _ => Err(RuntimeError::at(name, "only instances have fields")),
                }
            }
            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),
            Expr::Super { id, keyword, method } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &crate::token::Token,
        right: &Expr,
    ) -> Result<Value, RuntimeError> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;
        use TokenKind::*;
        match (operator.kind, &left, &right) {
            (STAR, Value::Number(l), Value::Number(r)) => Ok(Value::Number(l * r)),
            (SLASH, Value::Number(l), Value::Number(r)) => Ok(Value::Number(l / r)),
            (MINUS, Value::Number(l), Value::Number(r)) => Ok(Value::Number(l - r)),
            (PLUS, Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (PLUS, Value::String(l), Value::String(r)) => {
                Ok(Value::string(format!("{l}{r}")))
            }
            (GREATER, Value::Number(l), Value::Number(r)) => Ok(Value::Bool(l > r)),
            (GREATER_EQUAL, Value::Number(l), Value::Number(r)) => Ok(Value::Bool(l >= r)),
            (LESS, Value::Number(l), Value::Number(r)) => Ok(Value::Bool(l < r)),
            (LESS_EQUAL, Value::Number(l), Value::Number(r)) => Ok(Value::Bool(l <= r)),
            (BANG_EQUAL, l, r) => Ok(Value::Bool(l != r)),
            (EQUAL_EQUAL, l, r) => Ok(Value::Bool(l == r)),
            (STAR | SLASH | MINUS | GREATER | GREATER_EQUAL | LESS | LESS_EQUAL, _, _) => {
                Err(RuntimeError::at(operator, "operands must be numbers"))
            }
            (PLUS, _, _) => Err(RuntimeError::at(
                operator,
                "operands must be two numbers or two strings",
            )),
            _ => unreachable!("parser only emits arithmetic/comparison/equality binary operators"),
        }
    }

    fn evaluate_call(
        &mut self,
        callee: &Expr,
        paren: &crate::token::Token,
        arguments: &[Expr],
    ) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(callee)?;
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        let callable = match callee {
            Value::Callable(callable) => callable,
            _ => return Err(RuntimeError::at(paren, "can only call functions and classes")),
        };

        if args.len() != callable.arity() {
            return Err(RuntimeError::at(
                paren,
                format!("expected {} arguments but got {}", callable.arity(), args.len()),
            ));
        }

        callable.call(self, args)
    }

    fn lookup_variable(&self, id: NodeId, name: &crate::token::Token) -> Result<Value, RuntimeError> {
        match self.locals.get(&id) {
            Some(&hops) => Environment::get_at(&self.environment, hops, name),
            None => Environment::get_at(&self.globals, 0, name),
        }
    }

    fn evaluate_super(
        &self,
        id: NodeId,
        keyword: &crate::token::Token,
        method: &crate::token::Token,
    ) -> Result<Value, RuntimeError> {
        let hops = *self
            .locals
            .get(&id)
            .expect("resolver always records a hop count for 'super'");
        let superclass = match Environment::get_at(&self.environment, hops, keyword)? {
            Value::Callable(Callable::Class(class)) => class,
            _ => unreachable!("resolver only binds 'super' in scopes pointing at a class"),
        };

        let this = Environment::get_at_name(&self.environment, hops - 1, "this")
            .expect("'this' is always one frame closer than 'super'");

        superclass
            .find_method(&method.lexeme)
            .map(|m| Value::Callable(Callable::Function(m.bind(this))))
            .ok_or_else(|| RuntimeError::at(method, format!("undefined property '{}'", method.lexeme)))
    }
}

fn literal_value(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Nil => Value::Nil,
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::String(s) => Value::string(s.clone()),
    }
}
