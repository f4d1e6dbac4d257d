use std::rc::Rc;

use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::interpreter::{ExecSignal, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::object::Value;

/// The runtime representation of a function statement or method.
/// `is_initializer` is true exactly for methods named `init` on a class —
/// checked once at creation time, not by comparing names at call time.
#[derive(Debug)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvRef,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A bound method shares `declaration` and `is_initializer` with the
    /// original and points at a fresh frame binding `this` to the given
    /// instance, enclosed by the original `closure`. The original is left
    /// untouched, so different instances produce different bound copies.
    pub fn bind(self: &Rc<Self>, instance: Value) -> Rc<LoxFunction> {
        let scope = Environment::child_of(&self.closure);
        scope.borrow_mut().define("this", instance);
        Rc::new(LoxFunction::new(
            Rc::clone(&self.declaration),
            scope,
            self.is_initializer,
        ))
    }

    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        log::trace!(target: "interp::interpreter", "calling {}", self.name());
        let call_env = Environment::child_of(&self.closure);
        for (param, arg) in self.declaration.params.iter().zip(args) {
            call_env.borrow_mut().define(param.lexeme.clone(), arg);
        }

        match interpreter.execute_block(&self.declaration.body, call_env) {
            Ok(()) => Ok(self.completion_value()),
            Err(ExecSignal::Return(value)) => {
                if self.is_initializer {
                    Ok(self.completion_value())
                } else {
                    Ok(value)
                }
            }
            Err(ExecSignal::Runtime(err)) => Err(err),
        }
    }

    /// On normal completion, an initializer always yields the constructed
    /// instance regardless of what (if anything) its body returned;
    /// everything else yields `nil`.
    fn completion_value(&self) -> Value {
        if self.is_initializer {
            Environment::get_at_name(&self.closure, 0, "this")
                .expect("initializer closure always binds 'this'")
        } else {
            Value::Nil
        }
    }
}
