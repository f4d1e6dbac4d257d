use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::object::Value;

/// Shared handle to a frame. Frames form a chain (and, via closures, a DAG)
/// from the innermost active scope out to the global frame, so every handle
/// needs shared ownership with interior mutability.
pub type EnvRef = Rc<RefCell<Environment>>;

/// A single lexical scope: bindings from name to value, plus a link to the
/// enclosing frame (absent only for the global frame).
#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new_global() -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: None,
        }))
    }

    /// Block entry, function-call entry, and class-with-superclass scopes
    /// all push a fresh frame this way.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    /// Writes into the innermost frame unconditionally; shadowing within the
    /// same frame is permitted (the resolver is what prevents it for locals).
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    fn ancestor(env: &EnvRef, hops: usize) -> EnvRef {
        let mut frame = Rc::clone(env);
        for _ in 0..hops {
            let next = frame
                .borrow()
                .enclosing
                .as_ref()
                .map(Rc::clone)
                .expect("resolver hop count exceeds the live frame chain");
            frame = next;
        }
        frame
    }

    /// Walks `hops` enclosing links from `env` and requires `name` already be
    /// present there. Reading `this`/`super` reuses this exact mechanism
    /// with their resolver-recorded hop counts.
    pub fn get_at(env: &EnvRef, hops: usize, name: &Token) -> Result<Value, RuntimeError> {
        Self::get_at_name(env, hops, &name.lexeme).ok_or_else(|| {
            RuntimeError::at(name, format!("undefined variable '{}'", name.lexeme))
        })
    }

    /// Same walk as [`Self::get_at`], for lookups (`this`, `super`) that are
    /// known to always succeed and so need no token to report against.
    pub fn get_at_name(env: &EnvRef, hops: usize, name: &str) -> Option<Value> {
        let frame = Self::ancestor(env, hops);
        let value = frame.borrow().values.get(name).cloned();
        value
    }

    pub fn assign_at(
        env: &EnvRef,
        hops: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let frame = Self::ancestor(env, hops);
        let mut frame = frame.borrow_mut();
        if frame.values.contains_key(&name.lexeme) {
            frame.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else {
            Err(RuntimeError::at(
                name,
                format!("undefined variable '{}'", name.lexeme),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Location, TokenKind};
    use std::rc::Rc as StdRc;

    fn token(name: &str) -> Token {
        Token::new(
            TokenKind::IDENTIFIER,
            name.to_string(),
            None,
            Location {
                source_path: StdRc::from("test"),
                line: 1,
                column: 1,
            },
        )
    }

    #[test]
    fn get_at_walks_the_hop_count() {
        let global = Environment::new_global();
        global.borrow_mut().define("x", Value::Number(1.0));
        let inner = Environment::child_of(&global);
        inner.borrow_mut().define("y", Value::Number(2.0));

        assert_eq!(Environment::get_at(&inner, 0, &token("y")).unwrap(), Value::Number(2.0));
        assert_eq!(Environment::get_at(&inner, 1, &token("x")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_at_requires_existing_binding() {
        let global = Environment::new_global();
        let err = Environment::assign_at(&global, 0, &token("missing"), Value::Nil);
        assert!(err.is_err());
    }

    #[test]
    fn shadowing_in_a_child_frame_does_not_touch_the_parent() {
        let global = Environment::new_global();
        global.borrow_mut().define("x", Value::Number(1.0));
        let inner = Environment::child_of(&global);
        inner.borrow_mut().define("x", Value::Number(2.0));

        assert_eq!(Environment::get_at(&inner, 0, &token("x")).unwrap(), Value::Number(2.0));
        assert_eq!(Environment::get_at(&global, 0, &token("x")).unwrap(), Value::Number(1.0));
    }
}
