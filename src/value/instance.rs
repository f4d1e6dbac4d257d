use std::collections::HashMap;
use std::fmt::{self, Display};
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::class::LoxClass;
use crate::value::object::Value;

/// A live object: its class plus its own field bindings. Methods are never
/// copied in here — `get` falls back to the class only after the field
/// map misses.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// A field shadows a method of the same name. Looking up a method binds
    /// a fresh copy of it to `self_value`, the instance wrapping this struct.
    pub fn get(&self, name: &Token, self_value: &Value) -> Result<Value, RuntimeError> {
        if let Some(value) = self.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = self.class.find_method(&name.lexeme) {
            return Ok(Value::Callable(crate::value::callable::Callable::Function(
                method.bind(self_value.clone()),
            )));
        }

        Err(RuntimeError::at(
            name,
            format!("undefined property '{}'", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<instance of <class: {}>>", self.class.name)
    }
}
