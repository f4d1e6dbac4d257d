use std::fmt::{self, Display};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::class::LoxClass;
use crate::value::function::LoxFunction;
use crate::value::object::Value;

/// The closed set of things that can appear on the left of a call
/// expression. A class is itself callable — calling it constructs an
/// instance.
#[derive(Debug, Clone)]
pub enum Callable {
    NativeClock,
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Callable::NativeClock => "clock",
            Callable::Function(f) => f.name(),
            Callable::Class(c) => &c.name,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Callable::NativeClock => 0,
            Callable::Function(f) => f.arity(),
            Callable::Class(c) => c.arity(),
        }
    }

    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match self {
            Callable::NativeClock => Ok(clock()),
            Callable::Function(f) => f.call(interpreter, args),
            Callable::Class(c) => LoxClass::instantiate(c, interpreter, args),
        }
    }

    /// Reference equality: two separately bound methods of the same
    /// instance compare unequal (see `DESIGN.md`).
    pub fn ref_eq(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::NativeClock, Callable::NativeClock) => true,
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::NativeClock => write!(f, "<native fn: clock>"),
            Callable::Function(func) => write!(f, "<fn: {}>", func.name()),
            Callable::Class(c) => write!(f, "<class: {}>", c.name),
        }
    }
}

/// Returns the current time in whole seconds since the Unix epoch,
/// truncated toward zero via integer division rather than rounding.
fn clock() -> Value {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Value::Number(elapsed.as_secs() as f64)
}
