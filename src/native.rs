use crate::environment::EnvRef;
use crate::value::callable::Callable;
use crate::value::object::Value;

/// Installs every native binding into the global frame before a program's
/// top-level statements run.
pub fn define_globals(env: &EnvRef) {
    env.borrow_mut()
        .define("clock", Value::Callable(Callable::NativeClock));
}
