use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::function::LoxFunction;
use crate::value::instance::Instance;
use crate::value::object::Value;

/// The runtime representation of a class declaration. Methods are owned
/// here and reached through an instance only by name lookup, never copied
/// onto the instance itself.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Looks up the chain of superclasses, nearest first, so an override
    /// in a subclass always wins over its ancestor's method of the same name.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }
        self.superclass.as_ref()?.find_method(name)
    }

    /// Zero arity with no `init`; otherwise the initializer's arity.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    pub fn instantiate(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(class))));
        let instance_value = Value::Instance(Rc::clone(&instance));
        if let Some(initializer) = class.find_method("init") {
            initializer.bind(instance_value.clone()).call(interpreter, args)?;
        }
        Ok(instance_value)
    }
}
