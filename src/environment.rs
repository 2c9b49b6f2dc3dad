use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a frame. Closures and bound methods hold these, so a frame
/// lives as long as its longest holder.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope frame: its own bindings plus a link to the enclosing frame. The
/// global frame is the only one without a parent.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Fresh shared child frame of `parent`.
    pub fn child(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(parent))))
    }

    /// Binds `name` in this frame only, shadowing or overwriting.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(RuntimeError::undefined_variable(name))
        }
    }

    /// Rebinds an existing name somewhere in the chain; never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(RuntimeError::undefined_variable(name))
        }
    }

    /// Reads `name` from the frame exactly `distance` links up.
    ///
    /// # Panics
    ///
    /// If the frame or the binding is missing. Distances come from the
    /// resolver, so a miss means it and the interpreter disagree about scope
    /// nesting.
    pub fn get_at(&self, distance: usize, name: &str) -> Value {
        debug!("get_at({}, '{}')", distance, name);

        if distance == 0 {
            match self.values.get(name) {
                Some(value) => value.clone(),
                None => panic!("resolved binding '{}' missing from its frame", name),
            }
        } else {
            self.parent(distance).borrow().get_at(distance - 1, name)
        }
    }

    /// Writes `name` in the frame exactly `distance` links up.
    ///
    /// # Panics
    ///
    /// If there are fewer than `distance` enclosing frames.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) {
        debug!("assign_at({}, '{}')", distance, name);

        if distance == 0 {
            self.values.insert(name.to_string(), value);
        } else {
            self.parent(distance)
                .borrow_mut()
                .assign_at(distance - 1, name, value);
        }
    }

    fn parent(&self, distance: usize) -> &EnvRef {
        match &self.enclosing {
            Some(enclosing) => enclosing,
            None => panic!("scope chain shorter than resolved distance {}", distance),
        }
    }

    /// Names bound directly in this frame.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}
