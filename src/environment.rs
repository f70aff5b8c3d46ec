use crate::error::{RResult, RuntimeError};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope.  Scopes are shared through `Rc<RefCell<..>>` so a
/// closure can keep its declaring scope alive after the block exits.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// Global (root) scope.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wraps a fresh child of `enclosing` ready to become the active scope.
    pub fn child_of(enclosing: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Creates or overwrites a binding in this scope only.
    pub fn declare(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> RResult<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(RuntimeError::undefined_variable(name, line))
        }
    }

    /// Overwrites the nearest existing binding of `name` and returns the
    /// stored value.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> RResult<Value> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value.clone();
            Ok(value)
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(RuntimeError::undefined_variable(name, line))
        }
    }

    pub fn is_global(&self) -> bool {
        self.enclosing.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::new()))
    }

    #[test]
    fn lookup_walks_outward() {
        let root = global();
        root.borrow_mut().declare("x", Value::Number(42.0));

        let child = Environment::child_of(&root);
        let grandchild = Environment::child_of(&child);

        assert_eq!(grandchild.borrow().get("x", 1).unwrap(), Value::Number(42.0));
    }

    #[test]
    fn declare_shadows_without_touching_parent() {
        let root = global();
        root.borrow_mut().declare("x", Value::Number(1.0));

        let child = Environment::child_of(&root);
        child.borrow_mut().declare("x", Value::Number(2.0));

        assert_eq!(child.borrow().get("x", 1).unwrap(), Value::Number(2.0));
        assert_eq!(root.borrow().get("x", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_updates_nearest_binding() {
        let root = global();
        root.borrow_mut().declare("x", Value::Number(1.0));

        let child = Environment::child_of(&root);
        let returned = child
            .borrow_mut()
            .assign("x", Value::Number(5.0), 1)
            .unwrap();

        assert_eq!(returned, Value::Number(5.0));
        assert_eq!(root.borrow().get("x", 1).unwrap(), Value::Number(5.0));
        assert!(child.borrow().values.is_empty());
    }

    #[test]
    fn unknown_names_are_errors() {
        let root = global();
        let child = Environment::child_of(&root);

        let err = child.borrow().get("y", 3).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::UndefinedVariable { ref name, line: 3 } if name == "y"
        ));

        let err = child
            .borrow_mut()
            .assign("y", Value::Number(5.0), 4)
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::UndefinedVariable { ref name, line: 4 } if name == "y"
        ));
    }

    #[test]
    fn only_root_is_global() {
        let root = global();
        let child = Environment::child_of(&root);

        assert!(root.borrow().is_global());
        assert!(!child.borrow().is_global());
    }
}
